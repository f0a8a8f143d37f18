/*!
 * Monitoring
 * Tracing setup for binaries and tests
 */

mod tracer;

pub use tracer::{init_tracing, span_worker};
