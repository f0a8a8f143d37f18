/*!
 * Fatal Escalation
 *
 * Single exit point for use-after-free, double free and pool exhaustion.
 */

use super::traits::FatalHandler;
use crate::core::errors::PoolError;
use tracing::error;

/// Default handler: log and let the process abort
#[derive(Debug, Default, Clone, Copy)]
pub struct AbortOnFatal;

impl FatalHandler for AbortOnFatal {
    fn on_fatal(&self, error: &PoolError) {
        // Reaches stderr even when no tracing subscriber is installed
        eprintln!("FATAL: {error}");
    }
}

/// Turns fatal pool errors into panics carrying the error text
///
/// For tests and embedders that supervise the pool from an unwinding
/// boundary. State touched by the failing call is left as it was before the
/// call.
#[derive(Debug, Default, Clone, Copy)]
pub struct PanicOnFatal;

impl FatalHandler for PanicOnFatal {
    fn on_fatal(&self, error: &PoolError) {
        panic!("{error}");
    }
}

/// Log `error` with full context, notify `handler`, then abort
#[cold]
#[inline(never)]
pub(crate) fn escalate(handler: &dyn FatalHandler, error: PoolError) -> ! {
    debug_assert!(error.is_fatal(), "non-fatal error escalated: {error}");
    error!(error = ?error, "Fatal buffer pool error: {}", error);
    handler.on_fatal(&error);
    std::process::abort()
}
