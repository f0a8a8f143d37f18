/*!
 * Pool Soak - Main Entry Point
 *
 * Runs a multi-threaded allocate/slice/duplicate/discard workload against one
 * pool, prints the final statistics as JSON and fails if any buffer was not
 * returned.
 */

#[cfg(all(feature = "jemalloc", not(target_env = "msvc")))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

use heap_buffer_pool::monitoring::span_worker;
use heap_buffer_pool::{init_tracing, BufferPool, PoolConfig, SharedBuffer};
use std::process::ExitCode;
use tracing::{error, info};

const DEFAULT_THREADS: usize = 8;
const DEFAULT_ITERATIONS: usize = 10_000;
const MAX_REQUEST: usize = 64 * 1024;

fn env_usize(name: &str, default: usize) -> usize {
    std::env::var(name)
        .ok()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(default)
}

/// One worker's share of the workload
///
/// Every path discards exactly what it acquired, so a correct pool ends
/// with every buffer idle.
fn run_worker(pool: &BufferPool, worker: usize, iterations: usize) {
    let span = span_worker(worker, iterations);
    let _entered = span.enter();

    let mut state = (worker as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    for _ in 0..iterations {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;

        let size = (state as usize) % MAX_REQUEST;
        let buffer = pool.allocate_silent(size, "soak");
        fill(&buffer);

        match state % 4 {
            0 => {
                let slice = buffer.slice("slice");
                buffer.discard_silent("soak");
                slice.discard_silent("slice");
            }
            1 => {
                let dup = buffer.duplicate_read_only("dup");
                let _ = dup.access().to_vec();
                dup.discard_silent("dup");
                buffer.discard_silent("soak");
            }
            2 => {
                let other = buffer.implicit_reference("ref");
                buffer.discard_silent("soak");
                other.discard_silent("ref");
            }
            _ => buffer.discard_silent("soak"),
        }
    }
}

fn fill(buffer: &SharedBuffer) {
    if let Ok(view) = buffer.access_mut() {
        view.write(|bytes| bytes.fill(0xA5));
    }
}

fn main() -> ExitCode {
    init_tracing();

    let threads = env_usize("HBB_SOAK_THREADS", DEFAULT_THREADS);
    let iterations = env_usize("HBB_SOAK_ITERATIONS", DEFAULT_ITERATIONS);
    let pool = BufferPool::builder()
        .with_config(PoolConfig::from_env().with_leak_detection(true))
        .build();

    info!(threads, iterations, "Pool soak starting");
    std::thread::scope(|scope| {
        for worker in 0..threads {
            let pool = &pool;
            scope.spawn(move || run_worker(pool, worker, iterations));
        }
    });

    let stats = pool.stats();
    match serde_json::to_string_pretty(&stats) {
        Ok(json) => println!("{json}"),
        Err(e) => error!(error = %e, "Could not serialize pool statistics"),
    }

    if pool.all_buffers_returned() && stats.leaked_handles == 0 {
        info!(
            reuse_ratio = stats.reuse_ratio(),
            allocated = stats.allocated_bytes,
            "Pool soak finished, every buffer returned"
        );
        ExitCode::SUCCESS
    } else {
        error!(
            checked_out = stats.checked_out_bytes(),
            leaked = stats.leaked_handles,
            "Pool soak finished with outstanding buffers"
        );
        ExitCode::FAILURE
    }
}
