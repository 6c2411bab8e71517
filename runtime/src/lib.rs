mod logger;
mod pool;
mod signal;
/// Monotonic/wall-clock time helpers.
pub mod time;

pub use logger::Logger;
pub use pool::WorkerPool;
pub use signal::ShutdownSignal;

static LOGGER: Logger = Logger;

/// Install the process-wide logger. Idempotent — safe to call from multiple driver
/// instances in the same process (e.g. an in-process client/server test pair); only the
/// first call takes effect.
pub fn init_logger(level: log::LevelFilter) {
	if log::set_logger(&LOGGER).is_ok() {
		log::set_max_level(level);
	}
}
