use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A process-wide `running` flag toggled by Ctrl+C, for driver shells to poll from their
/// tick loop. Acquire/release semantics per the concurrency model's atomic-flag policy.
#[derive(Clone)]
pub struct ShutdownSignal(Arc<AtomicBool>);

impl ShutdownSignal {
	/// Install the Ctrl+C handler. Only the first call per process actually registers a
	/// handler; subsequent handles share the same flag.
	pub fn install() -> utils::error::Result<Self> {
		let flag = Arc::new(AtomicBool::new(false));
		let handle = flag.clone();

		ctrlc::set_handler(move || handle.store(true, Ordering::Release)).map_err(|err| log::error!("failed to install Ctrl+C handler: {err}"))?;

		Ok(Self(flag))
	}

	pub fn requested(&self) -> bool {
		self.0.load(Ordering::Acquire)
	}

	pub fn request(&self) {
		self.0.store(true, Ordering::Release);
	}
}
