use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam::channel::{bounded, Sender};

type Task = Box<dyn FnOnce() + Send + 'static>;

/// A fixed-size pool of OS worker threads draining a bounded task queue.
///
/// This is the `run(fn)` primitive required of the transport dispatch core: it delivers
/// `fn` to some worker thread with at-least-once execution and no ordering guarantee across
/// distinct `run` calls, backed by genuine parallel threads rather than a cooperative
/// scheduler.
pub struct WorkerPool {
	tx: Sender<Task>,
	workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
	/// Spawn `num_threads` workers draining a task queue bounded at `queue_size`.
	pub fn new(num_threads: usize, queue_size: usize) -> Arc<Self> {
		let (tx, rx) = bounded::<Task>(queue_size);

		let workers = (0..num_threads.max(1))
			.map(|idx| {
				let rx = rx.clone();
				std::thread::Builder::new()
					.name(format!("worker-{idx}"))
					.spawn(move || {
						while let Ok(task) = rx.recv() {
							task();
						}
					})
					.expect("failed to spawn worker thread")
			})
			.collect();

		Arc::new(Self { tx, workers })
	}

	/// Enqueue a task. Returns `false` if the queue is full and the task was rejected —
	/// the caller is expected to log and drop the datagram that produced it.
	pub fn run(&self, task: impl FnOnce() + Send + 'static) -> bool {
		self.tx.try_send(Box::new(task)).is_ok()
	}

	/// Signal workers to stop accepting new work and block until every in-flight task
	/// has drained. Idempotent: calling `shutdown` twice on the same (now-empty) pool is a
	/// no-op beyond dropping an already-disconnected sender.
	pub fn shutdown(self: Arc<Self>) {
		let Self { tx, workers } = match Arc::try_unwrap(self) {
			Ok(inner) => inner,
			Err(_) => return,
		};

		drop(tx);

		for worker in workers {
			let _ = worker.join();
		}
	}
}
