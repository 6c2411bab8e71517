use std::time::Duration;

use crate::endpoint::Endpoint;

/// Tunable knobs for a [`crate::driver::Driver`], per §6/§10.3. Defaults mirror the
/// numeric examples the specification itself uses.
#[derive(Clone)]
pub struct DriverConfig {
	/// Local endpoint to bind a server to, or `None` for a client's ephemeral port.
	pub bind: Option<Endpoint>,

	/// Size of the fixed worker pool that runs packet handlers off the receiver thread.
	pub worker_threads: usize,

	/// Depth of the bounded handler-task queue each worker thread drains.
	pub worker_queue_depth: usize,

	/// How long a connection may go without a heartbeat before it is torn down.
	pub connection_timeout: Duration,

	/// How often a connected client re-sends its heartbeat, and the short bound after
	/// which it forces a resend if the prior heartbeat's ack hasn't arrived yet (§6).
	pub heartbeat_interval: Duration,

	/// Upper bound on concurrently tracked connections before new `Connect`s are rejected
	/// with `AckStatus::Rejected` (server full).
	pub max_connections: usize,

	/// Packet-object pool chunk counts for each of the five size tiers, smallest first:
	/// 512, 768, 1024, 2048, 4096 bytes, per §11.2 and [`crate::pool::TIERS`].
	pub pool_chunk_counts: [usize; 5],

	/// Ceiling on how many heaps a pool tier may grow to under `gc_collect` pressure.
	pub pool_max_heaps: usize,
}

impl Default for DriverConfig {
	fn default() -> Self {
		Self {
			bind: None,
			worker_threads: 4,
			worker_queue_depth: 256,
			connection_timeout: Duration::from_millis(500),
			heartbeat_interval: Duration::from_millis(100),
			max_connections: 1024,
			pool_chunk_counts: [64, 128, 256, 256, 512],
			pool_max_heaps: 8,
		}
	}
}
