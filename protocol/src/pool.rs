use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::endpoint::Endpoint;
use crate::error::{ProtocolError, Result};
use crate::headers::PacketType;

/// The five fixed chunk sizes a [`PacketPool`] allocates from, largest-unit-first is not
/// required; `allocate` always picks the smallest tier that fits the request, per §11.2.
pub const TIERS: [usize; 5] = [512, 768, 1024, 2048, 4096];

/// Descriptor carried alongside a pooled buffer, mirroring the source's packet-object
/// header: what kind of datagram this is, its logical size (which may be smaller than
/// the tier's chunk size), how many times it has been retransmitted, and who it is to or
/// from.
#[derive(Debug, Clone, Copy)]
pub struct PacketData {
	pub kind: PacketType,
	pub size: usize,
	pub retransmits: u32,
	pub sender: Endpoint,
}

/// A buffer checked out of a [`PacketPool`] tier, paired with its descriptor. Dropping a
/// handle without returning it to the pool leaks the chunk rather than corrupting the
/// pool — callers are expected to call [`PacketPool::free`] once done.
pub struct PacketHandle {
	pub data: PacketData,
	buffer: Box<[u8]>,
	tier_index: usize,
}

impl PacketHandle {
	pub fn bytes(&self) -> &[u8] {
		&self.buffer[..self.data.size]
	}

	pub fn bytes_mut(&mut self) -> &mut [u8] {
		let size = self.data.size;
		&mut self.buffer[..size]
	}
}

struct Tier {
	chunk_size: usize,
	free: Mutex<Vec<Box<[u8]>>>,
	heaps_allocated: AtomicUsize,
	objects_per_heap: usize,
	max_heaps: usize,
}

impl Tier {
	fn new(chunk_size: usize, objects_per_heap: usize, max_heaps: usize) -> Self {
		let free = (0..objects_per_heap).map(|_| vec![0u8; chunk_size].into_boxed_slice()).collect();
		Self { chunk_size, free: Mutex::new(free), heaps_allocated: AtomicUsize::new(1), objects_per_heap, max_heaps }
	}

	fn allocate(&self) -> Option<Box<[u8]>> {
		let mut free = self.free.lock().expect("packet pool mutex poisoned");
		if let Some(chunk) = free.pop() {
			return Some(chunk);
		}

		if self.heaps_allocated.load(Ordering::Relaxed) >= self.max_heaps {
			return None;
		}
		self.heaps_allocated.fetch_add(1, Ordering::Relaxed);
		free.extend((0..self.objects_per_heap).map(|_| vec![0u8; self.chunk_size].into_boxed_slice()));
		free.pop()
	}

	fn free(&self, chunk: Box<[u8]>) {
		debug_assert_eq!(chunk.len(), self.chunk_size);
		self.free.lock().expect("packet pool mutex poisoned").push(chunk);
	}

	/// Reclaim heaps grown beyond the tier's initial configured size: keep at most
	/// `objects_per_heap` chunks on the free list and reset the heap counter to 1.
	fn gc_collect(&self) {
		let mut free = self.free.lock().expect("packet pool mutex poisoned");
		if free.len() > self.objects_per_heap {
			free.truncate(self.objects_per_heap);
		}
		self.heaps_allocated.store(1, Ordering::Relaxed);
	}
}

/// A fixed-tier packet buffer pool, matching the source's `TPacketAllocator` lifecycle:
/// `initialize` up front, `allocate`/`free` per datagram, `gc_collect` to shed load-spike
/// growth, `release` to tear the whole pool down.
pub struct PacketPool {
	tiers: Vec<Tier>,
}

impl PacketPool {
	/// `object_counts` gives the initial chunk count per tier in [`TIERS`] order;
	/// `max_heaps` bounds how many times a tier may double under allocation pressure
	/// before `allocate` starts reporting [`ProtocolError::PoolExhausted`].
	pub fn initialize(object_counts: [usize; 5], max_heaps: usize) -> Self {
		let tiers = TIERS.iter().zip(object_counts).map(|(&chunk_size, count)| Tier::new(chunk_size, count.max(1), max_heaps.max(1))).collect();
		Self { tiers }
	}

	/// Check out a buffer from the smallest tier that can hold `size` bytes.
	pub fn allocate(&self, kind: PacketType, size: usize, sender: Endpoint) -> Result<PacketHandle> {
		let tier_index = self.tiers.iter().position(|tier| tier.chunk_size >= size).ok_or(ProtocolError::BufferTooSmall { required: size })?;

		let buffer = self.tiers[tier_index].allocate().ok_or(ProtocolError::PoolExhausted)?;
		Ok(PacketHandle { data: PacketData { kind, size, retransmits: 0, sender }, buffer, tier_index })
	}

	/// Return a handle's buffer to its owning tier.
	pub fn free(&self, handle: PacketHandle) {
		self.tiers[handle.tier_index].free(handle.buffer);
	}

	/// Shed any tier growth accumulated since the last collection.
	pub fn gc_collect(&self) {
		for tier in &self.tiers {
			tier.gc_collect();
		}
	}

	/// Tear the pool down. Chunks still checked out by live [`PacketHandle`]s are simply
	/// dropped when those handles go out of scope; this does not wait for them.
	pub fn release(self) {
		drop(self);
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::net::Ipv4Addr;

	fn endpoint() -> Endpoint {
		Endpoint::v4(Ipv4Addr::LOCALHOST, 9000)
	}

	#[test]
	fn allocate_picks_smallest_fitting_tier() {
		let pool = PacketPool::initialize([4, 4, 4, 4, 4], 4);
		let handle = pool.allocate(PacketType::Message, 600, endpoint()).unwrap();
		assert_eq!(handle.bytes().len(), 600);
		pool.free(handle);
	}

	#[test]
	fn allocate_rejects_oversized_request() {
		let pool = PacketPool::initialize([4, 4, 4, 4, 4], 4);
		match pool.allocate(PacketType::Message, 5000, endpoint()) {
			Err(ProtocolError::BufferTooSmall { required }) => assert_eq!(required, 5000),
			_ => panic!("expected BufferTooSmall"),
		}
	}

	#[test]
	fn exhausted_tier_grows_then_reports_pool_exhausted() {
		let pool = PacketPool::initialize([1, 1, 1, 1, 1], 2);
		let a = pool.allocate(PacketType::Connect, 400, endpoint()).unwrap();
		let b = pool.allocate(PacketType::Connect, 400, endpoint()).unwrap();
		assert!(pool.allocate(PacketType::Connect, 400, endpoint()).is_err());
		pool.free(a);
		pool.free(b);
	}

	#[test]
	fn gc_collect_sheds_growth_back_to_initial_size() {
		let pool = PacketPool::initialize([1, 1, 1, 1, 1], 4);
		let handles: Vec<_> = (0..3).map(|_| pool.allocate(PacketType::Connect, 400, endpoint()).unwrap()).collect();
		for handle in handles {
			pool.free(handle);
		}
		pool.gc_collect();
		let handle = pool.allocate(PacketType::Connect, 400, endpoint()).unwrap();
		pool.free(handle);
	}
}
