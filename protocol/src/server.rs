use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::Mutex;

use rsa::RsaPublicKey;

use collections::map::{Entry, Key, Map};

use crate::crypto::{AesKey, HmacKey, RsaKeyPair};
use crate::endpoint::Endpoint;
use crate::headers::{ConnectionId, INVALID_CONNECTION};

/// Everything the server tracks per established connection.
pub struct ConnectionRecord {
	pub connection_id: ConnectionId,
	pub endpoint: Endpoint,
	pub client_public_key: RsaPublicKey,
	pub unique_keypair: RsaKeyPair,
	pub shared_key: AesKey,
	pub hmac_key: HmacKey,
	pub nonce: [u8; 32],
	pub last_heartbeat_millis: u64,
}

impl Key for ConnectionRecord {
	type Type = ConnectionId;

	fn key(&self) -> &Self::Type {
		&self.connection_id
	}
}

/// Fixed compile-time map capacity; [`ConnectionTable::max_connections`] is the runtime
/// cap actually enforced by `insert_connection` and may be set lower.
const TABLE_CAPACITY: usize = 4096;

/// The server-side connection table: `find_connection`/`insert_connection`/
/// `delete_connection`/`update`, per §4.6/C7. Connection identifiers are generated
/// starting at 100, per §11; `0` is reserved as [`INVALID_CONNECTION`].
pub struct ConnectionTable {
	map: Mutex<Map<ConnectionRecord, TABLE_CAPACITY>>,
	/// Parallel index of live connection ids. `collections::map::Map`'s safe core has no
	/// iterator, so sweep operations (timeout eviction) walk this list and point-look up
	/// into `map` instead.
	ids: Mutex<Vec<ConnectionId>>,
	next_id: AtomicU16,
	count: std::sync::atomic::AtomicUsize,
	max_connections: usize,
}

impl ConnectionTable {
	pub fn new(max_connections: usize) -> Self {
		Self {
			map: Mutex::new(Map::default()),
			ids: Mutex::new(Vec::new()),
			next_id: AtomicU16::new(100),
			count: std::sync::atomic::AtomicUsize::new(0),
			max_connections,
		}
	}

	pub fn len(&self) -> usize {
		self.count.load(Ordering::Acquire)
	}

	pub fn is_full(&self) -> bool {
		self.len() >= self.max_connections
	}

	fn next_candidate_id(&self) -> ConnectionId {
		loop {
			let candidate = self.next_id.fetch_add(1, Ordering::Relaxed);
			if candidate != INVALID_CONNECTION {
				return candidate;
			}
		}
	}

	/// Insert a newly established connection, returning its assigned identifier, or `None`
	/// if the table is at its configured capacity.
	pub fn insert_connection(
		&self,
		endpoint: Endpoint,
		client_public_key: RsaPublicKey,
		unique_keypair: RsaKeyPair,
		shared_key: AesKey,
		hmac_key: HmacKey,
		nonce: [u8; 32],
		now_millis: u64,
	) -> Option<ConnectionId> {
		if self.is_full() {
			return None;
		}

		let mut map = self.map.lock().expect("connection table mutex poisoned");
		for _ in 0..u16::MAX as usize {
			let candidate = self.next_candidate_id();
			if let Entry::Empty(slot) = map.find_entry(&candidate) {
				slot.insert(ConnectionRecord {
					connection_id: candidate,
					endpoint,
					client_public_key,
					unique_keypair,
					shared_key,
					hmac_key,
					nonce,
					last_heartbeat_millis: now_millis,
				});
				self.ids.lock().expect("connection table mutex poisoned").push(candidate);
				self.count.fetch_add(1, Ordering::AcqRel);
				return Some(candidate);
			}
		}
		None
	}

	pub fn find_connection<R>(&self, id: ConnectionId, f: impl FnOnce(&ConnectionRecord) -> R) -> Option<R> {
		let map = self.map.lock().expect("connection table mutex poisoned");
		map.find(&id).map(f)
	}

	pub fn with_connection_mut<R>(&self, id: ConnectionId, f: impl FnOnce(&mut ConnectionRecord) -> R) -> Option<R> {
		let mut map = self.map.lock().expect("connection table mutex poisoned");
		match map.find_entry(&id) {
			Entry::Filled(mut filled) => Some(f(&mut filled)),
			Entry::Empty(_) => None,
		}
	}

	pub fn delete_connection(&self, id: ConnectionId) -> bool {
		let mut map = self.map.lock().expect("connection table mutex poisoned");
		let removed = match map.find_entry(&id) {
			Entry::Filled(filled) => {
				filled.remove();
				true
			}
			Entry::Empty(_) => false,
		};
		drop(map);

		if removed {
			self.ids.lock().expect("connection table mutex poisoned").retain(|&existing| existing != id);
			self.count.fetch_sub(1, Ordering::AcqRel);
		}
		removed
	}

	/// Evict every connection whose last heartbeat is older than `timeout_millis` as of
	/// `now_millis`, returning the disconnected identifiers.
	pub fn update(&self, now_millis: u64, timeout_millis: u64) -> Vec<ConnectionId> {
		let candidates = self.ids.lock().expect("connection table mutex poisoned").clone();

		let mut timed_out = Vec::new();
		for id in candidates {
			let expired = self.find_connection(id, |record| now_millis.saturating_sub(record.last_heartbeat_millis) >= timeout_millis).unwrap_or(false);
			if expired {
				timed_out.push(id);
			}
		}

		for &id in &timed_out {
			self.delete_connection(id);
		}
		timed_out
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::net::Ipv4Addr;

	fn endpoint() -> Endpoint {
		Endpoint::v4(Ipv4Addr::LOCALHOST, 9000)
	}

	fn record_material() -> (RsaPublicKey, RsaKeyPair, AesKey, HmacKey) {
		let client = RsaKeyPair::generate().unwrap();
		let unique = RsaKeyPair::generate().unwrap();
		(client.public_key().clone(), unique, AesKey::generate(), HmacKey::generate())
	}

	#[test]
	fn insert_assigns_ids_starting_at_100() {
		let table = ConnectionTable::new(16);
		let (pub_key, unique, shared, hmac) = record_material();
		let id = table.insert_connection(endpoint(), pub_key, unique, shared, hmac, [0; 32], 0).unwrap();
		assert_eq!(id, 100);
		assert_eq!(table.len(), 1);
	}

	#[test]
	fn find_and_delete_round_trip() {
		let table = ConnectionTable::new(16);
		let (pub_key, unique, shared, hmac) = record_material();
		let id = table.insert_connection(endpoint(), pub_key, unique, shared, hmac, [0; 32], 0).unwrap();

		assert!(table.find_connection(id, |record| record.connection_id == id).unwrap());
		assert!(table.delete_connection(id));
		assert!(table.find_connection(id, |_| ()).is_none());
		assert_eq!(table.len(), 0);
	}

	#[test]
	fn insert_rejects_once_full() {
		let table = ConnectionTable::new(1);
		let (pub_key, unique, shared, hmac) = record_material();
		table.insert_connection(endpoint(), pub_key, unique, shared, hmac, [0; 32], 0).unwrap();

		let (pub_key2, unique2, shared2, hmac2) = record_material();
		assert!(table.insert_connection(endpoint(), pub_key2, unique2, shared2, hmac2, [0; 32], 0).is_none());
	}

	#[test]
	fn update_evicts_stale_connections() {
		let table = ConnectionTable::new(16);
		let (pub_key, unique, shared, hmac) = record_material();
		let id = table.insert_connection(endpoint(), pub_key, unique, shared, hmac, [0; 32], 0).unwrap();

		let disconnected = table.update(10_000, 5_000);
		assert_eq!(disconnected, vec![id]);
		assert_eq!(table.len(), 0);
	}
}
