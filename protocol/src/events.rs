use crate::endpoint::Endpoint;
use crate::headers::ConnectionId;

/// Why a connection attempt or an established connection did not survive, per §4.7.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionFailureReason {
	Unknown,
	TimedOut,
	ServerFull,
}

/// The full outward-facing event taxonomy a [`crate::driver::Driver`] raises.
///
/// Inbound-triggered variants carry a `from` field in debug builds only — production
/// builds drop it, since it exists purely to help a developer trace which datagram
/// produced which event, not to drive protocol logic.
#[derive(Debug, Clone)]
pub enum DriverEvent {
	ConnectSuccess {
		server_nonce: [u8; 32],
		#[cfg(debug_assertions)]
		from: Endpoint,
	},
	ConnectFailed {
		reason: ConnectionFailureReason,
		#[cfg(debug_assertions)]
		from: Endpoint,
	},
	ConnectionCreated {
		connection_id: ConnectionId,
	},
	ConnectionTerminated {
		connection_id: ConnectionId,
		reason: ConnectionFailureReason,
	},
	HeartbeatReceived {
		connection_id: ConnectionId,
		nonce: [u8; 32],
		#[cfg(debug_assertions)]
		from: Endpoint,
	},
	DataReceived {
		connection_id: ConnectionId,
		bytes: Vec<u8>,
		#[cfg(debug_assertions)]
		from: Endpoint,
	},
	DataReceivedReliable {
		connection_id: ConnectionId,
		bytes: Vec<u8>,
		#[cfg(debug_assertions)]
		from: Endpoint,
	},
	DataReceivedOrderedWeak {
		connection_id: ConnectionId,
		bytes: Vec<u8>,
		#[cfg(debug_assertions)]
		from: Endpoint,
	},
	DataReceivedOrderedStrict {
		connection_id: ConnectionId,
		bytes: Vec<u8>,
		#[cfg(debug_assertions)]
		from: Endpoint,
	},
}

impl DriverEvent {
	/// Build `ConnectSuccess`, attaching `from` only in debug builds.
	pub fn connect_success(server_nonce: [u8; 32], #[allow(unused_variables)] from: Endpoint) -> Self {
		#[cfg(debug_assertions)]
		{
			Self::ConnectSuccess { server_nonce, from }
		}
		#[cfg(not(debug_assertions))]
		{
			Self::ConnectSuccess { server_nonce }
		}
	}

	pub fn connect_failed(reason: ConnectionFailureReason, #[allow(unused_variables)] from: Endpoint) -> Self {
		#[cfg(debug_assertions)]
		{
			Self::ConnectFailed { reason, from }
		}
		#[cfg(not(debug_assertions))]
		{
			Self::ConnectFailed { reason }
		}
	}

	pub fn heartbeat_received(connection_id: ConnectionId, nonce: [u8; 32], #[allow(unused_variables)] from: Endpoint) -> Self {
		#[cfg(debug_assertions)]
		{
			Self::HeartbeatReceived { connection_id, nonce, from }
		}
		#[cfg(not(debug_assertions))]
		{
			Self::HeartbeatReceived { connection_id, nonce }
		}
	}

	pub fn data_received(connection_id: ConnectionId, bytes: Vec<u8>, #[allow(unused_variables)] from: Endpoint) -> Self {
		#[cfg(debug_assertions)]
		{
			Self::DataReceived { connection_id, bytes, from }
		}
		#[cfg(not(debug_assertions))]
		{
			Self::DataReceived { connection_id, bytes }
		}
	}

	pub fn data_received_reliable(connection_id: ConnectionId, bytes: Vec<u8>, #[allow(unused_variables)] from: Endpoint) -> Self {
		#[cfg(debug_assertions)]
		{
			Self::DataReceivedReliable { connection_id, bytes, from }
		}
		#[cfg(not(debug_assertions))]
		{
			Self::DataReceivedReliable { connection_id, bytes }
		}
	}

	pub fn data_received_ordered_weak(connection_id: ConnectionId, bytes: Vec<u8>, #[allow(unused_variables)] from: Endpoint) -> Self {
		#[cfg(debug_assertions)]
		{
			Self::DataReceivedOrderedWeak { connection_id, bytes, from }
		}
		#[cfg(not(debug_assertions))]
		{
			Self::DataReceivedOrderedWeak { connection_id, bytes }
		}
	}

	pub fn data_received_ordered_strict(connection_id: ConnectionId, bytes: Vec<u8>, #[allow(unused_variables)] from: Endpoint) -> Self {
		#[cfg(debug_assertions)]
		{
			Self::DataReceivedOrderedStrict { connection_id, bytes, from }
		}
		#[cfg(not(debug_assertions))]
		{
			Self::DataReceivedOrderedStrict { connection_id, bytes }
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn connection_terminated_carries_its_reason() {
		let event = DriverEvent::ConnectionTerminated { connection_id: 101, reason: ConnectionFailureReason::TimedOut };
		match event {
			DriverEvent::ConnectionTerminated { connection_id, reason } => {
				assert_eq!(connection_id, 101);
				assert_eq!(reason, ConnectionFailureReason::TimedOut);
			}
			_ => panic!("wrong variant"),
		}
	}
}
