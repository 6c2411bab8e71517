use crate::crypto::{self, AesKey, HmacKey, RsaKeyPair};
use crate::error::{ProtocolError, Result};
use crate::headers::ConnectionId;

/// The states a client-side session moves through, per §4.5. There is only one shape of
/// session: every instance carries a nonce once connected. The source's slimmer,
/// nonce-less variant was considered and rejected (§9) — it never appears in this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
	Idle,
	AwaitingAck,
	Connected,
	Terminated,
}

/// Client-side handshake and session state. Holds the long-lived client keypair plus
/// everything negotiated during `Connect`/`ConnectAck`: the shared AES key, the HMAC key,
/// the server's per-connection unique RSA key, and the heartbeat nonce-chain state.
///
/// The nonce chain tracks two values separately, per §5/§6's `heartbeat_waiting` policy:
/// `server_nonce` is the last nonce the server confirmed (echoed back as `server_ping` on
/// the next Heartbeat), and `pending_client_nonce` is the nonce of a Heartbeat sent but not
/// yet acked. `server_nonce` only advances once `confirm_heartbeat` sees a matching ack —
/// never optimistically at send time — so an ack that is lost, delayed, or arrives out of
/// order cannot desync the chain.
pub struct ClientSession {
	state: SessionState,
	client_keypair: RsaKeyPair,
	shared_key: Option<AesKey>,
	hmac_key: Option<HmacKey>,
	unique_server_key: Option<rsa::RsaPublicKey>,
	connection_id: ConnectionId,
	server_nonce: [u8; 32],
	pending_client_nonce: Option<[u8; 32]>,
	heartbeat_waiting: bool,
	last_heartbeat_sent_millis: u64,
}

impl ClientSession {
	pub fn new(client_keypair: RsaKeyPair) -> Self {
		Self {
			state: SessionState::Idle,
			client_keypair,
			shared_key: None,
			hmac_key: None,
			unique_server_key: None,
			connection_id: crate::headers::INVALID_CONNECTION,
			server_nonce: [0; 32],
			pending_client_nonce: None,
			heartbeat_waiting: false,
			last_heartbeat_sent_millis: 0,
		}
	}

	pub fn state(&self) -> SessionState {
		self.state
	}

	pub fn is_connected(&self) -> bool {
		self.state == SessionState::Connected
	}

	pub fn client_keypair(&self) -> &RsaKeyPair {
		&self.client_keypair
	}

	/// Begin a handshake attempt: generate fresh shared/HMAC keys, move to `AwaitingAck`.
	pub fn initialize(&mut self) -> (AesKey, HmacKey) {
		let shared_key = AesKey::generate();
		let hmac_key = HmacKey::generate();
		self.shared_key = Some(shared_key.clone());
		self.hmac_key = Some(hmac_key.clone());
		self.state = SessionState::AwaitingAck;
		(shared_key, hmac_key)
	}

	/// Complete the handshake on receiving a successful `ConnectAck`.
	pub fn set_connection_id(&mut self, connection_id: ConnectionId, unique_server_key: rsa::RsaPublicKey, server_nonce: [u8; 32]) -> Result<()> {
		if self.state != SessionState::AwaitingAck {
			return Err(ProtocolError::StateViolation);
		}
		self.connection_id = connection_id;
		self.unique_server_key = Some(unique_server_key);
		self.server_nonce = server_nonce;
		self.pending_client_nonce = None;
		self.heartbeat_waiting = false;
		self.last_heartbeat_sent_millis = 0;
		self.state = SessionState::Connected;
		Ok(())
	}

	/// Decide whether a Heartbeat should be sent right now, per §6's emission policy: emit
	/// when not already waiting on a prior heartbeat's ack, or force a resend once
	/// `force_bound` has elapsed since the last send with no ack received. Returns
	/// `(server_nonce_to_echo, client_nonce_to_send)` when a datagram should go out, or
	/// `None` when still within the bound and a send should be skipped. A forced resend
	/// reuses the still-pending client nonce rather than minting a new one, since it is a
	/// retransmission of the same logical heartbeat, not a new one.
	pub fn begin_heartbeat(&mut self, now_millis: u64, force_bound: std::time::Duration) -> Result<Option<([u8; 32], [u8; 32])>> {
		if self.state != SessionState::Connected {
			return Err(ProtocolError::StateViolation);
		}

		if self.heartbeat_waiting {
			let elapsed = now_millis.saturating_sub(self.last_heartbeat_sent_millis);
			if elapsed < force_bound.as_millis() as u64 {
				return Ok(None);
			}
			let client_nonce = self.pending_client_nonce.expect("heartbeat_waiting implies a pending nonce");
			self.last_heartbeat_sent_millis = now_millis;
			return Ok(Some((self.server_nonce, client_nonce)));
		}

		let client_nonce = crypto::random_bytes::<32>();
		self.pending_client_nonce = Some(client_nonce);
		self.heartbeat_waiting = true;
		self.last_heartbeat_sent_millis = now_millis;
		Ok(Some((self.server_nonce, client_nonce)))
	}

	/// Confirm a `HeartbeatAck`, advancing `server_nonce` only if `client_nonce_echoed`
	/// matches the outstanding pending nonce — a stale or duplicate ack for an earlier,
	/// already-confirmed heartbeat is rejected rather than silently re-confirmed.
	pub fn confirm_heartbeat(&mut self, client_nonce_echoed: [u8; 32], new_server_nonce: [u8; 32]) -> Result<()> {
		if self.state != SessionState::Connected {
			return Err(ProtocolError::StateViolation);
		}
		if self.pending_client_nonce != Some(client_nonce_echoed) {
			return Err(ProtocolError::ReplayDetected);
		}
		self.server_nonce = new_server_nonce;
		self.pending_client_nonce = None;
		self.heartbeat_waiting = false;
		Ok(())
	}

	pub fn connection_id(&self) -> ConnectionId {
		self.connection_id
	}

	pub fn server_nonce(&self) -> [u8; 32] {
		self.server_nonce
	}

	pub fn shared_key(&self) -> Option<&AesKey> {
		self.shared_key.as_ref()
	}

	pub fn unique_server_key(&self) -> Option<&rsa::RsaPublicKey> {
		self.unique_server_key.as_ref()
	}

	/// Tear the session down; it cannot be reused, a fresh `ClientSession` is required.
	pub fn terminate(&mut self) {
		self.state = SessionState::Terminated;
	}

	/// Reset a terminated or idle session back to `Idle`, discarding all negotiated key
	/// material so a fresh `initialize` can run.
	pub fn reset(&mut self) {
		self.state = SessionState::Idle;
		self.shared_key = None;
		self.hmac_key = None;
		self.unique_server_key = None;
		self.connection_id = crate::headers::INVALID_CONNECTION;
		self.server_nonce = [0; 32];
		self.pending_client_nonce = None;
		self.heartbeat_waiting = false;
		self.last_heartbeat_sent_millis = 0;
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn handshake_moves_idle_to_connected() {
		let mut session = ClientSession::new(RsaKeyPair::generate().unwrap());
		assert_eq!(session.state(), SessionState::Idle);

		session.initialize();
		assert_eq!(session.state(), SessionState::AwaitingAck);

		let unique = RsaKeyPair::generate().unwrap();
		session.set_connection_id(101, unique.public_key().clone(), [7; 32]).unwrap();
		assert!(session.is_connected());
		assert_eq!(session.connection_id(), 101);
	}

	#[test]
	fn set_connection_id_before_initialize_is_rejected() {
		let mut session = ClientSession::new(RsaKeyPair::generate().unwrap());
		let unique = RsaKeyPair::generate().unwrap();
		assert!(matches!(session.set_connection_id(101, unique.public_key().clone(), [0; 32]), Err(ProtocolError::StateViolation)));
	}

	#[test]
	fn reset_clears_negotiated_state() {
		let mut session = ClientSession::new(RsaKeyPair::generate().unwrap());
		session.initialize();
		let unique = RsaKeyPair::generate().unwrap();
		session.set_connection_id(101, unique.public_key().clone(), [1; 32]).unwrap();
		session.terminate();
		session.reset();
		assert_eq!(session.state(), SessionState::Idle);
		assert_eq!(session.connection_id(), crate::headers::INVALID_CONNECTION);
	}

	fn connected_session() -> ClientSession {
		let mut session = ClientSession::new(RsaKeyPair::generate().unwrap());
		session.initialize();
		let unique = RsaKeyPair::generate().unwrap();
		session.set_connection_id(101, unique.public_key().clone(), [1; 32]).unwrap();
		session
	}

	#[test]
	fn begin_heartbeat_does_not_resend_within_the_bound() {
		let mut session = connected_session();
		let bound = std::time::Duration::from_millis(100);

		let first = session.begin_heartbeat(1_000, bound).unwrap();
		assert!(first.is_some());

		let second = session.begin_heartbeat(1_050, bound).unwrap();
		assert!(second.is_none(), "still waiting within the bound, should not resend");
	}

	#[test]
	fn begin_heartbeat_forces_a_resend_after_the_bound_expires() {
		let mut session = connected_session();
		let bound = std::time::Duration::from_millis(100);

		let (_, first_nonce) = session.begin_heartbeat(1_000, bound).unwrap().unwrap();
		let (_, resend_nonce) = session.begin_heartbeat(1_150, bound).unwrap().unwrap();

		assert_eq!(first_nonce, resend_nonce, "a forced resend reuses the pending nonce");
	}

	#[test]
	fn confirm_heartbeat_advances_server_nonce_and_clears_waiting() {
		let mut session = connected_session();
		let bound = std::time::Duration::from_millis(100);
		let (_, client_nonce) = session.begin_heartbeat(1_000, bound).unwrap().unwrap();

		session.confirm_heartbeat(client_nonce, [9; 32]).unwrap();
		assert_eq!(session.server_nonce(), [9; 32]);

		let next = session.begin_heartbeat(1_010, bound).unwrap();
		assert!(next.is_some(), "ack confirmed, a fresh heartbeat may be sent immediately");
	}

	#[test]
	fn confirm_heartbeat_rejects_a_stale_nonce() {
		let mut session = connected_session();
		let bound = std::time::Duration::from_millis(100);
		session.begin_heartbeat(1_000, bound).unwrap();

		let stale = [0xAA; 32];
		assert!(matches!(session.confirm_heartbeat(stale, [9; 32]), Err(ProtocolError::ReplayDetected)));
	}
}
