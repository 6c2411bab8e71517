use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use crossbeam::channel::{unbounded, Receiver, Sender};
use rsa::RsaPublicKey;

use crate::client::{ClientSession, SessionState};
use crate::codec::{self, ConnectAckDecoded, HeartbeatAckDecoded};
use crate::config::DriverConfig;
use crate::crypto::{self, RsaKeyPair};
use crate::dispatch::{Dispatcher, PacketHandler};
use crate::endpoint::Endpoint;
use crate::error::{ProtocolError, Result};
use crate::events::{ConnectionFailureReason, DriverEvent};
use crate::headers::{header_type, is_ack, AckStatus, BaseHeader, ConnectedHeader, HeaderKind, PacketFlags, PacketType, BASE_HEADER_SIZE, CONNECTED_HEADER_SIZE};
use crate::server::ConnectionTable;
use crate::socket::{DatagramSocket, NetProtocol};
use utils::bytes::cast;

fn status_to_reason(status: u8) -> ConnectionFailureReason {
	match AckStatus::try_from(status) {
		Ok(AckStatus::Rejected) => ConnectionFailureReason::ServerFull,
		_ => ConnectionFailureReason::Unknown,
	}
}

struct ServerHandler {
	table: Arc<ConnectionTable>,
	server_keypair: Arc<RsaKeyPair>,
	events_tx: Sender<DriverEvent>,
}

impl ServerHandler {
	fn handle_connect(&self, datagram: &[u8], from: Endpoint) -> Option<Vec<u8>> {
		if self.table.is_full() {
			return Some(codec::encode_connect_ack_failure(AckStatus::Rejected as u8));
		}

		let decoded = match codec::decode_connect(datagram, &self.server_keypair) {
			Ok(decoded) => decoded,
			Err(_) => return Some(codec::encode_connect_ack_failure(AckStatus::Unauthorized as u8)),
		};

		let unique_keypair = match RsaKeyPair::generate() {
			Ok(pair) => pair,
			Err(_) => return Some(codec::encode_connect_ack_failure(AckStatus::Rejected as u8)),
		};
		let unique_pem = match unique_keypair.public_to_pem() {
			Ok(pem) => pem,
			Err(_) => return Some(codec::encode_connect_ack_failure(AckStatus::Rejected as u8)),
		};

		let nonce = crypto::random_bytes::<32>();
		let now = runtime::time::unix_millis();
		let client_public_key = decoded.client_public_key.clone();

		let connection_id = self.table.insert_connection(from, client_public_key.clone(), unique_keypair, decoded.shared_key.clone(), decoded.hmac_key, nonce, now)?;

		self.events_tx.send(DriverEvent::ConnectionCreated { connection_id }).ok();

		match codec::encode_connect_ack_ok(&client_public_key, &decoded.shared_key, &unique_pem, decoded.challenge, nonce, connection_id) {
			Ok(ack) => Some(ack),
			Err(_) => {
				self.table.delete_connection(connection_id);
				Some(codec::encode_connect_ack_failure(AckStatus::Rejected as u8))
			}
		}
	}

	fn handle_heartbeat(&self, datagram: &[u8], _from: Endpoint) -> Option<Vec<u8>> {
		if datagram.len() < CONNECTED_HEADER_SIZE {
			return None;
		}
		let header = cast::<ConnectedHeader, [u8]>(datagram);
		let connection_id = header.connection_id.get();
		let packet_uid = header.packet_uid.get();

		let now = runtime::time::unix_millis();
		let events_tx = self.events_tx.clone();

		let result = self.table.with_connection_mut(connection_id, |record| {
			let decoded = codec::decode_heartbeat(datagram, &record.unique_keypair)?;
			if decoded.server_nonce != record.nonce {
				return Err(ProtocolError::ReplayDetected);
			}

			let new_nonce = crypto::random_bytes::<32>();
			record.nonce = new_nonce;
			record.last_heartbeat_millis = now;

			events_tx.send(DriverEvent::heartbeat_received(connection_id, new_nonce, record.endpoint)).ok();

			codec::encode_heartbeat_ack_ok(&record.client_public_key, decoded.client_nonce, new_nonce, packet_uid)
		});

		match result {
			Some(Ok(ack)) => Some(ack),
			Some(Err(_)) => Some(codec::encode_heartbeat_ack_failure(AckStatus::Rejected as u8, packet_uid)),
			None => Some(codec::encode_heartbeat_ack_failure(AckStatus::NotFound as u8, packet_uid)),
		}
	}

	/// `Disconnect` carries no connection id in the Base family; this is a best-effort
	/// acknowledgement only. A server wanting to tear down connection state on receipt
	/// would need an endpoint-keyed index, which this connection table does not keep.
	fn handle_disconnect(&self, datagram: &[u8], _from: Endpoint) -> Option<Vec<u8>> {
		codec::prepare_ack_ok_header(datagram).ok()
	}
}

impl PacketHandler for ServerHandler {
	fn handle(&self, datagram: &[u8], from: Endpoint) -> Option<Vec<u8>> {
		if datagram.len() < BASE_HEADER_SIZE {
			return None;
		}
		let header = cast::<BaseHeader, [u8]>(datagram);
		let flags = PacketFlags::new(header.flags);
		if is_ack(flags) {
			return None;
		}
		let kind = PacketType::try_from(header.kind).ok()?;

		match header_type(kind, flags) {
			HeaderKind::Base if kind == PacketType::Connect => self.handle_connect(datagram, from),
			HeaderKind::Base if kind == PacketType::Disconnect => self.handle_disconnect(datagram, from),
			HeaderKind::Connected if kind == PacketType::Heartbeat => self.handle_heartbeat(datagram, from),
			_ => None,
		}
	}
}

struct ClientHandler {
	session: Arc<Mutex<ClientSession>>,
	events_tx: Sender<DriverEvent>,
}

impl PacketHandler for ClientHandler {
	fn handle(&self, datagram: &[u8], from: Endpoint) -> Option<Vec<u8>> {
		let mut session = self.session.lock().expect("client session mutex poisoned");

		match session.state() {
			SessionState::AwaitingAck => {
				let shared = session.shared_key()?.clone();
				match codec::decode_connect_ack(datagram, session.client_keypair(), &shared) {
					Ok(ConnectAckDecoded::Ok { unique_server_public_key, server_nonce, connection_id, .. }) => {
						if session.set_connection_id(connection_id, unique_server_public_key, server_nonce).is_ok() {
							self.events_tx.send(DriverEvent::connect_success(server_nonce, from)).ok();
						}
					}
					Ok(ConnectAckDecoded::Failure { status }) => {
						self.events_tx.send(DriverEvent::connect_failed(status_to_reason(status), from)).ok();
					}
					Err(_) => {}
				}
			}
			SessionState::Connected => match codec::decode_heartbeat_ack(datagram, session.client_keypair()) {
				Ok(HeartbeatAckDecoded::Ok { client_nonce, server_nonce, .. }) => {
					let connection_id = session.connection_id();
					if session.confirm_heartbeat(client_nonce, server_nonce).is_ok() {
						self.events_tx.send(DriverEvent::heartbeat_received(connection_id, server_nonce, from)).ok();
					}
				}
				Ok(HeartbeatAckDecoded::Failure { status, .. }) => {
					let connection_id = session.connection_id();
					self.events_tx.send(DriverEvent::ConnectionTerminated { connection_id, reason: status_to_reason(status) }).ok();
				}
				Err(_) => {}
			},
			_ => {}
		}

		None
	}
}

/// Server-role shell: binds, spawns the receiver/worker pool, tracks connections.
pub struct ServerDriver {
	dispatcher: Option<Dispatcher>,
	table: Arc<ConnectionTable>,
	events_rx: Receiver<DriverEvent>,
	events_tx: Sender<DriverEvent>,
	config: DriverConfig,
}

impl ServerDriver {
	pub fn start(config: DriverConfig, server_keypair: RsaKeyPair) -> Result<Self> {
		let port = config.bind.map(|ep| ep.port()).unwrap_or(0);
		let socket = Arc::new(DatagramSocket::bind(NetProtocol::Udp, port)?);
		let pool = runtime::WorkerPool::new(config.worker_threads, config.worker_queue_depth);
		let table = Arc::new(ConnectionTable::new(config.max_connections));
		let (events_tx, events_rx) = unbounded();

		let handler = Arc::new(ServerHandler { table: table.clone(), server_keypair: Arc::new(server_keypair), events_tx: events_tx.clone() });
		let dispatcher = Dispatcher::spawn(socket, pool, handler);

		Ok(Self { dispatcher: Some(dispatcher), table, events_rx, events_tx, config })
	}

	pub fn events(&self) -> &Receiver<DriverEvent> {
		&self.events_rx
	}

	/// Sweep the connection table for timed-out connections, emitting
	/// `ConnectionTerminated` for each and returning how many were evicted.
	pub fn tick(&self) -> usize {
		let now = runtime::time::unix_millis();
		let timeout = self.config.connection_timeout.as_millis() as u64;
		let disconnected = self.table.update(now, timeout);
		for connection_id in &disconnected {
			self.events_tx.send(DriverEvent::ConnectionTerminated { connection_id: *connection_id, reason: ConnectionFailureReason::TimedOut }).ok();
		}
		disconnected.len()
	}

	pub fn connection_count(&self) -> usize {
		self.table.len()
	}

	pub fn stop(mut self) {
		if let Some(dispatcher) = self.dispatcher.take() {
			dispatcher.shutdown();
		}
	}
}

/// Client-role shell: owns the handshake session and drives `Connect`/`Heartbeat` sends.
pub struct ClientDriver {
	socket: Arc<DatagramSocket>,
	dispatcher: Option<Dispatcher>,
	session: Arc<Mutex<ClientSession>>,
	events_rx: Receiver<DriverEvent>,
	server_endpoint: Endpoint,
	packet_uid: AtomicU32,
	heartbeat_interval: std::time::Duration,
}

impl ClientDriver {
	pub fn start(config: DriverConfig, client_keypair: RsaKeyPair, server_endpoint: Endpoint) -> Result<Self> {
		let socket = Arc::new(DatagramSocket::create(NetProtocol::Udp)?);
		let pool = runtime::WorkerPool::new(config.worker_threads, config.worker_queue_depth);
		let session = Arc::new(Mutex::new(ClientSession::new(client_keypair)));
		let (events_tx, events_rx) = unbounded();

		let handler = Arc::new(ClientHandler { session: session.clone(), events_tx });
		let dispatcher = Dispatcher::spawn(socket.clone(), pool, handler);

		Ok(Self { socket, dispatcher: Some(dispatcher), session, events_rx, server_endpoint, packet_uid: AtomicU32::new(0), heartbeat_interval: config.heartbeat_interval })
	}

	pub fn events(&self) -> &Receiver<DriverEvent> {
		&self.events_rx
	}

	pub fn is_connected(&self) -> bool {
		self.session.lock().expect("client session mutex poisoned").is_connected()
	}

	pub fn connection_id(&self) -> crate::headers::ConnectionId {
		self.session.lock().expect("client session mutex poisoned").connection_id()
	}

	/// Send a `Connect` to `server_public_key`, moving the session to `AwaitingAck`. The
	/// resulting `ConnectSuccess`/`ConnectFailed` event arrives asynchronously via
	/// [`ClientDriver::events`].
	pub fn connect(&self, server_public_key: &RsaPublicKey) -> Result<()> {
		let (shared_key, hmac_key) = {
			let mut session = self.session.lock().expect("client session mutex poisoned");
			session.initialize()
		};
		let challenge = crypto::random_bytes::<32>();

		let buf = {
			let session = self.session.lock().expect("client session mutex poisoned");
			codec::encode_connect(session.client_keypair(), server_public_key, &shared_key, &hmac_key, challenge)?
		};

		self.socket.send_to(&buf, self.server_endpoint)
	}

	/// Emit a `Heartbeat`, per §6's `heartbeat_waiting`-gated policy: a no-op if the prior
	/// heartbeat's ack is still outstanding and within `heartbeat_interval`'s short bound, a
	/// retransmit of the same pending nonce once that bound expires, or a fresh heartbeat if
	/// none is outstanding. Requires the session to already be `Connected`. Callers are
	/// expected to invoke this on a tick finer than `heartbeat_interval` (the driver itself
	/// decides whether anything actually goes on the wire).
	pub fn send_heartbeat(&self) -> Result<()> {
		let (unique_key, connection_id, maybe_nonces) = {
			let mut session = self.session.lock().expect("client session mutex poisoned");
			let unique_key = session.unique_server_key().ok_or(ProtocolError::StateViolation)?.clone();
			let connection_id = session.connection_id();
			let now = runtime::time::unix_millis();
			let maybe_nonces = session.begin_heartbeat(now, self.heartbeat_interval)?;
			(unique_key, connection_id, maybe_nonces)
		};

		let Some((last_server_nonce, client_nonce)) = maybe_nonces else {
			return Ok(());
		};

		let packet_uid = self.packet_uid.fetch_add(1, Ordering::Relaxed);
		let buf = codec::encode_heartbeat(&unique_key, client_nonce, last_server_nonce, connection_id, packet_uid)?;
		self.socket.send_to(&buf, self.server_endpoint)
	}

	pub fn stop(mut self) {
		if let Some(dispatcher) = self.dispatcher.take() {
			dispatcher.shutdown();
		}
	}
}

/// A driver bound to either role. Most callers construct a [`ClientDriver`] or
/// [`ServerDriver`] directly; this wrapper exists for call sites that pick the role at
/// runtime (e.g. a CLI `--server`/`--client` flag).
pub enum Driver {
	Client(ClientDriver),
	Server(ServerDriver),
}

impl Driver {
	pub fn start_client(config: DriverConfig, client_keypair: RsaKeyPair, server_endpoint: Endpoint) -> Result<Self> {
		Ok(Self::Client(ClientDriver::start(config, client_keypair, server_endpoint)?))
	}

	pub fn start_server(config: DriverConfig, server_keypair: RsaKeyPair) -> Result<Self> {
		Ok(Self::Server(ServerDriver::start(config, server_keypair)?))
	}

	pub fn events(&self) -> &Receiver<DriverEvent> {
		match self {
			Self::Client(driver) => driver.events(),
			Self::Server(driver) => driver.events(),
		}
	}

	pub fn stop(self) {
		match self {
			Self::Client(driver) => driver.stop(),
			Self::Server(driver) => driver.stop(),
		}
	}
}
