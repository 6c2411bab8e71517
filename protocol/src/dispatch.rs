use std::sync::Arc;
use std::thread::JoinHandle;

use runtime::WorkerPool;

use crate::codec;
use crate::endpoint::Endpoint;
use crate::headers::MTU;
use crate::socket::DatagramSocket;

/// Role-specific logic invoked for every CRC-valid datagram the receiver thread sees.
/// Implementations own the cryptographic/session state; `handle` runs on a worker thread,
/// never on the receiver thread itself, so a slow handler cannot stall new receives.
pub trait PacketHandler: Send + Sync {
	/// Process one datagram, returning bytes to send back to `from`, if any.
	fn handle(&self, datagram: &[u8], from: Endpoint) -> Option<Vec<u8>>;
}

/// The six-step receive loop of §4.3: block for a datagram, verify its CRC, hand
/// CRC-valid datagrams to the worker pool for handling, send back whatever response the
/// handler produces. A CRC failure on an apparent Base-family datagram gets a best-effort
/// `AckStatus::Corrupt` reply; anything too short to carry even a `BaseHeader` is dropped
/// silently.
pub struct Dispatcher {
	socket: Arc<DatagramSocket>,
	pool: Arc<WorkerPool>,
	receiver: Option<JoinHandle<()>>,
}

impl Dispatcher {
	pub fn spawn(socket: Arc<DatagramSocket>, pool: Arc<WorkerPool>, handler: Arc<dyn PacketHandler>) -> Self {
		let recv_socket = socket.clone();
		let recv_pool = pool.clone();

		let receiver = std::thread::Builder::new()
			.name("net-receiver".to_string())
			.spawn(move || {
				let mut buf = vec![0u8; MTU];
				loop {
					match recv_socket.receive_from(&mut buf) {
						Ok(Some((n, from))) => {
							if !codec::verify_crc32(&buf[..n]) {
								if let Ok(ack) = codec::prepare_ack_corrupt_header(&buf[..n]) {
									let _ = recv_socket.send_to(&ack, from);
								}
								continue;
							}

							let datagram = buf[..n].to_vec();
							let response_socket = recv_socket.clone();
							let handler = handler.clone();
							if !recv_pool.run(move || {
								if let Some(response) = handler.handle(&datagram, from) {
									let _ = response_socket.send_to(&response, from);
								}
							}) {
								log::warn!("worker pool saturated, dropping datagram from {from}");
							}
						}
						Ok(None) => {
							if !recv_socket.is_awaiting_receive() {
								break;
							}
						}
						Err(err) => {
							log::error!("receive error: {err}");
							if !recv_socket.is_awaiting_receive() {
								break;
							}
						}
					}
				}
			})
			.expect("failed to spawn receiver thread");

		Self { socket, pool, receiver: Some(receiver) }
	}

	pub fn socket(&self) -> &Arc<DatagramSocket> {
		&self.socket
	}

	/// Unblock the receiver thread, wait for it to exit, then drain and join the worker
	/// pool. Order matters: the receiver must stop enqueueing new work before the pool is
	/// told to drain, or `shutdown` could return while a fresh task is still in flight.
	pub fn shutdown(mut self) {
		self.socket.shutdown();
		if let Some(handle) = self.receiver.take() {
			let _ = handle.join();
		}
		self.pool.clone().shutdown();
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::socket::NetProtocol;
	use std::sync::atomic::{AtomicUsize, Ordering};
	use std::time::Duration;

	struct EchoHandler(Arc<AtomicUsize>);

	impl PacketHandler for EchoHandler {
		fn handle(&self, datagram: &[u8], _from: Endpoint) -> Option<Vec<u8>> {
			self.0.fetch_add(1, Ordering::SeqCst);
			Some(datagram.to_vec())
		}
	}

	#[test]
	fn dispatcher_routes_crc_valid_datagrams_to_handler() {
		let server_socket = Arc::new(DatagramSocket::bind(NetProtocol::Ipv4Udp, 0).unwrap());
		let port = server_socket.get_bound_port().unwrap();
		let pool = WorkerPool::new(2, 16);
		let count = Arc::new(AtomicUsize::new(0));
		let dispatcher = Dispatcher::spawn(server_socket, pool, Arc::new(EchoHandler(count.clone())));

		let client = DatagramSocket::bind(NetProtocol::Ipv4Udp, 0).unwrap();
		let ack = codec::prepare_ack_ok_header(&[0u8; crate::headers::BASE_HEADER_SIZE]).unwrap();
		client.send_to(&ack, Endpoint::v4(std::net::Ipv4Addr::LOCALHOST, port)).unwrap();

		std::thread::sleep(Duration::from_millis(300));
		assert_eq!(count.load(Ordering::SeqCst), 1);

		dispatcher.shutdown();
	}
}
