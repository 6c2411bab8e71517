use std::io::ErrorKind;
use std::net::{SocketAddr, UdpSocket};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use socket2::{Domain, Protocol, Socket, Type};

use crate::endpoint::Endpoint;
use crate::error::{ProtocolError, Result};

/// The protocol family a [`DatagramSocket`] was created for, echoing `get_protocol` in §6.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetProtocol {
	Ipv4Udp,
	Ipv6Udp,
	/// Dual-stack: an IPv6 socket with `V6ONLY = false`, accepting both families.
	Udp,
}

/// A poll interval used to make the blocking `recv_from` call interruptible by `shutdown`
/// without a native "unblock this fd" primitive for UDP sockets.
const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// A non-blocking-capable datagram socket abstraction over IPv4, IPv6, or dual-stack.
///
/// `receive_from` is blocking but interruptible: it polls an internal `shutdown` flag at
/// [`POLL_INTERVAL`] granularity via the socket's read timeout, so a concurrent call to
/// [`DatagramSocket::shutdown`] reliably unblocks it within one poll tick.
pub struct DatagramSocket {
	socket: UdpSocket,
	protocol: NetProtocol,
	shutdown: AtomicBool,
}

impl DatagramSocket {
	/// Create an unbound, ephemeral-port socket (used by clients).
	pub fn create(protocol: NetProtocol) -> Result<Self> {
		Self::bind_inner(protocol, None)
	}

	/// Create and bind to a local port (used by servers).
	pub fn bind(protocol: NetProtocol, port: u16) -> Result<Self> {
		Self::bind_inner(protocol, Some(port))
	}

	fn bind_inner(protocol: NetProtocol, port: Option<u16>) -> Result<Self> {
		let (domain, addr): (Domain, SocketAddr) = match protocol {
			NetProtocol::Ipv4Udp => (Domain::IPV4, SocketAddr::new(std::net::Ipv4Addr::UNSPECIFIED.into(), port.unwrap_or(0))),
			NetProtocol::Ipv6Udp | NetProtocol::Udp => (Domain::IPV6, SocketAddr::new(std::net::Ipv6Addr::UNSPECIFIED.into(), port.unwrap_or(0))),
		};

		let socket = Socket::new(domain, Type::DGRAM, Some(Protocol::UDP))?;

		if matches!(protocol, NetProtocol::Udp) {
			socket.set_only_v6(false)?;
		}

		socket.bind(&addr.into())?;
		socket.set_read_timeout(Some(POLL_INTERVAL))?;
		socket.set_nonblocking(false)?;

		Ok(Self { socket: socket.into(), protocol, shutdown: AtomicBool::new(false) })
	}

	/// Blocking, interruptible receive. Returns `Ok(None)` on a read-timeout poll tick with
	/// no shutdown requested yet, so callers should loop on `Ok(None)`.
	pub fn receive_from(&self, buf: &mut [u8]) -> Result<Option<(usize, Endpoint)>> {
		if self.shutdown.load(Ordering::Acquire) {
			return Ok(None);
		}

		match self.socket.recv_from(buf) {
			Ok((n, addr)) => Ok(Some((n, Endpoint::new(addr)))),
			Err(err) if matches!(err.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => Ok(None),
			Err(err) => Err(ProtocolError::SocketError(err)),
		}
	}

	pub fn send_to(&self, buf: &[u8], endpoint: Endpoint) -> Result<()> {
		let n = self.socket.send_to(buf, endpoint.socket_addr())?;
		if n != buf.len() {
			return Err(ProtocolError::SocketError(std::io::Error::new(ErrorKind::Other, "short send")));
		}
		Ok(())
	}

	/// Unblock a concurrent `receive_from` within one [`POLL_INTERVAL`].
	pub fn shutdown(&self) {
		self.shutdown.store(true, Ordering::Release);
	}

	pub fn is_awaiting_receive(&self) -> bool {
		!self.shutdown.load(Ordering::Acquire)
	}

	pub fn get_protocol(&self) -> NetProtocol {
		self.protocol
	}

	pub fn get_bound_port(&self) -> Result<u16> {
		Ok(self.socket.local_addr()?.port())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn bind_and_round_trip_datagram() {
		let server = DatagramSocket::bind(NetProtocol::Ipv4Udp, 0).unwrap();
		let port = server.get_bound_port().unwrap();
		let client = DatagramSocket::create(NetProtocol::Ipv4Udp).unwrap();

		let target = Endpoint::v4(std::net::Ipv4Addr::LOCALHOST, port);
		client.send_to(b"hello", target).unwrap();

		let mut buf = [0u8; 64];
		loop {
			if let Some((n, _)) = server.receive_from(&mut buf).unwrap() {
				assert_eq!(&buf[..n], b"hello");
				break;
			}
		}
	}

	#[test]
	fn shutdown_unblocks_receive() {
		let socket = DatagramSocket::bind(NetProtocol::Ipv4Udp, 0).unwrap();
		socket.shutdown();
		let mut buf = [0u8; 64];
		assert!(socket.receive_from(&mut buf).unwrap().is_none());
		assert!(!socket.is_awaiting_receive());
	}
}
