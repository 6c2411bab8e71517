use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::str::FromStr;

/// Address family tag carried alongside an [`Endpoint`], matching the `IPV4`/`IPV6` split
/// in the wire `NetAddressFamily` enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressFamily {
	V4,
	V6,
}

/// A tagged address-family/port/address triple.
///
/// Internally this crate's single convention is: addresses and ports are held in
/// host/native order in memory (as `std::net` already does) and only converted to
/// network byte order at the point bytes leave the process, inside [`crate::socket`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Endpoint {
	addr: SocketAddr,
}

impl Endpoint {
	pub fn new(addr: SocketAddr) -> Self {
		Self { addr }
	}

	pub fn v4(ip: Ipv4Addr, port: u16) -> Self {
		Self { addr: SocketAddr::new(IpAddr::V4(ip), port) }
	}

	pub fn v6(ip: Ipv6Addr, port: u16) -> Self {
		Self { addr: SocketAddr::new(IpAddr::V6(ip), port) }
	}

	pub fn family(&self) -> AddressFamily {
		match self.addr {
			SocketAddr::V4(_) => AddressFamily::V4,
			SocketAddr::V6(_) => AddressFamily::V6,
		}
	}

	pub fn port(&self) -> u16 {
		self.addr.port()
	}

	pub fn socket_addr(&self) -> SocketAddr {
		self.addr
	}

	/// Map an IPv4 endpoint to its IPv4-mapped-IPv6 form, for sending out a dual-stack
	/// socket bound with `V6ONLY = false`. IPv6 endpoints are returned unchanged.
	pub fn to_ipv6_mapped(&self) -> Self {
		match self.addr {
			SocketAddr::V4(v4) => Self::v6(v4.ip().to_ipv6_mapped(), v4.port()),
			SocketAddr::V6(_) => *self,
		}
	}
}

impl fmt::Display for Endpoint {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.addr)
	}
}

impl FromStr for Endpoint {
	type Err = std::net::AddrParseError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Ok(Self { addr: SocketAddr::from_str(s)? })
	}
}

impl From<SocketAddr> for Endpoint {
	fn from(addr: SocketAddr) -> Self {
		Self { addr }
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn v4_round_trips_through_display_and_parse() {
		let ep = Endpoint::v4(Ipv4Addr::new(127, 0, 0, 1), 27015);
		let parsed: Endpoint = ep.to_string().parse().unwrap();
		assert_eq!(ep, parsed);
		assert_eq!(parsed.family(), AddressFamily::V4);
	}

	#[test]
	fn v6_round_trips_through_display_and_parse() {
		let ep = Endpoint::v6(Ipv6Addr::LOCALHOST, 27015);
		let parsed: Endpoint = ep.to_string().parse().unwrap();
		assert_eq!(ep, parsed);
		assert_eq!(parsed.family(), AddressFamily::V6);
	}

	#[test]
	fn ipv4_mapped_into_v6() {
		let ep = Endpoint::v4(Ipv4Addr::new(10, 0, 0, 1), 9000);
		let mapped = ep.to_ipv6_mapped();
		assert_eq!(mapped.family(), AddressFamily::V6);
		assert_eq!(mapped.port(), 9000);
	}
}
