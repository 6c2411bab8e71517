use macros::Cast;
use utils::endian::{u16le, u32le};

/// `app_id`/`app_version` the repository pins for every datagram.
pub const NET_APP_ID: u16 = 0x0001;
pub const NET_APP_VERSION: u16 = 0x0001;

/// Fixed per-datagram maximum, per §6.
pub const MTU: usize = 2048;

pub const CLIENT_CHALLENGE_BYTES: usize = 32;
pub const HEARTBEAT_NONCE_BYTES: usize = 32;

/// A per-server-process connection identifier; `0` is the sentinel "invalid" value.
pub type ConnectionId = u16;
pub const INVALID_CONNECTION: ConnectionId = 0;

/// Bitset over the `flags` header byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PacketFlags(pub u8);

impl PacketFlags {
	pub const RELIABILITY: u8 = 1 << 0;
	pub const ORDER_WEAK: u8 = 1 << 1;
	pub const ORDER_STRICT: u8 = 1 << 2;
	pub const COMPRESSION: u8 = 1 << 3;
	pub const ACK: u8 = 1 << 4;
	pub const SYNC: u8 = 1 << 5;
	pub const SECURE: u8 = 1 << 6;
	pub const IPV4: u8 = 1 << 7;

	pub fn new(bits: u8) -> Self {
		Self(bits)
	}

	pub fn contains(self, bit: u8) -> bool {
		self.0 & bit != 0
	}

	pub fn with(self, bit: u8) -> Self {
		Self(self.0 | bit)
	}
}

/// The `type` header byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PacketType {
	Connect = 0,
	Disconnect = 1,
	Heartbeat = 2,
	Message = 3,
}

impl TryFrom<u8> for PacketType {
	type Error = ();

	fn try_from(value: u8) -> Result<Self, Self::Error> {
		Ok(match value {
			0 => Self::Connect,
			1 => Self::Disconnect,
			2 => Self::Heartbeat,
			3 => Self::Message,
			_ => return Err(()),
		})
	}
}

/// Ack outcome taxonomy, carried in `status` on every ack-family header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum AckStatus {
	Ok = 0,
	Corrupt = 1,
	Rejected = 2,
	Forbidden = 3,
	NotFound = 4,
	Unauthorized = 5,
	InvalidRequest = 6,
}

impl TryFrom<u8> for AckStatus {
	type Error = ();

	fn try_from(value: u8) -> Result<Self, Self::Error> {
		Ok(match value {
			0 => Self::Ok,
			1 => Self::Corrupt,
			2 => Self::Rejected,
			3 => Self::Forbidden,
			4 => Self::NotFound,
			5 => Self::Unauthorized,
			6 => Self::InvalidRequest,
			_ => return Err(()),
		})
	}
}

/// Which of the three non-ack header families a datagram carries, per `header_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderKind {
	Base,
	Connected,
	SecureConnected,
}

/// Classify a received buffer's header family from its `type` field and `SECURE` flag.
/// `HEARTBEAT` and plain `MESSAGE` are Connected, `MESSAGE|SECURE` is SecureConnected,
/// everything else (Connect/Disconnect) is Base.
pub fn header_type(kind: PacketType, flags: PacketFlags) -> HeaderKind {
	match kind {
		PacketType::Heartbeat => HeaderKind::Connected,
		PacketType::Message if flags.contains(PacketFlags::SECURE) => HeaderKind::SecureConnected,
		PacketType::Message => HeaderKind::Connected,
		_ => HeaderKind::Base,
	}
}

pub fn is_ack(flags: PacketFlags) -> bool {
	flags.contains(PacketFlags::ACK)
}

/// Base header family: used by Connect/Disconnect and their non-secure acks' prefix.
#[derive(Cast, Clone, Copy)]
#[repr(C)]
pub struct BaseHeader {
	pub app_id: u16le,
	pub app_version: u16le,
	pub crc32: u32le,
	pub flags: u8,
	pub kind: u8,
	pub padding: [u8; 2],
}

pub const BASE_HEADER_SIZE: usize = 12;

/// Connected header family: used by `MESSAGE` and `HEARTBEAT`.
#[derive(Cast, Clone, Copy)]
#[repr(C)]
pub struct ConnectedHeader {
	pub app_id: u16le,
	pub app_version: u16le,
	pub crc32: u32le,
	pub flags: u8,
	pub kind: u8,
	pub connection_id: u16le,
	pub packet_uid: u32le,
}

pub const CONNECTED_HEADER_SIZE: usize = 16;

/// SecureConnected header family: used for secure session payloads.
#[derive(Cast, Clone, Copy)]
#[repr(C)]
pub struct SecureConnectedHeader {
	pub app_id: u16le,
	pub app_version: u16le,
	pub crc32: u32le,
	pub flags: u8,
	pub kind: u8,
	pub hash: [u8; 32],
	pub connection_id: u16le,
	pub packet_uid: u32le,
	pub reserved: [u8; 10],
	pub padding: [u8; 2],
}

pub const SECURE_CONNECTED_HEADER_SIZE: usize = 60;

/// AckBase header family.
#[derive(Cast, Clone, Copy)]
#[repr(C)]
pub struct AckBaseHeader {
	pub app_id: u16le,
	pub app_version: u16le,
	pub crc32: u32le,
	pub flags: u8,
	pub kind: u8,
	pub status: u8,
	pub padding: [u8; 1],
}

pub const ACK_BASE_HEADER_SIZE: usize = 12;

/// AckConnected header family. `packet_uid` here is a raw, unaligned 4-byte array (not a
/// native `u32le`) — it is copied byte-by-byte in and out, matching the source, which
/// never casts it directly.
#[derive(Cast, Clone, Copy)]
#[repr(C)]
pub struct AckConnectedHeader {
	pub app_id: u16le,
	pub app_version: u16le,
	pub crc32: u32le,
	pub flags: u8,
	pub kind: u8,
	pub status: u8,
	pub packet_uid: [u8; 4],
	pub padding: [u8; 1],
}

pub const ACK_CONNECTED_HEADER_SIZE: usize = 16;

/// AckSecureConnected header family. `data` is an opaque 256-byte RSA block whose
/// plaintext, once decrypted by the ack's recipient, is a small `codec::AckSignature { iv,
/// hash }` authenticating a separate AES-encrypted payload trailing the header — see
/// `codec::encode_connect_ack_ok`/`decode_connect_ack` for the committed layout. A bare
/// `(packet_uid, connection_id, status)` plaintext, as the RSA block alone, doesn't fit: a
/// PEM-encoded 2048-bit public key is well past the 245-byte PKCS#1 v1.5 ceiling, which is
/// why the ack is a hybrid envelope rather than a single RSA block.
#[derive(Cast, Clone, Copy)]
#[repr(C)]
pub struct AckSecureConnectedHeader {
	pub app_id: u16le,
	pub app_version: u16le,
	pub crc32: u32le,
	pub flags: u8,
	pub kind: u8,
	pub data: [u8; 256],
	pub padding: [u8; 2],
}

pub const ACK_SECURE_CONNECTED_HEADER_SIZE: usize = 268;

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn header_sizes_match_the_frozen_wire_layout() {
		assert_eq!(std::mem::size_of::<BaseHeader>(), BASE_HEADER_SIZE);
		assert_eq!(std::mem::size_of::<ConnectedHeader>(), CONNECTED_HEADER_SIZE);
		assert_eq!(std::mem::size_of::<SecureConnectedHeader>(), SECURE_CONNECTED_HEADER_SIZE);
		assert_eq!(std::mem::size_of::<AckBaseHeader>(), ACK_BASE_HEADER_SIZE);
		assert_eq!(std::mem::size_of::<AckConnectedHeader>(), ACK_CONNECTED_HEADER_SIZE);
		assert_eq!(std::mem::size_of::<AckSecureConnectedHeader>(), ACK_SECURE_CONNECTED_HEADER_SIZE);
	}

	#[test]
	fn header_type_classifies_by_kind_and_secure_flag() {
		let plain = PacketFlags::new(0);
		let secure = PacketFlags::new(0).with(PacketFlags::SECURE);

		assert_eq!(header_type(PacketType::Message, plain), HeaderKind::Connected);
		assert_eq!(header_type(PacketType::Message, secure), HeaderKind::SecureConnected);
		assert_eq!(header_type(PacketType::Connect, plain), HeaderKind::Base);
		assert_eq!(header_type(PacketType::Heartbeat, plain), HeaderKind::Connected);
		assert_eq!(header_type(PacketType::Heartbeat, secure), HeaderKind::Connected);
		assert_eq!(header_type(PacketType::Disconnect, plain), HeaderKind::Base);
	}
}
