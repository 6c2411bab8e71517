use macros::Cast;
use rsa::RsaPublicKey;
use utils::bytes::{as_slice, cast, Cast};

use crate::crypto::{self, AesKey, HmacKey, RsaKeyPair};
use crate::error::{ProtocolError, Result};
use crate::headers::{
	AckBaseHeader, AckConnectedHeader, AckSecureConnectedHeader, BaseHeader, ConnectedHeader, PacketFlags, PacketType, ACK_BASE_HEADER_SIZE,
	ACK_CONNECTED_HEADER_SIZE, ACK_SECURE_CONNECTED_HEADER_SIZE, BASE_HEADER_SIZE, CONNECTED_HEADER_SIZE, NET_APP_ID, NET_APP_VERSION,
};

/// Compute the CRC32 of `bytes` with the `crc32` header field (bytes 4..8, common to every
/// family's shared prefix) treated as zero, per §4.1.
pub fn calc_crc32(bytes: &[u8]) -> u32 {
	if bytes.len() < 8 {
		return crc32fast::hash(bytes);
	}

	let mut hasher = crc32fast::Hasher::new();
	hasher.update(&bytes[..4]);
	hasher.update(&[0u8; 4]);
	hasher.update(&bytes[8..]);
	hasher.finalize()
}

fn write_crc32(buf: &mut [u8]) {
	let crc = calc_crc32(buf);
	buf[4..8].copy_from_slice(&crc.to_le_bytes());
}

/// Verify the CRC32 embedded in `buf` against a recomputation with the field zeroed.
pub fn verify_crc32(buf: &[u8]) -> bool {
	if buf.len() < 8 {
		return false;
	}
	let stored = u32::from_le_bytes(buf[4..8].try_into().unwrap());
	stored == calc_crc32(buf)
}

fn push<T: Cast>(buf: &mut Vec<u8>, value: &T) {
	buf.extend_from_slice(as_slice::<u8, T>(value));
}

/// The RSA-encrypted signature blob appended to a Connect datagram.
///
/// Field order is frozen: `iv`, `shared_key`, `hmac_key`, `challenge`, `salt`, `hash`,
/// where `hash = SHA-256(cipher || salt)`. 176 bytes plaintext, well inside the 245-byte
/// PKCS#1 v1.5 envelope for a 2048-bit key.
#[derive(Cast, Clone, Copy)]
#[repr(C)]
struct ConnectSignature {
	iv: [u8; 16],
	shared_key: [u8; 32],
	hmac_key: [u8; 32],
	challenge: [u8; 32],
	salt: [u8; 32],
	hash: [u8; 32],
}

pub struct ConnectDecoded {
	pub client_public_key: RsaPublicKey,
	pub shared_key: AesKey,
	pub hmac_key: HmacKey,
	pub challenge: [u8; 32],
}

/// Encode a `Connect` datagram: `[BaseHeader][aes_encrypted_client_pubkey][rsa_signature(256)]`.
pub fn encode_connect(client_keypair: &RsaKeyPair, server_public: &RsaPublicKey, shared_key: &AesKey, hmac_key: &HmacKey, challenge: [u8; 32]) -> Result<Vec<u8>> {
	client_keypair.validate(true)?;

	let pem = client_keypair.public_to_pem()?;
	let iv = crypto::generate_iv();
	let cipher = crypto::aes_encrypt(shared_key, &iv, pem.as_bytes());
	let salt = crypto::random_bytes::<32>();
	let hash = crypto::sha256(&[cipher.as_slice(), &salt].concat());

	let signature = ConnectSignature { iv, shared_key: shared_key.0, hmac_key: hmac_key.0, challenge, salt, hash };
	let rsa_sig = RsaKeyPair::public_only(server_public.clone()).encrypt(as_slice::<u8, ConnectSignature>(&signature))?;

	let mut buf = Vec::with_capacity(BASE_HEADER_SIZE + cipher.len() + rsa_sig.len());
	let header = BaseHeader {
		app_id: NET_APP_ID.into(),
		app_version: NET_APP_VERSION.into(),
		crc32: 0u32.into(),
		flags: PacketFlags::RELIABILITY,
		kind: PacketType::Connect as u8,
		padding: [0; 2],
	};
	push(&mut buf, &header);
	buf.extend_from_slice(&cipher);
	buf.extend_from_slice(&rsa_sig);

	write_crc32(&mut buf);
	Ok(buf)
}

/// Decode a `Connect` datagram on the server side using the server's private key.
pub fn decode_connect(buf: &[u8], server_keypair: &RsaKeyPair) -> Result<ConnectDecoded> {
	if buf.len() <= BASE_HEADER_SIZE + crypto::RSA_KEY_BYTES {
		return Err(ProtocolError::DecodeFailed);
	}

	let rsa_block = &buf[buf.len() - crypto::RSA_KEY_BYTES..];
	let cipher = &buf[BASE_HEADER_SIZE..buf.len() - crypto::RSA_KEY_BYTES];

	let plaintext = server_keypair.decrypt(rsa_block)?;
	if plaintext.len() != std::mem::size_of::<ConnectSignature>() {
		return Err(ProtocolError::DecodeFailed);
	}
	let signature = *cast::<ConnectSignature, [u8]>(&plaintext);

	let expected_hash = crypto::sha256(&[cipher, &signature.salt[..]].concat());
	if expected_hash != signature.hash {
		return Err(ProtocolError::AuthenticationFailed);
	}

	let shared_key = AesKey(signature.shared_key);
	let pem_bytes = crypto::aes_decrypt(&shared_key, &signature.iv, cipher)?;
	let pem = String::from_utf8(pem_bytes).map_err(|_| ProtocolError::KeyParse)?;
	let client_public_key = RsaKeyPair::public_from_pem(&pem)?;

	Ok(ConnectDecoded {
		client_public_key,
		shared_key,
		hmac_key: HmacKey(signature.hmac_key),
		challenge: signature.challenge,
	})
}

/// RSA-encrypted signature authenticating a successful ConnectAck's AES-encrypted payload.
#[derive(Cast, Clone, Copy)]
#[repr(C)]
struct AckSignature {
	iv: [u8; 16],
	hash: [u8; 32],
}

/// Encode a successful `ConnectAck`: `[AckSecureConnectedHeader][aes_encrypted_payload]`.
///
/// The trailing payload is `[pem_len: u16][pem_bytes][challenge(32)][server_nonce(32)][connection_id: u16]`,
/// AES-encrypted under the connection's already-established shared key (no new key exchange
/// is needed at this point in the handshake). The header's 256-byte `data` block is an
/// RSA encryption, under the client's public key, of `AckSignature { iv, hash }` where
/// `hash = SHA-256(payload_ciphertext || iv)` — this authenticates the payload without
/// needing to fit it whole inside one RSA block.
pub fn encode_connect_ack_ok(
	client_public_key: &RsaPublicKey,
	shared_key: &AesKey,
	unique_server_public_pem: &str,
	challenge_echo: [u8; 32],
	server_nonce: [u8; 32],
	connection_id: u16,
) -> Result<Vec<u8>> {
	let pem_bytes = unique_server_public_pem.as_bytes();
	if pem_bytes.len() > u16::MAX as usize {
		return Err(ProtocolError::BufferTooSmall { required: pem_bytes.len() });
	}

	let mut plaintext = Vec::with_capacity(2 + pem_bytes.len() + 32 + 32 + 2);
	plaintext.extend_from_slice(&(pem_bytes.len() as u16).to_le_bytes());
	plaintext.extend_from_slice(pem_bytes);
	plaintext.extend_from_slice(&challenge_echo);
	plaintext.extend_from_slice(&server_nonce);
	plaintext.extend_from_slice(&connection_id.to_le_bytes());

	let iv = crypto::generate_iv();
	let payload = crypto::aes_encrypt(shared_key, &iv, &plaintext);
	let hash = crypto::sha256(&[payload.as_slice(), &iv].concat());

	let signature = AckSignature { iv, hash };
	let rsa_block = RsaKeyPair::public_only(client_public_key.clone()).encrypt(as_slice::<u8, AckSignature>(&signature))?;
	let mut data = [0u8; 256];
	data.copy_from_slice(&rsa_block);

	let mut buf = Vec::with_capacity(ACK_SECURE_CONNECTED_HEADER_SIZE + payload.len());
	let header = AckSecureConnectedHeader {
		app_id: NET_APP_ID.into(),
		app_version: NET_APP_VERSION.into(),
		crc32: 0u32.into(),
		flags: PacketFlags::ACK,
		kind: PacketType::Connect as u8,
		data,
		padding: [0; 2],
	};
	push(&mut buf, &header);
	buf.extend_from_slice(&payload);

	write_crc32(&mut buf);
	Ok(buf)
}

/// Encode a failed `ConnectAck`: a bare 12-byte `AckBaseHeader` carrying only `status`.
pub fn encode_connect_ack_failure(status: u8) -> Vec<u8> {
	let mut buf = Vec::with_capacity(ACK_BASE_HEADER_SIZE);
	let header = AckBaseHeader {
		app_id: NET_APP_ID.into(),
		app_version: NET_APP_VERSION.into(),
		crc32: 0u32.into(),
		flags: PacketFlags::ACK,
		kind: PacketType::Connect as u8,
		status,
		padding: [0; 1],
	};
	push(&mut buf, &header);
	write_crc32(&mut buf);
	buf
}

pub enum ConnectAckDecoded {
	Ok { unique_server_public_key: RsaPublicKey, challenge_echo: [u8; 32], server_nonce: [u8; 32], connection_id: u16 },
	Failure { status: u8 },
}

/// Decode a `ConnectAck` on the client side. Disambiguates the success/failure layout by
/// datagram length, per the `AckBaseHeader` vs. `AckSecureConnectedHeader` size gap: a
/// bare 12-byte datagram is a failure ack, anything carrying an `AckSecureConnectedHeader`
/// prefix is a success ack.
pub fn decode_connect_ack(buf: &[u8], client_keypair: &RsaKeyPair, shared_key: &AesKey) -> Result<ConnectAckDecoded> {
	if buf.len() == ACK_BASE_HEADER_SIZE {
		let header = cast::<AckBaseHeader, [u8]>(buf);
		return Ok(ConnectAckDecoded::Failure { status: header.status });
	}

	if buf.len() <= ACK_SECURE_CONNECTED_HEADER_SIZE {
		return Err(ProtocolError::DecodeFailed);
	}

	let header = cast::<AckSecureConnectedHeader, [u8]>(buf);
	let payload = &buf[ACK_SECURE_CONNECTED_HEADER_SIZE..];

	let signature_bytes = client_keypair.decrypt(&header.data)?;
	if signature_bytes.len() != std::mem::size_of::<AckSignature>() {
		return Err(ProtocolError::DecodeFailed);
	}
	let signature = *cast::<AckSignature, [u8]>(&signature_bytes);

	let expected_hash = crypto::sha256(&[payload, &signature.iv[..]].concat());
	if expected_hash != signature.hash {
		return Err(ProtocolError::AuthenticationFailed);
	}

	let plaintext = crypto::aes_decrypt(shared_key, &signature.iv, payload)?;
	if plaintext.len() < 2 {
		return Err(ProtocolError::DecodeFailed);
	}
	let pem_len = u16::from_le_bytes([plaintext[0], plaintext[1]]) as usize;
	if plaintext.len() != 2 + pem_len + 32 + 32 + 2 {
		return Err(ProtocolError::DecodeFailed);
	}

	let pem = std::str::from_utf8(&plaintext[2..2 + pem_len]).map_err(|_| ProtocolError::KeyParse)?;
	let unique_server_public_key = RsaKeyPair::public_from_pem(pem)?;

	let mut challenge_echo = [0u8; 32];
	challenge_echo.copy_from_slice(&plaintext[2 + pem_len..2 + pem_len + 32]);
	let mut server_nonce = [0u8; 32];
	server_nonce.copy_from_slice(&plaintext[2 + pem_len + 32..2 + pem_len + 64]);
	let connection_id = u16::from_le_bytes([plaintext[2 + pem_len + 64], plaintext[2 + pem_len + 65]]);

	Ok(ConnectAckDecoded::Ok { unique_server_public_key, challenge_echo, server_nonce, connection_id })
}

/// The RSA-encrypted nonce exchange carried by Heartbeat and its ack.
#[derive(Cast, Clone, Copy)]
#[repr(C)]
struct HeartbeatPing {
	client_ping: [u8; 32],
	server_ping: [u8; 32],
}

/// Encode a `Heartbeat`: `[ConnectedHeader][rsa_ciphertext(256)]`.
pub fn encode_heartbeat(unique_server_public_key: &RsaPublicKey, client_nonce: [u8; 32], last_server_nonce: [u8; 32], connection_id: u16, packet_uid: u32) -> Result<Vec<u8>> {
	let ping = HeartbeatPing { client_ping: client_nonce, server_ping: last_server_nonce };
	let rsa_block = RsaKeyPair::public_only(unique_server_public_key.clone()).encrypt(as_slice::<u8, HeartbeatPing>(&ping))?;

	let mut buf = Vec::with_capacity(CONNECTED_HEADER_SIZE + rsa_block.len());
	let header = ConnectedHeader {
		app_id: NET_APP_ID.into(),
		app_version: NET_APP_VERSION.into(),
		crc32: 0u32.into(),
		flags: 0,
		kind: PacketType::Heartbeat as u8,
		connection_id: connection_id.into(),
		packet_uid: packet_uid.into(),
	};
	push(&mut buf, &header);
	buf.extend_from_slice(&rsa_block);

	write_crc32(&mut buf);
	Ok(buf)
}

pub struct HeartbeatDecoded {
	pub connection_id: u16,
	pub client_nonce: [u8; 32],
	pub server_nonce: [u8; 32],
}

/// Decode a `Heartbeat` on the server side using the connection's unique private key.
pub fn decode_heartbeat(buf: &[u8], unique_server_keypair: &RsaKeyPair) -> Result<HeartbeatDecoded> {
	if buf.len() != CONNECTED_HEADER_SIZE + crypto::RSA_KEY_BYTES {
		return Err(ProtocolError::DecodeFailed);
	}

	let header = cast::<ConnectedHeader, [u8]>(buf);
	if PacketFlags::new(header.flags).contains(PacketFlags::ACK) {
		return Err(ProtocolError::DecodeFailed);
	}

	let plaintext = unique_server_keypair.decrypt(&buf[CONNECTED_HEADER_SIZE..])?;
	if plaintext.len() != std::mem::size_of::<HeartbeatPing>() {
		return Err(ProtocolError::DecodeFailed);
	}
	let ping = *cast::<HeartbeatPing, [u8]>(&plaintext);

	Ok(HeartbeatDecoded { connection_id: header.connection_id.get(), client_nonce: ping.client_ping, server_nonce: ping.server_ping })
}

/// Encode a successful `HeartbeatAck`: `[AckConnectedHeader][rsa_ciphertext(256)]`.
pub fn encode_heartbeat_ack_ok(client_public_key: &RsaPublicKey, client_nonce: [u8; 32], new_server_nonce: [u8; 32], packet_uid: u32) -> Result<Vec<u8>> {
	let ping = HeartbeatPing { client_ping: client_nonce, server_ping: new_server_nonce };
	let rsa_block = RsaKeyPair::public_only(client_public_key.clone()).encrypt(as_slice::<u8, HeartbeatPing>(&ping))?;

	let mut buf = Vec::with_capacity(ACK_CONNECTED_HEADER_SIZE + rsa_block.len());
	let header = AckConnectedHeader {
		app_id: NET_APP_ID.into(),
		app_version: NET_APP_VERSION.into(),
		crc32: 0u32.into(),
		flags: PacketFlags::ACK,
		kind: PacketType::Heartbeat as u8,
		status: 0,
		packet_uid: packet_uid.to_le_bytes(),
		padding: [0; 1],
	};
	push(&mut buf, &header);
	buf.extend_from_slice(&rsa_block);

	write_crc32(&mut buf);
	Ok(buf)
}

/// Encode a status-only `HeartbeatAck` (no RSA block), e.g. for a connection that can no
/// longer be found.
pub fn encode_heartbeat_ack_failure(status: u8, packet_uid: u32) -> Vec<u8> {
	let mut buf = Vec::with_capacity(ACK_CONNECTED_HEADER_SIZE);
	let header = AckConnectedHeader {
		app_id: NET_APP_ID.into(),
		app_version: NET_APP_VERSION.into(),
		crc32: 0u32.into(),
		flags: PacketFlags::ACK,
		kind: PacketType::Heartbeat as u8,
		status,
		packet_uid: packet_uid.to_le_bytes(),
		padding: [0; 1],
	};
	push(&mut buf, &header);
	write_crc32(&mut buf);
	buf
}

pub enum HeartbeatAckDecoded {
	Ok { client_nonce: [u8; 32], server_nonce: [u8; 32], packet_uid: u32 },
	Failure { status: u8, packet_uid: u32 },
}

/// Decode a `HeartbeatAck` on the client side. Implementations must tolerate receipt of a
/// status-only ack (no trailing RSA block), disambiguated here by datagram length.
pub fn decode_heartbeat_ack(buf: &[u8], client_keypair: &RsaKeyPair) -> Result<HeartbeatAckDecoded> {
	if buf.len() < ACK_CONNECTED_HEADER_SIZE {
		return Err(ProtocolError::DecodeFailed);
	}

	let header = cast::<AckConnectedHeader, [u8]>(buf);
	let packet_uid = u32::from_le_bytes(header.packet_uid);

	if buf.len() == ACK_CONNECTED_HEADER_SIZE {
		return Ok(HeartbeatAckDecoded::Failure { status: header.status, packet_uid });
	}

	if header.status != 0 || buf.len() != ACK_CONNECTED_HEADER_SIZE + crypto::RSA_KEY_BYTES {
		return Err(ProtocolError::DecodeFailed);
	}

	let plaintext = client_keypair.decrypt(&buf[ACK_CONNECTED_HEADER_SIZE..])?;
	if plaintext.len() != std::mem::size_of::<HeartbeatPing>() {
		return Err(ProtocolError::DecodeFailed);
	}
	let ping = *cast::<HeartbeatPing, [u8]>(&plaintext);

	Ok(HeartbeatAckDecoded::Ok { client_nonce: ping.client_ping, server_nonce: ping.server_ping, packet_uid })
}

/// Given a received Base-family datagram (`Connect`/`Disconnect`), produce a matching
/// `AckBaseHeader` with `status = CORRUPT`, recomputing CRC over the ack. Both real call
/// sites (`dispatch.rs`, `driver.rs`) only ever invoke this on Base-family datagrams, so
/// unlike `encode_connect_ack_failure`/`encode_heartbeat_ack_failure` this takes no
/// recipient key and never produces an AckConnected/AckSecureConnected family ack.
pub fn prepare_ack_corrupt_header(received: &[u8]) -> Result<Vec<u8>> {
	prepare_ack_base(received, crate::headers::AckStatus::Corrupt as u8)
}

/// Given a received Base-family datagram (`Connect`/`Disconnect`), produce a matching
/// `AckBaseHeader` with `status = OK`, recomputing CRC over the ack. See
/// [`prepare_ack_corrupt_header`] for the scope of this function's contract.
pub fn prepare_ack_ok_header(received: &[u8]) -> Result<Vec<u8>> {
	prepare_ack_base(received, crate::headers::AckStatus::Ok as u8)
}

fn prepare_ack_base(received: &[u8], status: u8) -> Result<Vec<u8>> {
	if received.len() < BASE_HEADER_SIZE {
		return Err(ProtocolError::BufferTooSmall { required: BASE_HEADER_SIZE });
	}
	let received_header = cast::<BaseHeader, [u8]>(received);

	let mut buf = Vec::with_capacity(ACK_BASE_HEADER_SIZE);
	let header = AckBaseHeader {
		app_id: NET_APP_ID.into(),
		app_version: NET_APP_VERSION.into(),
		crc32: 0u32.into(),
		flags: PacketFlags::ACK,
		kind: received_header.kind,
		status,
		padding: [0; 1],
	};
	push(&mut buf, &header);
	write_crc32(&mut buf);
	Ok(buf)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::crypto::{AesKey, HmacKey};

	fn keys() -> (RsaKeyPair, RsaKeyPair) {
		(RsaKeyPair::generate().unwrap(), RsaKeyPair::generate().unwrap())
	}

	#[test]
	fn crc_zero_field_round_trips() {
		let (client, server) = keys();
		let buf = encode_connect(&client, server.public_key(), &AesKey::generate(), &HmacKey::generate(), crypto::random_bytes::<32>()).unwrap();
		assert!(verify_crc32(&buf));
	}

	#[test]
	fn connect_round_trips_all_fields() {
		let (client, server) = keys();
		let shared_key = AesKey::generate();
		let hmac_key = HmacKey::generate();
		let challenge = crypto::random_bytes::<32>();

		let buf = encode_connect(&client, server.public_key(), &shared_key, &hmac_key, challenge).unwrap();
		let decoded = decode_connect(&buf, &server).unwrap();

		assert_eq!(decoded.shared_key.0, shared_key.0);
		assert_eq!(decoded.hmac_key.0, hmac_key.0);
		assert_eq!(decoded.challenge, challenge);
		assert_eq!(decoded.client_public_key.to_pkcs1_der().unwrap().as_bytes(), client.public_key().to_pkcs1_der().unwrap().as_bytes());
	}

	#[test]
	fn connect_replay_differs_every_call() {
		let (client, server) = keys();
		let shared_key = AesKey::generate();
		let hmac_key = HmacKey::generate();
		let challenge = crypto::random_bytes::<32>();

		let a = encode_connect(&client, server.public_key(), &shared_key, &hmac_key, challenge).unwrap();
		let b = encode_connect(&client, server.public_key(), &shared_key, &hmac_key, challenge).unwrap();
		assert_ne!(a, b);
	}

	#[test]
	fn corrupted_connect_fails_authentication() {
		let (client, server) = keys();
		let mut buf = encode_connect(&client, server.public_key(), &AesKey::generate(), &HmacKey::generate(), crypto::random_bytes::<32>()).unwrap();
		let mutate_at = BASE_HEADER_SIZE + 4;
		buf[mutate_at] ^= 0xFF;

		match decode_connect(&buf, &server) {
			Err(ProtocolError::AuthenticationFailed) | Err(ProtocolError::DecodeFailed) => {}
			other => panic!("expected authentication failure, got {other:?}", other = other.is_ok()),
		}
	}

	#[test]
	fn connect_ack_ok_round_trips() {
		let (client, _server) = keys();
		let unique = RsaKeyPair::generate().unwrap();
		let shared_key = AesKey::generate();
		let challenge = crypto::random_bytes::<32>();
		let nonce = crypto::random_bytes::<32>();

		let pem = unique.public_to_pem().unwrap();
		let buf = encode_connect_ack_ok(client.public_key(), &shared_key, &pem, challenge, nonce, 101).unwrap();
		assert!(verify_crc32(&buf));

		match decode_connect_ack(&buf, &client, &shared_key).unwrap() {
			ConnectAckDecoded::Ok { challenge_echo, server_nonce, connection_id, .. } => {
				assert_eq!(challenge_echo, challenge);
				assert_eq!(server_nonce, nonce);
				assert_eq!(connection_id, 101);
			}
			ConnectAckDecoded::Failure { .. } => panic!("expected success"),
		}
	}

	#[test]
	fn heartbeat_round_trips() {
		let unique = RsaKeyPair::generate().unwrap();
		let client_nonce = crypto::random_bytes::<32>();
		let server_nonce = crypto::random_bytes::<32>();

		let buf = encode_heartbeat(unique.public_key(), client_nonce, server_nonce, 101, 7).unwrap();
		let decoded = decode_heartbeat(&buf, &unique).unwrap();

		assert_eq!(decoded.connection_id, 101);
		assert_eq!(decoded.client_nonce, client_nonce);
		assert_eq!(decoded.server_nonce, server_nonce);
	}

	#[test]
	fn heartbeat_ack_round_trips_and_tolerates_status_only() {
		let client = RsaKeyPair::generate().unwrap();
		let client_nonce = crypto::random_bytes::<32>();
		let new_nonce = crypto::random_bytes::<32>();

		let ok = encode_heartbeat_ack_ok(client.public_key(), client_nonce, new_nonce, 9).unwrap();
		match decode_heartbeat_ack(&ok, &client).unwrap() {
			HeartbeatAckDecoded::Ok { client_nonce: cn, server_nonce: sn, packet_uid } => {
				assert_eq!(cn, client_nonce);
				assert_eq!(sn, new_nonce);
				assert_eq!(packet_uid, 9);
			}
			HeartbeatAckDecoded::Failure { .. } => panic!("expected success"),
		}

		let failure = encode_heartbeat_ack_failure(crate::headers::AckStatus::NotFound as u8, 9);
		match decode_heartbeat_ack(&failure, &client).unwrap() {
			HeartbeatAckDecoded::Failure { status, .. } => assert_eq!(status, crate::headers::AckStatus::NotFound as u8),
			HeartbeatAckDecoded::Ok { .. } => panic!("expected failure"),
		}
	}

	#[test]
	fn ack_signature_round_trips_through_cast() {
		let signature = AckSignature { iv: [9; 16], hash: [3; 32] };
		let bytes = as_slice::<u8, AckSignature>(&signature).to_vec();
		let back = *cast::<AckSignature, [u8]>(&bytes);
		assert_eq!(back.iv, signature.iv);
		assert_eq!(back.hash, signature.hash);
	}

	#[test]
	fn corrupt_ack_preserves_kind_and_validates_crc() {
		let (client, server) = keys();
		let connect = encode_connect(&client, server.public_key(), &AesKey::generate(), &HmacKey::generate(), crypto::random_bytes::<32>()).unwrap();
		let ack = prepare_ack_corrupt_header(&connect).unwrap();
		assert!(verify_crc32(&ack));
		assert_eq!(ack.len(), ACK_BASE_HEADER_SIZE);
	}
}
