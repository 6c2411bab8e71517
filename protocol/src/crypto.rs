use aes::cipher::block_padding::Pkcs7;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use hmac::{Hmac, Mac};
use rand::rngs::OsRng;
use rand::RngCore;
use rsa::pkcs1::{DecodeRsaPublicKey, EncodeRsaPublicKey};
use rsa::{Pkcs1v15Encrypt, RsaPrivateKey, RsaPublicKey};
use sha2::{Digest, Sha256};
use zeroize::Zeroize;

use crate::error::{ProtocolError, Result};

/// RSA-2048 modulus size in bytes; every RSA ciphertext produced or consumed by this
/// crate is exactly this many bytes.
pub const RSA_KEY_BYTES: usize = 256;
pub const AES_KEY_BYTES: usize = 32;
pub const HMAC_KEY_BYTES: usize = 32;
pub const NONCE_BYTES: usize = 32;
pub const CHALLENGE_BYTES: usize = 32;
const AES_IV_BYTES: usize = 16;

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;
type HmacSha256 = Hmac<Sha256>;

/// A 2048-bit PKCS#1 keypair, public-only or public+private.
pub struct RsaKeyPair {
	private: Option<RsaPrivateKey>,
	public: RsaPublicKey,
}

impl RsaKeyPair {
	/// Generate a fresh RSA-2048 keypair with both halves present.
	pub fn generate() -> Result<Self> {
		let private = RsaPrivateKey::new(&mut OsRng, 2048).map_err(|_| ProtocolError::KeyParse)?;
		let public = private.to_public_key();
		Ok(Self { private: Some(private), public })
	}

	pub fn public_only(public: RsaPublicKey) -> Self {
		Self { private: None, public }
	}

	pub fn public_key(&self) -> &RsaPublicKey {
		&self.public
	}

	pub fn has_private(&self) -> bool {
		self.private.is_some()
	}

	/// Validate the keypair is exactly RSA-2048 and, if a private half is required by the
	/// caller, that it is present.
	pub fn validate(&self, require_private: bool) -> Result<()> {
		if self.public.size() != RSA_KEY_BYTES {
			return Err(ProtocolError::InvalidKeySize);
		}
		if require_private && self.private.is_none() {
			return Err(ProtocolError::InvalidKeySize);
		}
		Ok(())
	}

	/// Serialize the public half to its PEM-like (PKCS#1 DER-in-PEM) text form.
	pub fn public_to_pem(&self) -> Result<String> {
		self.public.to_pkcs1_pem(Default::default()).map_err(|_| ProtocolError::KeyParse).map(|s| s.to_string())
	}

	/// Parse a public key from its PEM-like text form.
	pub fn public_from_pem(pem: &str) -> Result<RsaPublicKey> {
		RsaPublicKey::from_pkcs1_pem(pem).map_err(|_| ProtocolError::KeyParse)
	}

	/// RSA-encrypt `plaintext` under this key's public half. `plaintext` must fit the
	/// PKCS#1 v1.5 padding envelope for a 2048-bit key (at most 245 bytes).
	pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
		self.public.encrypt(&mut OsRng, Pkcs1v15Encrypt, plaintext).map_err(|_| ProtocolError::DecodeFailed)
	}

	/// RSA-decrypt `ciphertext` with this key's private half.
	pub fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>> {
		let private = self.private.as_ref().ok_or(ProtocolError::InvalidKeySize)?;
		private.decrypt(Pkcs1v15Encrypt, ciphertext).map_err(|_| ProtocolError::DecodeFailed)
	}
}

/// A 256-bit AES key, zeroized on drop.
#[derive(Clone, Zeroize)]
#[zeroize(drop)]
pub struct AesKey(pub [u8; AES_KEY_BYTES]);

impl AesKey {
	pub fn generate() -> Self {
		let mut key = [0u8; AES_KEY_BYTES];
		OsRng.fill_bytes(&mut key);
		Self(key)
	}
}

/// A fixed-size opaque HMAC key, zeroized on drop.
#[derive(Clone, Zeroize)]
#[zeroize(drop)]
pub struct HmacKey(pub [u8; HMAC_KEY_BYTES]);

impl HmacKey {
	pub fn generate() -> Self {
		let mut key = [0u8; HMAC_KEY_BYTES];
		OsRng.fill_bytes(&mut key);
		Self(key)
	}

	/// Authenticate `data` under this key, returning a 32-byte tag.
	pub fn tag(&self, data: &[u8]) -> [u8; 32] {
		let mut mac = HmacSha256::new_from_slice(&self.0).expect("HMAC accepts any key length");
		mac.update(data);
		mac.finalize().into_bytes().into()
	}
}

/// Generate a random 16-byte AES-CBC initialization vector.
pub fn generate_iv() -> [u8; AES_IV_BYTES] {
	let mut iv = [0u8; AES_IV_BYTES];
	OsRng.fill_bytes(&mut iv);
	iv
}

/// Generate `N` cryptographically secure random bytes (nonces, challenges, salts).
pub fn random_bytes<const N: usize>() -> [u8; N] {
	let mut out = [0u8; N];
	OsRng.fill_bytes(&mut out);
	out
}

/// AES-256-CBC encrypt `plaintext` under `key`/`iv` with PKCS#7 padding.
pub fn aes_encrypt(key: &AesKey, iv: &[u8; AES_IV_BYTES], plaintext: &[u8]) -> Vec<u8> {
	let mut buf = vec![0u8; plaintext.len() + AES_IV_BYTES];
	buf[..plaintext.len()].copy_from_slice(plaintext);
	let enc = Aes256CbcEnc::new(&key.0.into(), iv.into());
	let ct = enc.encrypt_padded_mut::<Pkcs7>(&mut buf, plaintext.len()).expect("destination buffer sized for padding");
	ct.to_vec()
}

/// AES-256-CBC decrypt `ciphertext` under `key`/`iv`, removing PKCS#7 padding.
pub fn aes_decrypt(key: &AesKey, iv: &[u8; AES_IV_BYTES], ciphertext: &[u8]) -> Result<Vec<u8>> {
	let mut buf = ciphertext.to_vec();
	let dec = Aes256CbcDec::new(&key.0.into(), iv.into());
	dec.decrypt_padded_mut::<Pkcs7>(&mut buf).map(|pt| pt.to_vec()).map_err(|_| ProtocolError::DecodeFailed)
}

/// SHA-256 hash of `data`.
pub fn sha256(data: &[u8]) -> [u8; 32] {
	let mut hasher = Sha256::new();
	hasher.update(data);
	hasher.finalize().into()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn aes_round_trips() {
		let key = AesKey::generate();
		let iv = generate_iv();
		let plaintext = b"a connect payload of arbitrary length";
		let ciphertext = aes_encrypt(&key, &iv, plaintext);
		let recovered = aes_decrypt(&key, &iv, &ciphertext).unwrap();
		assert_eq!(recovered, plaintext);
	}

	#[test]
	fn rsa_round_trips_and_reports_correct_size() {
		let pair = RsaKeyPair::generate().unwrap();
		pair.validate(true).unwrap();
		assert_eq!(pair.public_key().size(), RSA_KEY_BYTES);

		let plaintext = b"signature payload";
		let ciphertext = pair.encrypt(plaintext).unwrap();
		assert_eq!(ciphertext.len(), RSA_KEY_BYTES);
		assert_eq!(pair.decrypt(&ciphertext).unwrap(), plaintext);
	}

	#[test]
	fn public_key_pem_round_trips() {
		let pair = RsaKeyPair::generate().unwrap();
		let pem = pair.public_to_pem().unwrap();
		let parsed = RsaKeyPair::public_from_pem(&pem).unwrap();
		assert_eq!(parsed.size(), RSA_KEY_BYTES);
	}
}
