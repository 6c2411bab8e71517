use std::io;

/// A flat, non-nested error taxonomy for every fallible core operation.
///
/// Mirrors the teacher's "side-effecting value, never thrown" convention
/// ([`utils::error::Result`]) but carries the data the richer failure taxonomy of this
/// protocol needs to log or to pick an ack status — never a chain of wrapped causes.
#[derive(Debug)]
pub enum ProtocolError {
	InvalidKeySize,
	KeyParse,
	BufferTooSmall { required: usize },
	CrcMismatch,
	AuthenticationFailed,
	ReplayDetected,
	DecodeFailed,
	StateViolation,
	PoolExhausted,
	SocketError(io::Error),
}

impl std::fmt::Display for ProtocolError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::InvalidKeySize => write!(f, "key is the wrong size for this operation"),
			Self::KeyParse => write!(f, "key failed to parse"),
			Self::BufferTooSmall { required } => write!(f, "destination buffer too small, need at least {required} bytes"),
			Self::CrcMismatch => write!(f, "CRC32 did not match the datagram contents"),
			Self::AuthenticationFailed => write!(f, "signature hash did not match"),
			Self::ReplayDetected => write!(f, "nonce did not match the expected value"),
			Self::DecodeFailed => write!(f, "RSA or AES decode failed"),
			Self::StateViolation => write!(f, "operation not valid in the current session state"),
			Self::PoolExhausted => write!(f, "packet pool exhausted its configured chunks"),
			Self::SocketError(err) => write!(f, "socket error: {err}"),
		}
	}
}

impl std::error::Error for ProtocolError {}

impl From<io::Error> for ProtocolError {
	fn from(err: io::Error) -> Self {
		Self::SocketError(err)
	}
}

pub type Result<T> = std::result::Result<T, ProtocolError>;
