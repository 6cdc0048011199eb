//! Cursor encoding strategies for cursor-based pagination

use base64::{Engine as _, engine::general_purpose};
use hmac::{Hmac, Mac};
use prism_exception::{Error, Result};
use sha2::Sha256;
use std::time::{SystemTime, UNIX_EPOCH};

type HmacSha256 = Hmac<Sha256>;

/// Default lifetime of an encoded cursor: 24 hours
pub const DEFAULT_EXPIRY_SECONDS: u64 = 86400;

/// Trait for encoding and decoding pagination cursors
///
/// Implementations turn an offset into an opaque token and back, for
/// instance by signing, encrypting or compressing it.
///
/// # Examples
///
/// ```
/// use prism_pagination::{Base64CursorEncoder, CursorEncoder};
///
/// let encoder = Base64CursorEncoder::new();
/// let cursor = encoder.encode(42).unwrap();
/// assert_eq!(encoder.decode(&cursor).unwrap(), 42);
/// ```
pub trait CursorEncoder: Send + Sync {
	/// Encode a position into a cursor string
	fn encode(&self, position: usize) -> Result<String>;

	/// Decode a cursor string back to a position
	fn decode(&self, cursor: &str) -> Result<usize>;
}

/// Base64 cursor encoder with timestamp and HMAC-SHA256 integrity validation
///
/// Cursors are `base64(position:timestamp:hmac)`, so a client can neither
/// forge a position nor reuse a cursor past its expiry.
#[derive(Clone)]
pub struct Base64CursorEncoder {
	/// Cursor lifetime in seconds
	pub expiry_seconds: u64,
	secret_key: Vec<u8>,
}

impl Base64CursorEncoder {
	/// Create an encoder with the default expiry and a random secret key
	///
	/// Cursors issued by one such encoder cannot be decoded by another; use
	/// [`Base64CursorEncoder::with_secret_key`] when several processes must
	/// share cursors.
	pub fn new() -> Self {
		use rand::RngCore;
		let mut key = vec![0u8; 32];
		rand::rng().fill_bytes(&mut key);
		Self::with_secret_key(&key)
	}

	/// Create an encoder with a specific secret key
	///
	/// The key should be at least 32 bytes.
	///
	/// # Examples
	///
	/// ```
	/// use prism_pagination::Base64CursorEncoder;
	///
	/// let encoder = Base64CursorEncoder::with_secret_key(b"my-secret-key-at-least-32-bytes!");
	/// assert_eq!(encoder.expiry_seconds, 86400);
	/// ```
	pub fn with_secret_key(key: &[u8]) -> Self {
		Self {
			expiry_seconds: DEFAULT_EXPIRY_SECONDS,
			secret_key: key.to_vec(),
		}
	}

	/// Set custom expiry time in seconds
	pub fn expiry_seconds(mut self, seconds: u64) -> Self {
		self.expiry_seconds = seconds;
		self
	}

	fn mac(&self, position: usize, timestamp: u64) -> Result<HmacSha256> {
		let mut mac = HmacSha256::new_from_slice(&self.secret_key)
			.map_err(|error| Error::Config(format!("Invalid cursor signing key: {}", error)))?;
		mac.update(format!("{}:{}", position, timestamp).as_bytes());
		Ok(mac)
	}

	fn encode_at(&self, position: usize, timestamp: u64) -> Result<String> {
		let signature = hex::encode(self.mac(position, timestamp)?.finalize().into_bytes());
		let cursor_data = format!("{}:{}:{}", position, timestamp, signature);
		Ok(general_purpose::URL_SAFE_NO_PAD.encode(cursor_data.as_bytes()))
	}
}

impl Default for Base64CursorEncoder {
	fn default() -> Self {
		Self::new()
	}
}

impl std::fmt::Debug for Base64CursorEncoder {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Base64CursorEncoder")
			.field("expiry_seconds", &self.expiry_seconds)
			.finish_non_exhaustive()
	}
}

impl CursorEncoder for Base64CursorEncoder {
	fn encode(&self, position: usize) -> Result<String> {
		self.encode_at(position, now()?)
	}

	fn decode(&self, cursor: &str) -> Result<usize> {
		let decoded = general_purpose::URL_SAFE_NO_PAD
			.decode(cursor)
			.map_err(|_| Error::InvalidPage("Invalid cursor".to_string()))?;
		let cursor_data = String::from_utf8(decoded)
			.map_err(|_| Error::InvalidPage("Invalid cursor encoding".to_string()))?;

		let mut parts = cursor_data.splitn(3, ':');
		let (Some(position), Some(timestamp), Some(signature)) =
			(parts.next(), parts.next(), parts.next())
		else {
			return Err(Error::InvalidPage("Malformed cursor".to_string()));
		};

		let position: usize = position
			.parse()
			.map_err(|_| Error::InvalidPage("Invalid cursor value".to_string()))?;
		let timestamp: u64 = timestamp
			.parse()
			.map_err(|_| Error::InvalidPage("Invalid cursor timestamp".to_string()))?;
		let signature = hex::decode(signature)
			.map_err(|_| Error::InvalidPage("Invalid cursor signature".to_string()))?;

		self.mac(position, timestamp)?
			.verify_slice(&signature)
			.map_err(|_| Error::InvalidPage("Cursor integrity check failed".to_string()))?;

		// Clock skew can put the timestamp in the future.
		if now()?.saturating_sub(timestamp) > self.expiry_seconds {
			return Err(Error::InvalidPage("Cursor expired".to_string()));
		}

		Ok(position)
	}
}

fn now() -> Result<u64> {
	SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.map(|elapsed| elapsed.as_secs())
		.map_err(|error| Error::InvalidPage(format!("System clock is before the epoch: {}", error)))
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	const KEY: &[u8] = b"test-secret-key-for-unit-tests!!";

	fn invalid_page_message(result: Result<usize>) -> String {
		match result {
			Err(Error::InvalidPage(msg)) => msg,
			other => panic!("Expected InvalidPage, got {:?}", other),
		}
	}

	#[rstest]
	#[case(0)]
	#[case(42)]
	#[case(usize::MAX / 2)]
	fn test_encode_decode(#[case] position: usize) {
		// Arrange
		let encoder = Base64CursorEncoder::with_secret_key(KEY);

		// Act
		let cursor = encoder.encode(position).unwrap();

		// Assert
		assert_eq!(encoder.decode(&cursor).unwrap(), position);
	}

	#[rstest]
	#[case::not_base64("not-valid-base64!!!", "Invalid cursor")]
	#[case::missing_parts("MTIz", "Malformed cursor")]
	fn test_rejects_garbage(#[case] cursor: &str, #[case] expected: &str) {
		let encoder = Base64CursorEncoder::with_secret_key(KEY);

		let message = invalid_page_message(encoder.decode(cursor));

		assert_eq!(message, expected);
	}

	#[rstest]
	fn test_rejects_forged_position() {
		// Arrange
		let encoder = Base64CursorEncoder::with_secret_key(KEY);
		let cursor = encoder.encode(42).unwrap();
		let decoded = String::from_utf8(general_purpose::URL_SAFE_NO_PAD.decode(&cursor).unwrap()).unwrap();
		let forged = general_purpose::URL_SAFE_NO_PAD.encode(decoded.replacen("42", "43", 1));

		// Act
		let message = invalid_page_message(encoder.decode(&forged));

		// Assert
		assert_eq!(message, "Cursor integrity check failed");
	}

	#[rstest]
	fn test_different_key_rejects_cursor() {
		// Arrange
		let encoder_a = Base64CursorEncoder::with_secret_key(b"secret-key-a-for-testing-only!!");
		let encoder_b = Base64CursorEncoder::with_secret_key(b"secret-key-b-for-testing-only!!");

		// Act
		let cursor = encoder_a.encode(42).unwrap();

		// Assert
		assert_eq!(
			invalid_page_message(encoder_b.decode(&cursor)),
			"Cursor integrity check failed"
		);
	}

	#[rstest]
	fn test_expired_cursor() {
		// Arrange
		let encoder = Base64CursorEncoder::with_secret_key(KEY).expiry_seconds(60);
		let issued = now().unwrap() - 61;
		let cursor = encoder.encode_at(7, issued).unwrap();

		// Act & Assert
		assert_eq!(invalid_page_message(encoder.decode(&cursor)), "Cursor expired");
	}

	#[rstest]
	fn test_future_timestamp_is_not_expired() {
		// Arrange
		let encoder = Base64CursorEncoder::with_secret_key(KEY);
		let cursor = encoder.encode_at(42, now().unwrap() + 3600).unwrap();

		// Act & Assert
		assert_eq!(encoder.decode(&cursor).unwrap(), 42);
	}

	#[rstest]
	fn test_debug_hides_secret_key() {
		let encoder = Base64CursorEncoder::with_secret_key(KEY);

		let debug = format!("{:?}", encoder);

		assert!(!debug.contains("test-secret-key"));
		assert!(debug.contains("expiry_seconds"));
	}
}
