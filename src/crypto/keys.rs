//! Public key encoding and random byte generation.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;

use super::error::{CryptoError, Result};

/// Length of an X25519 public or private key in bytes.
pub const KEY_LEN: usize = 32;

/// An X25519 public key as registered with the server and exchanged
/// between contacts.
///
/// Construction from untrusted input always validates the length, so a
/// `PublicKey` value is guaranteed to be exactly [`KEY_LEN`] bytes.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PublicKey([u8; KEY_LEN]);

impl PublicKey {
    /// Wraps raw public key bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// Parses a public key from a byte slice.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidKeyMaterial`] if the slice is not 32 bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let bytes: [u8; KEY_LEN] = bytes.try_into().map_err(|_| {
            CryptoError::InvalidKeyMaterial(format!(
                "expected {KEY_LEN} bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self(bytes))
    }

    /// Parses a standard-base64 encoded public key.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidKeyMaterial`] if the string is not valid
    /// base64 or does not decode to 32 bytes.
    ///
    /// # Example
    ///
    /// ```
    /// use whereish_core::crypto::PublicKey;
    ///
    /// let key = PublicKey::from_bytes([7u8; 32]);
    /// let parsed = PublicKey::from_base64(&key.to_base64()).unwrap();
    /// assert_eq!(key, parsed);
    /// assert!(PublicKey::from_base64("too-short").is_err());
    /// ```
    pub fn from_base64(encoded: &str) -> Result<Self> {
        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|e| CryptoError::InvalidKeyMaterial(format!("invalid base64: {e}")))?;
        Self::from_slice(&bytes)
    }

    /// Returns the standard-base64 encoding used on the wire.
    #[must_use]
    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.0)
    }

    /// Returns the raw key bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }

    /// Returns the key as lowercase hex, for logs and diagnostics.
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl std::fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("PublicKey").field(&self.to_hex()).finish()
    }
}

impl From<[u8; KEY_LEN]> for PublicKey {
    fn from(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }
}

/// Fills a fixed-size array from the operating system CSPRNG.
///
/// # Errors
///
/// Returns [`CryptoError::Rng`] if the generator is unavailable.
pub(crate) fn random_array<const N: usize>() -> Result<[u8; N]> {
    let mut out = [0u8; N];
    OsRng
        .try_fill_bytes(&mut out)
        .map_err(|e| CryptoError::Rng(e.to_string()))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_slice_accepts_32_bytes() {
        let key = PublicKey::from_slice(&[1u8; 32]).unwrap();
        assert_eq!(key.as_bytes(), &[1u8; 32]);
    }

    #[test]
    fn from_slice_rejects_wrong_length() {
        assert!(matches!(
            PublicKey::from_slice(&[1u8; 31]),
            Err(CryptoError::InvalidKeyMaterial(_))
        ));
        assert!(matches!(
            PublicKey::from_slice(&[1u8; 33]),
            Err(CryptoError::InvalidKeyMaterial(_))
        ));
        assert!(PublicKey::from_slice(&[]).is_err());
    }

    #[test]
    fn base64_roundtrip() {
        let key = PublicKey::from_bytes([0xAB; 32]);
        let encoded = key.to_base64();
        assert_eq!(PublicKey::from_base64(&encoded).unwrap(), key);
    }

    #[test]
    fn from_base64_rejects_garbage() {
        assert!(matches!(
            PublicKey::from_base64("not base64!!!"),
            Err(CryptoError::InvalidKeyMaterial(_))
        ));
    }

    #[test]
    fn from_base64_rejects_short_key() {
        let short = STANDARD.encode([1u8; 16]);
        assert!(matches!(
            PublicKey::from_base64(&short),
            Err(CryptoError::InvalidKeyMaterial(_))
        ));
    }

    #[test]
    fn debug_shows_hex() {
        let key = PublicKey::from_bytes([0x01; 32]);
        let debug = format!("{key:?}");
        assert!(debug.contains(&"01".repeat(32)));
    }

    #[test]
    fn random_array_is_not_constant() {
        let a: [u8; 32] = random_array().unwrap();
        let b: [u8; 32] = random_array().unwrap();
        assert_ne!(a, b);
    }
}
