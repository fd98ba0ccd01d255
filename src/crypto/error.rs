//! Error types for cryptographic operations.
//!
//! Authentication failures are deliberately collapsed into a single
//! [`CryptoError::DecryptionFailed`] variant: a wrong PIN, a corrupted salt
//! or nonce, and a tampered ciphertext all look identical to the caller.

use thiserror::Error;

/// Errors that can occur during identity, location, or self-sync crypto.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// Authentication failed (wrong key or PIN, corrupted or tampered data).
    #[error("Decryption failed: invalid PIN or corrupted data")]
    DecryptionFailed,

    /// The backup authenticated but its contents are structurally invalid.
    #[error("Malformed backup: {0}")]
    MalformedBackup(String),

    /// A peer-supplied public key has a bad encoding or length.
    #[error("Invalid key material: {0}")]
    InvalidKeyMaterial(String),

    /// The backup names parameters this library cannot honor.
    #[error("Unsupported backup: {0}")]
    UnsupportedBackup(String),

    /// The payload authenticated but could not be decoded.
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// The operating system random number generator is unavailable.
    #[error("Random number generator unavailable: {0}")]
    Rng(String),

    /// Encryption failed.
    #[error("Encryption failed: {0}")]
    Encryption(String),
}

/// Result type for crypto operations.
pub type Result<T> = std::result::Result<T, CryptoError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decryption_failed_display_is_generic() {
        let err = CryptoError::DecryptionFailed;
        assert_eq!(
            err.to_string(),
            "Decryption failed: invalid PIN or corrupted data"
        );
    }

    #[test]
    fn malformed_backup_display() {
        let err = CryptoError::MalformedBackup("private key length 31".to_string());
        assert_eq!(err.to_string(), "Malformed backup: private key length 31");
    }

    #[test]
    fn invalid_key_material_display() {
        let err = CryptoError::InvalidKeyMaterial("expected 32 bytes".to_string());
        assert_eq!(err.to_string(), "Invalid key material: expected 32 bytes");
    }

    #[test]
    fn unsupported_backup_display() {
        let err = CryptoError::UnsupportedBackup("algorithm ROT13".to_string());
        assert_eq!(err.to_string(), "Unsupported backup: algorithm ROT13");
    }

    #[test]
    fn rng_display() {
        let err = CryptoError::Rng("getrandom failed".to_string());
        assert_eq!(
            err.to_string(),
            "Random number generator unavailable: getrandom failed"
        );
    }
}
