//! Error type for store, contact, and facade operations.
//!
//! Missing and unauthorized resources are both reported as
//! [`Error::NotFound`], so callers cannot probe for the existence of other
//! users' requests or contacts.

use thiserror::Error;

use crate::crypto::CryptoError;

/// Error type for whereish-core operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Authentication failed (wrong PIN or key, corrupted or tampered data).
    #[error("Decryption failed")]
    DecryptionFailed,

    /// A backup authenticated but its contents are invalid.
    #[error("Malformed backup: {0}")]
    MalformedBackup(String),

    /// A public key has a bad encoding or length.
    #[error("Invalid key material: {0}")]
    InvalidKeyMaterial(String),

    /// The stored version moved on since the client last read it.
    #[error("Version conflict: current version is {current_version}")]
    VersionConflict {
        /// Version the client must rebase onto (0 if no row exists).
        current_version: i64,
    },

    /// A pending request already exists between the two users.
    #[error("Contact request already pending")]
    DuplicateRequest,

    /// The two users are already mutual contacts.
    #[error("Already contacts")]
    AlreadyContacts,

    /// Resource missing, or not visible to the acting user.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The request is structurally invalid.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// A unique resource already exists.
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// The payload exceeds a configured size limit.
    #[error("Payload too large: {size} bytes (limit {limit})")]
    PayloadTooLarge {
        /// Actual size in bytes.
        size: usize,
        /// Configured limit in bytes.
        limit: usize,
    },

    /// Any other crypto failure.
    #[error("Crypto error: {0}")]
    Crypto(CryptoError),

    /// Database error from `SQLite`.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Storage operation failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Stored data could not be decoded.
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// Result type alias for whereish-core operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Returns true if the caller may retry after refreshing its state.
    ///
    /// Only version conflicts qualify; crypto and persistence errors are
    /// terminal for the attempt.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::VersionConflict { .. })
    }

    /// Stable machine-readable code for API responses.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::DecryptionFailed => "decryption_failed",
            Self::MalformedBackup(_) => "malformed_backup",
            Self::InvalidKeyMaterial(_) => "invalid_public_key",
            Self::VersionConflict { .. } => "version_conflict",
            Self::DuplicateRequest => "duplicate_request",
            Self::AlreadyContacts => "already_contacts",
            Self::NotFound(_) => "not_found",
            Self::InvalidRequest(_) => "invalid_request",
            Self::AlreadyExists(_) => "already_exists",
            Self::PayloadTooLarge { .. } => "payload_too_large",
            Self::Crypto(_) => "crypto_error",
            Self::Database(_) | Self::Storage(_) | Self::InvalidData(_) => "internal_error",
        }
    }
}

impl From<CryptoError> for Error {
    fn from(err: CryptoError) -> Self {
        match err {
            CryptoError::DecryptionFailed => Self::DecryptionFailed,
            CryptoError::MalformedBackup(msg) => Self::MalformedBackup(msg),
            CryptoError::InvalidKeyMaterial(msg) => Self::InvalidKeyMaterial(msg),
            other => Self::Crypto(other),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidData(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_conflict_display() {
        let err = Error::VersionConflict { current_version: 4 };
        assert_eq!(err.to_string(), "Version conflict: current version is 4");
    }

    #[test]
    fn not_found_display() {
        let err = Error::NotFound("contact request".to_string());
        assert_eq!(err.to_string(), "Not found: contact request");
    }

    #[test]
    fn payload_too_large_display() {
        let err = Error::PayloadTooLarge {
            size: 20_000,
            limit: 10_240,
        };
        assert_eq!(
            err.to_string(),
            "Payload too large: 20000 bytes (limit 10240)"
        );
    }

    #[test]
    fn storage_error_display() {
        let err = Error::Storage("lock poisoned".to_string());
        assert_eq!(err.to_string(), "Storage error: lock poisoned");
    }

    #[test]
    fn only_version_conflict_is_retryable() {
        assert!(Error::VersionConflict { current_version: 1 }.is_retryable());
        assert!(!Error::DecryptionFailed.is_retryable());
        assert!(!Error::DuplicateRequest.is_retryable());
        assert!(!Error::NotFound(String::new()).is_retryable());
        assert!(!Error::Storage(String::new()).is_retryable());
    }

    #[test]
    fn crypto_errors_keep_their_category() {
        assert!(matches!(
            Error::from(CryptoError::DecryptionFailed),
            Error::DecryptionFailed
        ));
        assert!(matches!(
            Error::from(CryptoError::MalformedBackup("x".into())),
            Error::MalformedBackup(_)
        ));
        assert!(matches!(
            Error::from(CryptoError::InvalidKeyMaterial("x".into())),
            Error::InvalidKeyMaterial(_)
        ));
        assert!(matches!(
            Error::from(CryptoError::Rng("x".into())),
            Error::Crypto(CryptoError::Rng(_))
        ));
    }

    #[test]
    fn codes_are_stable() {
        assert_eq!(
            Error::VersionConflict { current_version: 0 }.code(),
            "version_conflict"
        );
        assert_eq!(Error::AlreadyContacts.code(), "already_contacts");
        assert_eq!(Error::Storage(String::new()).code(), "internal_error");
    }
}
