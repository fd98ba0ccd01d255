//! Stored records other than contacts.

use serde::{Deserialize, Serialize};

/// A registered user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// User identifier (UUID v4).
    pub id: String,
    /// Lower-cased email address; unique.
    pub email: String,
    /// Display name.
    pub name: String,
    /// Base64 X25519 public key, once registered.
    pub public_key: Option<String>,
    /// When the user was created (Unix timestamp).
    pub created_at: i64,
}

/// The version-guarded, self-encrypted state blob of one user.
///
/// Opaque to the server: only the owner's identity can decrypt `blob`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserData {
    /// Monotonic version, starting at 1.
    pub version: i64,
    /// When the current version was written (Unix timestamp).
    pub updated_at: i64,
    /// Base64 `nonce || ciphertext`.
    pub blob: String,
}

/// A location blob sealed by one user for one contact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptedLocation {
    /// Sender.
    pub from_user_id: String,
    /// Recipient.
    pub to_user_id: String,
    /// Base64 `nonce || ciphertext`.
    pub blob: String,
    /// When the blob was last replaced (Unix timestamp).
    pub updated_at: i64,
}

/// One entry of a share batch: a blob for one recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationShare {
    /// Recipient.
    pub to_user_id: String,
    /// Base64 `nonce || ciphertext`.
    pub blob: String,
}

impl LocationShare {
    /// Creates a share entry.
    #[must_use]
    pub fn new(to_user_id: impl Into<String>, blob: impl Into<String>) -> Self {
        Self {
            to_user_id: to_user_id.into(),
            blob: blob.into(),
        }
    }
}

/// Normalizes an email for storage and lookup.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
