//! Self-encrypted state synchronization.
//!
//! Each user owns one opaque blob (settings, contact nicknames, named
//! places) encrypted to their own identity and stored server-side under a
//! version number. Writes use optimistic concurrency:
//!
//! ```text
//! client reads {version: 3}
//! client writes {version: 3, blob}  ──► stored version 3? ──yes──► version 4
//!                                                        └─no───► conflict {currentVersion}
//! ```
//!
//! On conflict the client re-reads, merges, and writes again. Nothing in
//! this crate retries on its own.

pub mod types;

use serde::de::DeserializeOwned;
use serde::Serialize;
use zeroize::Zeroizing;

use crate::crypto::{decrypt_self_b64, encrypt_self_b64, CryptoError, Identity, Result};

pub use types::{
    ConflictResponse, ErrorBody, UserDataSnapshot, UserDataWrite, VERSION_CONFLICT_CODE,
    VERSION_CONFLICT_MESSAGE,
};

/// Serializes `state` to JSON and encrypts it to `identity`.
///
/// # Errors
///
/// Returns [`CryptoError::Encryption`] if serialization or sealing fails.
pub fn seal_state<T: Serialize>(state: &T, identity: &Identity) -> Result<String> {
    let json = Zeroizing::new(
        serde_json::to_vec(state)
            .map_err(|e| CryptoError::Encryption(format!("failed to serialize state: {e}")))?,
    );
    encrypt_self_b64(&json, identity)
}

/// Decrypts a blob produced by [`seal_state`].
///
/// # Errors
///
/// Returns [`CryptoError::DecryptionFailed`] for a foreign or damaged blob,
/// or [`CryptoError::InvalidPayload`] if it decrypts but does not parse
/// as `T`.
pub fn open_state<T: DeserializeOwned>(blob: &str, identity: &Identity) -> Result<T> {
    let json = decrypt_self_b64(blob, identity)?;
    serde_json::from_slice(&json)
        .map_err(|e| CryptoError::InvalidPayload(format!("state does not parse: {e}")))
}
