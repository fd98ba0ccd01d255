//! Per-recipient location encryption.
//!
//! A sender seals one copy of its [`LocationData`] for every contact, using
//! the contact's public key and its own private key. Because the box is
//! keyed by the sender's long-term key, a successful open also proves who
//! sent the location.

use crate::crypto::sealed::{self, decode_blob, encode_blob};
use crate::crypto::{CryptoError, Identity, PublicKey, Result};

use super::types::LocationData;

/// Encrypts a location for one recipient.
///
/// Returns `nonce || ciphertext` as raw bytes.
///
/// # Errors
///
/// Returns [`CryptoError::Encryption`] if serialization or sealing fails,
/// or [`CryptoError::Rng`] if no nonce can be drawn.
pub fn encrypt_location(
    location: &LocationData,
    sender: &Identity,
    recipient: &PublicKey,
) -> Result<Vec<u8>> {
    let plaintext = location
        .to_json()
        .map_err(|e| CryptoError::Encryption(format!("failed to serialize location: {e}")))?;
    sealed::seal(plaintext.as_bytes(), sender, recipient)
}

/// Decrypts a location sealed for `recipient` by `sender`.
///
/// # Errors
///
/// - [`CryptoError::DecryptionFailed`] if the blob is truncated, corrupted,
///   or sealed under different keys
/// - [`CryptoError::InvalidPayload`] if it authenticates but is not a
///   location record
pub fn decrypt_location(
    blob: &[u8],
    recipient: &Identity,
    sender: &PublicKey,
) -> Result<LocationData> {
    let plaintext = sealed::open(blob, recipient, sender)?;
    serde_json::from_slice(&plaintext)
        .map_err(|e| CryptoError::InvalidPayload(format!("not a location record: {e}")))
}

/// [`encrypt_location`] with a base64 recipient key, returning the base64
/// wire form.
///
/// # Errors
///
/// Returns [`CryptoError::InvalidKeyMaterial`] for a bad recipient key, or
/// any error from [`encrypt_location`].
pub fn encrypt_location_b64(
    location: &LocationData,
    sender: &Identity,
    recipient_public_key: &str,
) -> Result<String> {
    let recipient = PublicKey::from_base64(recipient_public_key)?;
    encrypt_location(location, sender, &recipient).map(|blob| encode_blob(&blob))
}

/// [`decrypt_location`] taking base64 for both the blob and the sender key.
///
/// # Errors
///
/// Returns [`CryptoError::InvalidKeyMaterial`] for a bad sender key,
/// otherwise as [`decrypt_location`].
pub fn decrypt_location_b64(
    encoded: &str,
    recipient: &Identity,
    sender_public_key: &str,
) -> Result<LocationData> {
    let sender = PublicKey::from_base64(sender_public_key)?;
    decrypt_location(&decode_blob(encoded)?, recipient, &sender)
}
