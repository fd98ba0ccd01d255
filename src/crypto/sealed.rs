//! NaCl box sealing for location payloads and self-sync blobs.
//!
//! Both use the same construction: X25519 key agreement between a sender
//! private key and a recipient public key, then XSalsa20-Poly1305 under a
//! fresh 24-byte nonce. The nonce is prepended to the ciphertext:
//!
//! ```text
//! nonce (24 bytes) || ciphertext || tag (16 bytes)
//! ```
//!
//! On the wire the whole blob is a single standard-base64 string.
//!
//! Self-sync is the degenerate case where sender and recipient are the same
//! identity, so only the holder of the private key can open the blob.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use crypto_box::aead::Aead;
use crypto_box::SalsaBox;
use zeroize::Zeroizing;

use super::error::{CryptoError, Result};
use super::identity::Identity;
use super::keys::{random_array, PublicKey};

/// Nonce length for XSalsa20-Poly1305.
pub const NONCE_LEN: usize = 24;

/// Poly1305 tag length.
pub const TAG_LEN: usize = 16;

/// Shortest blob that can possibly authenticate (empty plaintext).
pub const MIN_SEALED_LEN: usize = NONCE_LEN + TAG_LEN;

fn salsa_box(peer: &PublicKey, own: &Identity) -> SalsaBox {
    let peer = crypto_box::PublicKey::from(*peer.as_bytes());
    SalsaBox::new(&peer, &own.secret_key())
}

/// Seals `plaintext` from `sender` to `recipient`.
///
/// # Errors
///
/// Returns [`CryptoError::Rng`] if no nonce can be drawn or
/// [`CryptoError::Encryption`] if sealing fails.
pub fn seal(plaintext: &[u8], sender: &Identity, recipient: &PublicKey) -> Result<Vec<u8>> {
    let nonce: [u8; NONCE_LEN] = random_array()?;
    let ciphertext = salsa_box(recipient, sender)
        .encrypt(crypto_box::Nonce::from_slice(&nonce), plaintext)
        .map_err(|e| CryptoError::Encryption(format!("box seal failed: {e}")))?;

    let mut blob = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    blob.extend_from_slice(&nonce);
    blob.extend_from_slice(&ciphertext);
    Ok(blob)
}

/// Opens a blob sealed by `sender` for `recipient`.
///
/// The returned plaintext is wrapped in [`Zeroizing`].
///
/// # Errors
///
/// Returns [`CryptoError::DecryptionFailed`] if the blob is shorter than
/// [`MIN_SEALED_LEN`], was sealed for other keys, or has been modified.
pub fn open(blob: &[u8], recipient: &Identity, sender: &PublicKey) -> Result<Zeroizing<Vec<u8>>> {
    if blob.len() < MIN_SEALED_LEN {
        return Err(CryptoError::DecryptionFailed);
    }
    let (nonce, ciphertext) = blob.split_at(NONCE_LEN);
    salsa_box(sender, recipient)
        .decrypt(crypto_box::Nonce::from_slice(nonce), ciphertext)
        .map(Zeroizing::new)
        .map_err(|_| CryptoError::DecryptionFailed)
}

/// Encrypts data that only `identity` itself can decrypt.
///
/// # Errors
///
/// See [`seal`].
pub fn encrypt_self(data: &[u8], identity: &Identity) -> Result<Vec<u8>> {
    seal(data, identity, &identity.public_key())
}

/// Decrypts data produced by [`encrypt_self`] with the same identity.
///
/// # Errors
///
/// See [`open`].
pub fn decrypt_self(blob: &[u8], identity: &Identity) -> Result<Zeroizing<Vec<u8>>> {
    open(blob, identity, &identity.public_key())
}

/// [`encrypt_self`] returning the base64 wire form.
///
/// # Errors
///
/// See [`seal`].
pub fn encrypt_self_b64(data: &[u8], identity: &Identity) -> Result<String> {
    encrypt_self(data, identity).map(|blob| encode_blob(&blob))
}

/// [`decrypt_self`] taking the base64 wire form.
///
/// # Errors
///
/// Returns [`CryptoError::DecryptionFailed`] for invalid base64 as well as
/// for every failure of [`open`].
pub fn decrypt_self_b64(encoded: &str, identity: &Identity) -> Result<Zeroizing<Vec<u8>>> {
    decrypt_self(&decode_blob(encoded)?, identity)
}

/// Encodes a sealed blob for the wire.
#[must_use]
pub fn encode_blob(blob: &[u8]) -> String {
    STANDARD.encode(blob)
}

/// Decodes a wire blob. Corrupt encodings are indistinguishable from
/// corrupt ciphertext.
///
/// # Errors
///
/// Returns [`CryptoError::DecryptionFailed`] if the string is not base64.
pub fn decode_blob(encoded: &str) -> Result<Vec<u8>> {
    STANDARD
        .decode(encoded.trim())
        .map_err(|_| CryptoError::DecryptionFailed)
}

/// Returns whether `encoded` is base64 of a plausibly sealed blob.
///
/// Used server-side to reject garbage without holding any keys.
#[must_use]
pub fn is_well_formed_blob(encoded: &str) -> bool {
    decode_blob(encoded).is_ok_and(|blob| blob.len() >= MIN_SEALED_LEN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seal_open_roundtrip() {
        let alice = Identity::generate().unwrap();
        let bob = Identity::generate().unwrap();

        let blob = seal(b"hello bob", &alice, &bob.public_key()).unwrap();
        let opened = open(&blob, &bob, &alice.public_key()).unwrap();
        assert_eq!(opened.as_slice(), b"hello bob");
    }

    #[test]
    fn blob_layout() {
        let alice = Identity::generate().unwrap();
        let bob = Identity::generate().unwrap();
        let blob = seal(b"abc", &alice, &bob.public_key()).unwrap();
        assert_eq!(blob.len(), NONCE_LEN + 3 + TAG_LEN);
    }

    #[test]
    fn fresh_nonce_each_seal() {
        let alice = Identity::generate().unwrap();
        let bob = Identity::generate().unwrap();
        let a = seal(b"same", &alice, &bob.public_key()).unwrap();
        let b = seal(b"same", &alice, &bob.public_key()).unwrap();
        assert_ne!(a[..NONCE_LEN], b[..NONCE_LEN]);
    }

    #[test]
    fn third_party_cannot_open() {
        let alice = Identity::generate().unwrap();
        let bob = Identity::generate().unwrap();
        let eve = Identity::generate().unwrap();

        let blob = seal(b"secret", &alice, &bob.public_key()).unwrap();
        assert_eq!(
            open(&blob, &eve, &alice.public_key()),
            Err(CryptoError::DecryptionFailed)
        );
    }

    #[test]
    fn wrong_sender_key_fails() {
        let alice = Identity::generate().unwrap();
        let bob = Identity::generate().unwrap();
        let mallory = Identity::generate().unwrap();

        let blob = seal(b"secret", &alice, &bob.public_key()).unwrap();
        assert!(open(&blob, &bob, &mallory.public_key()).is_err());
    }

    #[test]
    fn single_bit_flips_are_rejected() {
        let alice = Identity::generate().unwrap();
        let bob = Identity::generate().unwrap();
        let blob = seal(b"tamper me", &alice, &bob.public_key()).unwrap();

        for i in 0..blob.len() {
            let mut tampered = blob.clone();
            tampered[i] ^= 0x80;
            assert_eq!(
                open(&tampered, &bob, &alice.public_key()),
                Err(CryptoError::DecryptionFailed),
                "flip at byte {i} was accepted"
            );
        }
    }

    #[test]
    fn short_blobs_are_rejected() {
        let bob = Identity::generate().unwrap();
        let alice = Identity::generate().unwrap();
        for len in [0, 1, NONCE_LEN, MIN_SEALED_LEN - 1] {
            assert_eq!(
                open(&vec![0u8; len], &bob, &alice.public_key()),
                Err(CryptoError::DecryptionFailed)
            );
        }
    }

    #[test]
    fn self_roundtrip() {
        let me = Identity::generate().unwrap();
        let blob = encrypt_self(br#"{"contacts":[]}"#, &me).unwrap();
        assert_eq!(decrypt_self(&blob, &me).unwrap().as_slice(), br#"{"contacts":[]}"#);
    }

    #[test]
    fn self_blob_not_readable_by_others() {
        let me = Identity::generate().unwrap();
        let other = Identity::generate().unwrap();
        let blob = encrypt_self(b"private", &me).unwrap();
        assert_eq!(decrypt_self(&blob, &other), Err(CryptoError::DecryptionFailed));
    }

    #[test]
    fn self_b64_roundtrip_and_bad_encoding() {
        let me = Identity::generate().unwrap();
        let encoded = encrypt_self_b64(b"state", &me).unwrap();
        assert_eq!(decrypt_self_b64(&encoded, &me).unwrap().as_slice(), b"state");
        assert_eq!(
            decrypt_self_b64("***", &me),
            Err(CryptoError::DecryptionFailed)
        );
    }

    #[test]
    fn well_formed_blob_check() {
        assert!(is_well_formed_blob(&encode_blob(&[0u8; MIN_SEALED_LEN])));
        assert!(!is_well_formed_blob(&encode_blob(&[0u8; MIN_SEALED_LEN - 1])));
        assert!(!is_well_formed_blob("not base64"));
    }
}
