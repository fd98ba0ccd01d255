//! PIN-protected identity backup.
//!
//! The backup wraps a serialized [`Identity`] with AES-256-GCM under a key
//! derived from the user's PIN with PBKDF2-HMAC-SHA256. Every parameter
//! needed to re-derive the key is recorded next to the ciphertext, so
//! backups written with older parameters stay decryptable.
//!
//! # Wire Format
//!
//! ```text
//! {
//!   "algorithm": "AES-256-GCM",
//!   "kdf": "PBKDF2-SHA256",
//!   "iterations": 100000,
//!   "salt": "<base64, 16 bytes>",
//!   "iv": "<base64, 12 bytes>",
//!   "payload": "<base64, ciphertext + 16-byte tag>"
//! }
//! ```
//!
//! # Failure Model
//!
//! Anything that can go wrong before the GCM tag is verified (wrong PIN,
//! corrupted salt, nonce, or payload) produces [`CryptoError::DecryptionFailed`].
//! Only defects found after authentication are reported as
//! [`CryptoError::MalformedBackup`].

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hmac::Hmac;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use super::error::{CryptoError, Result};
use super::identity::Identity;
use super::keys::{random_array, KEY_LEN};

/// AEAD algorithm label recorded in every backup.
pub const ALGORITHM_AES_256_GCM: &str = "AES-256-GCM";

/// KDF label recorded in every backup.
pub const KDF_PBKDF2_SHA256: &str = "PBKDF2-SHA256";

/// Default PBKDF2 iteration count for new backups.
pub const DEFAULT_ITERATIONS: u32 = 100_000;

/// Lowest iteration count accepted for new backups.
pub const MIN_ITERATIONS: u32 = 100_000;

/// Highest iteration count honored when decrypting.
///
/// Iteration counts come from stored records, so they are capped to keep a
/// hostile record from pinning a CPU for minutes.
pub const MAX_ITERATIONS: u32 = 10_000_000;

/// PBKDF2 salt length in bytes.
pub const SALT_LEN: usize = 16;

/// AES-GCM nonce length in bytes.
pub const IV_LEN: usize = 12;

/// Key derivation parameters for identity backups.
///
/// # Example
///
/// ```
/// use whereish_core::crypto::{BackupParams, DEFAULT_ITERATIONS};
///
/// let params = BackupParams::default();
/// assert_eq!(params.iterations(), DEFAULT_ITERATIONS);
/// assert!(params.legacy_iteration_fallback());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackupParams {
    iterations: u32,
    legacy_iteration_fallback: bool,
}

impl Default for BackupParams {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
            legacy_iteration_fallback: true,
        }
    }
}

impl BackupParams {
    /// Creates parameters with a custom iteration count.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::UnsupportedBackup`] if `iterations` is outside
    /// `MIN_ITERATIONS..=MAX_ITERATIONS`.
    pub fn new(iterations: u32) -> Result<Self> {
        let params = Self {
            iterations,
            ..Self::default()
        };
        params.validate()?;
        Ok(params)
    }

    /// Creates parameters with an arbitrarily low iteration count.
    ///
    /// # Warning
    ///
    /// Only for tests: a handful of PBKDF2 rounds offers no brute-force
    /// resistance at all.
    #[cfg(any(test, feature = "test-utils"))]
    #[must_use]
    pub const fn insecure_for_tests(iterations: u32) -> Self {
        Self {
            iterations,
            legacy_iteration_fallback: true,
        }
    }

    /// Sets whether a stored iteration count of zero falls back to the
    /// current default instead of being rejected.
    #[must_use]
    pub const fn with_legacy_iteration_fallback(mut self, enabled: bool) -> Self {
        self.legacy_iteration_fallback = enabled;
        self
    }

    /// Returns the iteration count used for new backups.
    #[must_use]
    pub const fn iterations(&self) -> u32 {
        self.iterations
    }

    /// Returns whether legacy records without an iteration count are accepted.
    #[must_use]
    pub const fn legacy_iteration_fallback(&self) -> bool {
        self.legacy_iteration_fallback
    }

    /// Checks the iteration count against the accepted range.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::UnsupportedBackup`] when out of range.
    pub fn validate(&self) -> Result<()> {
        if cfg!(any(test, feature = "test-utils")) && self.iterations > 0 {
            return Ok(());
        }
        check_iteration_range(self.iterations)
    }

    /// Resolves the iteration count to use for a stored record.
    fn resolve_stored(&self, stored: u32) -> Result<u32> {
        match stored {
            0 if self.legacy_iteration_fallback => Ok(self.iterations),
            0 => Err(CryptoError::UnsupportedBackup(
                "backup does not record an iteration count".to_string(),
            )),
            n if n > MAX_ITERATIONS => Err(CryptoError::UnsupportedBackup(format!(
                "iteration count {n} exceeds {MAX_ITERATIONS}"
            ))),
            n => Ok(n),
        }
    }
}

/// Encrypted identity backup, persisted server-side as JSON.
///
/// One per user, replaced wholesale on every write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityBackup {
    /// AEAD algorithm label (always [`ALGORITHM_AES_256_GCM`]).
    pub algorithm: String,
    /// KDF label (always [`KDF_PBKDF2_SHA256`]).
    pub kdf: String,
    /// PBKDF2 iteration count; zero or absent in legacy records.
    #[serde(default)]
    pub iterations: u32,
    /// Base64 PBKDF2 salt.
    pub salt: String,
    /// Base64 AES-GCM nonce.
    pub iv: String,
    /// Base64 ciphertext with appended tag.
    pub payload: String,
}

impl IdentityBackup {
    /// Parses a backup from its JSON form.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is invalid or missing required fields.
    pub fn from_json(json: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serializes this backup to its JSON form.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails (extremely rare).
    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Returns whether the labels name a scheme this library implements.
    #[must_use]
    pub fn is_supported_scheme(&self) -> bool {
        self.algorithm == ALGORITHM_AES_256_GCM && self.kdf == KDF_PBKDF2_SHA256
    }

    /// Approximate stored size in bytes, used for server-side limits.
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        self.algorithm.len() + self.kdf.len() + self.salt.len() + self.iv.len() + self.payload.len()
    }
}

/// The plaintext record sealed inside a backup.
#[derive(Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
#[serde(rename_all = "camelCase")]
struct IdentityPayload {
    private_key: String,
    public_key: String,
}

/// Derives the AES-256 key from a PIN with PBKDF2-HMAC-SHA256.
fn derive_key(pin: &str, salt: &[u8], iterations: u32) -> Result<Zeroizing<[u8; KEY_LEN]>> {
    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    pbkdf2::pbkdf2::<Hmac<Sha256>>(pin.as_bytes(), salt, iterations, key.as_mut_slice())
        .map_err(|e| CryptoError::Encryption(format!("key derivation failed: {e}")))?;
    Ok(key)
}

/// Encrypts an identity under a PIN-derived key.
///
/// A fresh salt and nonce are drawn for every call, so encrypting the same
/// identity twice never produces the same backup.
///
/// # Errors
///
/// Returns [`CryptoError::UnsupportedBackup`] for invalid parameters,
/// [`CryptoError::Rng`] if randomness is unavailable, or
/// [`CryptoError::Encryption`] if sealing fails.
pub fn encrypt_identity(
    identity: &Identity,
    pin: &str,
    params: &BackupParams,
) -> Result<IdentityBackup> {
    params.validate()?;

    let salt: [u8; SALT_LEN] = random_array()?;
    let iv: [u8; IV_LEN] = random_array()?;
    let key = derive_key(pin, &salt, params.iterations())?;

    let payload = IdentityPayload {
        private_key: STANDARD.encode(*identity.private_key_bytes()),
        public_key: identity.public_key_base64(),
    };
    let plaintext = Zeroizing::new(
        serde_json::to_vec(&payload)
            .map_err(|e| CryptoError::Encryption(format!("failed to serialize identity: {e}")))?,
    );

    let cipher = Aes256Gcm::new_from_slice(key.as_slice())
        .map_err(|e| CryptoError::Encryption(e.to_string()))?;
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&iv), plaintext.as_slice())
        .map_err(|e| CryptoError::Encryption(e.to_string()))?;

    Ok(IdentityBackup {
        algorithm: ALGORITHM_AES_256_GCM.to_string(),
        kdf: KDF_PBKDF2_SHA256.to_string(),
        iterations: params.iterations(),
        salt: STANDARD.encode(salt),
        iv: STANDARD.encode(iv),
        payload: STANDARD.encode(ciphertext),
    })
}

/// Decrypts an identity backup with a PIN.
///
/// The key is re-derived with the iteration count stored in the backup,
/// not the current default.
///
/// # Errors
///
/// - [`CryptoError::UnsupportedBackup`] if the labels or iteration count
///   cannot be honored
/// - [`CryptoError::DecryptionFailed`] for a wrong PIN or any corruption of
///   salt, nonce, or payload
/// - [`CryptoError::MalformedBackup`] if the authenticated plaintext is not
///   a valid identity record
pub fn decrypt_identity(
    backup: &IdentityBackup,
    pin: &str,
    params: &BackupParams,
) -> Result<Identity> {
    if !backup.is_supported_scheme() {
        return Err(CryptoError::UnsupportedBackup(format!(
            "{} / {}",
            backup.algorithm, backup.kdf
        )));
    }
    let iterations = params.resolve_stored(backup.iterations)?;

    let salt = STANDARD
        .decode(&backup.salt)
        .map_err(|_| CryptoError::DecryptionFailed)?;
    let iv = STANDARD
        .decode(&backup.iv)
        .map_err(|_| CryptoError::DecryptionFailed)?;
    let ciphertext = STANDARD
        .decode(&backup.payload)
        .map_err(|_| CryptoError::DecryptionFailed)?;
    if iv.len() != IV_LEN {
        return Err(CryptoError::DecryptionFailed);
    }

    let key = derive_key(pin, &salt, iterations)?;
    let cipher =
        Aes256Gcm::new_from_slice(key.as_slice()).map_err(|_| CryptoError::DecryptionFailed)?;
    let plaintext = Zeroizing::new(
        cipher
            .decrypt(Nonce::from_slice(&iv), ciphertext.as_slice())
            .map_err(|_| CryptoError::DecryptionFailed)?,
    );

    // Authenticated from here on; structural defects are safe to report.
    let payload: IdentityPayload = serde_json::from_slice(&plaintext)
        .map_err(|_| CryptoError::MalformedBackup("payload is not an identity record".into()))?;

    let private_key = decode_key(&payload.private_key, "private")?;
    let public_key = decode_key(&payload.public_key, "public")?;

    let derived = Identity::from_private_key(*private_key);
    if !bool::from(derived.public_key().as_bytes().ct_eq(&*public_key)) {
        return Err(CryptoError::MalformedBackup(
            "public key does not match private key".into(),
        ));
    }

    Ok(Identity::from_parts(*public_key, *private_key))
}

/// Re-encrypts a backup under a new PIN.
///
/// # Errors
///
/// Propagates any error from [`decrypt_identity`] or [`encrypt_identity`].
pub fn change_pin(
    backup: &IdentityBackup,
    old_pin: &str,
    new_pin: &str,
    params: &BackupParams,
) -> Result<IdentityBackup> {
    let identity = decrypt_identity(backup, old_pin, params)?;
    encrypt_identity(&identity, new_pin, params)
}

fn check_iteration_range(iterations: u32) -> Result<()> {
    if !(MIN_ITERATIONS..=MAX_ITERATIONS).contains(&iterations) {
        return Err(CryptoError::UnsupportedBackup(format!(
            "iteration count {iterations} outside {MIN_ITERATIONS}..={MAX_ITERATIONS}"
        )));
    }
    Ok(())
}

fn decode_key(encoded: &str, which: &str) -> Result<Zeroizing<[u8; KEY_LEN]>> {
    let bytes = Zeroizing::new(
        STANDARD
            .decode(encoded)
            .map_err(|_| CryptoError::MalformedBackup(format!("{which} key is not base64")))?,
    );
    if bytes.len() != KEY_LEN {
        return Err(CryptoError::MalformedBackup(format!(
            "{which} key length {} (expected {KEY_LEN})",
            bytes.len()
        )));
    }
    let mut out = Zeroizing::new([0u8; KEY_LEN]);
    out.copy_from_slice(&bytes);
    Ok(out)
}
