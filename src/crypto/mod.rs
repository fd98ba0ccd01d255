//! Identity keys and the three ciphers built on them.
//!
//! - [`Identity`]: long-lived X25519 keypair
//! - [`backup`]: PIN-protected identity backup (PBKDF2 + AES-256-GCM)
//! - [`sealed`]: NaCl box for per-recipient and encrypt-to-self blobs
//!
//! Everything here is pure and synchronous; nothing touches storage.

pub mod backup;
mod error;
mod identity;
mod keys;
pub mod sealed;

pub use backup::{
    change_pin, decrypt_identity, encrypt_identity, BackupParams, IdentityBackup,
    ALGORITHM_AES_256_GCM, DEFAULT_ITERATIONS, KDF_PBKDF2_SHA256, MAX_ITERATIONS, MIN_ITERATIONS,
};
pub use error::{CryptoError, Result};
pub use identity::Identity;
pub use keys::{PublicKey, KEY_LEN};
pub use sealed::{decrypt_self, decrypt_self_b64, encrypt_self, encrypt_self_b64};
