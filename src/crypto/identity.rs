//! Long-lived identity keypair.
//!
//! This module provides [`Identity`], the user's X25519 keypair. The public
//! half is registered with the server and handed to mutual contacts; the
//! private half never leaves the device except inside a PIN-encrypted
//! [`IdentityBackup`](super::IdentityBackup).
//!
//! # Security
//!
//! - Secret bytes are automatically zeroized on drop via [`ZeroizeOnDrop`]
//! - Temporary copies are wrapped in [`Zeroizing`]
//! - Debug output never includes secret material
//! - Equality is evaluated in constant time

use crypto_box::SecretKey;
use subtle::ConstantTimeEq;
use zeroize::{ZeroizeOnDrop, Zeroizing};

use super::error::Result;
use super::keys::{random_array, PublicKey, KEY_LEN};

/// A persistent X25519 identity keypair.
///
/// # Example
///
/// ```
/// use whereish_core::crypto::Identity;
///
/// let identity = Identity::generate().unwrap();
/// assert_eq!(identity.public_key().as_bytes().len(), 32);
/// ```
#[derive(ZeroizeOnDrop)]
pub struct Identity {
    /// The private key bytes (zeroized on drop).
    private_key: [u8; KEY_LEN],

    /// Public key bytes (not sensitive, skip zeroization).
    #[zeroize(skip)]
    public_key: [u8; KEY_LEN],
}

impl Identity {
    /// Generates a new random identity.
    ///
    /// The private key is drawn from the operating system's CSPRNG and the
    /// public key is the matching X25519 point.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::Rng`](super::CryptoError::Rng) if the random
    /// number generator is unavailable. This is fatal and not retried.
    pub fn generate() -> Result<Self> {
        let secret = Zeroizing::new(random_array::<KEY_LEN>()?);
        Ok(Self::from_private_key(*secret))
    }

    /// Rebuilds an identity from its private key, deriving the public key.
    #[must_use]
    pub fn from_private_key(private_key: [u8; KEY_LEN]) -> Self {
        let secret = SecretKey::from(private_key);
        let public_key = *secret.public_key().as_bytes();
        Self {
            private_key,
            public_key,
        }
    }

    /// Assembles an identity from both halves without re-deriving the
    /// public key. Callers are responsible for consistency.
    pub(crate) const fn from_parts(public_key: [u8; KEY_LEN], private_key: [u8; KEY_LEN]) -> Self {
        Self {
            private_key,
            public_key,
        }
    }

    /// Returns the public half of this identity.
    #[must_use]
    pub const fn public_key(&self) -> PublicKey {
        PublicKey::from_bytes(self.public_key)
    }

    /// Returns the public key in the base64 form registered with the server.
    #[must_use]
    pub fn public_key_base64(&self) -> String {
        self.public_key().to_base64()
    }

    /// Returns the private key bytes, wrapped in `Zeroizing`.
    ///
    /// # Security Warning
    ///
    /// This is `pub(crate)` to limit exposure.
    #[must_use]
    pub(crate) fn private_key_bytes(&self) -> Zeroizing<[u8; KEY_LEN]> {
        Zeroizing::new(self.private_key)
    }

    /// Returns the private key as a `crypto_box` secret for sealing.
    pub(crate) fn secret_key(&self) -> SecretKey {
        SecretKey::from(self.private_key)
    }
}

impl PartialEq for Identity {
    fn eq(&self, other: &Self) -> bool {
        let private_eq = self.private_key.ct_eq(&other.private_key);
        let public_eq = self.public_key.ct_eq(&other.public_key);
        (private_eq & public_eq).into()
    }
}

impl Eq for Identity {}

impl std::fmt::Debug for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print the private key
        f.debug_struct("Identity")
            .field("public_key", &hex::encode(self.public_key))
            .finish_non_exhaustive()
    }
}
