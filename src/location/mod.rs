//! Location payloads and their per-recipient encryption.
//!
//! Locations are expressed as a hierarchy of place names (street, city,
//! country, ...) rather than coordinates, plus an optional user-defined
//! name. A sender encrypts one copy per contact; the server stores the
//! opaque blobs and never sees a plaintext location.
//!
//! # Example Usage
//!
//! ```
//! use whereish_core::crypto::Identity;
//! use whereish_core::location::{decrypt_location, encrypt_location, LocationData};
//!
//! let alice = Identity::generate().unwrap();
//! let bob = Identity::generate().unwrap();
//!
//! let here = LocationData::new().with_level("city", "Lisbon");
//! let blob = encrypt_location(&here, &alice, &bob.public_key()).unwrap();
//!
//! let seen_by_bob = decrypt_location(&blob, &bob, &alice.public_key()).unwrap();
//! assert_eq!(seen_by_bob.hierarchy["city"], "Lisbon");
//! ```

pub mod cipher;
pub mod types;

pub use cipher::{decrypt_location, decrypt_location_b64, encrypt_location, encrypt_location_b64};
pub use types::{LocationData, LEVELS};
