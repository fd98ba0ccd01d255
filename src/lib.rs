//! Whereish Core Library
//!
//! Identity and sync core for Whereish, end-to-end encrypted location
//! sharing between mutually trusted contacts.
//!
//! - [`crypto`]: X25519 identities, PIN-protected identity backups and the
//!   NaCl box used for every ciphertext the server stores
//! - [`location`]: location hierarchies sealed for one recipient
//! - [`sync`]: the self-encrypted state blob and its versioning protocol
//! - [`contacts`]: the request / accept / decline / cancel / remove lifecycle
//! - [`store`]: repository traits and the bundled `SQLite` implementation
//! - [`WhereishCore`]: the server-side facade tying them together
//!
//! The server only ever handles public keys, backups it cannot open and
//! opaque blobs. All plaintext stays on the client.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![deny(unsafe_code)]

mod api;
pub mod config;
pub mod contacts;
pub mod crypto;
mod error;
pub mod location;
pub mod store;
pub mod sync;

pub use api::{CurrentUser, Principal, WhereishCore};
pub use config::CoreConfig;
pub use error::{Error, Result};
