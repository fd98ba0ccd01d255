//! Persistence seams.
//!
//! The core consumes storage only through the repository traits below. Each
//! operation that must be atomic (version-guarded writes, accepting a
//! request, removing a contact, sharing a batch of locations) is a single
//! trait method, so an implementation can run it as one transaction.
//!
//! # Architecture
//!
//! ```text
//! WhereishCore / ContactManager
//!     └── S: Store
//!           ├── UserRepository
//!           ├── ContactRepository
//!           └── LocationRepository
//! ```
//!
//! [`SqliteStore`] is the bundled implementation.

mod sqlite;
pub mod types;

use crate::contacts::{Contact, ContactRequest};
use crate::crypto::{IdentityBackup, PublicKey};
use crate::error::Result;

pub use sqlite::SqliteStore;
pub use types::{normalize_email, EncryptedLocation, LocationShare, User, UserData};

/// Users, their public keys, identity backups, and sync blobs.
pub trait UserRepository: Send + Sync {
    /// Creates a user. The email is stored lower-cased.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyExists`](crate::Error::AlreadyExists) if the
    /// email is taken.
    fn create_user(&self, email: &str, name: &str) -> Result<User>;

    /// Retrieves a user by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn get_user(&self, user_id: &str) -> Result<Option<User>>;

    /// Retrieves a user by email, case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Updates a user's display name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`](crate::Error::NotFound) for an unknown user.
    fn update_user_name(&self, user_id: &str, name: &str) -> Result<()>;

    /// Deletes a user and everything they own or are party to.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`](crate::Error::NotFound) for an unknown user.
    fn delete_user(&self, user_id: &str) -> Result<()>;

    /// Registers (or replaces) the user's public key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`](crate::Error::NotFound) for an unknown user.
    fn set_public_key(&self, user_id: &str, public_key: &PublicKey) -> Result<()>;

    /// Retrieves the user's identity backup.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn get_identity_backup(&self, user_id: &str) -> Result<Option<IdentityBackup>>;

    /// Stores the user's identity backup, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn set_identity_backup(&self, user_id: &str, backup: &IdentityBackup) -> Result<()>;

    /// Deletes the user's identity backup. Returns whether one existed.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn delete_identity_backup(&self, user_id: &str) -> Result<bool>;

    /// Retrieves the user's sync blob.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn get_user_data(&self, user_id: &str) -> Result<Option<UserData>>;

    /// Writes the user's sync blob under optimistic concurrency.
    ///
    /// `expected_version == 0` inserts version 1; otherwise the write
    /// succeeds only if the stored version equals `expected_version`, and
    /// bumps it by one.
    ///
    /// # Errors
    ///
    /// Returns [`Error::VersionConflict`](crate::Error::VersionConflict) with
    /// the stored version (0 if none) when the guard fails.
    fn set_user_data(&self, user_id: &str, blob: &str, expected_version: i64) -> Result<UserData>;
}

/// Contact requests and contact edges.
pub trait ContactRepository: Send + Sync {
    /// Creates a pending request.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidRequest`](crate::Error::InvalidRequest) if requester == recipient
    /// - [`Error::AlreadyContacts`](crate::Error::AlreadyContacts) if trust already exists
    /// - [`Error::DuplicateRequest`](crate::Error::DuplicateRequest) if a pending request
    ///   exists in either direction
    fn create_request(&self, requester_id: &str, recipient_id: &str) -> Result<ContactRequest>;

    /// Retrieves a request by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn get_request(&self, request_id: &str) -> Result<Option<ContactRequest>>;

    /// Pending requests addressed to the user, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn list_incoming_requests(&self, user_id: &str) -> Result<Vec<ContactRequest>>;

    /// Pending requests sent by the user, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn list_outgoing_requests(&self, user_id: &str) -> Result<Vec<ContactRequest>>;

    /// Accepts a pending request and creates both contact edges atomically.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`](crate::Error::NotFound) if the request is
    /// missing, not pending, or not addressed to `acting_user_id`.
    fn accept_request(&self, request_id: &str, acting_user_id: &str) -> Result<ContactRequest>;

    /// Declines a pending request addressed to `acting_user_id`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`](crate::Error::NotFound) if no such request.
    fn decline_request(&self, request_id: &str, acting_user_id: &str) -> Result<()>;

    /// Deletes a pending request sent by `acting_user_id`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`](crate::Error::NotFound) if no such request.
    fn cancel_request(&self, request_id: &str, acting_user_id: &str) -> Result<()>;

    /// Returns whether `user_id` has `other_id` as a contact.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn are_contacts(&self, user_id: &str, other_id: &str) -> Result<bool>;

    /// Removes both edges and all locations between the two users atomically.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`](crate::Error::NotFound) if they are not contacts.
    fn remove_contact(&self, user_id: &str, contact_id: &str) -> Result<()>;

    /// Lists the user's contacts, with profiles resolved.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn list_contacts(&self, user_id: &str) -> Result<Vec<Contact>>;
}

/// Encrypted location blobs between contacts.
pub trait LocationRepository: Send + Sync {
    /// Locations shared to the user.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn get_locations_for_user(&self, user_id: &str) -> Result<Vec<EncryptedLocation>>;

    /// Upserts a batch of blobs from `from_user_id`, all or nothing.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRequest`](crate::Error::InvalidRequest) if any
    /// recipient is not a contact of the sender; nothing is written then.
    fn set_locations(&self, from_user_id: &str, shares: &[LocationShare]) -> Result<()>;

    /// Deletes everything the user shared. Returns the number of rows removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn delete_locations_from_user(&self, user_id: &str) -> Result<usize>;

    /// Deletes locations between two users in both directions.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn delete_locations_between(&self, user_id: &str, other_id: &str) -> Result<usize>;
}

/// Everything the core needs from persistence.
pub trait Store: UserRepository + ContactRepository + LocationRepository {}

impl<T: UserRepository + ContactRepository + LocationRepository> Store for T {}
