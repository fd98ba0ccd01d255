//! Server-side entry point.
//!
//! [`WhereishCore`] bundles a [`Store`], the [`ContactManager`] on top of
//! it, and the size limits from [`CoreConfig`]. Every operation on behalf
//! of a user takes an explicit [`Principal`]; the transport layer is
//! responsible for authenticating the caller and constructing it.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::CoreConfig;
use crate::contacts::{Contact, ContactManager, ContactPublicKey, ContactRequest, ContactRequestList};
use crate::crypto::backup::{IV_LEN, SALT_LEN};
use crate::crypto::sealed::is_well_formed_blob;
use crate::crypto::{IdentityBackup, PublicKey, MAX_ITERATIONS};
use crate::error::{Error, Result};
use crate::store::{EncryptedLocation, LocationShare, SqliteStore, Store, User};
use crate::sync::UserDataSnapshot;

/// The authenticated user an operation runs as.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Principal {
    user_id: String,
}

impl Principal {
    /// Wraps an already-authenticated user id.
    #[must_use]
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }

    /// Returns the user id.
    #[must_use]
    pub fn user_id(&self) -> &str {
        &self.user_id
    }
}

impl From<&User> for Principal {
    fn from(user: &User) -> Self {
        Self::new(user.id.clone())
    }
}

/// The caller's own profile plus what they have stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUser {
    /// User id.
    pub id: String,
    /// Email.
    pub email: String,
    /// Display name.
    pub name: String,
    /// Registered public key, if any.
    pub public_key: Option<String>,
    /// Whether a public key is registered.
    pub has_public_key: bool,
    /// Whether an identity backup is stored.
    pub has_identity_backup: bool,
    /// Whether a sync blob is stored.
    pub has_user_data: bool,
}

/// Core interface for Whereish server functionality.
///
/// # Example
///
/// ```
/// use whereish_core::{CoreConfig, Principal, WhereishCore};
///
/// let dir = tempfile::tempdir().unwrap();
/// let config = CoreConfig::default().with_database_path(dir.path().join("whereish.db"));
/// let core = WhereishCore::open(config).unwrap();
///
/// let alice = core.register_user("alice@example.com", "Alice").unwrap();
/// let me = core.current_user(&Principal::from(&alice)).unwrap();
/// assert!(!me.has_identity_backup);
/// ```
pub struct WhereishCore<S: Store> {
    store: Arc<S>,
    contacts: ContactManager<S>,
    config: CoreConfig,
}

impl WhereishCore<SqliteStore> {
    /// Opens the `SQLite` database named in `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the database
    /// cannot be opened.
    pub fn open(config: CoreConfig) -> Result<Self> {
        config.validate()?;
        let store = Arc::new(SqliteStore::open(&config.database_path)?);
        Self::new(store, config)
    }
}

impl<S: Store> WhereishCore<S> {
    /// Creates a core over an existing store.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(store: Arc<S>, config: CoreConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            contacts: ContactManager::new(Arc::clone(&store)),
            store,
            config,
        })
    }

    /// Returns the active configuration.
    #[must_use]
    pub const fn config(&self) -> &CoreConfig {
        &self.config
    }

    /// Returns the contact manager.
    #[must_use]
    pub const fn contacts(&self) -> &ContactManager<S> {
        &self.contacts
    }

    fn require_user(&self, principal: &Principal) -> Result<User> {
        self.store
            .get_user(principal.user_id())?
            .ok_or_else(|| Error::NotFound("user".to_string()))
    }

    fn check_size(size: usize, limit: usize) -> Result<()> {
        if size > limit {
            return Err(Error::PayloadTooLarge { size, limit });
        }
        Ok(())
    }

    // ==================== Account ====================

    /// Creates a user account.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyExists`] if the email is taken.
    pub fn register_user(&self, email: &str, name: &str) -> Result<User> {
        let user = self.store.create_user(email, name)?;
        info!(user_id = %user.id, "user registered");
        Ok(user)
    }

    /// Returns the caller's profile and storage flags.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the principal no longer exists.
    pub fn current_user(&self, principal: &Principal) -> Result<CurrentUser> {
        let user = self.require_user(principal)?;
        let has_identity_backup = self.store.get_identity_backup(&user.id)?.is_some();
        let has_user_data = self.store.get_user_data(&user.id)?.is_some();
        Ok(CurrentUser {
            has_public_key: user.public_key.is_some(),
            id: user.id,
            email: user.email,
            name: user.name,
            public_key: user.public_key,
            has_identity_backup,
            has_user_data,
        })
    }

    /// Changes the caller's display name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRequest`] for a blank name.
    pub fn update_name(&self, principal: &Principal, name: &str) -> Result<()> {
        if name.trim().is_empty() {
            return Err(Error::InvalidRequest("name is required".to_string()));
        }
        self.store.update_user_name(principal.user_id(), name)
    }

    /// Deletes the caller's account and everything attached to it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the principal no longer exists.
    pub fn delete_account(&self, principal: &Principal) -> Result<()> {
        self.store.delete_user(principal.user_id())?;
        info!(user_id = principal.user_id(), "account deleted");
        Ok(())
    }

    // ==================== Identity ====================

    /// Registers the caller's public key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidKeyMaterial`] unless the key is base64 of
    /// exactly 32 bytes.
    pub fn register_public_key(&self, principal: &Principal, public_key: &str) -> Result<PublicKey> {
        let key = PublicKey::from_base64(public_key)?;
        self.store.set_public_key(principal.user_id(), &key)?;
        debug!(user_id = principal.user_id(), "public key registered");
        Ok(key)
    }

    /// Returns a contact's public key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] unless the caller and `contact_id` are
    /// mutual contacts.
    pub fn contact_public_key(
        &self,
        principal: &Principal,
        contact_id: &str,
    ) -> Result<ContactPublicKey> {
        self.contacts
            .contact_public_key(principal.user_id(), contact_id)
    }

    /// Stores the caller's identity backup, replacing any previous one.
    ///
    /// The server cannot decrypt the backup; it only checks that the record
    /// is structurally something a client could decrypt.
    ///
    /// # Errors
    ///
    /// - [`Error::PayloadTooLarge`] over `max_backup_bytes`
    /// - [`Error::InvalidRequest`] for an unknown scheme, an undecodable
    ///   field, or an iteration count out of range
    pub fn put_identity_backup(&self, principal: &Principal, backup: &IdentityBackup) -> Result<()> {
        Self::check_size(backup.encoded_len(), self.config.max_backup_bytes)?;
        validate_backup(backup)?;
        self.store.set_identity_backup(principal.user_id(), backup)?;
        info!(user_id = principal.user_id(), "identity backup stored");
        Ok(())
    }

    /// Returns the caller's identity backup.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if none is stored.
    pub fn get_identity_backup(&self, principal: &Principal) -> Result<IdentityBackup> {
        self.store
            .get_identity_backup(principal.user_id())?
            .ok_or_else(|| Error::NotFound("identity backup".to_string()))
    }

    /// Deletes the caller's identity backup. Succeeds if there was none.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    pub fn delete_identity_backup(&self, principal: &Principal) -> Result<()> {
        if self.store.delete_identity_backup(principal.user_id())? {
            info!(user_id = principal.user_id(), "identity backup deleted");
        }
        Ok(())
    }

    // ==================== User data ====================

    /// Returns the caller's sync blob.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if nothing has been written yet, or
    /// [`Error::InvalidData`] if the stored timestamp is out of range.
    pub fn get_user_data(&self, principal: &Principal) -> Result<UserDataSnapshot> {
        self.store
            .get_user_data(principal.user_id())?
            .ok_or_else(|| Error::NotFound("user data".to_string()))?
            .try_into()
    }

    /// Writes the caller's sync blob if `expected_version` is current.
    ///
    /// # Errors
    ///
    /// - [`Error::VersionConflict`] if another write got there first
    /// - [`Error::InvalidRequest`] for an empty blob or negative version
    /// - [`Error::PayloadTooLarge`] over `max_user_data_bytes`
    pub fn put_user_data(
        &self,
        principal: &Principal,
        blob: &str,
        expected_version: i64,
    ) -> Result<UserDataSnapshot> {
        if blob.is_empty() {
            return Err(Error::InvalidRequest("blob is required".to_string()));
        }
        Self::check_size(blob.len(), self.config.max_user_data_bytes)?;

        let data = self
            .store
            .set_user_data(principal.user_id(), blob, expected_version)?;
        debug!(user_id = principal.user_id(), version = data.version, "user data written");
        data.try_into()
    }

    // ==================== Contacts ====================

    /// Sends a contact request to the user with `email`.
    ///
    /// # Errors
    ///
    /// See [`ContactManager::send_request`].
    pub fn send_contact_request(&self, principal: &Principal, email: &str) -> Result<ContactRequest> {
        self.contacts.send_request(principal.user_id(), email)
    }

    /// Lists the caller's pending requests.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    pub fn list_contact_requests(&self, principal: &Principal) -> Result<ContactRequestList> {
        self.contacts.list_requests(principal.user_id())
    }

    /// Accepts a request addressed to the caller.
    ///
    /// # Errors
    ///
    /// See [`ContactManager::accept_request`].
    pub fn accept_contact_request(
        &self,
        principal: &Principal,
        request_id: &str,
    ) -> Result<ContactRequest> {
        self.contacts.accept_request(request_id, principal.user_id())
    }

    /// Declines a request addressed to the caller.
    ///
    /// # Errors
    ///
    /// See [`ContactManager::decline_request`].
    pub fn decline_contact_request(&self, principal: &Principal, request_id: &str) -> Result<()> {
        self.contacts.decline_request(request_id, principal.user_id())
    }

    /// Cancels a request the caller sent.
    ///
    /// # Errors
    ///
    /// See [`ContactManager::cancel_request`].
    pub fn cancel_contact_request(&self, principal: &Principal, request_id: &str) -> Result<()> {
        self.contacts.cancel_request(request_id, principal.user_id())
    }

    /// Lists the caller's contacts.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    pub fn list_contacts(&self, principal: &Principal) -> Result<Vec<Contact>> {
        self.contacts.list_contacts(principal.user_id())
    }

    /// Removes a contact and all locations exchanged with them.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if they are not contacts.
    pub fn remove_contact(&self, principal: &Principal, contact_id: &str) -> Result<()> {
        self.contacts.remove_contact(principal.user_id(), contact_id)
    }

    // ==================== Locations ====================

    /// Stores a batch of location blobs from the caller.
    ///
    /// The batch is validated up front and written in one transaction; if
    /// any entry is rejected nothing is stored.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidRequest`] for an empty batch, a blob that is not a
    ///   plausible sealed box, or a recipient who is not a mutual contact
    /// - [`Error::PayloadTooLarge`] for a blob over `max_location_blob_bytes`
    pub fn share_locations(&self, principal: &Principal, shares: &[LocationShare]) -> Result<()> {
        if shares.is_empty() {
            return Err(Error::InvalidRequest("no locations to share".to_string()));
        }
        for share in shares {
            Self::check_size(share.blob.len(), self.config.max_location_blob_bytes)?;
            if !is_well_formed_blob(&share.blob) {
                return Err(Error::InvalidRequest(format!(
                    "blob for {} is not a sealed location",
                    share.to_user_id
                )));
            }
        }

        self.store.set_locations(principal.user_id(), shares)?;
        debug!(
            user_id = principal.user_id(),
            count = shares.len(),
            "locations shared"
        );
        Ok(())
    }

    /// Lists the location blobs contacts have shared with the caller.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    pub fn get_locations(&self, principal: &Principal) -> Result<Vec<EncryptedLocation>> {
        self.store.get_locations_for_user(principal.user_id())
    }

    /// Deletes every location blob the caller has shared.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    pub fn stop_sharing(&self, principal: &Principal) -> Result<usize> {
        let removed = self.store.delete_locations_from_user(principal.user_id())?;
        info!(user_id = principal.user_id(), removed, "stopped sharing");
        Ok(removed)
    }
}

fn validate_backup(backup: &IdentityBackup) -> Result<()> {
    if !backup.is_supported_scheme() {
        return Err(Error::InvalidRequest(format!(
            "unsupported backup scheme {} / {}",
            backup.algorithm, backup.kdf
        )));
    }
    if backup.iterations > MAX_ITERATIONS {
        return Err(Error::InvalidRequest(format!(
            "iteration count {} exceeds {MAX_ITERATIONS}",
            backup.iterations
        )));
    }

    let decoded_len = |field: &str, value: &str| {
        STANDARD
            .decode(value)
            .map(|bytes| bytes.len())
            .map_err(|_| Error::InvalidRequest(format!("backup {field} is not base64")))
    };
    if decoded_len("salt", &backup.salt)? != SALT_LEN {
        return Err(Error::InvalidRequest(format!("backup salt must be {SALT_LEN} bytes")));
    }
    if decoded_len("iv", &backup.iv)? != IV_LEN {
        return Err(Error::InvalidRequest(format!("backup iv must be {IV_LEN} bytes")));
    }
    if decoded_len("payload", &backup.payload)? == 0 {
        return Err(Error::InvalidRequest("backup payload is empty".to_string()));
    }
    Ok(())
}
