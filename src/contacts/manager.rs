//! High-level contact trust API.
//!
//! [`ContactManager`] drives the request lifecycle on top of a [`Store`].
//! The atomic parts (accepting, removing) are single repository calls; the
//! manager adds recipient resolution, visibility rules, and logging.
//!
//! # Visibility
//!
//! A request is only visible to its two parties, and a public key only to
//! mutual contacts. Everything else is reported as
//! [`Error::NotFound`], indistinguishable from a missing row.

use std::sync::Arc;

use tracing::{debug, info};

use super::types::{
    Contact, ContactPublicKey, ContactRequest, ContactRequestList, RequestDirection,
    RequestSummary,
};
use crate::error::{Error, Result};
use crate::store::{normalize_email, Store, User};

/// High-level API for the contact trust state machine.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use whereish_core::contacts::ContactManager;
/// use whereish_core::store::{SqliteStore, UserRepository};
///
/// let dir = tempfile::tempdir().unwrap();
/// let store = Arc::new(SqliteStore::open(&dir.path().join("whereish.db")).unwrap());
/// let alice = store.create_user("alice@example.com", "Alice").unwrap();
/// let bob = store.create_user("bob@example.com", "Bob").unwrap();
///
/// let contacts = ContactManager::new(Arc::clone(&store));
/// let request = contacts.send_request(&alice.id, "Bob@Example.com").unwrap();
/// contacts.accept_request(&request.id, &bob.id).unwrap();
/// assert!(contacts.are_contacts(&alice.id, &bob.id).unwrap());
/// ```
pub struct ContactManager<S: Store> {
    store: Arc<S>,
}

impl<S: Store> Clone for ContactManager<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: Store> ContactManager<S> {
    /// Creates a manager over a shared store.
    #[must_use]
    pub const fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    fn require_user(&self, user_id: &str) -> Result<User> {
        self.store
            .get_user(user_id)?
            .ok_or_else(|| Error::NotFound(format!("user {user_id}")))
    }

    // ==================== Requests ====================

    /// Sends a request to the user registered under `recipient_email`.
    ///
    /// The email is matched case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no user has that email, otherwise as
    /// [`create_request`](Self::create_request).
    pub fn send_request(&self, requester_id: &str, recipient_email: &str) -> Result<ContactRequest> {
        let email = normalize_email(recipient_email);
        if email.is_empty() {
            return Err(Error::InvalidRequest("email is required".to_string()));
        }
        let recipient = self
            .store
            .get_user_by_email(&email)?
            .ok_or_else(|| Error::NotFound("user".to_string()))?;
        self.create_request(requester_id, &recipient.id)
    }

    /// Creates a pending request from `requester_id` to `recipient_id`.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidRequest`] for a request to oneself
    /// - [`Error::NotFound`] if the recipient does not exist
    /// - [`Error::AlreadyContacts`] / [`Error::DuplicateRequest`] per the
    ///   trust invariants
    pub fn create_request(&self, requester_id: &str, recipient_id: &str) -> Result<ContactRequest> {
        if requester_id == recipient_id {
            return Err(Error::InvalidRequest(
                "cannot send a contact request to yourself".to_string(),
            ));
        }
        self.require_user(recipient_id)?;

        let request = self.store.create_request(requester_id, recipient_id)?;
        info!(request_id = %request.id, "contact request created");
        Ok(request)
    }

    /// Returns a request if `viewer_id` is one of its parties.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if missing or not visible to the viewer.
    pub fn get_request(&self, request_id: &str, viewer_id: &str) -> Result<ContactRequest> {
        self.store
            .get_request(request_id)?
            .filter(|request| request.involves(viewer_id))
            .ok_or_else(|| Error::NotFound(format!("contact request {request_id}")))
    }

    /// Accepts a request addressed to `acting_user_id`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] unless the request exists, is pending, and
    /// is addressed to the acting user.
    pub fn accept_request(&self, request_id: &str, acting_user_id: &str) -> Result<ContactRequest> {
        let request = self.store.accept_request(request_id, acting_user_id)?;
        info!(request_id, "contact request accepted");
        Ok(request)
    }

    /// Declines a request addressed to `acting_user_id`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] unless the request exists, is pending, and
    /// is addressed to the acting user.
    pub fn decline_request(&self, request_id: &str, acting_user_id: &str) -> Result<()> {
        self.store.decline_request(request_id, acting_user_id)?;
        info!(request_id, "contact request declined");
        Ok(())
    }

    /// Cancels a pending request sent by `acting_user_id`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] unless the request exists, is pending, and
    /// was sent by the acting user.
    pub fn cancel_request(&self, request_id: &str, acting_user_id: &str) -> Result<()> {
        self.store.cancel_request(request_id, acting_user_id)?;
        info!(request_id, "contact request canceled");
        Ok(())
    }

    /// Lists the user's pending requests with the other party resolved.
    ///
    /// Requests whose counterparty no longer exists are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    pub fn list_requests(&self, user_id: &str) -> Result<ContactRequestList> {
        let incoming = self.store.list_incoming_requests(user_id)?;
        let outgoing = self.store.list_outgoing_requests(user_id)?;

        Ok(ContactRequestList {
            incoming: self.summarize(user_id, &incoming, RequestDirection::Incoming)?,
            outgoing: self.summarize(user_id, &outgoing, RequestDirection::Outgoing)?,
        })
    }

    fn summarize(
        &self,
        user_id: &str,
        requests: &[ContactRequest],
        direction: RequestDirection,
    ) -> Result<Vec<RequestSummary>> {
        let mut summaries = Vec::with_capacity(requests.len());
        for request in requests {
            let Some(other_id) = request.counterparty(user_id) else {
                continue;
            };
            let Some(other) = self.store.get_user(other_id)? else {
                debug!(request_id = %request.id, "skipping request with missing counterparty");
                continue;
            };
            summaries.push(RequestSummary {
                request_id: request.id.clone(),
                user_id: other.id,
                email: other.email,
                name: other.name,
                direction,
                created_at: request.created_at,
            });
        }
        Ok(summaries)
    }

    // ==================== Contacts ====================

    /// Returns whether the two users are mutual contacts.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    pub fn are_contacts(&self, user_id: &str, other_id: &str) -> Result<bool> {
        self.store.are_contacts(user_id, other_id)
    }

    /// Lists the user's contacts.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    pub fn list_contacts(&self, user_id: &str) -> Result<Vec<Contact>> {
        self.store.list_contacts(user_id)
    }

    /// Ends trust between two users, deleting both edges and every location
    /// blob exchanged between them.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if they are not contacts.
    pub fn remove_contact(&self, user_id: &str, contact_id: &str) -> Result<()> {
        self.store.remove_contact(user_id, contact_id)?;
        info!(contact_id, "contact removed");
        Ok(())
    }

    /// Returns a contact's public key, only if the two are mutual contacts.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if they are not contacts or the contact no
    /// longer exists.
    pub fn contact_public_key(&self, user_id: &str, contact_id: &str) -> Result<ContactPublicKey> {
        let not_found = || Error::NotFound(format!("contact {contact_id}"));
        if !self.store.are_contacts(user_id, contact_id)? {
            return Err(not_found());
        }
        let contact = self.store.get_user(contact_id)?.ok_or_else(not_found)?;
        Ok(ContactPublicKey {
            user_id: contact.id,
            name: contact.name,
            public_key: contact.public_key,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contacts::RequestStatus;
    use crate::crypto::Identity;
    use crate::store::{SqliteStore, UserRepository};

    struct Fixture {
        manager: ContactManager<SqliteStore>,
        store: Arc<SqliteStore>,
        alice: User,
        bob: User,
        carol: User,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        let alice = store.create_user("alice@example.com", "Alice").unwrap();
        let bob = store.create_user("bob@example.com", "Bob").unwrap();
        let carol = store.create_user("carol@example.com", "Carol").unwrap();
        Fixture {
            manager: ContactManager::new(Arc::clone(&store)),
            store,
            alice,
            bob,
            carol,
        }
    }

    #[test]
    fn send_request_resolves_email_case_insensitively() {
        let f = fixture();
        let request = f.manager.send_request(&f.alice.id, "  BOB@example.com").unwrap();
        assert_eq!(request.recipient_id, f.bob.id);
        assert_eq!(request.status, RequestStatus::Pending);
    }

    #[test]
    fn send_request_to_unknown_email_is_not_found() {
        let f = fixture();
        assert!(matches!(
            f.manager.send_request(&f.alice.id, "nobody@example.com"),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn send_request_to_self_is_invalid() {
        let f = fixture();
        assert!(matches!(
            f.manager.send_request(&f.alice.id, "alice@example.com"),
            Err(Error::InvalidRequest(_))
        ));
    }

    #[test]
    fn create_request_to_unknown_user_is_not_found() {
        let f = fixture();
        assert!(matches!(
            f.manager.create_request(&f.alice.id, "ghost"),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn create_request_from_unknown_user_is_not_found() {
        let f = fixture();
        let err = f.manager.create_request("ghost", &f.bob.id).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert_eq!(err.code(), "not_found");
    }

    #[test]
    fn get_request_hidden_from_third_parties() {
        let f = fixture();
        let request = f.manager.create_request(&f.alice.id, &f.bob.id).unwrap();

        assert!(f.manager.get_request(&request.id, &f.alice.id).is_ok());
        assert!(f.manager.get_request(&request.id, &f.bob.id).is_ok());
        assert!(matches!(
            f.manager.get_request(&request.id, &f.carol.id),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn list_requests_resolves_counterparties() {
        let f = fixture();
        f.manager.create_request(&f.alice.id, &f.bob.id).unwrap();
        f.manager.create_request(&f.carol.id, &f.alice.id).unwrap();

        let list = f.manager.list_requests(&f.alice.id).unwrap();
        assert_eq!(list.outgoing.len(), 1);
        assert_eq!(list.outgoing[0].email, "bob@example.com");
        assert_eq!(list.outgoing[0].direction, RequestDirection::Outgoing);
        assert_eq!(list.incoming.len(), 1);
        assert_eq!(list.incoming[0].name, "Carol");
        assert_eq!(list.incoming[0].direction, RequestDirection::Incoming);
    }

    #[test]
    fn full_lifecycle() {
        let f = fixture();
        let request = f.manager.create_request(&f.alice.id, &f.bob.id).unwrap();
        f.manager.accept_request(&request.id, &f.bob.id).unwrap();

        assert_eq!(f.manager.list_contacts(&f.alice.id).unwrap().len(), 1);
        assert_eq!(f.manager.list_contacts(&f.bob.id).unwrap().len(), 1);
        assert!(f.manager.list_requests(&f.bob.id).unwrap().incoming.is_empty());

        f.manager.remove_contact(&f.alice.id, &f.bob.id).unwrap();
        assert!(!f.manager.are_contacts(&f.bob.id, &f.alice.id).unwrap());
    }

    #[test]
    fn public_key_only_for_contacts() {
        let f = fixture();
        let key = Identity::generate().unwrap().public_key();
        f.store.set_public_key(&f.bob.id, &key).unwrap();

        assert!(matches!(
            f.manager.contact_public_key(&f.alice.id, &f.bob.id),
            Err(Error::NotFound(_))
        ));

        let request = f.manager.create_request(&f.alice.id, &f.bob.id).unwrap();
        assert!(matches!(
            f.manager.contact_public_key(&f.alice.id, &f.bob.id),
            Err(Error::NotFound(_))
        ));

        f.manager.accept_request(&request.id, &f.bob.id).unwrap();
        let found = f.manager.contact_public_key(&f.alice.id, &f.bob.id).unwrap();
        assert_eq!(found.public_key, Some(key.to_base64()));
        assert_eq!(found.name, "Bob");
    }

    #[test]
    fn public_key_absent_until_registered() {
        let f = fixture();
        let request = f.manager.create_request(&f.alice.id, &f.bob.id).unwrap();
        f.manager.accept_request(&request.id, &f.bob.id).unwrap();

        let found = f.manager.contact_public_key(&f.bob.id, &f.alice.id).unwrap();
        assert!(found.public_key.is_none());
    }
}
