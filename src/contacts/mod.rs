//! Contact trust between users.
//!
//! Two users may exchange public keys, and therefore locations, only after
//! one has sent a request and the other has accepted it. The lifecycle:
//!
//! ```text
//! create ──► pending ──accept──► accepted   (two contact edges created)
//!               │
//!               ├──decline─► declined
//!               └──cancel──► (deleted)
//!
//! remove: accepted pair ──► edges and locations in both directions deleted
//! ```
//!
//! # Types
//!
//! - [`ContactRequest`]: a request and its status
//! - [`Contact`]: one directed trust edge with the contact's profile
//! - [`ContactRequestList`]: pending requests for display
//! - [`ContactPublicKey`]: what a contact may learn about another contact

mod manager;
pub mod types;

pub use manager::ContactManager;
pub use types::{
    Contact, ContactPublicKey, ContactRequest, ContactRequestList, RequestDirection,
    RequestStatus, RequestSummary,
};
