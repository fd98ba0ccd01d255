//! Core types for the contact trust lifecycle.
//!
//! A [`ContactRequest`] moves `pending -> accepted | declined` exactly once,
//! or is deleted while still pending. Accepting creates two directed
//! [`Contact`] edges; trust exists only while both edges exist.

use serde::{Deserialize, Serialize};

/// Status of a contact request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    /// Sent, awaiting the recipient's response.
    Pending,
    /// Recipient accepted; contact edges exist.
    Accepted,
    /// Recipient declined.
    Declined,
}

impl RequestStatus {
    /// Converts to string representation for storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Declined => "declined",
        }
    }

    /// Parses from string representation.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "accepted" => Some(Self::Accepted),
            "declined" => Some(Self::Declined),
            _ => None,
        }
    }

    /// Returns whether no further transition is possible.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Accepted | Self::Declined)
    }
}

/// A request from one user to become mutual contacts with another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactRequest {
    /// Request identifier (UUID v4).
    pub id: String,
    /// User who sent the request.
    pub requester_id: String,
    /// User who may accept or decline it.
    pub recipient_id: String,
    /// Current status.
    pub status: RequestStatus,
    /// When the request was created (Unix timestamp).
    pub created_at: i64,
    /// When the request was accepted (Unix timestamp).
    pub accepted_at: Option<i64>,
}

impl ContactRequest {
    /// Returns whether `user_id` is the requester or the recipient.
    #[must_use]
    pub fn involves(&self, user_id: &str) -> bool {
        self.requester_id == user_id || self.recipient_id == user_id
    }

    /// Returns the other party relative to `user_id`.
    #[must_use]
    pub fn counterparty(&self, user_id: &str) -> Option<&str> {
        if self.requester_id == user_id {
            Some(&self.recipient_id)
        } else if self.recipient_id == user_id {
            Some(&self.requester_id)
        } else {
            None
        }
    }
}

/// One directed contact edge, with the contact's profile resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    /// Owner of this edge.
    pub user_id: String,
    /// The trusted user.
    pub contact_id: String,
    /// Contact's display name.
    pub name: String,
    /// Contact's email.
    pub email: String,
    /// Contact's base64 public key, if registered.
    pub public_key: Option<String>,
    /// When the edge was created (Unix timestamp).
    pub created_at: i64,
}

/// Which side of a request the viewing user is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestDirection {
    /// The viewer is the recipient.
    Incoming,
    /// The viewer is the requester.
    Outgoing,
}

/// A pending request as presented to one of its parties.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestSummary {
    /// Request identifier.
    pub request_id: String,
    /// The other party's user id.
    pub user_id: String,
    /// The other party's email.
    pub email: String,
    /// The other party's display name.
    pub name: String,
    /// Direction relative to the viewer.
    pub direction: RequestDirection,
    /// When the request was created (Unix timestamp).
    pub created_at: i64,
}

/// Pending requests for one user, newest first in each list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactRequestList {
    /// Requests awaiting the user's response.
    pub incoming: Vec<RequestSummary>,
    /// Requests the user sent.
    pub outgoing: Vec<RequestSummary>,
}

/// A contact's public key, handed out only to mutual contacts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactPublicKey {
    /// The contact's user id.
    pub user_id: String,
    /// The contact's display name.
    pub name: String,
    /// Base64 public key; `None` until the contact registers one.
    pub public_key: Option<String>,
}
