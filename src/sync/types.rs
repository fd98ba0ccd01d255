//! Wire types for the user-data sync protocol.

use chrono::DateTime;
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::store::UserData;

/// Error code carried by a conflict response.
pub const VERSION_CONFLICT_CODE: &str = "version_conflict";

/// Message carried by a conflict response.
pub const VERSION_CONFLICT_MESSAGE: &str = "Data has been modified by another device";

/// A client write: the version it last saw plus the new blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDataWrite {
    /// Version the client based this write on; 0 for the first write.
    pub version: i64,
    /// Base64 self-encrypted blob.
    pub blob: String,
}

/// The stored state after a successful read or write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDataSnapshot {
    /// Current version.
    pub version: i64,
    /// RFC 3339 time of the last write.
    pub updated_at: String,
    /// Base64 self-encrypted blob.
    pub blob: String,
}

impl TryFrom<UserData> for UserDataSnapshot {
    type Error = Error;

    fn try_from(data: UserData) -> Result<Self, Self::Error> {
        let updated_at = DateTime::from_timestamp(data.updated_at, 0)
            .ok_or_else(|| {
                Error::InvalidData(format!("Invalid user data timestamp: {}", data.updated_at))
            })?
            .to_rfc3339();
        Ok(Self {
            version: data.version,
            updated_at,
            blob: data.blob,
        })
    }
}

/// Error body of a conflict response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Machine-readable code.
    pub code: String,
    /// Human-readable message.
    pub message: String,
}

/// Response to a write whose expected version was stale.
///
/// ```
/// use whereish_core::sync::ConflictResponse;
/// use whereish_core::Error;
///
/// let response = ConflictResponse::from_error(&Error::VersionConflict { current_version: 4 }).unwrap();
/// let json = serde_json::to_string(&response).unwrap();
/// assert!(json.contains(r#""currentVersion":4"#));
/// assert!(json.contains(r#""code":"version_conflict""#));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictResponse {
    /// Version the client must rebase onto.
    pub current_version: i64,
    /// Error details.
    pub error: ErrorBody,
}

impl ConflictResponse {
    /// Builds a conflict response for the given version.
    #[must_use]
    pub fn new(current_version: i64) -> Self {
        Self {
            current_version,
            error: ErrorBody {
                code: VERSION_CONFLICT_CODE.to_string(),
                message: VERSION_CONFLICT_MESSAGE.to_string(),
            },
        }
    }

    /// Returns a conflict response if `err` is a version conflict.
    #[must_use]
    pub fn from_error(err: &Error) -> Option<Self> {
        match err {
            Error::VersionConflict { current_version } => Some(Self::new(*current_version)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_formats_timestamp() {
        let snapshot = UserDataSnapshot::try_from(UserData {
            version: 2,
            updated_at: 1_767_268_800,
            blob: "AAAA".to_string(),
        })
        .unwrap();
        assert_eq!(snapshot.updated_at, "2026-01-01T12:00:00+00:00");

        let json = serde_json::to_string(&snapshot).unwrap();
        assert!(json.contains(r#""updatedAt":"#));
    }

    #[test]
    fn snapshot_rejects_out_of_range_timestamp() {
        let result = UserDataSnapshot::try_from(UserData {
            version: 1,
            updated_at: i64::MAX,
            blob: "AAAA".to_string(),
        });
        assert!(matches!(result, Err(Error::InvalidData(_))));
    }

    #[test]
    fn write_parses_from_wire() {
        let write: UserDataWrite = serde_json::from_str(r#"{"version":3,"blob":"abc"}"#).unwrap();
        assert_eq!(write.version, 3);
    }

    #[test]
    fn conflict_only_from_version_conflict() {
        assert!(ConflictResponse::from_error(&Error::DuplicateRequest).is_none());
        let response =
            ConflictResponse::from_error(&Error::VersionConflict { current_version: 0 }).unwrap();
        assert_eq!(response.current_version, 0);
        assert_eq!(response.error.message, VERSION_CONFLICT_MESSAGE);
    }
}
