//! `SQLite` implementation of the repository traits.
//!
//! All access goes through one `Mutex<Connection>`. Multi-statement
//! operations run inside `BEGIN IMMEDIATE` transactions, so the write lock
//! is taken before the first read and a concurrent writer in another
//! process cannot interleave between a check and the write it guards.
//!
//! # Invariants enforced by the schema
//!
//! - At most one `pending` request per unordered user pair (partial unique
//!   index over `min(requester, recipient), max(requester, recipient)`)
//! - One sync blob, one identity backup, and one location blob per directed
//!   pair (primary keys)
//! - Deleting a user cascades to every row that references them

// SQLite operations need to hold the lock for the duration of the operation.
#![allow(clippy::significant_drop_tightening)]

use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use tracing::{debug, warn};

use super::types::{normalize_email, EncryptedLocation, LocationShare, User, UserData};
use super::{ContactRepository, LocationRepository, UserRepository};
use crate::contacts::{Contact, ContactRequest, RequestStatus};
use crate::crypto::{IdentityBackup, PublicKey};
use crate::error::{Error, Result};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const REQUEST_COLUMNS: &str =
    "id, requester_id, recipient_id, status, created_at, accepted_at";

type RequestRow = (String, String, String, String, i64, Option<i64>);

/// `SQLite`-backed [`Store`](super::Store).
///
/// Thread-safe: share it behind an `Arc`.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Opens (or creates) a database file and initializes the schema.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or initialized.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch(
            "PRAGMA foreign_keys = ON;
             PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;",
        )?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.initialize_schema()?;
        debug!(path = %path.display(), "opened sqlite store");
        Ok(store)
    }

    /// Creates an in-memory store for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be initialized.
    #[cfg(any(test, feature = "test-utils"))]
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.initialize_schema()?;
        Ok(store)
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| Error::Storage(format!("Failed to acquire database lock: {e}")))
    }

    fn initialize_schema(&self) -> Result<()> {
        let conn = self.conn()?;

        conn.execute_batch(
            r"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                email TEXT NOT NULL UNIQUE,
                name TEXT NOT NULL,
                public_key TEXT,
                created_at INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS identity_backups (
                user_id TEXT PRIMARY KEY REFERENCES users(id) ON DELETE CASCADE,
                algorithm TEXT NOT NULL,
                kdf TEXT NOT NULL,
                iterations INTEGER NOT NULL,
                salt TEXT NOT NULL,
                iv TEXT NOT NULL,
                payload TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            );

            -- Self-encrypted sync blob, version-guarded
            CREATE TABLE IF NOT EXISTS user_data (
                user_id TEXT PRIMARY KEY REFERENCES users(id) ON DELETE CASCADE,
                version INTEGER NOT NULL CHECK (version >= 1),
                blob TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS contact_requests (
                id TEXT PRIMARY KEY,
                requester_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                recipient_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                status TEXT NOT NULL DEFAULT 'pending'
                    CHECK (status IN ('pending', 'accepted', 'declined')),
                created_at INTEGER NOT NULL,
                accepted_at INTEGER,
                CHECK (requester_id <> recipient_id)
            );

            CREATE UNIQUE INDEX IF NOT EXISTS idx_contact_requests_pending_pair
                ON contact_requests (min(requester_id, recipient_id), max(requester_id, recipient_id))
                WHERE status = 'pending';
            CREATE INDEX IF NOT EXISTS idx_contact_requests_recipient
                ON contact_requests (recipient_id, status);
            CREATE INDEX IF NOT EXISTS idx_contact_requests_requester
                ON contact_requests (requester_id, status);

            -- Directed trust edges; always written and removed in pairs
            CREATE TABLE IF NOT EXISTS contacts (
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                contact_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                created_at INTEGER NOT NULL,
                PRIMARY KEY (user_id, contact_id)
            );

            CREATE TABLE IF NOT EXISTS encrypted_locations (
                from_user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                to_user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                blob TEXT NOT NULL,
                updated_at INTEGER NOT NULL,
                PRIMARY KEY (from_user_id, to_user_id)
            );
            CREATE INDEX IF NOT EXISTS idx_encrypted_locations_to
                ON encrypted_locations (to_user_id);
            ",
        )?;

        Ok(())
    }
}

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                || e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
    )
}

fn is_foreign_key_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY
    )
}

fn into_request(row: RequestRow) -> Result<ContactRequest> {
    let (id, requester_id, recipient_id, status_str, created_at, accepted_at) = row;
    let status = RequestStatus::parse(&status_str)
        .ok_or_else(|| Error::InvalidData(format!("Invalid request status: {status_str}")))?;
    Ok(ContactRequest {
        id,
        requester_id,
        recipient_id,
        status,
        created_at,
        accepted_at,
    })
}

fn query_request(conn: &Connection, request_id: &str) -> Result<Option<ContactRequest>> {
    let row: Option<RequestRow> = conn
        .query_row(
            &format!("SELECT {REQUEST_COLUMNS} FROM contact_requests WHERE id = ?1"),
            params![request_id],
            |row| {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                    row.get(5)?,
                ))
            },
        )
        .optional()?;
    row.map(into_request).transpose()
}

fn query_pending_requests(conn: &Connection, column: &str, user_id: &str) -> Result<Vec<ContactRequest>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {REQUEST_COLUMNS} FROM contact_requests
         WHERE {column} = ?1 AND status = 'pending'
         ORDER BY created_at DESC, rowid DESC"
    ))?;

    let rows = stmt
        .query_map(params![user_id], |row| {
            Ok((
                row.get(0)?,
                row.get(1)?,
                row.get(2)?,
                row.get(3)?,
                row.get(4)?,
                row.get(5)?,
            ))
        })?
        .collect::<std::result::Result<Vec<RequestRow>, _>>()?;

    rows.into_iter().map(into_request).collect()
}

fn edge_exists(conn: &Connection, user_id: &str, contact_id: &str) -> Result<bool> {
    let exists = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM contacts WHERE user_id = ?1 AND contact_id = ?2)",
        params![user_id, contact_id],
        |row| row.get(0),
    )?;
    Ok(exists)
}

/// Fails with [`Error::NotFound`] unless `user_id` is a registered user.
fn require_user_row(conn: &Connection, user_id: &str) -> Result<()> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM users WHERE id = ?1)",
        params![user_id],
        |row| row.get(0),
    )?;
    if !exists {
        return Err(Error::NotFound(format!("user {user_id}")));
    }
    Ok(())
}

fn current_version(conn: &Connection, user_id: &str) -> Result<i64> {
    let version: Option<i64> = conn
        .query_row(
            "SELECT version FROM user_data WHERE user_id = ?1",
            params![user_id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(version.unwrap_or(0))
}

fn query_user_data(conn: &Connection, user_id: &str) -> Result<Option<UserData>> {
    let data = conn
        .query_row(
            "SELECT version, updated_at, blob FROM user_data WHERE user_id = ?1",
            params![user_id],
            |row| {
                Ok(UserData {
                    version: row.get(0)?,
                    updated_at: row.get(1)?,
                    blob: row.get(2)?,
                })
            },
        )
        .optional()?;
    Ok(data)
}

fn delete_between(conn: &Connection, user_id: &str, other_id: &str) -> Result<usize> {
    let rows = conn.execute(
        "DELETE FROM encrypted_locations
         WHERE (from_user_id = ?1 AND to_user_id = ?2)
            OR (from_user_id = ?2 AND to_user_id = ?1)",
        params![user_id, other_id],
    )?;
    Ok(rows)
}

fn query_user(conn: &Connection, column: &str, value: &str) -> Result<Option<User>> {
    let user = conn
        .query_row(
            &format!("SELECT id, email, name, public_key, created_at FROM users WHERE {column} = ?1"),
            params![value],
            |row| {
                Ok(User {
                    id: row.get(0)?,
                    email: row.get(1)?,
                    name: row.get(2)?,
                    public_key: row.get(3)?,
                    created_at: row.get(4)?,
                })
            },
        )
        .optional()?;
    Ok(user)
}

// ==================== Users ====================

impl UserRepository for SqliteStore {
    fn create_user(&self, email: &str, name: &str) -> Result<User> {
        let email = normalize_email(email);
        if email.is_empty() {
            return Err(Error::InvalidRequest("email is required".to_string()));
        }
        let user = User {
            id: uuid::Uuid::new_v4().to_string(),
            email,
            name: name.trim().to_string(),
            public_key: None,
            created_at: now(),
        };

        let conn = self.conn()?;
        match conn.execute(
            "INSERT INTO users (id, email, name, public_key, created_at) VALUES (?1, ?2, ?3, NULL, ?4)",
            params![&user.id, &user.email, &user.name, user.created_at],
        ) {
            Ok(_) => Ok(user),
            Err(e) if is_unique_violation(&e) => {
                Err(Error::AlreadyExists(format!("user {}", user.email)))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn get_user(&self, user_id: &str) -> Result<Option<User>> {
        let conn = self.conn()?;
        query_user(&conn, "id", user_id)
    }

    fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let conn = self.conn()?;
        query_user(&conn, "email", &normalize_email(email))
    }

    fn update_user_name(&self, user_id: &str, name: &str) -> Result<()> {
        let conn = self.conn()?;
        let rows = conn.execute(
            "UPDATE users SET name = ?1 WHERE id = ?2",
            params![name.trim(), user_id],
        )?;
        if rows == 0 {
            return Err(Error::NotFound(format!("user {user_id}")));
        }
        Ok(())
    }

    fn delete_user(&self, user_id: &str) -> Result<()> {
        let conn = self.conn()?;
        let rows = conn.execute("DELETE FROM users WHERE id = ?1", params![user_id])?;
        if rows == 0 {
            return Err(Error::NotFound(format!("user {user_id}")));
        }
        Ok(())
    }

    fn set_public_key(&self, user_id: &str, public_key: &PublicKey) -> Result<()> {
        let conn = self.conn()?;
        let rows = conn.execute(
            "UPDATE users SET public_key = ?1 WHERE id = ?2",
            params![public_key.to_base64(), user_id],
        )?;
        if rows == 0 {
            return Err(Error::NotFound(format!("user {user_id}")));
        }
        Ok(())
    }

    fn get_identity_backup(&self, user_id: &str) -> Result<Option<IdentityBackup>> {
        let conn = self.conn()?;
        let backup = conn
            .query_row(
                "SELECT algorithm, kdf, iterations, salt, iv, payload
                 FROM identity_backups WHERE user_id = ?1",
                params![user_id],
                |row| {
                    Ok(IdentityBackup {
                        algorithm: row.get(0)?,
                        kdf: row.get(1)?,
                        iterations: row.get(2)?,
                        salt: row.get(3)?,
                        iv: row.get(4)?,
                        payload: row.get(5)?,
                    })
                },
            )
            .optional()?;
        Ok(backup)
    }

    fn set_identity_backup(&self, user_id: &str, backup: &IdentityBackup) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            r"
            INSERT INTO identity_backups (user_id, algorithm, kdf, iterations, salt, iv, payload, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT(user_id) DO UPDATE SET
                algorithm = excluded.algorithm,
                kdf = excluded.kdf,
                iterations = excluded.iterations,
                salt = excluded.salt,
                iv = excluded.iv,
                payload = excluded.payload,
                updated_at = excluded.updated_at
            ",
            params![
                user_id,
                &backup.algorithm,
                &backup.kdf,
                backup.iterations,
                &backup.salt,
                &backup.iv,
                &backup.payload,
                now(),
            ],
        )
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                Error::NotFound(format!("user {user_id}"))
            } else {
                e.into()
            }
        })?;
        Ok(())
    }

    fn delete_identity_backup(&self, user_id: &str) -> Result<bool> {
        let conn = self.conn()?;
        let rows = conn.execute(
            "DELETE FROM identity_backups WHERE user_id = ?1",
            params![user_id],
        )?;
        Ok(rows > 0)
    }

    fn get_user_data(&self, user_id: &str) -> Result<Option<UserData>> {
        let conn = self.conn()?;
        query_user_data(&conn, user_id)
    }

    fn set_user_data(&self, user_id: &str, blob: &str, expected_version: i64) -> Result<UserData> {
        if expected_version < 0 {
            return Err(Error::InvalidRequest(format!(
                "expected version must not be negative, got {expected_version}"
            )));
        }

        let mut conn = self.conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        require_user_row(&tx, user_id)?;
        let timestamp = now();

        if expected_version == 0 {
            match tx.execute(
                "INSERT INTO user_data (user_id, version, blob, updated_at) VALUES (?1, 1, ?2, ?3)",
                params![user_id, blob, timestamp],
            ) {
                Ok(_) => {}
                Err(e) if is_unique_violation(&e) => {
                    let current_version = current_version(&tx, user_id)?;
                    warn!(user_id, current_version, "user data first-write conflict");
                    return Err(Error::VersionConflict { current_version });
                }
                Err(e) => return Err(e.into()),
            }
        } else {
            let rows = tx.execute(
                "UPDATE user_data SET version = version + 1, blob = ?1, updated_at = ?2
                 WHERE user_id = ?3 AND version = ?4",
                params![blob, timestamp, user_id, expected_version],
            )?;
            if rows == 0 {
                let current_version = current_version(&tx, user_id)?;
                warn!(
                    user_id,
                    expected_version, current_version, "user data version conflict"
                );
                return Err(Error::VersionConflict { current_version });
            }
        }

        let data = query_user_data(&tx, user_id)?
            .ok_or_else(|| Error::Storage("user data vanished inside transaction".to_string()))?;
        tx.commit()?;
        Ok(data)
    }
}

// ==================== Contacts ====================

impl ContactRepository for SqliteStore {
    fn create_request(&self, requester_id: &str, recipient_id: &str) -> Result<ContactRequest> {
        if requester_id == recipient_id {
            return Err(Error::InvalidRequest(
                "cannot send a contact request to yourself".to_string(),
            ));
        }

        let mut conn = self.conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        require_user_row(&tx, requester_id)?;
        require_user_row(&tx, recipient_id)?;

        if edge_exists(&tx, requester_id, recipient_id)? {
            return Err(Error::AlreadyContacts);
        }

        let pending: bool = tx.query_row(
            "SELECT EXISTS(
                SELECT 1 FROM contact_requests
                WHERE status = 'pending'
                  AND ((requester_id = ?1 AND recipient_id = ?2)
                    OR (requester_id = ?2 AND recipient_id = ?1)))",
            params![requester_id, recipient_id],
            |row| row.get(0),
        )?;
        if pending {
            return Err(Error::DuplicateRequest);
        }

        let request = ContactRequest {
            id: uuid::Uuid::new_v4().to_string(),
            requester_id: requester_id.to_string(),
            recipient_id: recipient_id.to_string(),
            status: RequestStatus::Pending,
            created_at: now(),
            accepted_at: None,
        };

        match tx.execute(
            "INSERT INTO contact_requests (id, requester_id, recipient_id, status, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                &request.id,
                &request.requester_id,
                &request.recipient_id,
                request.status.as_str(),
                request.created_at,
            ],
        ) {
            Ok(_) => {}
            Err(e) if is_unique_violation(&e) => return Err(Error::DuplicateRequest),
            Err(e) => return Err(e.into()),
        }

        tx.commit()?;
        Ok(request)
    }

    fn get_request(&self, request_id: &str) -> Result<Option<ContactRequest>> {
        let conn = self.conn()?;
        query_request(&conn, request_id)
    }

    fn list_incoming_requests(&self, user_id: &str) -> Result<Vec<ContactRequest>> {
        let conn = self.conn()?;
        query_pending_requests(&conn, "recipient_id", user_id)
    }

    fn list_outgoing_requests(&self, user_id: &str) -> Result<Vec<ContactRequest>> {
        let conn = self.conn()?;
        query_pending_requests(&conn, "requester_id", user_id)
    }

    fn accept_request(&self, request_id: &str, acting_user_id: &str) -> Result<ContactRequest> {
        let mut conn = self.conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let not_found = || Error::NotFound(format!("contact request {request_id}"));
        let request = query_request(&tx, request_id)?.ok_or_else(not_found)?;
        if request.recipient_id != acting_user_id || request.status != RequestStatus::Pending {
            return Err(not_found());
        }

        let accepted_at = now();
        let rows = tx.execute(
            "UPDATE contact_requests SET status = 'accepted', accepted_at = ?1
             WHERE id = ?2 AND status = 'pending'",
            params![accepted_at, request_id],
        )?;
        if rows != 1 {
            return Err(not_found());
        }

        for (user_id, contact_id) in [
            (&request.requester_id, &request.recipient_id),
            (&request.recipient_id, &request.requester_id),
        ] {
            tx.execute(
                "INSERT INTO contacts (user_id, contact_id, created_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(user_id, contact_id) DO NOTHING",
                params![user_id, contact_id, accepted_at],
            )?;
        }

        tx.commit()?;
        Ok(ContactRequest {
            status: RequestStatus::Accepted,
            accepted_at: Some(accepted_at),
            ..request
        })
    }

    fn decline_request(&self, request_id: &str, acting_user_id: &str) -> Result<()> {
        let conn = self.conn()?;
        let rows = conn.execute(
            "UPDATE contact_requests SET status = 'declined'
             WHERE id = ?1 AND recipient_id = ?2 AND status = 'pending'",
            params![request_id, acting_user_id],
        )?;
        if rows == 0 {
            return Err(Error::NotFound(format!("contact request {request_id}")));
        }
        Ok(())
    }

    fn cancel_request(&self, request_id: &str, acting_user_id: &str) -> Result<()> {
        let conn = self.conn()?;
        let rows = conn.execute(
            "DELETE FROM contact_requests
             WHERE id = ?1 AND requester_id = ?2 AND status = 'pending'",
            params![request_id, acting_user_id],
        )?;
        if rows == 0 {
            return Err(Error::NotFound(format!("contact request {request_id}")));
        }
        Ok(())
    }

    fn are_contacts(&self, user_id: &str, other_id: &str) -> Result<bool> {
        let conn = self.conn()?;
        edge_exists(&conn, user_id, other_id)
    }

    fn remove_contact(&self, user_id: &str, contact_id: &str) -> Result<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let edges = tx.execute(
            "DELETE FROM contacts
             WHERE (user_id = ?1 AND contact_id = ?2)
                OR (user_id = ?2 AND contact_id = ?1)",
            params![user_id, contact_id],
        )?;
        if edges == 0 {
            return Err(Error::NotFound(format!("contact {contact_id}")));
        }
        let locations = delete_between(&tx, user_id, contact_id)?;

        tx.commit()?;
        debug!(edges, locations, "removed contact pair");
        Ok(())
    }

    fn list_contacts(&self, user_id: &str) -> Result<Vec<Contact>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r"
            SELECT c.user_id, c.contact_id, u.name, u.email, u.public_key, c.created_at
            FROM contacts c
            JOIN users u ON u.id = c.contact_id
            WHERE c.user_id = ?1
            ORDER BY u.name COLLATE NOCASE, c.contact_id
            ",
        )?;

        let contacts = stmt
            .query_map(params![user_id], |row| {
                Ok(Contact {
                    user_id: row.get(0)?,
                    contact_id: row.get(1)?,
                    name: row.get(2)?,
                    email: row.get(3)?,
                    public_key: row.get(4)?,
                    created_at: row.get(5)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(contacts)
    }
}

// ==================== Locations ====================

impl LocationRepository for SqliteStore {
    fn get_locations_for_user(&self, user_id: &str) -> Result<Vec<EncryptedLocation>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r"
            SELECT from_user_id, to_user_id, blob, updated_at
            FROM encrypted_locations
            WHERE to_user_id = ?1
            ORDER BY updated_at DESC, from_user_id
            ",
        )?;

        let locations = stmt
            .query_map(params![user_id], |row| {
                Ok(EncryptedLocation {
                    from_user_id: row.get(0)?,
                    to_user_id: row.get(1)?,
                    blob: row.get(2)?,
                    updated_at: row.get(3)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(locations)
    }

    fn set_locations(&self, from_user_id: &str, shares: &[LocationShare]) -> Result<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        require_user_row(&tx, from_user_id)?;
        let timestamp = now();

        {
            let mut upsert = tx.prepare(
                r"
                INSERT INTO encrypted_locations (from_user_id, to_user_id, blob, updated_at)
                VALUES (?1, ?2, ?3, ?4)
                ON CONFLICT(from_user_id, to_user_id) DO UPDATE SET
                    blob = excluded.blob,
                    updated_at = excluded.updated_at
                ",
            )?;

            for share in shares {
                if !edge_exists(&tx, from_user_id, &share.to_user_id)? {
                    return Err(Error::InvalidRequest(format!(
                        "{} is not a contact",
                        share.to_user_id
                    )));
                }
                upsert.execute(params![from_user_id, &share.to_user_id, &share.blob, timestamp])?;
            }
        }

        tx.commit()?;
        Ok(())
    }

    fn delete_locations_from_user(&self, user_id: &str) -> Result<usize> {
        let conn = self.conn()?;
        let rows = conn.execute(
            "DELETE FROM encrypted_locations WHERE from_user_id = ?1",
            params![user_id],
        )?;
        Ok(rows)
    }

    fn delete_locations_between(&self, user_id: &str, other_id: &str) -> Result<usize> {
        let conn = self.conn()?;
        delete_between(&conn, user_id, other_id)
    }
}
