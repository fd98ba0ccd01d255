//! Runtime configuration.
//!
//! [`CoreConfig`] can be built in code with the `with_*` methods, parsed
//! from JSON (missing fields take defaults), or read from environment
//! variables.
//!
//! | Variable                      | Field                         | Default       |
//! |-------------------------------|-------------------------------|---------------|
//! | `DATABASE_URL`                | `database_path`               | `whereish.db` |
//! | `WHEREISH_PBKDF2_ITERATIONS`  | `backup.iterations`           | 100000        |
//! | `WHEREISH_LEGACY_ITERATIONS`  | `backup.legacy_iteration_fallback` | `true`   |
//! | `WHEREISH_MAX_BACKUP_BYTES`   | `max_backup_bytes`            | 10240         |
//! | `WHEREISH_MAX_LOCATION_BYTES` | `max_location_blob_bytes`     | 4096          |
//! | `WHEREISH_MAX_USER_DATA_BYTES`| `max_user_data_bytes`         | 1048576       |

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::crypto::BackupParams;
use crate::error::{Error, Result};

/// Default database file.
pub const DEFAULT_DATABASE_PATH: &str = "whereish.db";

/// Default limit on a stored identity backup.
pub const DEFAULT_MAX_BACKUP_BYTES: usize = 10 * 1024;

/// Default limit on one encoded location blob.
pub const DEFAULT_MAX_LOCATION_BLOB_BYTES: usize = 4 * 1024;

/// Default limit on the encoded sync blob.
pub const DEFAULT_MAX_USER_DATA_BYTES: usize = 1024 * 1024;

/// Configuration for [`WhereishCore`](crate::WhereishCore).
///
/// # Example
///
/// ```
/// use whereish_core::CoreConfig;
///
/// let config = CoreConfig::from_json(r#"{"max_backup_bytes": 20480}"#).unwrap();
/// assert_eq!(config.max_backup_bytes, 20480);
/// assert_eq!(config.max_location_blob_bytes, 4096);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// `SQLite` database file.
    pub database_path: PathBuf,

    /// Key derivation parameters for identity backups.
    pub backup: BackupParams,

    /// Maximum encoded size of an identity backup.
    pub max_backup_bytes: usize,

    /// Maximum encoded size of one location blob.
    pub max_location_blob_bytes: usize,

    /// Maximum encoded size of the sync blob.
    pub max_user_data_bytes: usize,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from(DEFAULT_DATABASE_PATH),
            backup: BackupParams::default(),
            max_backup_bytes: DEFAULT_MAX_BACKUP_BYTES,
            max_location_blob_bytes: DEFAULT_MAX_LOCATION_BLOB_BYTES,
            max_user_data_bytes: DEFAULT_MAX_USER_DATA_BYTES,
        }
    }
}

impl CoreConfig {
    /// Parses configuration from JSON and validates it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidData`] for malformed JSON, or any error from
    /// [`validate`](Self::validate).
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidData`] if a variable is set but unparsable,
    /// or any error from [`validate`](Self::validate).
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds configuration from an arbitrary variable lookup.
    ///
    /// Empty values count as unset.
    ///
    /// # Errors
    ///
    /// As [`from_env`](Self::from_env).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let mut config = Self::default();

        if let Some(path) = get("DATABASE_URL") {
            config.database_path = PathBuf::from(path);
        }
        if let Some(iterations) = get("WHEREISH_PBKDF2_ITERATIONS") {
            let iterations = parse_var("WHEREISH_PBKDF2_ITERATIONS", &iterations)?;
            config.backup = BackupParams::new(iterations)?
                .with_legacy_iteration_fallback(config.backup.legacy_iteration_fallback());
        }
        if let Some(fallback) = get("WHEREISH_LEGACY_ITERATIONS") {
            let fallback = parse_var("WHEREISH_LEGACY_ITERATIONS", &fallback)?;
            config.backup = config.backup.with_legacy_iteration_fallback(fallback);
        }
        if let Some(limit) = get("WHEREISH_MAX_BACKUP_BYTES") {
            config.max_backup_bytes = parse_var("WHEREISH_MAX_BACKUP_BYTES", &limit)?;
        }
        if let Some(limit) = get("WHEREISH_MAX_LOCATION_BYTES") {
            config.max_location_blob_bytes = parse_var("WHEREISH_MAX_LOCATION_BYTES", &limit)?;
        }
        if let Some(limit) = get("WHEREISH_MAX_USER_DATA_BYTES") {
            config.max_user_data_bytes = parse_var("WHEREISH_MAX_USER_DATA_BYTES", &limit)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Sets the database path.
    #[must_use]
    pub fn with_database_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.database_path = path.into();
        self
    }

    /// Sets the backup parameters.
    #[must_use]
    pub fn with_backup_params(mut self, params: BackupParams) -> Self {
        self.backup = params;
        self
    }

    /// Sets the identity backup size limit.
    #[must_use]
    pub fn with_max_backup_bytes(mut self, limit: usize) -> Self {
        self.max_backup_bytes = limit;
        self
    }

    /// Sets the per-blob location size limit.
    #[must_use]
    pub fn with_max_location_blob_bytes(mut self, limit: usize) -> Self {
        self.max_location_blob_bytes = limit;
        self
    }

    /// Sets the sync blob size limit.
    #[must_use]
    pub fn with_max_user_data_bytes(mut self, limit: usize) -> Self {
        self.max_user_data_bytes = limit;
        self
    }

    /// Checks that the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Crypto`] if the iteration count is below the minimum
    /// (allowed under the `test-utils` feature), or
    /// [`Error::InvalidRequest`] if any size limit is zero.
    pub fn validate(&self) -> Result<()> {
        self.backup.validate()?;
        for (name, limit) in [
            ("max_backup_bytes", self.max_backup_bytes),
            ("max_location_blob_bytes", self.max_location_blob_bytes),
            ("max_user_data_bytes", self.max_user_data_bytes),
        ] {
            if limit == 0 {
                return Err(Error::InvalidRequest(format!("{name} must be positive")));
            }
        }
        Ok(())
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| Error::InvalidData(format!("{key}: {e}")))
}
