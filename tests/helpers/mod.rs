//! Shared fixtures for the integration tests.
//!
//! Stores are opened on real files under a per-test temporary directory so
//! that several `SqliteStore` handles can contend for the same database.

#![allow(dead_code)]

use std::env;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing_subscriber::EnvFilter;
use whereish_core::crypto::{BackupParams, Identity};
use whereish_core::store::{SqliteStore, User};
use whereish_core::{CoreConfig, Principal, WhereishCore};

/// Atomic counter for unique test directory names.
static HELPER_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Iteration count used in tests; far below the production floor.
pub const TEST_ITERATIONS: u32 = 1_000;

/// Installs a test-writer subscriber once. Honors `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

/// Creates a unique temporary directory for test isolation.
pub fn unique_temp_dir(prefix: &str) -> PathBuf {
    let id = HELPER_COUNTER.fetch_add(1, Ordering::SeqCst);
    let dir = env::temp_dir().join(format!(
        "whereish_test_{}_{}_{}",
        prefix,
        std::process::id(),
        id
    ));
    std::fs::create_dir_all(&dir).expect("should create temp dir");
    dir
}

/// Removes a temporary test directory. Ignores errors silently.
pub fn cleanup_dir(dir: &Path) {
    let _ = std::fs::remove_dir_all(dir);
}

/// Low-cost backup parameters.
pub const fn test_params() -> BackupParams {
    BackupParams::insecure_for_tests(TEST_ITERATIONS)
}

/// Opens a file-backed store in `dir`. Each call is an independent handle.
pub fn open_store(dir: &Path) -> Arc<SqliteStore> {
    Arc::new(SqliteStore::open(&dir.join("whereish.db")).expect("should open store"))
}

/// Opens a core over the database in `dir`.
pub fn open_core(dir: &Path) -> WhereishCore<SqliteStore> {
    let config = CoreConfig::default()
        .with_database_path(dir.join("whereish.db"))
        .with_backup_params(test_params());
    WhereishCore::open(config).expect("should open core")
}

/// A registered user with a registered identity.
pub struct TestUser {
    pub user: User,
    pub principal: Principal,
    pub identity: Identity,
}

/// Registers a user and their public key.
pub fn register(core: &WhereishCore<SqliteStore>, name: &str) -> TestUser {
    let email = format!("{}@example.com", name.to_lowercase());
    let user = core.register_user(&email, name).expect("should register");
    let principal = Principal::from(&user);
    let identity = Identity::generate().expect("should generate identity");
    core.register_public_key(&principal, &identity.public_key_base64())
        .expect("should register key");
    TestUser {
        user,
        principal,
        identity,
    }
}

/// Makes `a` and `b` mutual contacts via request and accept.
pub fn befriend(core: &WhereishCore<SqliteStore>, a: &TestUser, b: &TestUser) {
    let request = core
        .send_contact_request(&a.principal, &b.user.email)
        .expect("should send request");
    core.accept_contact_request(&b.principal, &request.id)
        .expect("should accept request");
}
