//! Integration tests for identity backup and restore.
//!
//! Covers the full device-migration path: a backup is created on one
//! device, stored through the core, fetched on another device and opened
//! with the PIN.

mod helpers;

use helpers::{cleanup_dir, open_core, register, test_params, unique_temp_dir};
use whereish_core::crypto::{
    change_pin, decrypt_identity, encrypt_identity, CryptoError, Identity, IdentityBackup,
};
use whereish_core::Error;

#[test]
fn backup_survives_storage_and_restores_on_new_device() {
    let dir = unique_temp_dir("restore");
    let core = open_core(&dir);
    let alice = register(&core, "Alice");

    let backup = encrypt_identity(&alice.identity, "4821", &test_params()).unwrap();
    core.put_identity_backup(&alice.principal, &backup).unwrap();

    // "New device": only the PIN and the stored JSON are available.
    let fetched = core.get_identity_backup(&alice.principal).unwrap();
    let json = fetched.to_json().unwrap();
    let restored = decrypt_identity(&IdentityBackup::from_json(&json).unwrap(), "4821", &test_params())
        .unwrap();

    assert_eq!(restored.public_key(), alice.identity.public_key());
    assert_eq!(
        core.current_user(&alice.principal).unwrap().public_key,
        Some(restored.public_key_base64())
    );

    cleanup_dir(&dir);
}

#[test]
fn wrong_pin_cannot_open_stored_backup() {
    let dir = unique_temp_dir("wrong_pin");
    let core = open_core(&dir);
    let alice = register(&core, "Alice");

    let backup = encrypt_identity(&alice.identity, "4821", &test_params()).unwrap();
    core.put_identity_backup(&alice.principal, &backup).unwrap();
    let fetched = core.get_identity_backup(&alice.principal).unwrap();

    assert_eq!(
        decrypt_identity(&fetched, "4822", &test_params()).unwrap_err(),
        CryptoError::DecryptionFailed
    );

    cleanup_dir(&dir);
}

#[test]
fn replacing_backup_after_pin_change() {
    let dir = unique_temp_dir("pin_change");
    let core = open_core(&dir);
    let alice = register(&core, "Alice");

    let original = encrypt_identity(&alice.identity, "1111", &test_params()).unwrap();
    core.put_identity_backup(&alice.principal, &original).unwrap();

    let rotated = change_pin(&original, "1111", "2222", &test_params()).unwrap();
    core.put_identity_backup(&alice.principal, &rotated).unwrap();

    let fetched = core.get_identity_backup(&alice.principal).unwrap();
    assert_eq!(fetched, rotated);
    assert!(decrypt_identity(&fetched, "1111", &test_params()).is_err());
    let restored = decrypt_identity(&fetched, "2222", &test_params()).unwrap();
    assert_eq!(restored.public_key(), alice.identity.public_key());

    cleanup_dir(&dir);
}

#[test]
fn legacy_record_without_iterations_uses_fallback() {
    let identity = Identity::generate().unwrap();
    let params = test_params();
    let backup = encrypt_identity(&identity, "9999", &params).unwrap();

    let mut value: serde_json::Value = serde_json::from_str(&backup.to_json().unwrap()).unwrap();
    value.as_object_mut().unwrap().remove("iterations");
    let legacy = IdentityBackup::from_json(&value.to_string()).unwrap();
    assert_eq!(legacy.iterations, 0);

    let restored = decrypt_identity(&legacy, "9999", &params).unwrap();
    assert_eq!(restored.public_key(), identity.public_key());

    let strict = params.with_legacy_iteration_fallback(false);
    assert!(matches!(
        decrypt_identity(&legacy, "9999", &strict),
        Err(CryptoError::UnsupportedBackup(_))
    ));
}

#[test]
fn server_rejects_structurally_broken_backups() {
    let dir = unique_temp_dir("broken");
    let core = open_core(&dir);
    let alice = register(&core, "Alice");
    let good = encrypt_identity(&alice.identity, "4821", &test_params()).unwrap();

    let mut unknown_algorithm = good.clone();
    unknown_algorithm.algorithm = "ChaCha20-Poly1305".into();
    let mut empty_payload = good.clone();
    empty_payload.payload = String::new();
    let mut huge_iterations = good;
    huge_iterations.iterations = u32::MAX;

    for backup in [unknown_algorithm, empty_payload, huge_iterations] {
        assert!(matches!(
            core.put_identity_backup(&alice.principal, &backup),
            Err(Error::InvalidRequest(_))
        ));
    }
    assert!(matches!(
        core.get_identity_backup(&alice.principal),
        Err(Error::NotFound(_))
    ));

    cleanup_dir(&dir);
}

#[test]
fn backup_removed_with_account() {
    let dir = unique_temp_dir("account_delete");
    let core = open_core(&dir);
    let alice = register(&core, "Alice");
    let backup = encrypt_identity(&alice.identity, "4821", &test_params()).unwrap();
    core.put_identity_backup(&alice.principal, &backup).unwrap();

    core.delete_account(&alice.principal).unwrap();

    let again = core
        .register_user("alice@example.com", "Alice")
        .expect("email is free again");
    let principal = whereish_core::Principal::from(&again);
    assert!(matches!(
        core.get_identity_backup(&principal),
        Err(Error::NotFound(_))
    ));

    cleanup_dir(&dir);
}
