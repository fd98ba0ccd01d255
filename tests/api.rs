//! Integration tests for the `WhereishCore` facade.

mod helpers;

use helpers::{befriend, cleanup_dir, open_core, register, test_params, unique_temp_dir};
use whereish_core::crypto::encrypt_identity;
use whereish_core::{CoreConfig, Error, Principal, WhereishCore};

#[test]
fn state_persists_across_reopen() {
    let dir = unique_temp_dir("reopen");
    let (alice_id, bob_id) = {
        let core = open_core(&dir);
        let alice = register(&core, "Alice");
        let bob = register(&core, "Bob");
        befriend(&core, &alice, &bob);
        let backup = encrypt_identity(&alice.identity, "1234", &test_params()).unwrap();
        core.put_identity_backup(&alice.principal, &backup).unwrap();
        core.put_user_data(&alice.principal, "blob", 0).unwrap();
        (alice.user.id, bob.user.id)
    };

    let core = open_core(&dir);
    let alice = Principal::new(alice_id);
    let me = core.current_user(&alice).unwrap();
    assert!(me.has_public_key && me.has_identity_backup && me.has_user_data);
    assert_eq!(core.list_contacts(&alice).unwrap()[0].contact_id, bob_id);
    assert_eq!(core.get_user_data(&alice).unwrap().version, 1);

    cleanup_dir(&dir);
}

#[test]
fn current_user_serializes_camel_case() {
    let dir = unique_temp_dir("me_json");
    let core = open_core(&dir);
    let alice = register(&core, "Alice");

    let json = serde_json::to_value(core.current_user(&alice.principal).unwrap()).unwrap();
    assert_eq!(json["email"], "alice@example.com");
    assert_eq!(json["hasPublicKey"], true);
    assert_eq!(json["hasIdentityBackup"], false);
    assert_eq!(json["hasUserData"], false);

    cleanup_dir(&dir);
}

#[test]
fn duplicate_email_is_rejected_case_insensitively() {
    let dir = unique_temp_dir("dup_email");
    let core = open_core(&dir);
    core.register_user("alice@example.com", "Alice").unwrap();

    assert!(matches!(
        core.register_user("ALICE@example.com", "Impostor"),
        Err(Error::AlreadyExists(_))
    ));

    cleanup_dir(&dir);
}

#[test]
fn invalid_config_is_rejected_before_opening() {
    let dir = unique_temp_dir("bad_config");
    let config = CoreConfig::default()
        .with_database_path(dir.join("whereish.db"))
        .with_backup_params(test_params())
        .with_max_location_blob_bytes(0);

    assert!(matches!(
        WhereishCore::open(config),
        Err(Error::InvalidRequest(_))
    ));
    assert!(!dir.join("whereish.db").exists());

    cleanup_dir(&dir);
}

#[test]
fn stop_sharing_clears_only_own_blobs() {
    let dir = unique_temp_dir("stop_sharing");
    let core = open_core(&dir);
    let alice = register(&core, "Alice");
    let bob = register(&core, "Bob");
    befriend(&core, &alice, &bob);

    let to_bob = whereish_core::location::encrypt_location_b64(
        &whereish_core::location::LocationData::new().with_level("city", "Seattle"),
        &alice.identity,
        &bob.identity.public_key_base64(),
    )
    .unwrap();
    let to_alice = whereish_core::location::encrypt_location_b64(
        &whereish_core::location::LocationData::new().with_level("city", "Tacoma"),
        &bob.identity,
        &alice.identity.public_key_base64(),
    )
    .unwrap();
    core.share_locations(
        &alice.principal,
        &[whereish_core::store::LocationShare::new(&bob.user.id, to_bob)],
    )
    .unwrap();
    core.share_locations(
        &bob.principal,
        &[whereish_core::store::LocationShare::new(&alice.user.id, to_alice)],
    )
    .unwrap();

    assert_eq!(core.stop_sharing(&alice.principal).unwrap(), 1);
    assert!(core.get_locations(&bob.principal).unwrap().is_empty());
    assert_eq!(core.get_locations(&alice.principal).unwrap().len(), 1);
    assert_eq!(core.stop_sharing(&alice.principal).unwrap(), 0);

    cleanup_dir(&dir);
}
