//! Recipient resolution and mutation through the `Store` facade.

mod support;

use keyscope::core::cipher::MockCrypto;
use keyscope::core::domain::Scope;
use keyscope::core::manifest;
use keyscope::core::storage::MemoryStorage;
use keyscope::error::{Error, ManifestError, RecipientError};
use keyscope::Context;
use support::*;

fn scope(dir: &str) -> Scope {
    Scope::new(dir).unwrap()
}

#[test]
fn test_empty_store_has_no_recipients() {
    let storage = MemoryStorage::new();
    let store = memory_store(&storage, &MockCrypto::new());
    let ctx = Context::background();

    assert_eq!(store.get_recipients(&ctx, "").unwrap(), Vec::<String>::new());
    assert!(store.get_recipients(&ctx, "any/deep/path").unwrap().is_empty());
    assert!(store.recipients(&ctx, "x").is_empty());
}

#[test]
fn test_subscope_manifest_applies_to_descendants() {
    let storage = MemoryStorage::new().with_file(".gpg-id", format!("{}\n", JANE));
    let crypto = MockCrypto::new();
    let store = memory_store(&storage, &crypto);
    let ctx = Context::background();

    store
        .mutator()
        .save(&ctx, &scope("foo/bar"), &ids(&[JOHN]), "sub", true)
        .unwrap();

    assert_eq!(store.get_recipients(&ctx, "foo/bar/baz").unwrap(), ids(&[JOHN]));
    assert_eq!(store.get_recipients(&ctx, "foo/baz").unwrap(), ids(&[JANE]));
    assert_eq!(store.get_recipients(&ctx, "").unwrap(), ids(&[JANE]));
}

#[test]
fn test_deeper_manifest_masks_instead_of_merging() {
    let storage = MemoryStorage::new()
        .with_file(".gpg-id", "a\n")
        .with_file("sub/.gpg-id", "b\n");
    let store = memory_store(&storage, &MockCrypto::new());

    assert_eq!(
        store
            .get_recipients(&Context::background(), "sub/secret")
            .unwrap(),
        ids(&["b"])
    );
}

#[test]
fn test_save_into_missing_root_reads_back_exactly() {
    let storage = MemoryStorage::new();
    let store = memory_store(&storage, &MockCrypto::new());

    store
        .mutator()
        .save(&Context::background(), &Scope::root(), &ids(&[JOHN]), "msg", true)
        .unwrap();

    let written = storage.contents(".gpg-id").unwrap();
    assert_eq!(manifest::decode(&written), ids(&[JOHN]));
    assert_eq!(storage.changes()[0].description, "msg");
}

#[test]
fn test_add_appends_in_order_and_save_persists_it() {
    let storage = MemoryStorage::new().with_file(".gpg-id", "0xA\n0xB\n");
    let store = memory_store(&storage, &MockCrypto::new());
    let ctx = Context::background();

    store.add_recipient(&ctx, "0xC").unwrap();
    assert_eq!(
        store.get_recipients(&ctx, "").unwrap(),
        ids(&["0xA", "0xB", "0xC"])
    );

    store.save_recipients(&ctx).unwrap();
    assert_eq!(storage.contents(".gpg-id").unwrap(), b"0xA\n0xB\n0xC\n");
    let last = storage.changes().pop().unwrap();
    assert_eq!(last.description, "Save Recipients");
}

#[test]
fn test_remove_recipient() {
    let storage =
        MemoryStorage::new().with_file(".gpg-id", format!("{}\n{}\n", DEADBEEF, FEEDBEEF));
    let store = memory_store(&storage, &MockCrypto::new());
    let ctx = Context::background();

    store.remove_recipient(&ctx, DEADBEEF).unwrap();

    assert_eq!(store.get_recipients(&ctx, "").unwrap(), ids(&[FEEDBEEF]));
}

#[test]
fn test_add_is_idempotent() {
    let storage = MemoryStorage::new().with_file(".gpg-id", "a\n");
    let store = memory_store(&storage, &MockCrypto::new());
    let ctx = Context::background();

    store.add_recipient_at(&ctx, &scope("team"), "b").unwrap();
    let once = store.get_recipients(&ctx, "team/x").unwrap();
    let second = store.add_recipient_at(&ctx, &scope("team"), "b").unwrap();

    assert!(second.change.is_noop());
    assert_eq!(store.get_recipients(&ctx, "team/x").unwrap(), once);
    assert_eq!(storage.changes().len(), 1);
}

#[test]
fn test_remove_unknown_id_is_noop() {
    let storage = MemoryStorage::new().with_file(".gpg-id", "a\n");
    let store = memory_store(&storage, &MockCrypto::new());

    let update = store
        .remove_recipient(&Context::background(), "nobody")
        .unwrap();

    assert!(update.change.is_noop());
    assert_eq!(storage.contents(".gpg-id").unwrap(), b"a\n");
}

#[test]
fn test_remove_last_root_recipient_leaves_manifest_unchanged() {
    let storage = MemoryStorage::new().with_file(".gpg-id", "# owner\na\n");
    let store = memory_store(&storage, &MockCrypto::new());

    let err = store
        .remove_recipient(&Context::background(), "a")
        .unwrap_err();

    assert!(matches!(
        err,
        Error::Recipient(RecipientError::WouldRemoveLastRootRecipient)
    ));
    assert_eq!(storage.contents(".gpg-id").unwrap(), b"# owner\na\n");
    assert!(storage.changes().is_empty());
}

#[test]
fn test_emptied_subscope_keeps_file_and_inherits() {
    let storage = MemoryStorage::new()
        .with_file(".gpg-id", "root\n")
        .with_file("team/.gpg-id", "member\n")
        .with_file("team/db.gpg", sealed(&["member"], "pw"));
    let store = memory_store(&storage, &MockCrypto::new());
    let ctx = Context::background();

    let update = store
        .remove_recipient_at(&ctx, &scope("team"), "member")
        .unwrap();

    assert_eq!(update.change.new, ids(&["root"]));
    assert_eq!(storage.contents("team/.gpg-id").unwrap(), b"");
    assert_eq!(store.get_recipients(&ctx, "team/db").unwrap(), ids(&["root"]));

    let ct = storage.contents("team/db.gpg").unwrap();
    assert_eq!(MockCrypto::recipients_of(&ct), Some(ids(&["root"])));
}

#[test]
fn test_remove_still_granted_by_parent_is_refused() {
    let storage = MemoryStorage::new()
        .with_file(".gpg-id", "A\nB\n")
        .with_file("team/.gpg-id", "B\n")
        .with_file("team/s.gpg", sealed(&["B"], "s"));
    let store = memory_store(&storage, &MockCrypto::new());
    let ctx = Context::background();
    let before = storage.contents("team/s.gpg");

    let err = store
        .remove_recipient_at(&ctx, &scope("team"), "B")
        .unwrap_err();

    assert!(matches!(
        err,
        Error::Recipient(RecipientError::StillInherited { .. })
    ));
    assert_eq!(store.get_recipients(&ctx, "team/s").unwrap(), ids(&["B"]));
    assert_eq!(storage.contents("team/s.gpg"), before);
    assert!(storage.changes().is_empty());
}

#[test]
fn test_remove_inherited_id_at_bare_subscope_changes_nothing() {
    let storage = MemoryStorage::new()
        .with_file(".gpg-id", "A\n")
        .with_file("team/s.gpg", sealed(&["A"], "s"));
    let store = memory_store(&storage, &MockCrypto::new());

    let err = store
        .remove_recipient_at(&Context::background(), &scope("team"), "A")
        .unwrap_err();

    assert!(matches!(
        err,
        Error::Recipient(RecipientError::StillInherited { .. })
    ));
    assert!(storage.contents("team/.gpg-id").is_none());
    assert!(storage.changes().is_empty());
}

#[test]
fn test_save_without_overwrite_refuses_existing_manifest() {
    let storage = MemoryStorage::new().with_file("team/.gpg-id", "a\n");
    let store = memory_store(&storage, &MockCrypto::new());

    let err = store
        .mutator()
        .save(&Context::background(), &scope("team"), &ids(&["b"]), "x", false)
        .unwrap_err();

    assert!(matches!(err, Error::Manifest(ManifestError::AlreadyExists(_))));
    assert_eq!(storage.contents("team/.gpg-id").unwrap(), b"a\n");
}

#[test]
fn test_unrecognized_recipient_is_written_with_warning() {
    let storage = MemoryStorage::new().with_file(".gpg-id", "known\n");
    let crypto = MockCrypto::new().recognizing(["known"]);
    let store = memory_store(&storage, &crypto);

    let update = store
        .add_recipient(&Context::background(), "stranger")
        .unwrap();

    assert_eq!(
        update.change.warnings,
        vec![RecipientError::NotRecognized("stranger".to_string())]
    );
    assert_eq!(storage.contents(".gpg-id").unwrap(), b"known\nstranger\n");
}

#[test]
fn test_invalid_recipient_is_rejected() {
    let storage = MemoryStorage::new().with_file(".gpg-id", "known\n");
    let crypto = MockCrypto::new().rejecting(["revoked"]);
    let store = memory_store(&storage, &crypto);

    let err = store
        .add_recipient(&Context::background(), "revoked")
        .unwrap_err();

    assert!(matches!(err, Error::Recipient(RecipientError::Invalid(_))));
    assert!(storage.changes().is_empty());
}

#[test]
fn test_malformed_ids_are_rejected() {
    let storage = MemoryStorage::new().with_file(".gpg-id", "a\n");
    let store = memory_store(&storage, &MockCrypto::new());
    let ctx = Context::background();

    assert!(matches!(
        store.add_recipient(&ctx, "   "),
        Err(Error::Validation(_))
    ));
    assert!(matches!(
        store.add_recipient(&ctx, "#comment"),
        Err(Error::Validation(_))
    ));
    assert!(matches!(
        store.add_recipient_at(&ctx, &Scope::root(), "a\nb"),
        Err(Error::Validation(_))
    ));
    assert!(Scope::new("../escape").is_err());
}

#[test]
fn test_list_recipients_is_union_over_scopes() {
    let storage = MemoryStorage::new()
        .with_file(".gpg-id", "0xB\n0xA\n")
        .with_file("one.gpg", "x")
        .with_file("team/.gpg-id", "0xC\n0xA\n")
        .with_file("team/two.gpg", "x");
    let store = memory_store(&storage, &MockCrypto::new());

    assert_eq!(
        store.list_recipients(&Context::background()).unwrap(),
        ids(&["0xA", "0xB", "0xC"])
    );
}

#[test]
fn test_scopes_and_governing_scope() {
    let storage = MemoryStorage::new()
        .with_file(".gpg-id", "a\n")
        .with_file("team/.gpg-id", "b\n")
        .with_file("team/ops/key.gpg", "x");
    let store = memory_store(&storage, &MockCrypto::new());
    let ctx = Context::background();

    let scopes = store.scopes(&ctx).unwrap();
    assert_eq!(scopes.len(), 2);
    assert_eq!(scopes[1].scope, scope("team"));
    assert_eq!(scopes[1].recipients, ids(&["b"]));

    assert_eq!(
        store.resolver().governing_scope(&ctx, "team/ops/key").unwrap(),
        Some(scope("team"))
    );
    assert_eq!(
        store.resolver().list_secrets(&ctx, &Scope::root()).unwrap(),
        ids(&["team/ops/key"])
    );
}

#[test]
fn test_unreadable_manifest_propagates() {
    let storage = MemoryStorage::new().with_file(".gpg-id", "a\n");
    storage.fail_reads_of(".gpg-id");
    let store = memory_store(&storage, &MockCrypto::new());

    assert!(matches!(
        store.get_recipients(&Context::background(), "x"),
        Err(Error::Manifest(ManifestError::ReadFailed { .. }))
    ));
}

#[test]
fn test_filesystem_store_resolves_and_mutates() {
    let t = Test::new();
    let alice = t.key("alice");
    let bob = t.key("bob");
    t.write(".gpg-id", format!("{}\n", alice.public));
    let store = t.store_as(&alice);
    let ctx = Context::background();

    store.add_recipient_at(&ctx, &scope("shared"), &bob.public).unwrap();

    let manifest = std::fs::read_to_string(t.root().join("shared/.gpg-id")).unwrap();
    assert_eq!(manifest, format!("{}\n{}\n", alice.public, bob.public));
    assert_eq!(
        store.get_recipients(&ctx, "shared/x").unwrap(),
        vec![alice.public.clone(), bob.public.clone()]
    );
    assert_eq!(store.get_recipients(&ctx, "x").unwrap(), vec![alice.public]);
}
