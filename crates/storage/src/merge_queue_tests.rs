// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tempfile::tempdir;

fn open_store() -> (tempfile::TempDir, MergeQueueStore) {
    let dir = tempdir().unwrap();
    let store = MergeQueueStore::open(dir.path().join("merge-queue")).unwrap();
    (dir, store)
}

#[test]
fn enqueue_and_list() {
    let (_dir, store) = open_store();
    let id = store.enqueue("ovs/builder-1", "builder-1", 1_000).unwrap();

    let entries = store.list(None).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].id, id);
    assert_eq!(entries[0].branch, "ovs/builder-1");
    assert_eq!(entries[0].status, MergeStatus::Queued);
    assert!(entries[0].tier.is_none());
}

#[test]
fn update_status_and_tier() {
    let (_dir, store) = open_store();
    let id = store.enqueue("ovs/builder-1", "builder-1", 1_000).unwrap();

    store.update_status(&id, MergeStatus::Merging, Some(1), 2_000).unwrap();
    let entry = store.get(&id).unwrap().unwrap();
    assert_eq!(entry.status, MergeStatus::Merging);
    assert_eq!(entry.tier, Some(1));
    assert_eq!(entry.updated_at, 2_000);

    // tier is sticky when not supplied
    store.update_status(&id, MergeStatus::Merged, None, 3_000).unwrap();
    let entry = store.get(&id).unwrap().unwrap();
    assert_eq!(entry.status, MergeStatus::Merged);
    assert_eq!(entry.tier, Some(1));
}

#[test]
fn list_filters_by_status() {
    let (_dir, store) = open_store();
    let a = store.enqueue("b-a", "a", 1_000).unwrap();
    store.enqueue("b-b", "b", 2_000).unwrap();
    store.update_status(&a, MergeStatus::Merged, None, 3_000).unwrap();

    let queued = store.list(Some(MergeStatus::Queued)).unwrap();
    assert_eq!(queued.len(), 1);
    assert_eq!(queued[0].branch, "b-b");
}

#[test]
fn update_unknown_entry_is_not_found() {
    let (_dir, store) = open_store();
    let err = store
        .update_status(&MergeId::from_string("mrg-none"), MergeStatus::Failed, None, 1_000)
        .unwrap_err();
    assert!(matches!(err, StorageError::NotFound { .. }));
}
