//! Tests for Store::merge (compaction)
//!
//! These tests verify:
//! - Merge on an empty log is an error
//! - Values are preserved across merge
//! - Stale records are dropped and the log shrinks
//! - Live tombstones are carried forward
//! - Merged logs replay correctly after restart
//! - A failed rename leaves the index and log untouched
//! - Merge under concurrent access

use std::collections::HashMap;
use std::sync::Arc;
use std::thread;

use tinycask::log::{DataType, LogFile, Record, LOG_FILENAME, MERGE_FILENAME};
use tinycask::{CaskError, Store};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_store() -> (TempDir, Store) {
    let temp_dir = TempDir::new().unwrap();
    let store = Store::open_path(temp_dir.path(), DataType::STRING).unwrap();
    (temp_dir, store)
}

fn snapshot(store: &Store) -> HashMap<Vec<u8>, Vec<u8>> {
    store
        .keys()
        .into_iter()
        .map(|key| {
            let value = store.get(&key).unwrap();
            (key, value)
        })
        .collect()
}

// =============================================================================
// Precondition Tests
// =============================================================================

#[test]
fn test_merge_empty_log_fails() {
    let (_temp, store) = setup_temp_store();

    let result = store.merge();

    assert!(matches!(result, Err(CaskError::NothingToMerge)));
}

// =============================================================================
// Correctness Tests
// =============================================================================

#[test]
fn test_merge_preserves_values() {
    let (_temp, store) = setup_temp_store();
    for round in 0..5 {
        for i in 0..20 {
            store
                .put(format!("key{}", i).as_bytes(), format!("value{}_{}", i, round).as_bytes())
                .unwrap();
        }
    }
    let before = snapshot(&store);

    store.merge().unwrap();

    assert_eq!(snapshot(&store), before);
    assert_eq!(store.get(b"key7").unwrap(), b"value7_4");
}

#[test]
fn test_merge_drops_stale_records() {
    let (temp_dir, store) = setup_temp_store();
    store.put(b"k", b"v1").unwrap();
    store.put(b"k", b"v2").unwrap();
    store.put(b"k", b"v3").unwrap();
    store.put(b"other", b"x").unwrap();

    let size_before = store.log_size();
    let result = store.merge().unwrap();

    let expected_after = Record::put(b"k".to_vec(), b"v3".to_vec(), DataType::STRING).size()
        + Record::put(b"other".to_vec(), b"x".to_vec(), DataType::STRING).size();

    assert_eq!(result.records_scanned, 4);
    assert_eq!(result.records_kept, 2);
    assert_eq!(result.bytes_before, size_before);
    assert_eq!(result.bytes_after, expected_after);
    assert_eq!(store.log_size(), expected_after);
    assert_eq!(
        std::fs::metadata(temp_dir.path().join(LOG_FILENAME)).unwrap().len(),
        expected_after
    );
}

#[test]
fn test_merge_never_grows_log() {
    let (_temp, store) = setup_temp_store();
    for i in 0..50 {
        store.put(format!("unique{}", i).as_bytes(), b"value").unwrap();
    }

    let size_before = store.log_size();
    let result = store.merge().unwrap();

    assert_eq!(result.records_kept, 50);
    assert!(store.log_size() <= size_before);
}

#[test]
fn test_merge_keeps_encounter_order() {
    let (temp_dir, store) = setup_temp_store();
    store.put(b"a", b"1").unwrap();
    store.put(b"b", b"1").unwrap();
    store.put(b"a", b"2").unwrap();
    store.put(b"c", b"1").unwrap();

    store.merge().unwrap();
    store.close().unwrap();

    let log = LogFile::open(&temp_dir.path().join(LOG_FILENAME)).unwrap();
    let keys: Vec<Vec<u8>> = log
        .iter()
        .map(|item| item.unwrap().1.key().to_vec())
        .collect();

    assert_eq!(keys, vec![b"b".to_vec(), b"a".to_vec(), b"c".to_vec()]);
}

#[test]
fn test_merge_removes_merge_file() {
    let (temp_dir, store) = setup_temp_store();
    store.put(b"k", b"v").unwrap();

    store.merge().unwrap();

    assert!(temp_dir.path().join(LOG_FILENAME).exists());
    assert!(!temp_dir.path().join(MERGE_FILENAME).exists());
}

#[test]
fn test_merge_store_usable_afterwards() {
    let (_temp, store) = setup_temp_store();
    store.put(b"k", b"v1").unwrap();
    store.put(b"k", b"v2").unwrap();
    store.merge().unwrap();

    store.put(b"new", b"value").unwrap();
    store.put(b"k", b"v3").unwrap();

    assert_eq!(store.get(b"new").unwrap(), b"value");
    assert_eq!(store.get(b"k").unwrap(), b"v3");

    // A second merge works on the adopted file
    let result = store.merge().unwrap();
    assert_eq!(result.records_scanned, 3);
    assert_eq!(result.records_kept, 2);
}

#[test]
fn test_merge_appends_land_in_canonical_file() {
    let (temp_dir, store) = setup_temp_store();
    store.put(b"k", b"v1").unwrap();
    store.put(b"k", b"v2").unwrap();
    store.merge().unwrap();

    store.put(b"after", b"merge").unwrap();
    store.sync().unwrap();

    let on_disk = std::fs::metadata(temp_dir.path().join(LOG_FILENAME)).unwrap().len();
    assert_eq!(on_disk, store.log_size());
    assert_eq!(store.log_path(), temp_dir.path().join(LOG_FILENAME));
}

#[cfg(unix)]
#[test]
fn test_merge_failed_rename_leaves_store_untouched() {
    let (temp_dir, store) = setup_temp_store();
    store.put(b"k", b"v1").unwrap();
    store.put(b"k", b"v2").unwrap();
    store.put(b"other", b"x").unwrap();
    let size_before = store.log_size();

    // A non-empty directory at the log path makes the rename fail;
    // the store keeps reading through its open handle
    let log_path = temp_dir.path().join(LOG_FILENAME);
    std::fs::remove_file(&log_path).unwrap();
    std::fs::create_dir(&log_path).unwrap();
    std::fs::write(log_path.join("blocker"), b"x").unwrap();

    let err = store.merge().unwrap_err();
    assert!(matches!(err, CaskError::Io(_)));

    assert!(!temp_dir.path().join(MERGE_FILENAME).exists());
    assert_eq!(store.log_size(), size_before);
    assert_eq!(store.get(b"k").unwrap(), b"v2");
    assert_eq!(store.get(b"other").unwrap(), b"x");
    assert_eq!(store.len(), 2);
}

// =============================================================================
// Tombstone Tests
// =============================================================================

#[test]
fn test_merge_carries_live_tombstone() {
    let (_temp, store) = setup_temp_store();
    store.put(b"gone", b"value").unwrap();
    store.delete(b"gone").unwrap();
    store.put(b"kept", b"value").unwrap();

    let result = store.merge().unwrap();

    assert_eq!(result.records_kept, 2);
    assert!(store.contains_key(b"gone"));
    assert!(store.get(b"gone").unwrap().is_empty());
    assert_eq!(store.get(b"kept").unwrap(), b"value");
}

#[test]
fn test_merge_then_restart_drops_tombstoned_key() {
    let temp_dir = TempDir::new().unwrap();
    {
        let store = Store::open_path(temp_dir.path(), DataType::STRING).unwrap();
        store.put(b"gone", b"value").unwrap();
        store.delete(b"gone").unwrap();
        store.put(b"kept", b"value").unwrap();
        store.merge().unwrap();
        store.close().unwrap();
    }

    let store = Store::open_path(temp_dir.path(), DataType::STRING).unwrap();

    assert!(!store.contains_key(b"gone"));
    assert_eq!(store.get(b"kept").unwrap(), b"value");
    assert_eq!(store.len(), 1);
}

#[test]
fn test_merge_with_no_live_records_keeps_log() {
    let temp_dir = TempDir::new().unwrap();
    {
        let store = Store::open_path(temp_dir.path(), DataType::STRING).unwrap();
        store.put(b"k", b"v").unwrap();
        store.delete(b"k").unwrap();
        store.close().unwrap();
    }

    // After restart the index is empty, so nothing in the log is live
    let store = Store::open_path(temp_dir.path(), DataType::STRING).unwrap();
    let size_before = store.log_size();

    let result = store.merge().unwrap();

    assert_eq!(result.records_scanned, 2);
    assert_eq!(result.records_kept, 0);
    assert_eq!(result.bytes_after, size_before);
    assert_eq!(store.log_size(), size_before);
}

// =============================================================================
// Restart Tests
// =============================================================================

#[test]
fn test_merge_then_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let before = {
        let store = Store::open_path(temp_dir.path(), DataType::STRING).unwrap();
        for i in 0..100 {
            store
                .put(format!("key{}", i % 10).as_bytes(), format!("value{}", i).as_bytes())
                .unwrap();
        }
        store.merge().unwrap();
        let before = snapshot(&store);
        store.close().unwrap();
        before
    };

    let store = Store::open_path(temp_dir.path(), DataType::STRING).unwrap();

    assert_eq!(snapshot(&store), before);
    assert_eq!(store.get(b"key3").unwrap(), b"value93");
}

// =============================================================================
// Concurrency Tests
// =============================================================================

#[test]
fn test_merge_concurrent_with_writes() {
    let (_temp, store) = setup_temp_store();
    for i in 0..100 {
        store.put(format!("key{}", i).as_bytes(), b"initial").unwrap();
    }
    let store = Arc::new(store);

    let writer = {
        let store = Arc::clone(&store);
        thread::spawn(move || {
            for i in 0..100 {
                store.put(format!("key{}", i).as_bytes(), b"updated").unwrap();
            }
        })
    };

    let merger = {
        let store = Arc::clone(&store);
        thread::spawn(move || {
            for _ in 0..5 {
                store.merge().unwrap();
            }
        })
    };

    writer.join().unwrap();
    merger.join().unwrap();

    for i in 0..100 {
        assert_eq!(store.get(format!("key{}", i).as_bytes()).unwrap(), b"updated");
    }
}
