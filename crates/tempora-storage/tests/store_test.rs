//! Store behaviour over the SQLite and in-memory backends.

use std::collections::BTreeMap;
use std::sync::Arc;

use proptest::prelude::*;
use tempfile::tempdir;

use tempora_core::config::StorageConfig;
use tempora_core::errors::{CloseError, StoreError};
use tempora_core::traits::KeyValueStore;
use tempora_storage::{Database, InMemoryStore, SqliteStore, StoreBundle};

fn disk_config(dir: &std::path::Path) -> StorageConfig {
    StorageConfig {
        directory: Some(dir.to_path_buf()),
        in_memory: false,
    }
}

#[test]
fn sqlite_values_survive_reopen() {
    let dir = tempdir().unwrap();
    {
        let mut bundle = StoreBundle::open(&disk_config(dir.path())).unwrap();
        let store = bundle.store::<Vec<u32>>("readings").unwrap();
        store.put("p1", &vec![1, 2, 3]).unwrap();
        store.put("p2", &vec![]).unwrap();
        bundle.close().unwrap();
    }
    let mut bundle = StoreBundle::open(&disk_config(dir.path())).unwrap();
    let store = bundle.store::<Vec<u32>>("readings").unwrap();
    assert_eq!(store.get("p1").unwrap(), Some(vec![1, 2, 3]));
    assert_eq!(store.key_set().unwrap(), vec!["p1", "p2"]);
    bundle.close().unwrap();
}

#[test]
fn put_overwrites_and_remove_returns_previous() {
    let db = Arc::new(Database::open_in_memory().unwrap());
    let store: SqliteStore<String> = SqliteStore::open(db, "names").unwrap();
    store.put("k", &"first".to_string()).unwrap();
    store.put("k", &"second".to_string()).unwrap();
    assert_eq!(store.len().unwrap(), 1);
    assert_eq!(store.remove("k").unwrap(), Some("second".to_string()));
    assert_eq!(store.remove("k").unwrap(), None);
    assert!(store.is_empty().unwrap());
}

#[test]
fn stores_in_one_database_are_independent() {
    let db = Arc::new(Database::open_in_memory().unwrap());
    let a: SqliteStore<u32> = SqliteStore::open(Arc::clone(&db), "a").unwrap();
    let b: SqliteStore<u32> = SqliteStore::open(db, "b").unwrap();
    a.put("k", &1).unwrap();
    assert!(a.contains_key("k").unwrap());
    assert!(!b.contains_key("k").unwrap());
}

#[test]
fn undecodable_value_is_a_serialization_error() {
    let db = Arc::new(Database::open_in_memory().unwrap());
    let text: SqliteStore<String> = SqliteStore::open(Arc::clone(&db), "shared").unwrap();
    text.put("k", &"not a number".to_string()).unwrap();
    let numbers: SqliteStore<u32> = SqliteStore::open(db, "shared").unwrap();
    assert!(matches!(
        numbers.get("k"),
        Err(StoreError::Serialization { .. })
    ));
}

#[test]
fn closed_sqlite_store_rejects_operations() {
    let db = Arc::new(Database::open_in_memory().unwrap());
    let store: SqliteStore<u32> = SqliteStore::open(db, "counts").unwrap();
    store.shutdown().unwrap();
    assert!(matches!(store.put("k", &1), Err(StoreError::Closed { .. })));
    assert!(matches!(store.key_set(), Err(StoreError::Closed { .. })));
    assert!(matches!(store.shutdown(), Err(StoreError::Closed { .. })));
}

#[test]
fn bundle_close_shuts_down_every_store_once() {
    let mut bundle = StoreBundle::open(&StorageConfig::default()).unwrap();
    let a = bundle.store::<u32>("a").unwrap();
    let b = bundle.store::<u32>("b").unwrap();
    assert_eq!(bundle.len(), 2);
    bundle.close().unwrap();
    assert!(bundle.is_closed());
    assert!(matches!(a.get("k"), Err(StoreError::Closed { .. })));
    assert!(matches!(b.get("k"), Err(StoreError::Closed { .. })));
    // A second close is a no-op.
    bundle.close().unwrap();
    assert!(bundle.store::<u32>("c").is_err());
}

#[test]
fn bundle_close_reports_first_failure_and_closes_the_rest() {
    let mut bundle = StoreBundle::open(&StorageConfig::default()).unwrap();
    let a = bundle.store::<u32>("a").unwrap();
    let b = bundle.store::<u32>("b").unwrap();
    let c = bundle.store::<u32>("c").unwrap();
    a.shutdown().unwrap();

    let err = bundle.close().unwrap_err();
    let CloseError::Failed {
        resource,
        failed,
        total,
        ..
    } = err;
    assert_eq!(resource, "a");
    assert_eq!((failed, total), (1, 3));
    assert!(b.get("k").is_err());
    assert!(c.get("k").is_err());
}

#[test]
fn bundle_without_directory_fails_to_open() {
    let config = StorageConfig {
        directory: None,
        in_memory: false,
    };
    assert!(matches!(
        StoreBundle::open(&config),
        Err(StoreError::Open { .. })
    ));
}

proptest! {
    #[test]
    fn key_set_is_sorted_and_matches_model(
        ops in proptest::collection::vec(("[a-e]{1,2}", any::<Option<u16>>()), 0..40)
    ) {
        let store: InMemoryStore<u16> = InMemoryStore::new("model");
        let db = Arc::new(Database::open_in_memory().unwrap());
        let sqlite: SqliteStore<u16> = SqliteStore::open(db, "model").unwrap();
        let mut model = BTreeMap::new();
        for (key, op) in ops {
            match op {
                Some(value) => {
                    store.put(&key, &value).unwrap();
                    sqlite.put(&key, &value).unwrap();
                    model.insert(key, value);
                }
                None => {
                    store.remove(&key).unwrap();
                    sqlite.remove(&key).unwrap();
                    model.remove(&key);
                }
            }
        }
        let expected: Vec<String> = model.keys().cloned().collect();
        prop_assert_eq!(store.key_set().unwrap(), expected.clone());
        prop_assert_eq!(sqlite.key_set().unwrap(), expected);
        for (key, value) in &model {
            prop_assert_eq!(sqlite.get(key).unwrap(), Some(*value));
        }
    }
}
