//! Volatile `KeyValueStore`.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use tempora_core::errors::StoreError;
use tempora_core::traits::KeyValueStore;

#[derive(Debug)]
pub struct InMemoryStore<V> {
    name: String,
    entries: RwLock<BTreeMap<String, V>>,
    closed: AtomicBool,
}

impl<V> InMemoryStore<V> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: RwLock::new(BTreeMap::new()),
            closed: AtomicBool::new(false),
        }
    }

    fn ensure_open(&self) -> Result<(), StoreError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(StoreError::Closed {
                store: self.name.clone(),
            });
        }
        Ok(())
    }

    fn poisoned(&self) -> StoreError {
        StoreError::Poisoned {
            store: self.name.clone(),
        }
    }
}

impl<V> KeyValueStore<V> for InMemoryStore<V>
where
    V: Clone + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn get(&self, key: &str) -> Result<Option<V>, StoreError> {
        self.ensure_open()?;
        let entries = self.entries.read().map_err(|_| self.poisoned())?;
        Ok(entries.get(key).cloned())
    }

    fn put(&self, key: &str, value: &V) -> Result<(), StoreError> {
        self.ensure_open()?;
        let mut entries = self.entries.write().map_err(|_| self.poisoned())?;
        entries.insert(key.to_string(), value.clone());
        Ok(())
    }

    fn key_set(&self) -> Result<Vec<String>, StoreError> {
        self.ensure_open()?;
        let entries = self.entries.read().map_err(|_| self.poisoned())?;
        Ok(entries.keys().cloned().collect())
    }

    fn remove(&self, key: &str) -> Result<Option<V>, StoreError> {
        self.ensure_open()?;
        let mut entries = self.entries.write().map_err(|_| self.poisoned())?;
        Ok(entries.remove(key))
    }

    fn shutdown(&self) -> Result<(), StoreError> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Err(StoreError::Closed {
                store: self.name.clone(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operations_fail_after_shutdown() {
        let store: InMemoryStore<u32> = InMemoryStore::new("counts");
        store.put("a", &1).unwrap();
        store.shutdown().unwrap();
        assert!(matches!(store.get("a"), Err(StoreError::Closed { .. })));
        assert!(store.shutdown().is_err());
    }

    #[test]
    fn keys_are_sorted() {
        let store: InMemoryStore<u32> = InMemoryStore::new("counts");
        for key in ["b", "c", "a"] {
            store.put(key, &0).unwrap();
        }
        assert_eq!(store.key_set().unwrap(), vec!["a", "b", "c"]);
        assert_eq!(store.remove("b").unwrap(), Some(0));
        assert!(!store.contains_key("b").unwrap());
    }
}
