use crate::errors::StoreError;

/// A persistent map from key id to `V`, one per concern of stateful execution.
pub trait KeyValueStore<V>: Send + Sync {
    fn name(&self) -> &str;

    fn get(&self, key: &str) -> Result<Option<V>, StoreError>;

    fn put(&self, key: &str, value: &V) -> Result<(), StoreError>;

    fn contains_key(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.get(key)?.is_some())
    }

    /// All keys in ascending order.
    fn key_set(&self) -> Result<Vec<String>, StoreError>;

    fn remove(&self, key: &str) -> Result<Option<V>, StoreError>;

    /// Flush and release. Later calls fail with `StoreError::Closed`.
    fn shutdown(&self) -> Result<(), StoreError>;
}
