use crate::domain::errors::KVStoreError;
use crate::ports::outbound::{BatchOperation, KeyValueStore, ScanResult};
use std::collections::HashMap;

/// In-memory key-value store.
///
/// Used when no data path is configured, and throughout the tests. Contents
/// are lost on restart.
#[derive(Default)]
pub struct InMemoryKVStore {
    data: HashMap<Vec<u8>, Vec<u8>>,
}

impl InMemoryKVStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl KeyValueStore for InMemoryKVStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KVStoreError> {
        Ok(self.data.get(key).cloned())
    }

    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), KVStoreError> {
        self.data.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> Result<(), KVStoreError> {
        self.data.remove(key);
        Ok(())
    }

    fn atomic_batch_write(&mut self, operations: Vec<BatchOperation>) -> Result<(), KVStoreError> {
        // Nothing here can fail part-way.
        for op in operations {
            match op {
                BatchOperation::Put { key, value } => {
                    self.data.insert(key, value);
                }
                BatchOperation::Delete { key } => {
                    self.data.remove(&key);
                }
            }
        }
        Ok(())
    }

    fn exists(&self, key: &[u8]) -> Result<bool, KVStoreError> {
        Ok(self.data.contains_key(key))
    }

    fn prefix_scan(&self, prefix: &[u8]) -> Result<ScanResult, KVStoreError> {
        Ok(self
            .data
            .iter()
            .filter(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_kv_store() {
        let mut store = InMemoryKVStore::new();

        store.put(b"user:ada", b"{}").unwrap();
        store.put(b"user:bob", b"{}").unwrap();

        assert_eq!(store.get(b"user:ada").unwrap(), Some(b"{}".to_vec()));
        assert_eq!(store.get(b"user:eve").unwrap(), None);
        assert!(store.exists(b"user:bob").unwrap());

        store.delete(b"user:bob").unwrap();
        assert!(!store.exists(b"user:bob").unwrap());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_batch_write_mixes_puts_and_deletes() {
        let mut store = InMemoryKVStore::new();
        store.put(b"chat:1", b"old").unwrap();

        store
            .atomic_batch_write(vec![
                BatchOperation::put(b"message:1".to_vec(), b"m1".to_vec()),
                BatchOperation::put(b"message:2".to_vec(), b"m2".to_vec()),
                BatchOperation::delete(b"chat:1".to_vec()),
            ])
            .unwrap();

        assert_eq!(store.get(b"message:2").unwrap(), Some(b"m2".to_vec()));
        assert_eq!(store.get(b"chat:1").unwrap(), None);
    }

    #[test]
    fn test_prefix_scan() {
        let mut store = InMemoryKVStore::new();

        store.put(b"chat:1", b"a").unwrap();
        store.put(b"chat:2", b"b").unwrap();
        store.put(b"user:1", b"c").unwrap();

        assert_eq!(store.prefix_scan(b"chat:").unwrap().len(), 2);
        assert_eq!(store.prefix_scan(b"user:").unwrap().len(), 1);
        assert!(store.prefix_scan(b"whiteboard:").unwrap().is_empty());
    }
}
