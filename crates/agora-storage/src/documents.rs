//! # Document Store
//!
//! Typed JSON documents over a [`KeyValueStore`].
//!
//! Each document is stored under `<collection>:<key>`. All access goes
//! through one `RwLock`: reads share it, and every write (including the
//! whole of a read-modify-write or a transaction) holds it exclusively.

use crate::adapters::storage::{FileBackedKVStore, InMemoryKVStore};
use crate::domain::collections::Collection;
use crate::domain::errors::{KVStoreError, StoreError};
use crate::ports::outbound::{BatchOperation, KeyValueStore};
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;

pub struct DocumentStore {
    kv: RwLock<Box<dyn KeyValueStore>>,
}

impl DocumentStore {
    pub fn new<KV: KeyValueStore + 'static>(kv: KV) -> Self {
        Self {
            kv: RwLock::new(Box::new(kv)),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(InMemoryKVStore::new())
    }

    /// Open a file-backed store, loading any existing snapshot.
    pub fn open_file<P: AsRef<Path>>(path: P) -> Result<Self, KVStoreError> {
        FileBackedKVStore::open(path).map(Self::new)
    }

    pub fn get<T: DeserializeOwned>(
        &self,
        collection: Collection,
        key: &str,
    ) -> Result<Option<T>, StoreError> {
        let kv = self.kv.read();
        read_doc(&**kv, collection, key)
    }

    pub fn exists(&self, collection: Collection, key: &str) -> Result<bool, StoreError> {
        Ok(self.kv.read().exists(&collection.key(key))?)
    }

    /// Store a new document.
    ///
    /// # Errors
    ///
    /// `StoreError::Conflict` if the key is already taken.
    pub fn insert<T: Serialize>(
        &self,
        collection: Collection,
        key: &str,
        doc: &T,
    ) -> Result<(), StoreError> {
        let mut kv = self.kv.write();
        let full_key = collection.key(key);
        if kv.exists(&full_key)? {
            return Err(StoreError::Conflict {
                collection: collection.name(),
                key: key.to_string(),
            });
        }
        kv.put(&full_key, &encode_doc(collection, key, doc)?)?;
        Ok(())
    }

    pub fn upsert<T: Serialize>(
        &self,
        collection: Collection,
        key: &str,
        doc: &T,
    ) -> Result<(), StoreError> {
        let bytes = encode_doc(collection, key, doc)?;
        self.kv.write().put(&collection.key(key), &bytes)?;
        Ok(())
    }

    /// Read-modify-write under the write lock.
    ///
    /// Returns `Ok(None)` when the document does not exist. If `f` fails the
    /// document is left untouched.
    pub fn update<T, R, E, F>(&self, collection: Collection, key: &str, f: F) -> Result<Option<R>, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce(&mut T) -> Result<R, E>,
        E: From<StoreError>,
    {
        let mut kv = self.kv.write();
        let Some(mut doc) = read_doc::<T>(&**kv, collection, key)? else {
            return Ok(None);
        };
        let result = f(&mut doc)?;
        let bytes = encode_doc(collection, key, &doc)?;
        kv.put(&collection.key(key), &bytes)
            .map_err(StoreError::from)?;
        Ok(Some(result))
    }

    /// Delete a document, returning what was stored.
    pub fn remove<T: DeserializeOwned>(
        &self,
        collection: Collection,
        key: &str,
    ) -> Result<Option<T>, StoreError> {
        let mut kv = self.kv.write();
        let existing = read_doc::<T>(&**kv, collection, key)?;
        if existing.is_some() {
            kv.delete(&collection.key(key))?;
        }
        Ok(existing)
    }

    /// Every document in a collection, in no particular order.
    pub fn scan<T: DeserializeOwned>(&self, collection: Collection) -> Result<Vec<T>, StoreError> {
        let kv = self.kv.read();
        let prefix = collection.prefix();
        kv.prefix_scan(&prefix)?
            .into_iter()
            .map(|(k, v)| {
                let key = String::from_utf8_lossy(&k[prefix.len()..]).into_owned();
                decode_doc(collection, &key, &v)
            })
            .collect()
    }

    /// Run `f` against a staged view of the store and commit its writes as
    /// one atomic batch. Nothing is written if `f` fails.
    pub fn transaction<R, E, F>(&self, f: F) -> Result<R, E>
    where
        F: FnOnce(&mut Transaction<'_>) -> Result<R, E>,
        E: From<StoreError>,
    {
        let mut kv = self.kv.write();
        let mut tx = Transaction::new(&**kv);
        let result = f(&mut tx)?;
        let operations = tx.into_operations();
        if !operations.is_empty() {
            kv.atomic_batch_write(operations)
                .map_err(StoreError::from)?;
        }
        Ok(result)
    }
}

/// Staged writes inside [`DocumentStore::transaction`]. Reads see staged
/// writes first, then the committed store.
pub struct Transaction<'a> {
    kv: &'a dyn KeyValueStore,
    staged: HashMap<Vec<u8>, Option<Vec<u8>>>,
}

impl<'a> Transaction<'a> {
    fn new(kv: &'a dyn KeyValueStore) -> Self {
        Self {
            kv,
            staged: HashMap::new(),
        }
    }

    pub fn get<T: DeserializeOwned>(
        &self,
        collection: Collection,
        key: &str,
    ) -> Result<Option<T>, StoreError> {
        match self.staged.get(&collection.key(key)) {
            Some(Some(bytes)) => decode_doc(collection, key, bytes).map(Some),
            Some(None) => Ok(None),
            None => read_doc(self.kv, collection, key),
        }
    }

    pub fn exists(&self, collection: Collection, key: &str) -> Result<bool, StoreError> {
        let full_key = collection.key(key);
        match self.staged.get(&full_key) {
            Some(staged) => Ok(staged.is_some()),
            None => Ok(self.kv.exists(&full_key)?),
        }
    }

    /// Every document in a collection as this transaction sees it.
    pub fn scan<T: DeserializeOwned>(&self, collection: Collection) -> Result<Vec<T>, StoreError> {
        let prefix = collection.prefix();
        let mut merged: HashMap<Vec<u8>, Vec<u8>> =
            self.kv.prefix_scan(&prefix)?.into_iter().collect();
        for (key, value) in self.staged.iter().filter(|(k, _)| k.starts_with(&prefix)) {
            match value {
                Some(bytes) => {
                    merged.insert(key.clone(), bytes.clone());
                }
                None => {
                    merged.remove(key);
                }
            }
        }
        merged
            .into_iter()
            .map(|(k, v)| {
                let key = String::from_utf8_lossy(&k[prefix.len()..]).into_owned();
                decode_doc(collection, &key, &v)
            })
            .collect()
    }

    pub fn insert<T: Serialize>(
        &mut self,
        collection: Collection,
        key: &str,
        doc: &T,
    ) -> Result<(), StoreError> {
        if self.exists(collection, key)? {
            return Err(StoreError::Conflict {
                collection: collection.name(),
                key: key.to_string(),
            });
        }
        self.upsert(collection, key, doc)
    }

    pub fn upsert<T: Serialize>(
        &mut self,
        collection: Collection,
        key: &str,
        doc: &T,
    ) -> Result<(), StoreError> {
        let bytes = encode_doc(collection, key, doc)?;
        self.staged.insert(collection.key(key), Some(bytes));
        Ok(())
    }

    pub fn remove(&mut self, collection: Collection, key: &str) {
        self.staged.insert(collection.key(key), None);
    }

    fn into_operations(self) -> Vec<BatchOperation> {
        self.staged
            .into_iter()
            .map(|(key, value)| match value {
                Some(value) => BatchOperation::Put { key, value },
                None => BatchOperation::Delete { key },
            })
            .collect()
    }
}

fn read_doc<T: DeserializeOwned>(
    kv: &dyn KeyValueStore,
    collection: Collection,
    key: &str,
) -> Result<Option<T>, StoreError> {
    match kv.get(&collection.key(key))? {
        Some(bytes) => decode_doc(collection, key, &bytes).map(Some),
        None => Ok(None),
    }
}

fn decode_doc<T: DeserializeOwned>(
    collection: Collection,
    key: &str,
    bytes: &[u8],
) -> Result<T, StoreError> {
    serde_json::from_slice(bytes).map_err(|e| StoreError::Serialization {
        collection: collection.name(),
        key: key.to_string(),
        message: e.to_string(),
    })
}

fn encode_doc<T: Serialize>(
    collection: Collection,
    key: &str,
    doc: &T,
) -> Result<Vec<u8>, StoreError> {
    serde_json::to_vec(doc).map_err(|e| StoreError::Serialization {
        collection: collection.name(),
        key: key.to_string(),
        message: e.to_string(),
    })
}
