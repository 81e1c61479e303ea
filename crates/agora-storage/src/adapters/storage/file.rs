use crate::domain::errors::KVStoreError;
use crate::ports::outbound::{BatchOperation, KeyValueStore, ScanResult};
use std::collections::HashMap;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

type Data = HashMap<Vec<u8>, Vec<u8>>;

/// File-backed key-value store.
///
/// The whole data set is held in memory and snapshotted to a single file on
/// every mutation. Snapshot format: `[key_len:u32 LE][key][value_len:u32 LE][value]...`
///
/// Writes go to a temp file that is synced and renamed over the snapshot,
/// so a crash leaves either the old or the new snapshot. A mutation whose
/// snapshot cannot be written is not applied in memory either.
pub struct FileBackedKVStore {
    data: Data,
    path: PathBuf,
}

impl FileBackedKVStore {
    /// Open the store at `path`, loading any existing snapshot.
    ///
    /// A missing file is an empty store. A truncated tail is ignored.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, KVStoreError> {
        let path = path.as_ref().to_path_buf();

        let data = match std::fs::read(&path) {
            Ok(bytes) => {
                let data = decode(&bytes);
                info!(
                    path = %path.display(),
                    bytes = bytes.len(),
                    keys = data.len(),
                    "Loaded storage snapshot"
                );
                data
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(path = %path.display(), "No existing storage file, starting empty");
                HashMap::new()
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Self { data, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    fn commit(&mut self, operations: Vec<BatchOperation>) -> Result<(), KVStoreError> {
        let mut next = self.data.clone();
        for op in operations {
            match op {
                BatchOperation::Put { key, value } => {
                    next.insert(key, value);
                }
                BatchOperation::Delete { key } => {
                    next.remove(&key);
                }
            }
        }
        self.save_to_file(&next)?;
        self.data = next;
        Ok(())
    }

    fn save_to_file(&self, data: &Data) -> Result<(), KVStoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let temp_path = self.path.with_extension("tmp");
        let mut file = std::fs::File::create(&temp_path)?;
        file.write_all(&encode(data))?;
        file.sync_all()?;
        std::fs::rename(&temp_path, &self.path)?;
        Ok(())
    }
}

fn encode(data: &Data) -> Vec<u8> {
    // Sorted so identical contents produce identical snapshots.
    let mut entries: Vec<_> = data.iter().collect();
    entries.sort();

    let mut bytes = Vec::new();
    for (key, value) in entries {
        bytes.extend_from_slice(&(key.len() as u32).to_le_bytes());
        bytes.extend_from_slice(key);
        bytes.extend_from_slice(&(value.len() as u32).to_le_bytes());
        bytes.extend_from_slice(value);
    }
    bytes
}

fn decode(bytes: &[u8]) -> Data {
    let mut data = HashMap::new();
    let mut cursor = 0;

    while cursor < bytes.len() {
        let Some((key, after_key)) = read_chunk(bytes, cursor) else {
            break;
        };
        let Some((value, after_value)) = read_chunk(bytes, after_key) else {
            break;
        };
        data.insert(key.to_vec(), value.to_vec());
        cursor = after_value;
    }

    if cursor < bytes.len() {
        warn!(
            offset = cursor,
            ignored_bytes = bytes.len() - cursor,
            "Ignoring truncated tail of storage snapshot"
        );
    }
    data
}

/// Read one length-prefixed chunk starting at `at`. Returns the chunk and
/// the offset just past it.
fn read_chunk(bytes: &[u8], at: usize) -> Option<(&[u8], usize)> {
    let len_bytes: [u8; 4] = bytes.get(at..at + 4)?.try_into().ok()?;
    let len = u32::from_le_bytes(len_bytes) as usize;
    let start = at + 4;
    let chunk = bytes.get(start..start.checked_add(len)?)?;
    Some((chunk, start + len))
}

impl KeyValueStore for FileBackedKVStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KVStoreError> {
        Ok(self.data.get(key).cloned())
    }

    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), KVStoreError> {
        self.commit(vec![BatchOperation::put(key, value)])
    }

    fn delete(&mut self, key: &[u8]) -> Result<(), KVStoreError> {
        self.commit(vec![BatchOperation::delete(key)])
    }

    fn atomic_batch_write(&mut self, operations: Vec<BatchOperation>) -> Result<(), KVStoreError> {
        self.commit(operations)
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
