//! Model store backed by the storage layer.

use std::io::{Read, Write};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::Result;
use crate::repository::ModelStore;
use crate::storage::file::FileStorage;
use crate::storage::memory::MemoryStorage;
use crate::storage::{Storage, StorageConfig};

/// Default file name of the model record.
pub const DEFAULT_MODEL_NAME: &str = "intent_model.bin";

/// Stores the model record as one named file.
///
/// A write goes to `<name>.tmp` first and is renamed over `<name>` once
/// complete, so readers see either the previous record or the new one.
#[derive(Debug)]
pub struct StorageModelStore {
    storage: Arc<dyn Storage>,
    name: String,
    write_lock: Mutex<()>,
}

impl StorageModelStore {
    pub fn new<S: Into<String>>(storage: Arc<dyn Storage>, name: S) -> Self {
        StorageModelStore {
            storage,
            name: name.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// A store in `directory`, created if missing.
    pub fn open_dir<P: AsRef<std::path::Path>>(directory: P) -> Result<Self> {
        let storage = FileStorage::new(directory, StorageConfig::default())?;
        Ok(Self::new(Arc::new(storage), DEFAULT_MODEL_NAME))
    }

    /// A store that lives only as long as the process.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new_default()), DEFAULT_MODEL_NAME)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    fn temp_name(&self) -> String {
        format!("{}.tmp", self.name)
    }
}

impl ModelStore for StorageModelStore {
    fn write(&self, record: &[u8]) -> Result<()> {
        let _guard = self.write_lock.lock();
        let temp = self.temp_name();

        let mut output = self.storage.create_output(&temp)?;
        output.write_all(record)?;
        output.close()?;
        drop(output);

        self.storage.rename_file(&temp, &self.name)
    }

    fn read_latest(&self) -> Result<Option<Vec<u8>>> {
        if !self.storage.file_exists(&self.name) {
            return Ok(None);
        }

        let mut input = self.storage.open_input(&self.name)?;
        let mut record = Vec::new();
        input.read_to_end(&mut record)?;
        Ok(Some(record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_store_reads_none() {
        let store = StorageModelStore::in_memory();
        assert_eq!(store.read_latest().unwrap(), None);
    }

    #[test]
    fn test_latest_write_wins() {
        let store = StorageModelStore::in_memory();
        store.write(b"first").unwrap();
        store.write(b"second").unwrap();

        assert_eq!(store.read_latest().unwrap(), Some(b"second".to_vec()));
        assert!(store.storage().file_exists(DEFAULT_MODEL_NAME));
        assert!(!store.storage().file_exists("intent_model.bin.tmp"));
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = StorageModelStore::open_dir(dir.path()).unwrap();
        store.write(b"record").unwrap();

        let reopened = StorageModelStore::open_dir(dir.path()).unwrap();
        assert_eq!(reopened.read_latest().unwrap(), Some(b"record".to_vec()));
        assert!(dir.path().join(DEFAULT_MODEL_NAME).is_file());
        assert!(!dir.path().join("intent_model.bin.tmp").exists());
    }
}
