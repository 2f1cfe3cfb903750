//! Storage abstraction layer.
//!
//! Persisted model records are written through the [`Storage`] trait so the
//! same model store works against a directory on disk or an in-memory map.
//!
//! - [`file::FileStorage`]: disk-based persistent storage
//! - [`memory::MemoryStorage`]: in-memory storage for tests and ephemeral hosts
//!
//! # Example
//!
//! ```
//! use std::io::{Read, Write};
//!
//! use nutriclass::storage::Storage;
//! use nutriclass::storage::memory::MemoryStorage;
//!
//! # fn main() -> nutriclass::error::Result<()> {
//! let storage = MemoryStorage::new_default();
//! let mut output = storage.create_output("model.bin")?;
//! output.write_all(b"weights")?;
//! output.close()?;
//!
//! let mut input = storage.open_input("model.bin")?;
//! let mut data = Vec::new();
//! input.read_to_end(&mut data)?;
//! assert_eq!(data, b"weights");
//! # Ok(())
//! # }
//! ```

use std::io::{Read, Write};

use thiserror::Error;

use crate::error::NutriclassError;
use crate::error::Result;

pub mod file;
pub mod memory;

/// A trait for storage backends that can store and retrieve named blobs.
pub trait Storage: Send + Sync + std::fmt::Debug {
    /// Open a file for reading.
    fn open_input(&self, name: &str) -> Result<Box<dyn StorageInput>>;

    /// Create (or truncate) a file for writing.
    fn create_output(&self, name: &str) -> Result<Box<dyn StorageOutput>>;

    /// Check if a file exists.
    fn file_exists(&self, name: &str) -> bool;

    /// Rename a file, replacing the target if it exists.
    fn rename_file(&self, old_name: &str, new_name: &str) -> Result<()>;
}

/// A readable stream over one stored file.
pub trait StorageInput: Read + Send + std::fmt::Debug {}

/// A trait for writing data to storage.
pub trait StorageOutput: Write + Send + std::fmt::Debug {
    /// Flush buffered bytes durably and make the contents visible.
    fn close(&mut self) -> Result<()>;
}

/// Configuration for storage backends.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Buffer size for I/O operations.
    pub buffer_size: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            buffer_size: 65536,
        }
    }
}

/// Error types specific to storage operations.
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("I/O error: {0}")]
    IoError(String),
}

impl From<StorageError> for NutriclassError {
    fn from(err: StorageError) -> Self {
        NutriclassError::storage(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_config_default() {
        let config = StorageConfig::default();
        assert_eq!(config.buffer_size, 65536);
    }

    #[test]
    fn test_storage_error_display() {
        let err = StorageError::FileNotFound("model.bin".to_string());
        assert_eq!(err.to_string(), "File not found: model.bin");

        let err = StorageError::IoError("connection failed".to_string());
        assert_eq!(err.to_string(), "I/O error: connection failed");

        let converted: NutriclassError = StorageError::FileNotFound("model.bin".into()).into();
        assert_eq!(
            converted.to_string(),
            "Storage error: File not found: model.bin"
        );
    }
}
