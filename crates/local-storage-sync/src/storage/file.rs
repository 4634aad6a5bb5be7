//! File-based store for native hosts: one file per key.
//!
//! Keys are percent-encoded into file names, so any key a browser store
//! accepts (the empty key, `..`, `a/b`) maps to a single plain file.

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use super::{KeyValueStore, StorageError};

pub struct FileStorage {
    base_path: PathBuf,
    name: String,
}

impl FileStorage {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        let base_path = base_path.into();
        let name = base_path.display().to_string();
        Self { base_path, name }
    }

    fn path(&self, key: &str) -> Result<PathBuf, StorageError> {
        let file_name = format!("{}.value", encode_key(key));
        if file_name.len() > MAX_FILE_NAME_LEN {
            return Err(StorageError::InvalidKey { key: key.to_owned() });
        }
        Ok(self.base_path.join(file_name))
    }
}

const MAX_FILE_NAME_LEN: usize = 255;

fn encode_key(key: &str) -> String {
    let mut encoded = String::with_capacity(key.len());
    for byte in key.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' {
            encoded.push(char::from(byte));
        } else {
            encoded.push_str(&format!("%{byte:02X}"));
        }
    }
    encoded
}

impl KeyValueStore for FileStorage {
    fn name(&self) -> &str {
        &self.name
    }

    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path(key)?) {
            Ok(value) => Ok(Some(value)),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(None),
            Err(error) => Err(error.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path(key)?;
        fs::create_dir_all(&self.base_path)?;
        fs::write(path, value)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.path(key)?) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(()),
            Err(error) => Err(error.into()),
        }
    }
}
