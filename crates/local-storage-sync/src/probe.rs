use ulid::Ulid;

use crate::storage::KeyValueStore;

pub const PROBE_KEY_PREFIX: &str = "__local_storage_sync_probe__";

/// Checks that `store` accepts a write and a removal right now.
///
/// Unavailability (full quota, storage disabled, no storage in this
/// environment) is an expected condition, so every error becomes `false`.
pub fn probe(store: &dyn KeyValueStore) -> bool {
    let key = format!("{}{}", PROBE_KEY_PREFIX, Ulid::new());
    let result = store.set(&key, "1").and_then(|()| store.remove(&key));
    match result {
        Ok(()) => true,
        Err(error) => {
            tracing::debug!(store = store.name(), %error, "storage probe failed");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStorage, StorageError};

    #[test]
    fn test_available_store_passes_and_leaves_nothing_behind() {
        let storage = MemoryStorage::new();
        storage.set("keep", "me").unwrap();
        assert!(probe(&storage));
        assert_eq!(storage.entries(), vec![("keep".to_owned(), "me".to_owned())]);
    }

    #[test]
    fn test_unavailable_store_fails() {
        assert!(!probe(&MemoryStorage::unavailable()));
    }

    #[test]
    fn test_full_quota_fails() {
        let storage = MemoryStorage::with_quota(4);
        assert!(!probe(&storage));
        assert!(storage.is_empty());
    }

    struct RemoveFails;

    impl KeyValueStore for RemoveFails {
        fn name(&self) -> &str {
            "remove-fails"
        }

        fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Ok(None)
        }

        fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Ok(())
        }

        fn remove(&self, _key: &str) -> Result<(), StorageError> {
            Err(StorageError::Backend("read-only".to_owned()))
        }
    }

    #[test]
    fn test_failed_removal_fails() {
        assert!(!probe(&RemoveFails));
    }
}
