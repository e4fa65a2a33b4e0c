use dashmap::DashMap;

use crate::error::StorageError;
use crate::storage::SessionStorage;

/// In-memory storage backend.
///
/// Sessions stored here do not survive the process; used by tests and by
/// hosts without a writable filesystem.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: DashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl SessionStorage for MemoryStorage {
    fn load(&self, origin: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(origin).map(|v| v.value().clone()))
    }

    fn store(&self, origin: &str, value: &str) -> Result<(), StorageError> {
        self.entries.insert(origin.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, origin: &str) -> Result<(), StorageError> {
        self.entries.remove(origin);
        Ok(())
    }
}
