use crate::error::StorageError;

/// Per-origin key-value storage for the persisted session record.
///
/// Values are opaque JSON text; the trait never interprets them. Implementors
/// must be safe to share across threads — the collector reads and writes from
/// spawned tasks.
pub trait SessionStorage: Send + Sync {
    /// Read the stored value for an origin, `None` when absent.
    fn load(&self, origin: &str) -> Result<Option<String>, StorageError>;

    /// Write (or overwrite) the value for an origin.
    fn store(&self, origin: &str, value: &str) -> Result<(), StorageError>;

    /// Delete the value for an origin. Deleting an absent key is not an error.
    fn remove(&self, origin: &str) -> Result<(), StorageError>;
}
