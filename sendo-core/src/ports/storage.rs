//! Persisted key-value storage port

use crate::domain::result::Result;

/// Small string-keyed store for client state that survives a restart
///
/// Values are opaque JSON strings; the session store owns their format.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Removing a missing key is not an error
    fn remove(&self, key: &str) -> Result<()>;
}
