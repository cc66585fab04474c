use crate::error::StoreResult;
use crate::context::WriteSet;

/// Key-value world state.
///
/// All implementations must satisfy these invariants:
/// - `get` returns `Ok(None)` for a key that has never been written.
/// - `put` replaces any previous value under the key; a key never holds
///   more than one value.
/// - `apply` writes an entire [`WriteSet`] atomically.
/// - All I/O errors are propagated, never silently ignored.
pub trait StateStore: Send + Sync {
    /// Read the value stored under `key`.
    fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>>;

    /// Store `value` under `key`.
    fn put(&self, key: &str, value: &[u8]) -> StoreResult<()>;

    /// Apply every write in `writes` as one atomic step.
    ///
    /// Default implementation calls `put()` for each entry. Backends with
    /// real I/O must override this to keep the all-or-nothing guarantee.
    fn apply(&self, writes: &WriteSet) -> StoreResult<()> {
        for (key, value) in writes.iter() {
            self.put(key, value)?;
        }
        Ok(())
    }
}
