use super::tables::Tables;
use crate::error::Result;
use fs2::FileExt;
use std::fs::File;

/// Abstract interface for raw storage I/O.
/// This trait handles the "how" of storage (filesystem vs memory),
/// while EavStore handles the "what" (constraints, transactions, cascades).
pub trait StorageBackend: Send + Sync {
    /// Load a private working copy of all tables.
    fn load_tables(&self) -> Result<Tables>;

    /// Replace the persisted tables.
    /// MUST be atomic: readers see either the old or the new tables, never a mix.
    fn save_tables(&self, tables: &Tables) -> Result<()>;

    /// Exclusive lock over the persisted tables, held for one load-mutate-save
    /// cycle. Must exclude every other handle on the same data, including
    /// handles in other processes. Storage private to one handle needs none.
    fn lock_for_write(&self) -> Result<WriteGuard> {
        Ok(WriteGuard::unlocked())
    }

    /// Human-readable location of the data, for diagnostics.
    fn describe(&self) -> String;
}

/// Releases the backend's write lock on drop.
pub struct WriteGuard {
    file: Option<File>,
}

impl WriteGuard {
    pub fn unlocked() -> Self {
        Self { file: None }
    }

    /// Guard for a lock file the caller has already locked exclusively.
    pub fn locked_file(file: File) -> Self {
        Self { file: Some(file) }
    }
}

impl Drop for WriteGuard {
    fn drop(&mut self) {
        if let Some(file) = &self.file {
            let _ = FileExt::unlock(file);
        }
    }
}
