use super::backend::StorageBackend;
use super::tables::Tables;
use crate::error::{EavError, Result};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};

/// In-memory storage backend for testing.
///
/// Uses an `RwLock` so a single store can be shared across threads; the
/// concurrency tests for option get-or-create depend on it.
#[derive(Default)]
pub struct MemBackend {
    tables: RwLock<Tables>,
    simulate_write_error: AtomicBool,
}

impl MemBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable write error simulation for testing rollback.
    pub fn set_simulate_write_error(&self, simulate: bool) {
        self.simulate_write_error.store(simulate, Ordering::SeqCst);
    }
}

impl StorageBackend for MemBackend {
    fn load_tables(&self) -> Result<Tables> {
        Ok(self.tables.read().clone())
    }

    fn save_tables(&self, tables: &Tables) -> Result<()> {
        if self.simulate_write_error.load(Ordering::SeqCst) {
            return Err(EavError::Store("Simulated write error".to_string()));
        }
        *self.tables.write() = tables.clone();
        Ok(())
    }

    fn describe(&self) -> String {
        "memory://attributes".to_string()
    }
}
