use super::eav_store::EavStore;
use super::fs_backend::FsBackend;
use std::path::PathBuf;

/// Store persisted to `<dir>/attributes.json`.
pub type FileStore = EavStore<FsBackend>;

impl FileStore {
    /// Open the store in `dir`. Nothing touches the disk until the first read or write.
    pub fn open(dir: impl Into<PathBuf>) -> Self {
        EavStore::with_backend(FsBackend::new(dir))
    }
}
