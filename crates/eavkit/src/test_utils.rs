use crate::api::AttrsApi;
use crate::store::fs::FileStore;
use std::path::PathBuf;
use tempfile::TempDir;

/// A file-backed store in a throwaway directory.
pub struct TestEnv {
    // Kept so the directory outlives the test
    pub _temp_dir: TempDir,
    pub root: PathBuf,
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl TestEnv {
    pub fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("failed to create temp dir");
        let root = temp_dir.path().to_path_buf();
        Self {
            _temp_dir: temp_dir,
            root,
        }
    }

    /// A fresh handle on the same data directory, as a new process would open it.
    pub fn store(&self) -> FileStore {
        FileStore::open(&self.root)
    }

    pub fn api(&self) -> AttrsApi<FileStore> {
        AttrsApi::new(self.store())
    }
}
