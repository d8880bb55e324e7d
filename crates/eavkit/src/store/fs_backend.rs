use super::backend::{StorageBackend, WriteGuard};
use super::tables::Tables;
use crate::error::{EavError, Result};
use fs2::FileExt;
use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use tracing::warn;
use uuid::Uuid;

pub const DATA_FILE: &str = "attributes.json";
/// Locked exclusively by every writer, across processes.
pub const LOCK_FILE: &str = ".attributes.lock";

/// Stores all tables as one pretty-printed JSON document.
pub struct FsBackend {
    root: PathBuf,
}

impl FsBackend {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn data_file(&self) -> PathBuf {
        self.root.join(DATA_FILE)
    }

    pub fn lock_file(&self) -> PathBuf {
        self.root.join(LOCK_FILE)
    }

    fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.root).map_err(EavError::Io)
    }
}

impl StorageBackend for FsBackend {
    fn load_tables(&self) -> Result<Tables> {
        let content = match fs::read_to_string(self.data_file()) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Tables::default()),
            Err(e) => return Err(EavError::Io(e)),
        };
        let tables: Tables = serde_json::from_str(&content).map_err(EavError::Serialization)?;
        Ok(tables)
    }

    fn save_tables(&self, tables: &Tables) -> Result<()> {
        self.ensure_dir()?;

        let content = serde_json::to_string_pretty(tables).map_err(EavError::Serialization)?;

        // Write to a temp file then rename, so readers never see a partial document
        let tmp_file = self.root.join(format!(".attributes-{}.tmp", Uuid::new_v4()));
        let written = fs::write(&tmp_file, content)
            .and_then(|()| fs::rename(&tmp_file, self.data_file()));
        if let Err(e) = written {
            if let Err(cleanup) = fs::remove_file(&tmp_file) {
                if cleanup.kind() != io::ErrorKind::NotFound {
                    warn!(file = %tmp_file.display(), error = %cleanup, "could not remove temp file");
                }
            }
            return Err(EavError::Io(e));
        }

        Ok(())
    }

    fn lock_for_write(&self) -> Result<WriteGuard> {
        self.ensure_dir()?;
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(self.lock_file())
            .map_err(EavError::Io)?;
        file.lock_exclusive().map_err(EavError::Io)?;
        Ok(WriteGuard::locked_file(file))
    }

    fn describe(&self) -> String {
        self.data_file().display().to_string()
    }
}
