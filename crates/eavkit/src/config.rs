//! # Configuration
//!
//! Settings are loaded with [`confique`], layered in priority order:
//! 1. **Environment variables**: `EAVKIT_CODE_SEPARATOR`, `EAVKIT_INVALIDATION`,
//!    `EAVKIT_REQUIRED_MARKER`, `EAVKIT_DATA_DIR`
//! 2. **Config file**: `eavkit.toml`, when one is given and exists
//! 3. **Compiled defaults**: via `#[config(default = ...)]`
//!
//! ## Available Settings
//!
//! | Key | Default | Description |
//! |-----|---------|-------------|
//! | `code_separator` | `_` | Joins words when a code is derived from a name |
//! | `invalidation` | `all` | Which values a category change purges (`all`, `inapplicable`) |
//! | `required_marker` | ` *` | Suffix on labels of required Select attributes |
//! | `data_dir` | platform data dir | Where `attributes.json` lives |

use crate::accessor::InvalidationPolicy;
use crate::codes::DefaultSlugger;
use crate::error::{EavError, Result};
use crate::forms::FormOptions;
use confique::Config;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "eavkit.toml";

#[derive(Config, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct EavConfig {
    /// Separator for derived codes: "_" or "-"
    #[config(default = "_", env = "EAVKIT_CODE_SEPARATOR")]
    pub code_separator: String,

    /// Purge policy on category change
    #[config(default = "all", env = "EAVKIT_INVALIDATION")]
    pub invalidation: InvalidationPolicy,

    #[config(default = " *", env = "EAVKIT_REQUIRED_MARKER")]
    pub required_marker: String,

    /// Directory holding attributes.json
    #[config(env = "EAVKIT_DATA_DIR")]
    pub data_dir: Option<PathBuf>,
}

impl Default for EavConfig {
    fn default() -> Self {
        Self {
            code_separator: "_".to_string(),
            invalidation: InvalidationPolicy::All,
            required_marker: " *".to_string(),
            data_dir: None,
        }
    }
}

impl EavConfig {
    /// Load from the environment over `file` (if given) over defaults.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let mut builder = EavConfig::builder().env();
        if let Some(file) = file {
            builder = builder.file(file);
        }
        let config = builder.load()?;
        config.separator()?;
        Ok(config)
    }

    /// The configured separator as a single character.
    pub fn separator(&self) -> Result<char> {
        let mut chars = self.code_separator.chars();
        match (chars.next(), chars.next()) {
            (Some(c @ ('_' | '-')), None) => Ok(c),
            _ => Err(EavError::InvalidSetting {
                key: "code_separator",
                reason: format!("expected '_' or '-', got '{}'", self.code_separator),
            }),
        }
    }

    pub fn slugger(&self) -> Result<DefaultSlugger> {
        Ok(DefaultSlugger::new(self.separator()?))
    }

    pub fn form_options(&self) -> FormOptions {
        FormOptions::default().with_required_marker(self.required_marker.clone())
    }

    /// Configured data directory, else the platform data directory.
    pub fn data_dir(&self) -> Result<PathBuf> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => default_data_dir(),
        }
    }
}

pub fn default_data_dir() -> Result<PathBuf> {
    ProjectDirs::from("", "", "eavkit")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or_else(|| EavError::InvalidSetting {
            key: "data_dir",
            reason: "no home directory to derive a default from".to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = EavConfig::default();
        assert_eq!(config.separator().unwrap(), '_');
        assert_eq!(config.invalidation, InvalidationPolicy::All);
        assert_eq!(config.form_options().required_marker, " *");
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        let written = EavConfig {
            code_separator: "-".to_string(),
            invalidation: InvalidationPolicy::Inapplicable,
            required_marker: " (required)".to_string(),
            data_dir: Some(dir.path().join("data")),
        };
        std::fs::write(&path, toml::to_string(&written).unwrap()).unwrap();

        let loaded = EavConfig::builder().file(&path).load().unwrap();
        assert_eq!(loaded, written);
        assert_eq!(loaded.slugger().unwrap(), DefaultSlugger::new('-'));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = EavConfig::builder()
            .file(dir.path().join(CONFIG_FILE))
            .load()
            .unwrap();
        assert_eq!(loaded, EavConfig::default());
    }

    #[test]
    fn rejects_odd_separator() {
        let config = EavConfig {
            code_separator: "::".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            config.separator(),
            Err(EavError::InvalidSetting { key: "code_separator", .. })
        ));
    }

    #[test]
    fn explicit_data_dir_wins() {
        let config = EavConfig {
            data_dir: Some(PathBuf::from("/tmp/eav")),
            ..Default::default()
        };
        assert_eq!(config.data_dir().unwrap(), PathBuf::from("/tmp/eav"));
    }
}
