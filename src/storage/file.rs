use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use super::{KeyValueStore, StoreError, StoreResult};
use crate::config::{app_config_path, config_env_dirs, ConfigError, APP_DIR};

const PREFERENCES_FILE: &str = "preferences.json";

/// JSON object file mapping slot keys to strings.
///
/// Writes keep every other key in the file and land through a sibling temp
/// file plus rename, so an interrupted write leaves the previous content.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn with_default_path() -> StoreResult<Self> {
        let (xdg_config_home, home) = config_env_dirs();
        Self::with_default_path_in(xdg_config_home.as_deref(), home.as_deref())
    }

    fn with_default_path_in(
        xdg_config_home: Option<&Path>,
        home: Option<&Path>,
    ) -> StoreResult<Self> {
        let path = app_config_path(APP_DIR, PREFERENCES_FILE, xdg_config_home, home).map_err(
            |error| match error {
                ConfigError::MissingHomeDirectory => StoreError::MissingHomeDirectory,
                other => StoreError::Unavailable {
                    reason: other.to_string(),
                },
            },
        )?;
        Ok(Self::new(path))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load_slots(&self) -> StoreResult<BTreeMap<String, Value>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let serialized = fs::read_to_string(&self.path).map_err(|source| StoreError::Read {
            path: self.path.clone(),
            source,
        })?;
        serde_json::from_str(&serialized).map_err(|source| StoreError::Corrupted {
            path: self.path.clone(),
            source,
        })
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_else(|| PREFERENCES_FILE.into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl KeyValueStore for FileStore {
    fn read(&self, key: &str) -> StoreResult<Option<String>> {
        let mut slots = self.load_slots()?;
        Ok(slots.remove(key).map(|value| match value {
            Value::String(text) => text,
            // Non-string content is handed back verbatim and fails validation upstream.
            other => other.to_string(),
        }))
    }

    fn write(&self, key: &str, value: &str) -> StoreResult<()> {
        let write_error = |source| StoreError::Write {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(write_error)?;
        }

        let mut slots = match self.load_slots() {
            Ok(slots) => slots,
            Err(err @ StoreError::Corrupted { .. }) => {
                tracing::warn!(%err, path = %self.path.display(), "replacing corrupted preference file");
                BTreeMap::new()
            }
            Err(StoreError::Read { source, .. }) => return Err(write_error(source)),
            Err(other) => return Err(other),
        };
        slots.insert(key.to_string(), Value::String(value.to_string()));

        let serialized = serde_json::to_string_pretty(&slots).map_err(|source| {
            StoreError::Corrupted {
                path: self.path.clone(),
                source,
            }
        })?;
        let temp = self.temp_path();
        fs::write(&temp, serialized).map_err(|source| {
            let _ = fs::remove_file(&temp);
            write_error(source)
        })?;
        fs::rename(&temp, &self.path).map_err(|source| {
            let _ = fs::remove_file(&temp);
            write_error(source)
        })?;
        Ok(())
    }
}
