use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::storage::DEFAULT_STORAGE_KEY;
use crate::ui::ThemeColors;

pub(crate) const APP_DIR: &str = "folio";
const APP_CONFIG_FILE: &str = "config.json";

/// Transition length used when nothing is configured.
pub const DEFAULT_TRANSITION_MS: u32 = 200;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing HOME environment variable")]
    MissingHomeDirectory,
    #[error("failed to read config: {path}")]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to parse config: {path}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Settings from `config.json`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub storage_key: Option<String>,
    #[serde(default)]
    pub transition_ms: Option<u32>,
    #[serde(default)]
    pub colors: Option<ThemeColors>,
}

/// Runtime knobs for a `ThemeController`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemeSettings {
    pub storage_key: String,
    pub transition_ms: u32,
}

impl Default for ThemeSettings {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            transition_ms: DEFAULT_TRANSITION_MS,
        }
    }
}

impl ThemeSettings {
    pub fn with_storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = key.into();
        self
    }
}

impl AppConfig {
    pub fn settings(&self) -> ThemeSettings {
        let defaults = ThemeSettings::default();
        let storage_key = match self.storage_key.as_deref().map(str::trim) {
            Some("") => {
                tracing::warn!("empty storage_key in config.json; using default");
                defaults.storage_key
            }
            Some(key) => key.to_string(),
            None => defaults.storage_key,
        };
        ThemeSettings {
            storage_key,
            transition_ms: self.transition_ms.unwrap_or(defaults.transition_ms),
        }
    }
}

pub fn load_app_config() -> AppConfig {
    let (xdg_config_home, home) = config_env_dirs();
    load_app_config_with(xdg_config_home.as_deref(), home.as_deref())
}

fn load_app_config_with(xdg_config_home: Option<&Path>, home: Option<&Path>) -> AppConfig {
    let path = match app_config_path(APP_DIR, APP_CONFIG_FILE, xdg_config_home, home) {
        Ok(p) => p,
        Err(_) => return AppConfig::default(),
    };
    read_app_config(&path).unwrap_or_else(|err| {
        tracing::warn!(%err, "failed to load config.json; using defaults");
        AppConfig::default()
    })
}

/// Reads a config file; a missing file yields defaults.
pub fn read_app_config(path: &Path) -> Result<AppConfig, ConfigError> {
    if !path.exists() {
        return Ok(AppConfig::default());
    }
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

pub(crate) fn config_env_dirs() -> (Option<PathBuf>, Option<PathBuf>) {
    (
        std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from),
        std::env::var_os("HOME").map(PathBuf::from),
    )
}

pub(crate) fn app_config_path(
    app_dir: &str,
    file_name: &str,
    xdg_config_home: Option<&Path>,
    home: Option<&Path>,
) -> Result<PathBuf, ConfigError> {
    let mut path = config_root(xdg_config_home, home)?;
    path.push(app_dir);
    path.push(file_name);
    Ok(path)
}

fn config_root(xdg_config_home: Option<&Path>, home: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(xdg) = xdg_config_home.filter(|path| !path.as_os_str().is_empty()) {
        return Ok(xdg.to_path_buf());
    }

    let home = home.ok_or(ConfigError::MissingHomeDirectory)?;
    Ok(home.join(".config"))
}
