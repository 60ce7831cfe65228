use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::io;
use std::path::PathBuf;
use std::rc::Rc;

use crate::error::ErrorKind;
use crate::theme::ThemePreference;
use thiserror::Error;

mod file;

pub use file::FileStore;

pub const DEFAULT_STORAGE_KEY: &str = "theme";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("missing HOME environment variable")]
    MissingHomeDirectory,
    #[error("storage unavailable: {reason}")]
    Unavailable { reason: String },
    #[error("failed to read preference store: {path}")]
    Read { path: PathBuf, source: io::Error },
    #[error("preference store is corrupted: {path}")]
    Corrupted {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("failed to write preference store: {path}")]
    Write { path: PathBuf, source: io::Error },
    #[error("storage quota exceeded while writing `{key}`")]
    QuotaExceeded { key: String },
}

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::Write { .. } | StoreError::QuotaExceeded { .. } => {
                ErrorKind::StorageWriteFailed
            }
            StoreError::MissingHomeDirectory
            | StoreError::Unavailable { .. }
            | StoreError::Read { .. }
            | StoreError::Corrupted { .. } => ErrorKind::StorageUnavailable,
        }
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// A persistent string slot store. Implementations may fail freely; the
/// [`PreferenceStore`] adapter absorbs every error.
pub trait KeyValueStore {
    fn read(&self, key: &str) -> StoreResult<Option<String>>;
    fn write(&self, key: &str, value: &str) -> StoreResult<()>;
}

/// In-process store. Clones share the same slots.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    slots: Rc<RefCell<BTreeMap<String, String>>>,
    quota_bytes: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects writes that would push the total stored size past `bytes`.
    pub fn with_quota(bytes: usize) -> Self {
        Self {
            slots: Rc::default(),
            quota_bytes: Some(bytes),
        }
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.slots.borrow().get(key).cloned()
    }

    pub fn insert_raw(&self, key: &str, value: &str) {
        self.slots
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
    }

    fn used_bytes_without(&self, key: &str) -> usize {
        self.slots
            .borrow()
            .iter()
            .filter(|(slot, _)| slot.as_str() != key)
            .map(|(slot, value)| slot.len() + value.len())
            .sum()
    }
}

impl KeyValueStore for MemoryStore {
    fn read(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.raw(key))
    }

    fn write(&self, key: &str, value: &str) -> StoreResult<()> {
        if let Some(quota) = self.quota_bytes {
            if self.used_bytes_without(key) + key.len() + value.len() > quota {
                return Err(StoreError::QuotaExceeded {
                    key: key.to_string(),
                });
            }
        }
        self.insert_raw(key, value);
        Ok(())
    }
}

/// Fault-absorbing front for a [`KeyValueStore`].
///
/// Neither `get` nor `set` can fail. A fault is logged, remembered until the
/// next [`PreferenceStore::take_fault`], and replaced by the documented
/// fallback (`None` on read, a dropped write on write).
pub struct PreferenceStore {
    backend: Option<Rc<dyn KeyValueStore>>,
    fault: Cell<Option<ErrorKind>>,
}

impl PreferenceStore {
    pub fn new(backend: Rc<dyn KeyValueStore>) -> Self {
        Self {
            backend: Some(backend),
            fault: Cell::new(None),
        }
    }

    /// No backing store at all, e.g. while rendering on the server.
    pub fn unavailable() -> Self {
        Self {
            backend: None,
            fault: Cell::new(None),
        }
    }

    pub fn is_available(&self) -> bool {
        self.backend.is_some()
    }

    pub fn get(&self, key: &str) -> Option<String> {
        let Some(backend) = self.backend.as_ref() else {
            tracing::debug!(key, "no preference store present; nothing to read");
            self.fault.set(Some(ErrorKind::StorageUnavailable));
            return None;
        };
        match backend.read(key) {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(key, %err, "failed to read stored preference; treating as absent");
                self.fault.set(Some(err.kind()));
                None
            }
        }
    }

    pub fn set(&self, key: &str, value: &str) {
        let Some(backend) = self.backend.as_ref() else {
            tracing::debug!(key, "no preference store present; dropping write");
            self.fault.set(Some(ErrorKind::StorageUnavailable));
            return;
        };
        if let Err(err) = backend.write(key, value) {
            tracing::warn!(key, value, %err, "failed to persist preference; keeping in-memory value only");
            self.fault.set(Some(err.kind()));
        }
    }

    /// Reads and validates the stored preference.
    ///
    /// Content that is not a canonical preference is reported as absent; the
    /// stored value is left untouched.
    pub fn load_preference(&self, key: &str) -> Option<ThemePreference> {
        let raw = self.get(key)?;
        let parsed = ThemePreference::parse(&raw);
        if parsed.is_none() {
            tracing::debug!(key, value = raw.as_str(), "ignoring unrecognized stored preference");
            self.fault.set(Some(ErrorKind::InvalidStoredValue));
        }
        parsed
    }

    pub fn save_preference(&self, key: &str, preference: ThemePreference) {
        self.set(key, preference.as_str());
    }

    pub fn take_fault(&self) -> Option<ErrorKind> {
        self.fault.take()
    }
}

impl std::fmt::Debug for PreferenceStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreferenceStore")
            .field("available", &self.is_available())
            .field("fault", &self.fault.get())
            .finish()
    }
}
