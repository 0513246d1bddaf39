//! Key-value storage providers
//!
//! Every provider exposes the same three string operations. Failures are
//! reported as [`StorageError`] and never panic; callers decide whether to
//! degrade.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use thiserror::Error;

/// Failure reported by a backing store
#[derive(Debug, Error)]
pub enum StorageError {
    /// The store refused the operation (quota, private mode, simulated outage)
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// Exception raised by the browser Storage API
    #[error("browser storage error: {0}")]
    Js(String),

    /// Native file backing failed
    #[error("storage file error: {0}")]
    Io(#[from] std::io::Error),
}

/// Get/set/remove of string values by string key.
pub trait StorageProvider {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Provider used when no backing store exists. Reads find nothing, writes vanish.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopStorageProvider;

impl StorageProvider for NoopStorageProvider {
    fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Ok(None)
    }

    fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
        Ok(())
    }

    fn remove(&self, _key: &str) -> Result<(), StorageError> {
        Ok(())
    }
}

/// In-memory store, shared through `Rc` so tests can inspect what was written.
#[derive(Debug, Default)]
pub struct MemoryStorageProvider {
    items: RefCell<HashMap<String, String>>,
    failing: Cell<bool>,
}

impl MemoryStorageProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose every operation fails until `set_failing(false)`
    pub fn failing() -> Self {
        let storage = Self::new();
        storage.set_failing(true);
        storage
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.set(failing);
    }

    pub fn len(&self) -> usize {
        self.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
    }

    fn check(&self) -> Result<(), StorageError> {
        if self.failing.get() {
            return Err(StorageError::Unavailable("memory store set to fail".into()));
        }
        Ok(())
    }
}

impl StorageProvider for MemoryStorageProvider {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.check()?;
        Ok(self.items.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.check()?;
        self.items
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.check()?;
        self.items.borrow_mut().remove(key);
        Ok(())
    }
}

/// Browser LocalStorage
#[cfg(target_arch = "wasm32")]
pub struct LocalStorageProvider {
    storage: web_sys::Storage,
}

#[cfg(target_arch = "wasm32")]
impl LocalStorageProvider {
    /// Bind to `window.localStorage`, or `None` when it cannot be reached.
    pub fn from_window() -> Option<Self> {
        web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()
            .map(|storage| Self { storage })
    }
}

#[cfg(target_arch = "wasm32")]
impl StorageProvider for LocalStorageProvider {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.storage
            .get_item(key)
            .map_err(|e| StorageError::Js(format!("{e:?}")))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.storage
            .set_item(key, value)
            .map_err(|e| StorageError::Js(format!("{e:?}")))
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.storage
            .remove_item(key)
            .map_err(|e| StorageError::Js(format!("{e:?}")))
    }
}

/// JSON object file holding every key, rewritten on each change (native only)
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Clone)]
pub struct FileStorageProvider {
    path: std::path::PathBuf,
}

#[cfg(not(target_arch = "wasm32"))]
impl FileStorageProvider {
    pub fn new(path: impl Into<std::path::PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read_all(&self) -> Result<std::collections::BTreeMap<String, String>, StorageError> {
        match std::fs::read_to_string(&self.path) {
            Ok(text) if text.trim().is_empty() => Ok(Default::default()),
            Ok(text) => serde_json::from_str(&text).map_err(|e| {
                StorageError::Unavailable(format!("{}: {e}", self.path.display()))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Default::default()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_all(
        &self,
        items: &std::collections::BTreeMap<String, String>,
    ) -> Result<(), StorageError> {
        let json = serde_json::to_string_pretty(items)
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl StorageProvider for FileStorageProvider {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut items = self.read_all()?;
        items.insert(key.to_string(), value.to_string());
        self.write_all(&items)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut items = self.read_all()?;
        if items.remove(key).is_some() {
            self.write_all(&items)?;
        }
        Ok(())
    }
}

/// LocalStorage when the browser offers it, otherwise the no-op provider.
#[cfg(target_arch = "wasm32")]
pub fn default_storage_provider() -> Rc<dyn StorageProvider> {
    match LocalStorageProvider::from_window() {
        Some(storage) => Rc::new(storage),
        None => {
            log::warn!("LocalStorage unavailable, progress will not be saved");
            Rc::new(NoopStorageProvider)
        }
    }
}

/// Native builds have no implicit store
#[cfg(not(target_arch = "wasm32"))]
pub fn default_storage_provider() -> Rc<dyn StorageProvider> {
    Rc::new(NoopStorageProvider)
}
