//! Save/load plumbing shared by records, tutorial and audio settings
//!
//! Features:
//! - Fixed storage keys (no version field, the persisted shape never changes)
//! - Swappable provider slot per module, resettable to the platform default
//! - JSON load/save helpers returning [`PersistenceError`]

use std::rc::Rc;

use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;

use crate::platform::{StorageError, StorageProvider, default_storage_provider};

/// Storage keys
pub mod keys {
    /// Best record per player class (JSON object)
    pub const BEST_RECORDS: &str = "ipne_best_records";
    /// Literal `"true"` once the tutorial is finished or skipped
    pub const TUTORIAL_COMPLETED: &str = "ipne_tutorial_completed";
    /// Audio volume/mute preferences (JSON object)
    pub const AUDIO_SETTINGS: &str = "ipne_audio_settings";
}

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("failed to serialize: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("malformed stored data: {0}")]
    Deserialize(#[source] serde_json::Error),
}

/// The provider one module reads and writes through.
///
/// Starts on [`default_storage_provider`]; tests swap in a memory store with
/// [`ProviderSlot::set`] and go back with [`ProviderSlot::reset`].
pub struct ProviderSlot {
    current: Rc<dyn StorageProvider>,
}

impl ProviderSlot {
    pub fn new() -> Self {
        Self {
            current: default_storage_provider(),
        }
    }

    pub fn with_provider(provider: Rc<dyn StorageProvider>) -> Self {
        Self { current: provider }
    }

    pub fn set(&mut self, provider: Rc<dyn StorageProvider>) {
        self.current = provider;
    }

    pub fn reset(&mut self) {
        self.current = default_storage_provider();
    }

    pub fn get(&self) -> &dyn StorageProvider {
        self.current.as_ref()
    }

    /// Read and parse a JSON value; `Ok(None)` when the key is absent
    pub fn load_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, PersistenceError> {
        match self.current.get(key)? {
            Some(json) => serde_json::from_str(&json)
                .map(Some)
                .map_err(PersistenceError::Deserialize),
            None => Ok(None),
        }
    }

    pub fn save_json<T: Serialize>(&self, key: &str, value: &T) -> Result<(), PersistenceError> {
        let json = serde_json::to_string(value).map_err(PersistenceError::Serialize)?;
        self.current.set(key, &json)?;
        Ok(())
    }
}

impl Default for ProviderSlot {
    fn default() -> Self {
        Self::new()
    }
}
