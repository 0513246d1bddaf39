//! Audio preferences
//!
//! Persisted separately from game progress in LocalStorage, so clearing
//! records keeps the player's volume choices.

use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::persistence::{PersistenceError, ProviderSlot, keys};
use crate::platform::StorageProvider;

/// Volume and mute preferences
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioSettings {
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub se_volume: f32,
    /// Music volume (0.0 - 1.0)
    pub bgm_volume: f32,
    pub is_muted: bool,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            master_volume: 0.7,
            se_volume: 0.8,
            bgm_volume: 0.5,
            is_muted: false,
        }
    }
}

impl AudioSettings {
    /// Copy with every volume forced into [0, 1]
    pub fn clamped(self) -> Self {
        Self {
            master_volume: clamp_volume(self.master_volume),
            se_volume: clamp_volume(self.se_volume),
            bgm_volume: clamp_volume(self.bgm_volume),
            ..self
        }
    }

    /// Effective sound effect gain (0 when muted)
    pub fn effective_se_volume(&self) -> f32 {
        if self.is_muted {
            0.0
        } else {
            self.master_volume * self.se_volume
        }
    }

    /// Effective music gain (0 when muted)
    pub fn effective_bgm_volume(&self) -> f32 {
        if self.is_muted {
            0.0
        } else {
            self.master_volume * self.bgm_volume
        }
    }
}

fn clamp_volume(volume: f32) -> f32 {
    if volume.is_nan() {
        return 0.0;
    }
    volume.clamp(0.0, 1.0)
}

/// Current audio settings plus the storage they live in
pub struct AudioSettingsStore {
    storage: ProviderSlot,
    current: AudioSettings,
}

impl AudioSettingsStore {
    pub fn new() -> Self {
        Self {
            storage: ProviderSlot::new(),
            current: AudioSettings::default(),
        }
    }

    pub fn with_provider(provider: Rc<dyn StorageProvider>) -> Self {
        Self {
            storage: ProviderSlot::with_provider(provider),
            current: AudioSettings::default(),
        }
    }

    pub fn set_storage_provider(&mut self, provider: Rc<dyn StorageProvider>) {
        self.storage.set(provider);
    }

    pub fn reset_storage_provider(&mut self) {
        self.storage.reset();
    }

    fn try_load(&self) -> Result<Option<AudioSettings>, PersistenceError> {
        Ok(self
            .storage
            .load_json::<AudioSettings>(keys::AUDIO_SETTINGS)?
            .map(AudioSettings::clamped))
    }

    fn save(&self) {
        if let Err(e) = self.storage.save_json(keys::AUDIO_SETTINGS, &self.current) {
            log::warn!("Failed to save audio settings: {e}");
        }
    }

    /// Load stored settings, falling back to defaults
    pub fn initialize(&mut self) -> AudioSettings {
        self.current = match self.try_load() {
            Ok(Some(settings)) => {
                log::info!("Loaded audio settings");
                settings
            }
            Ok(None) => {
                log::info!("Using default audio settings");
                AudioSettings::default()
            }
            Err(e) => {
                log::warn!("Ignoring stored audio settings: {e}");
                AudioSettings::default()
            }
        };
        self.current
    }

    pub fn settings(&self) -> AudioSettings {
        self.current
    }

    pub fn set_master_volume(&mut self, volume: f32) {
        self.current.master_volume = clamp_volume(volume);
        self.save();
    }

    pub fn set_se_volume(&mut self, volume: f32) {
        self.current.se_volume = clamp_volume(volume);
        self.save();
    }

    pub fn set_bgm_volume(&mut self, volume: f32) {
        self.current.bgm_volume = clamp_volume(volume);
        self.save();
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.current.is_muted = muted;
        self.save();
    }

    /// Flip mute, returning the new state
    pub fn toggle_mute(&mut self) -> bool {
        let muted = !self.current.is_muted;
        self.set_muted(muted);
        muted
    }

    /// Back to defaults, persisted
    pub fn reset(&mut self) {
        self.current = AudioSettings::default();
        self.save();
    }

    /// Back to defaults and drop the stored copy
    pub fn clear(&mut self) {
        self.current = AudioSettings::default();
        if let Err(e) = self.storage.get().remove(keys::AUDIO_SETTINGS) {
            log::warn!("Failed to clear audio settings: {e}");
        }
    }
}

impl Default for AudioSettingsStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::MemoryStorageProvider;

    fn store() -> (AudioSettingsStore, Rc<MemoryStorageProvider>) {
        let storage = Rc::new(MemoryStorageProvider::new());
        (AudioSettingsStore::with_provider(storage.clone()), storage)
    }

    #[test]
    fn test_initialize_defaults() {
        let (mut store, _) = store();
        assert_eq!(store.initialize(), AudioSettings::default());
    }

    #[test]
    fn test_initialize_clamps_stored_values() {
        let (mut store, storage) = store();
        storage
            .set(
                keys::AUDIO_SETTINGS,
                r#"{"masterVolume":1.5,"seVolume":-0.2,"bgmVolume":0.3,"isMuted":true}"#,
            )
            .unwrap();

        let settings = store.initialize();
        assert_eq!(settings.master_volume, 1.0);
        assert_eq!(settings.se_volume, 0.0);
        assert_eq!(settings.bgm_volume, 0.3);
        assert!(settings.is_muted);
    }

    #[test]
    fn test_initialize_rejects_wrong_types() {
        let (mut store, storage) = store();
        storage
            .set(keys::AUDIO_SETTINGS, r#"{"masterVolume":"loud","isMuted":1}"#)
            .unwrap();
        assert_eq!(store.initialize(), AudioSettings::default());
    }

    #[test]
    fn test_setters_clamp_and_persist() {
        let (mut store, storage) = store();
        store.set_master_volume(2.0);
        store.set_se_volume(0.25);
        store.set_bgm_volume(-1.0);

        let settings = store.settings();
        assert_eq!(settings.master_volume, 1.0);
        assert_eq!(settings.se_volume, 0.25);
        assert_eq!(settings.bgm_volume, 0.0);

        let mut reloaded = AudioSettingsStore::with_provider(storage);
        assert_eq!(reloaded.initialize(), settings);
    }

    #[test]
    fn test_toggle_mute() {
        let (mut store, _) = store();
        assert!(store.toggle_mute());
        assert!(store.settings().is_muted);
        assert_eq!(store.settings().effective_se_volume(), 0.0);
        assert!(!store.toggle_mute());
    }

    #[test]
    fn test_reset_and_clear() {
        let (mut store, storage) = store();
        store.set_muted(true);

        store.reset();
        assert_eq!(store.settings(), AudioSettings::default());
        assert!(storage.get(keys::AUDIO_SETTINGS).unwrap().is_some());

        store.set_master_volume(0.1);
        store.clear();
        assert_eq!(store.settings(), AudioSettings::default());
        assert_eq!(storage.get(keys::AUDIO_SETTINGS).unwrap(), None);
    }

    #[test]
    fn test_storage_failure_keeps_memory_state() {
        let (mut store, storage) = store();
        storage.set_failing(true);
        store.set_bgm_volume(0.9);
        assert_eq!(store.settings().bgm_volume, 0.9);
        assert_eq!(store.initialize(), AudioSettings::default());
    }
}
