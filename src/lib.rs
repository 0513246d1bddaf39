//! IPNE progress - best-run records and tutorial progress for the IPNE maze game
//!
//! Core modules:
//! - `records`: Best clear time per player class
//! - `tutorial`: First-run tutorial steps and completion flag
//! - `audio_settings`: Volume/mute preferences
//! - `persistence`: Storage keys, provider slots, JSON helpers
//! - `platform`: Browser/native storage and clock abstraction

pub mod audio_settings;
pub mod persistence;
pub mod platform;
pub mod records;
pub mod tutorial;

#[cfg(target_arch = "wasm32")]
pub mod web;

pub use audio_settings::{AudioSettings, AudioSettingsStore};
pub use records::{BestRecordUpdate, BestRecords, GameRecord, PlayerClass, Rating, RecordStore};
pub use tutorial::{TUTORIAL_STEPS, Tutorial, TutorialState, TutorialStep, TutorialStepId};
