//! Best-run record system
//!
//! Persisted to LocalStorage, keeps the fastest clear per player class.

use std::rc::Rc;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::persistence::{PersistenceError, ProviderSlot, keys};
use crate::platform::{Clock, StorageProvider, SystemClock, clock::to_iso8601};

/// Clear-time rank, best first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rating {
    S,
    A,
    B,
    C,
    D,
}

impl Rating {
    /// Upper bounds (inclusive, ms) for S, A, B and C. Anything slower is D.
    pub const THRESHOLDS: [(Rating, u64); 4] = [
        (Rating::S, 120_000),
        (Rating::A, 180_000),
        (Rating::B, 300_000),
        (Rating::C, 480_000),
    ];

    /// Rank a clear time
    pub fn from_time(time_ms: u64) -> Self {
        Self::THRESHOLDS
            .iter()
            .find(|(_, limit)| time_ms <= *limit)
            .map(|(rating, _)| *rating)
            .unwrap_or(Rating::D)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Rating::S => "s",
            Rating::A => "a",
            Rating::B => "b",
            Rating::C => "c",
            Rating::D => "d",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "s" => Some(Rating::S),
            "a" => Some(Rating::A),
            "b" => Some(Rating::B),
            "c" => Some(Rating::C),
            "d" => Some(Rating::D),
            _ => None,
        }
    }
}

/// Playable class. Records are kept separately per class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerClass {
    Warrior,
    Thief,
}

impl PlayerClass {
    /// Canonical listing order
    pub const ALL: [PlayerClass; 2] = [PlayerClass::Warrior, PlayerClass::Thief];

    pub fn as_str(&self) -> &'static str {
        match self {
            PlayerClass::Warrior => "warrior",
            PlayerClass::Thief => "thief",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "warrior" => Some(PlayerClass::Warrior),
            "thief" => Some(PlayerClass::Thief),
            _ => None,
        }
    }
}

/// One finished run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameRecord {
    /// Clear time in milliseconds
    #[serde(deserialize_with = "deserialize_millis")]
    pub time: u64,
    pub rating: Rating,
    pub player_class: PlayerClass,
    /// ISO-8601 UTC timestamp of the clear
    #[serde(default)]
    pub date: String,
}

/// Whole or fractional milliseconds; fractions round up so a stored time
/// never reads faster than it was.
fn deserialize_millis<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Millis {
        Whole(u64),
        Fraction(f64),
    }

    match Millis::deserialize(deserializer)? {
        Millis::Whole(ms) => Ok(ms),
        Millis::Fraction(ms) if ms.is_finite() && ms >= 0.0 => Ok(ms.ceil() as u64),
        Millis::Fraction(ms) => Err(serde::de::Error::custom(format!("invalid time {ms}"))),
    }
}

/// Best record per class, one optional slot each
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BestRecords {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warrior: Option<GameRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thief: Option<GameRecord>,
}

impl BestRecords {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, class: PlayerClass) -> Option<&GameRecord> {
        match class {
            PlayerClass::Warrior => self.warrior.as_ref(),
            PlayerClass::Thief => self.thief.as_ref(),
        }
    }

    /// Decode each known class on its own, skipping entries that do not parse
    pub fn from_entries(entries: &Map<String, Value>) -> Self {
        let mut records = Self::default();
        for class in PlayerClass::ALL {
            let Some(value) = entries.get(class.as_str()) else {
                continue;
            };
            match serde_json::from_value::<GameRecord>(value.clone()) {
                Ok(record) => *records.slot_mut(class) = Some(record),
                Err(e) => log::warn!("Skipping unreadable {} record: {e}", class.as_str()),
            }
        }
        records
    }

    fn slot_mut(&mut self, class: PlayerClass) -> &mut Option<GameRecord> {
        match class {
            PlayerClass::Warrior => &mut self.warrior,
            PlayerClass::Thief => &mut self.thief,
        }
    }

    /// Copy of this mapping with `record` stored under its own class
    pub fn with_record(&self, record: GameRecord) -> Self {
        let mut records = self.clone();
        let class = record.player_class;
        *records.slot_mut(class) = Some(record);
        records
    }

    /// Stored records in canonical class order
    pub fn iter(&self) -> impl Iterator<Item = (PlayerClass, &GameRecord)> {
        PlayerClass::ALL
            .into_iter()
            .filter_map(|class| self.get(class).map(|record| (class, record)))
    }

    pub fn is_empty(&self) -> bool {
        self.warrior.is_none() && self.thief.is_none()
    }
}

/// Outcome of offering a record to the leaderboard
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BestRecordUpdate {
    pub records: BestRecords,
    pub is_new_best: bool,
}

/// Whether `candidate` beats `current_best`. Ties keep the existing record.
pub fn is_best_record(candidate: &GameRecord, current_best: Option<&GameRecord>) -> bool {
    match current_best {
        None => true,
        Some(best) => candidate.time < best.time,
    }
}

/// Record persistence bound to a storage provider and a clock
pub struct RecordStore {
    storage: ProviderSlot,
    clock: Rc<dyn Clock>,
}

impl RecordStore {
    /// Store on the platform default provider and the system clock
    pub fn new() -> Self {
        Self {
            storage: ProviderSlot::new(),
            clock: Rc::new(SystemClock),
        }
    }

    pub fn with_provider(provider: Rc<dyn StorageProvider>) -> Self {
        Self {
            storage: ProviderSlot::with_provider(provider),
            clock: Rc::new(SystemClock),
        }
    }

    pub fn set_storage_provider(&mut self, provider: Rc<dyn StorageProvider>) {
        self.storage.set(provider);
    }

    pub fn reset_storage_provider(&mut self) {
        self.storage.reset();
    }

    pub fn set_clock(&mut self, clock: Rc<dyn Clock>) {
        self.clock = clock;
    }

    pub fn reset_clock(&mut self) {
        self.clock = Rc::new(SystemClock);
    }

    /// Stamp a new record with the current time. Values are taken as given.
    pub fn create_record(&self, time: u64, rating: Rating, player_class: PlayerClass) -> GameRecord {
        GameRecord {
            time,
            rating,
            player_class,
            date: to_iso8601(self.clock.now_millis()),
        }
    }

    fn try_load(&self) -> Result<BestRecords, PersistenceError> {
        Ok(self
            .storage
            .load_json::<Map<String, Value>>(keys::BEST_RECORDS)?
            .map(|entries| BestRecords::from_entries(&entries))
            .unwrap_or_default())
    }

    /// Load best records, empty when missing or unreadable
    pub fn load_best_records(&self) -> BestRecords {
        match self.try_load() {
            Ok(records) => {
                log::debug!("Loaded best records ({} classes)", records.iter().count());
                records
            }
            Err(e) => {
                log::warn!("Failed to load best records: {e}");
                BestRecords::default()
            }
        }
    }

    pub fn save_best_records(&self, records: &BestRecords) {
        match self.storage.save_json(keys::BEST_RECORDS, records) {
            Ok(()) => log::info!("Best records saved ({} classes)", records.iter().count()),
            Err(e) => log::warn!("Failed to save best records: {e}"),
        }
    }

    /// Store `record` if it beats the current best for its class, persisting immediately
    pub fn update_best_record(&self, record: GameRecord, records: BestRecords) -> BestRecordUpdate {
        if !is_best_record(&record, records.get(record.player_class)) {
            return BestRecordUpdate {
                records,
                is_new_best: false,
            };
        }

        log::info!(
            "New best for {}: {} ms ({})",
            record.player_class.as_str(),
            record.time,
            record.rating.as_str()
        );
        let records = records.with_record(record);
        self.save_best_records(&records);
        BestRecordUpdate {
            records,
            is_new_best: true,
        }
    }

    /// Offer a record against what is currently stored
    pub fn save_record(&self, record: GameRecord) -> BestRecordUpdate {
        let current = self.load_best_records();
        self.update_best_record(record, current)
    }

    /// Record a stage clear, rating it from the clear time
    pub fn record_clear(&self, time: u64, player_class: PlayerClass) -> BestRecordUpdate {
        let record = self.create_record(time, Rating::from_time(time), player_class);
        self.save_record(record)
    }

    /// Wipe game progress: best records and the tutorial flag
    pub fn clear_records(&self) {
        let storage = self.storage.get();
        let result = storage
            .remove(keys::BEST_RECORDS)
            .and_then(|()| storage.remove(keys::TUTORIAL_COMPLETED));
        match result {
            Ok(()) => log::info!("Game progress cleared"),
            Err(e) => log::warn!("Failed to clear records: {e}"),
        }
    }

    pub fn best_record_for_class(&self, player_class: PlayerClass) -> Option<GameRecord> {
        self.load_best_records().get(player_class).cloned()
    }

    /// Stored bests in canonical class order (warrior, then thief)
    pub fn all_best_records(&self) -> Vec<(PlayerClass, GameRecord)> {
        self.load_best_records()
            .iter()
            .map(|(class, record)| (class, record.clone()))
            .collect()
    }
}

impl Default for RecordStore {
    fn default() -> Self {
        Self::new()
    }
}
