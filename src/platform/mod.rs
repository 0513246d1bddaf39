//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Time (epoch milliseconds)
//! - Storage (LocalStorage on web, JSON file or no-op on native)

pub mod clock;
pub mod storage;

pub use clock::{Clock, FixedClock, SystemClock};
pub use storage::{
    MemoryStorageProvider, NoopStorageProvider, StorageError, StorageProvider,
    default_storage_provider,
};

#[cfg(target_arch = "wasm32")]
pub use storage::LocalStorageProvider;

#[cfg(not(target_arch = "wasm32"))]
pub use storage::FileStorageProvider;
