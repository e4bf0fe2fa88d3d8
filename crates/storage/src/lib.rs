#![forbid(unsafe_code)]

pub mod repository;
pub mod sqlite;

pub use repository::{
    CardStateRepository, InMemoryRepository, SessionHistoryRepository, SessionRecordId,
    SessionRecordRow, SettingsRepository, Storage, StorageError,
};
