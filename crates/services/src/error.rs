//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::BankError;
use quiz_core::model::{SessionRecordError, SettingsError};
use quiz_storage::repository::{SessionRecordId, StorageError};
use quiz_storage::sqlite::SqliteInitError;

/// Errors emitted by session services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("current question has not been answered yet")]
    NotAnswered,
    #[error("session already completed")]
    Completed,
    #[error("session is not finished")]
    NotFinished,
    #[error("session already recorded as {0}")]
    AlreadyRecorded(SessionRecordId),
    #[error(transparent)]
    Record(#[from] SessionRecordError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `SettingsService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SettingsServiceError {
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Bank(#[from] BankError),
}
