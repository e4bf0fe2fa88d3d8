use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

use quiz_core::model::{CardState, QuestionId, QuizSettings, SessionRecord};

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Storage identifier for a persisted session record.
///
/// NOTE: This is `i64` to match `SQLite` row IDs.
pub type SessionRecordId = i64;

/// A session record together with its storage id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecordRow {
    pub id: SessionRecordId,
    pub record: SessionRecord,
}

impl SessionRecordRow {
    #[must_use]
    pub fn new(id: SessionRecordId, record: SessionRecord) -> Self {
        Self { id, record }
    }
}

/// Durable mapping from question id to scheduling state.
#[async_trait]
pub trait CardStateRepository: Send + Sync {
    /// Every known card state.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the states cannot be read.
    async fn list_cards(&self) -> Result<Vec<CardState>, StorageError>;

    /// Card state for one question, or `None` if it was never answered.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the state cannot be read.
    async fn get_card(&self, question_id: QuestionId) -> Result<Option<CardState>, StorageError>;

    /// Insert or replace the state for `card.question_id()`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the state cannot be stored.
    async fn put_card(&self, card: &CardState) -> Result<(), StorageError>;
}

/// Append-only log of completed sessions.
#[async_trait]
pub trait SessionHistoryRepository: Send + Sync {
    /// Append a record and return its id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the record cannot be stored.
    async fn append_record(&self, record: &SessionRecord) -> Result<SessionRecordId, StorageError>;

    /// Fetch a record by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn get_record(&self, id: SessionRecordId) -> Result<SessionRecord, StorageError>;

    /// Newest records first (ties broken by id, newest first), at most `limit`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the records cannot be read.
    async fn list_records_descending(&self, limit: u32)
    -> Result<Vec<SessionRecordRow>, StorageError>;

    /// Every record, newest first, in the same order as `list_records_descending`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the records cannot be read.
    async fn list_all_records_descending(&self) -> Result<Vec<SessionRecordRow>, StorageError> {
        self.list_records_descending(u32::MAX).await
    }
}

#[async_trait]
pub trait SettingsRepository: Send + Sync {
    /// Stored settings, or `None` if the learner never saved any.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if settings cannot be read.
    async fn get_settings(&self) -> Result<Option<QuizSettings>, StorageError>;

    /// Replace the stored settings.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if settings cannot be stored.
    async fn save_settings(&self, settings: &QuizSettings) -> Result<(), StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    cards: Arc<Mutex<BTreeMap<QuestionId, CardState>>>,
    records: Arc<Mutex<Vec<SessionRecordRow>>>,
    settings: Arc<Mutex<Option<QuizSettings>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<E: std::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

#[async_trait]
impl CardStateRepository for InMemoryRepository {
    async fn list_cards(&self) -> Result<Vec<CardState>, StorageError> {
        let guard = self.cards.lock().map_err(poisoned)?;
        Ok(guard.values().cloned().collect())
    }

    async fn get_card(&self, question_id: QuestionId) -> Result<Option<CardState>, StorageError> {
        let guard = self.cards.lock().map_err(poisoned)?;
        Ok(guard.get(&question_id).cloned())
    }

    async fn put_card(&self, card: &CardState) -> Result<(), StorageError> {
        let mut guard = self.cards.lock().map_err(poisoned)?;
        guard.insert(card.question_id(), card.clone());
        Ok(())
    }
}

#[async_trait]
impl SessionHistoryRepository for InMemoryRepository {
    async fn append_record(&self, record: &SessionRecord) -> Result<SessionRecordId, StorageError> {
        let mut guard = self.records.lock().map_err(poisoned)?;
        let id = guard.last().map_or(1, |row| row.id + 1);
        guard.push(SessionRecordRow::new(id, record.clone()));
        Ok(id)
    }

    async fn get_record(&self, id: SessionRecordId) -> Result<SessionRecord, StorageError> {
        let guard = self.records.lock().map_err(poisoned)?;
        guard
            .iter()
            .find(|row| row.id == id)
            .map(|row| row.record.clone())
            .ok_or(StorageError::NotFound)
    }

    async fn list_records_descending(
        &self,
        limit: u32,
    ) -> Result<Vec<SessionRecordRow>, StorageError> {
        let guard = self.records.lock().map_err(poisoned)?;
        let mut rows = guard.clone();
        rows.sort_by(|a, b| {
            b.record
                .completed_at()
                .cmp(&a.record.completed_at())
                .then(b.id.cmp(&a.id))
        });
        rows.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(rows)
    }
}

#[async_trait]
impl SettingsRepository for InMemoryRepository {
    async fn get_settings(&self) -> Result<Option<QuizSettings>, StorageError> {
        let guard = self.settings.lock().map_err(poisoned)?;
        Ok(guard.clone())
    }

    async fn save_settings(&self, settings: &QuizSettings) -> Result<(), StorageError> {
        let mut guard = self.settings.lock().map_err(poisoned)?;
        *guard = Some(settings.clone());
        Ok(())
    }
}

/// Aggregates the quiz repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub cards: Arc<dyn CardStateRepository>,
    pub history: Arc<dyn SessionHistoryRepository>,
    pub settings: Arc<dyn SettingsRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let cards: Arc<dyn CardStateRepository> = Arc::new(repo.clone());
        let history: Arc<dyn SessionHistoryRepository> = Arc::new(repo.clone());
        let settings: Arc<dyn SettingsRepository> = Arc::new(repo);
        Self {
            cards,
            history,
            settings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use quiz_core::scheduler::on_correct;
    use quiz_core::time::fixed_now;

    #[tokio::test]
    async fn card_states_upsert_by_question() {
        let repo = InMemoryRepository::new();
        let id = QuestionId::new(4);
        assert!(repo.get_card(id).await.unwrap().is_none());

        let first = CardState::new(id);
        repo.put_card(&first).await.unwrap();
        let second = on_correct(&first, fixed_now());
        repo.put_card(&second).await.unwrap();

        assert_eq!(repo.get_card(id).await.unwrap(), Some(second));
        assert_eq!(repo.list_cards().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn history_lists_newest_first() {
        let repo = InMemoryRepository::new();
        let now = fixed_now();
        let older = SessionRecord::new(now - Duration::days(1), 30, 3, 5, 3).unwrap();
        let newer = SessionRecord::new(now, 10, 1, 5, 1).unwrap();
        let same_time = SessionRecord::new(now, 50, 5, 5, 5).unwrap();

        let older_id = repo.append_record(&older).await.unwrap();
        let newer_id = repo.append_record(&newer).await.unwrap();
        let same_id = repo.append_record(&same_time).await.unwrap();

        let rows = repo.list_records_descending(10).await.unwrap();
        let ids: Vec<_> = rows.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![same_id, newer_id, older_id]);

        let limited = repo.list_records_descending(1).await.unwrap();
        assert_eq!(limited.len(), 1);

        let all = repo.list_all_records_descending().await.unwrap();
        assert_eq!(all, rows);

        assert_eq!(repo.get_record(older_id).await.unwrap(), older);
        assert!(matches!(
            repo.get_record(999).await,
            Err(StorageError::NotFound)
        ));
    }

    #[tokio::test]
    async fn settings_round_trip() {
        let storage = Storage::in_memory();
        assert!(storage.settings.get_settings().await.unwrap().is_none());

        let settings = QuizSettings::from_persisted(25, ["MEMORY", "RTOS"]);
        storage.settings.save_settings(&settings).await.unwrap();
        assert_eq!(storage.settings.get_settings().await.unwrap(), Some(settings));
    }
}
