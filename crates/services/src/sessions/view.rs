use chrono::{DateTime, Utc};
use std::sync::Arc;

use quiz_storage::repository::{SessionHistoryRepository, SessionRecordId, SessionRecordRow};

use crate::error::SessionError;

/// Presentation-agnostic list item for a completed session.
///
/// Timestamps are left unformatted; the host decides how to render them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionHistoryItem {
    pub id: SessionRecordId,
    pub completed_at: DateTime<Utc>,
    pub score: u32,
    pub highest_streak: u32,
    pub total: u32,
    pub correct: u32,
    pub accuracy_percent: u32,
}

impl SessionHistoryItem {
    #[must_use]
    pub fn from_row(row: &SessionRecordRow) -> Self {
        let record = &row.record;
        Self {
            id: row.id,
            completed_at: record.completed_at(),
            score: record.score(),
            highest_streak: record.highest_streak(),
            total: record.total_questions(),
            correct: record.correct_answers(),
            accuracy_percent: record.accuracy_percent(),
        }
    }
}

/// Read side of the session history.
#[derive(Clone)]
pub struct SessionHistoryService {
    history: Arc<dyn SessionHistoryRepository>,
}

impl SessionHistoryService {
    #[must_use]
    pub fn new(history: Arc<dyn SessionHistoryRepository>) -> Self {
        Self { history }
    }

    /// Most recent sessions first, at most `limit`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` on repository failures.
    pub async fn list_recent(&self, limit: u32) -> Result<Vec<SessionHistoryItem>, SessionError> {
        let rows = self.history.list_records_descending(limit).await?;
        Ok(rows.iter().map(SessionHistoryItem::from_row).collect())
    }
}
