use async_trait::async_trait;
use quiz_core::model::SessionRecord;

use super::SqliteRepository;
use super::mapping::{conn, map_session_record_row, map_session_record_row_with_id};
use crate::repository::{SessionHistoryRepository, SessionRecordId, SessionRecordRow, StorageError};

#[async_trait]
impl SessionHistoryRepository for SqliteRepository {
    async fn append_record(&self, record: &SessionRecord) -> Result<SessionRecordId, StorageError> {
        let res = sqlx::query(
            r"
                INSERT INTO session_records (
                    completed_at_ms, score, highest_streak, total_questions, correct_answers
                )
                VALUES (?1, ?2, ?3, ?4, ?5)
            ",
        )
        .bind(record.completed_at().timestamp_millis())
        .bind(i64::from(record.score()))
        .bind(i64::from(record.highest_streak()))
        .bind(i64::from(record.total_questions()))
        .bind(i64::from(record.correct_answers()))
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(res.last_insert_rowid())
    }

    async fn get_record(&self, id: SessionRecordId) -> Result<SessionRecord, StorageError> {
        let row = sqlx::query(
            r"
                SELECT completed_at_ms, score, highest_streak, total_questions, correct_answers
                FROM session_records
                WHERE id = ?1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?
        .ok_or(StorageError::NotFound)?;

        map_session_record_row(&row)
    }

    async fn list_records_descending(
        &self,
        limit: u32,
    ) -> Result<Vec<SessionRecordRow>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT
                    id, completed_at_ms, score, highest_streak,
                    total_questions, correct_answers
                FROM session_records
                ORDER BY completed_at_ms DESC, id DESC
                LIMIT ?1
            ",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_session_record_row_with_id).collect()
    }
}
