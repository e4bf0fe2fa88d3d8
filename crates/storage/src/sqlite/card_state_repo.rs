use async_trait::async_trait;
use quiz_core::model::{CardState, QuestionId};

use super::SqliteRepository;
use super::mapping::{conn, map_card_state_row};
use crate::repository::{CardStateRepository, StorageError};

#[async_trait]
impl CardStateRepository for SqliteRepository {
    async fn list_cards(&self) -> Result<Vec<CardState>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT question_id, interval_days, ease_factor, due_at_ms
                FROM card_states
                ORDER BY question_id ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_card_state_row).collect()
    }

    async fn get_card(&self, question_id: QuestionId) -> Result<Option<CardState>, StorageError> {
        let row = sqlx::query(
            r"
                SELECT question_id, interval_days, ease_factor, due_at_ms
                FROM card_states
                WHERE question_id = ?1
            ",
        )
        .bind(i64::from(question_id.value()))
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        row.as_ref().map(map_card_state_row).transpose()
    }

    async fn put_card(&self, card: &CardState) -> Result<(), StorageError> {
        sqlx::query(
            r"
                INSERT INTO card_states (question_id, interval_days, ease_factor, due_at_ms)
                VALUES (?1, ?2, ?3, ?4)
                ON CONFLICT(question_id) DO UPDATE SET
                    interval_days = excluded.interval_days,
                    ease_factor = excluded.ease_factor,
                    due_at_ms = excluded.due_at_ms
            ",
        )
        .bind(i64::from(card.question_id().value()))
        .bind(i64::from(card.interval_days()))
        .bind(card.ease_factor())
        .bind(card.due_at_millis())
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }
}
