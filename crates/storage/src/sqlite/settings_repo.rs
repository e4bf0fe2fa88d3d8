use async_trait::async_trait;
use quiz_core::model::QuizSettings;

use super::SqliteRepository;
use super::mapping::{conn, join_domain_keys, map_settings_row};
use crate::repository::{SettingsRepository, StorageError};

#[async_trait]
impl SettingsRepository for SqliteRepository {
    async fn get_settings(&self) -> Result<Option<QuizSettings>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT questions_per_session, enabled_domains
            FROM quiz_settings
            WHERE id = 1
            ",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        let Some(row) = row else {
            return Ok(None);
        };

        map_settings_row(&row).map(Some)
    }

    async fn save_settings(&self, settings: &QuizSettings) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO quiz_settings (id, questions_per_session, enabled_domains)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(id) DO UPDATE SET
                questions_per_session = excluded.questions_per_session,
                enabled_domains = excluded.enabled_domains
            ",
        )
        .bind(1_i64)
        .bind(i64::from(settings.questions_per_session()))
        .bind(join_domain_keys(settings))
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }
}
