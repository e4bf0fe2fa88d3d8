use std::sync::Arc;
use std::time::Duration;

use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};
use thiserror::Error;
use tracing::debug;

use crate::repository::{
    CardStateRepository, SessionHistoryRepository, SettingsRepository, Storage,
};

mod card_state_repo;
mod mapping;
mod migrate;
mod session_record_repo;
mod settings_repo;

const MAX_CONNECTIONS: u32 = 5;
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// Run on every pooled connection.
const CONNECTION_PRAGMAS: &[&str] = &["PRAGMA journal_mode = WAL;", "PRAGMA busy_timeout = 5000;"];

/// Backs card states, session history and settings with one `SQLite` database.
#[derive(Clone)]
pub struct SqliteRepository {
    pool: SqlitePool,
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SqliteInitError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

impl SqliteRepository {
    /// Open the quiz database at `database_url`.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` if the pool cannot connect or a pragma fails.
    pub async fn connect(database_url: &str) -> Result<Self, SqliteInitError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .after_connect(|conn, _meta| {
                Box::pin(async move {
                    for &pragma in CONNECTION_PRAGMAS {
                        sqlx::query(pragma).execute(&mut *conn).await?;
                    }
                    Ok(())
                })
            })
            .connect(database_url)
            .await?;
        debug!(database_url, "quiz database opened");
        Ok(Self { pool })
    }

    /// Bring the card state, history and settings tables up to date.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` if a migration step fails.
    pub async fn migrate(&self) -> Result<(), SqliteInitError> {
        migrate::run_migrations(&self.pool).await
    }
}

impl Storage {
    /// Open and migrate the quiz database, then share it across all three
    /// repositories.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` if opening or migrating fails.
    pub async fn sqlite(database_url: &str) -> Result<Self, SqliteInitError> {
        let repo = SqliteRepository::connect(database_url).await?;
        repo.migrate().await?;
        let cards: Arc<dyn CardStateRepository> = Arc::new(repo.clone());
        let history: Arc<dyn SessionHistoryRepository> = Arc::new(repo.clone());
        let settings: Arc<dyn SettingsRepository> = Arc::new(repo);
        Ok(Self {
            cards,
            history,
            settings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pragmas_enable_wal_and_busy_timeout() {
        assert!(CONNECTION_PRAGMAS.iter().any(|p| p.contains("journal_mode = WAL")));
        assert!(CONNECTION_PRAGMAS.iter().any(|p| p.contains("busy_timeout")));
    }

    #[tokio::test]
    async fn storage_shares_one_database_across_repositories() {
        let storage = Storage::sqlite("sqlite:file:memdb_shared_storage?mode=memory&cache=shared")
            .await
            .unwrap();
        assert!(storage.settings.get_settings().await.unwrap().is_none());
        assert!(storage.cards.list_cards().await.unwrap().is_empty());
        assert!(storage.history.list_all_records_descending().await.unwrap().is_empty());
    }
}
