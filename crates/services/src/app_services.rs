use std::sync::Arc;
use tracing::info;

use quiz_core::QuestionBank;
use quiz_storage::repository::Storage;

use crate::Clock;
use crate::error::AppServicesError;
use crate::sessions::{QuizLoopService, SessionHistoryService};
use crate::settings_service::SettingsService;

pub const DEFAULT_DB_URL: &str = "sqlite:quiz.sqlite3";
pub const DB_URL_ENV: &str = "QUIZ_DB_URL";

/// Database URL from `QUIZ_DB_URL`, falling back to `DEFAULT_DB_URL`.
#[must_use]
pub fn db_url_from_env() -> String {
    std::env::var(DB_URL_ENV)
        .ok()
        .filter(|url| !url.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_DB_URL.to_string())
}

/// Assembles host-facing services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    bank: Arc<QuestionBank>,
    quiz_loop: Arc<QuizLoopService>,
    history: Arc<SessionHistoryService>,
    settings: Arc<SettingsService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails or the bundled
    /// catalog is invalid.
    pub async fn new_sqlite(db_url: &str, clock: Clock) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        let services = Self::from_storage(&storage, clock)?;
        info!(db_url, questions = services.bank.len(), "app services ready");
        Ok(services)
    }

    /// Build services over in-memory storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError::Bank` if the bundled catalog is invalid.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn in_memory(clock: Clock) -> Result<Self, AppServicesError> {
        Self::from_storage(&Storage::in_memory(), clock)
    }

    /// Build services over an existing storage aggregate.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError::Bank` if the bundled catalog is invalid.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn from_storage(storage: &Storage, clock: Clock) -> Result<Self, AppServicesError> {
        let bank = Arc::new(QuestionBank::bundled()?);
        let quiz_loop = Arc::new(QuizLoopService::new(
            clock,
            Arc::clone(&bank),
            Arc::clone(&storage.cards),
            Arc::clone(&storage.history),
            Arc::clone(&storage.settings),
        ));
        let history = Arc::new(SessionHistoryService::new(Arc::clone(&storage.history)));
        let settings = Arc::new(SettingsService::new(Arc::clone(&storage.settings)));

        Ok(Self {
            bank,
            quiz_loop,
            history,
            settings,
        })
    }

    #[must_use]
    pub fn bank(&self) -> Arc<QuestionBank> {
        Arc::clone(&self.bank)
    }

    #[must_use]
    pub fn quiz_loop(&self) -> Arc<QuizLoopService> {
        Arc::clone(&self.quiz_loop)
    }

    #[must_use]
    pub fn history(&self) -> Arc<SessionHistoryService> {
        Arc::clone(&self.history)
    }

    #[must_use]
    pub fn settings(&self) -> Arc<SettingsService> {
        Arc::clone(&self.settings)
    }
}
