#![forbid(unsafe_code)]

pub mod app_services;
pub mod error;
pub mod sessions;
pub mod settings_service;

pub use quiz_core::Clock;

pub use app_services::{AppServices, DB_URL_ENV, DEFAULT_DB_URL, db_url_from_env};
pub use error::{AppServicesError, SessionError, SettingsServiceError};
pub use settings_service::SettingsService;

pub use sessions::{
    AnswerFeedback, FinishedSession, QuizLoopService, QuizPhase, QuizSession, SessionBuilder,
    SessionHistoryItem, SessionHistoryService, SessionPlan, SessionProgress,
};
