use quiz_core::model::{CardState, QuestionId, QuizSettings, SessionRecord};
use quiz_core::time::from_millis;
use sqlx::Row;

use crate::repository::{SessionRecordRow, StorageError};

/// Separator used for the enabled domain keys column.
pub(crate) const DOMAIN_SEPARATOR: &str = ",";

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

fn timestamp(
    field: &'static str,
    millis: i64,
) -> Result<chrono::DateTime<chrono::Utc>, StorageError> {
    from_millis(millis)
        .ok_or_else(|| StorageError::Serialization(format!("{field} out of range: {millis}")))
}

pub(crate) fn map_card_state_row(row: &sqlx::sqlite::SqliteRow) -> Result<CardState, StorageError> {
    let question_id = QuestionId::new(u32_from_i64(
        "question_id",
        row.try_get::<i64, _>("question_id").map_err(ser)?,
    )?);
    let interval_days = u32_from_i64(
        "interval_days",
        row.try_get::<i64, _>("interval_days").map_err(ser)?,
    )?;
    let ease_factor: f64 = row.try_get("ease_factor").map_err(ser)?;
    let due_at = timestamp("due_at_ms", row.try_get::<i64, _>("due_at_ms").map_err(ser)?)?;

    CardState::from_persisted(question_id, interval_days, ease_factor, due_at).map_err(ser)
}

pub(crate) fn map_session_record_row(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<SessionRecord, StorageError> {
    let completed_at = timestamp(
        "completed_at_ms",
        row.try_get::<i64, _>("completed_at_ms").map_err(ser)?,
    )?;
    let score = u32_from_i64("score", row.try_get::<i64, _>("score").map_err(ser)?)?;
    let highest_streak = u32_from_i64(
        "highest_streak",
        row.try_get::<i64, _>("highest_streak").map_err(ser)?,
    )?;
    let total_questions = u32_from_i64(
        "total_questions",
        row.try_get::<i64, _>("total_questions").map_err(ser)?,
    )?;
    let correct_answers = u32_from_i64(
        "correct_answers",
        row.try_get::<i64, _>("correct_answers").map_err(ser)?,
    )?;

    SessionRecord::new(
        completed_at,
        score,
        highest_streak,
        total_questions,
        correct_answers,
    )
    .map_err(ser)
}

pub(crate) fn map_session_record_row_with_id(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<SessionRecordRow, StorageError> {
    let id: i64 = row.try_get("id").map_err(ser)?;
    Ok(SessionRecordRow::new(id, map_session_record_row(row)?))
}

pub(crate) fn map_settings_row(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<QuizSettings, StorageError> {
    let count = row
        .try_get::<i64, _>("questions_per_session")
        .map_err(ser)?;
    let domains: String = row.try_get("enabled_domains").map_err(ser)?;

    // Out-of-range counts are clamped rather than rejected.
    let count = u32::try_from(count.max(0)).unwrap_or(u32::MAX);
    Ok(QuizSettings::from_persisted(
        count,
        domains
            .split(DOMAIN_SEPARATOR)
            .map(str::trim)
            .filter(|k| !k.is_empty()),
    ))
}

pub(crate) fn join_domain_keys(settings: &QuizSettings) -> String {
    settings.domain_keys().join(DOMAIN_SEPARATOR)
}
