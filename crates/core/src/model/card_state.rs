use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::QuestionId;
use crate::time::epoch;

pub const DEFAULT_INTERVAL_DAYS: u32 = 1;
pub const DEFAULT_EASE_FACTOR: f64 = 2.5;
pub const MIN_EASE_FACTOR: f64 = 1.3;

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum CardStateError {
    #[error("interval must be at least 1 day, got {0}")]
    InvalidInterval(u32),

    #[error("ease factor must be finite and >= 1.3, got {0}")]
    InvalidEaseFactor(f64),
}

/// Per-question scheduling state.
///
/// A card is due once `due_at <= now`. Values are never mutated in place: the
/// scheduler takes a reference and hands back a fresh `CardState`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PersistedCardState")]
pub struct CardState {
    question_id: QuestionId,
    interval_days: u32,
    ease_factor: f64,
    due_at: DateTime<Utc>,
}

impl CardState {
    /// Default state for a question answered for the first time.
    ///
    /// The due date is the Unix epoch, so the card counts as due right away.
    #[must_use]
    pub fn new(question_id: QuestionId) -> Self {
        Self {
            question_id,
            interval_days: DEFAULT_INTERVAL_DAYS,
            ease_factor: DEFAULT_EASE_FACTOR,
            due_at: epoch(),
        }
    }

    /// Rehydrate a card state from storage.
    ///
    /// # Errors
    ///
    /// Returns `CardStateError` if the interval is zero or the ease factor is
    /// below the floor.
    pub fn from_persisted(
        question_id: QuestionId,
        interval_days: u32,
        ease_factor: f64,
        due_at: DateTime<Utc>,
    ) -> Result<Self, CardStateError> {
        if interval_days == 0 {
            return Err(CardStateError::InvalidInterval(interval_days));
        }
        if !ease_factor.is_finite() || ease_factor < MIN_EASE_FACTOR {
            return Err(CardStateError::InvalidEaseFactor(ease_factor));
        }

        Ok(Self {
            question_id,
            interval_days,
            ease_factor,
            due_at,
        })
    }

    pub(crate) fn rescheduled(
        &self,
        interval_days: u32,
        ease_factor: f64,
        due_at: DateTime<Utc>,
    ) -> Self {
        Self {
            question_id: self.question_id,
            interval_days,
            ease_factor,
            due_at,
        }
    }

    #[must_use]
    pub fn question_id(&self) -> QuestionId {
        self.question_id
    }

    #[must_use]
    pub fn interval_days(&self) -> u32 {
        self.interval_days
    }

    #[must_use]
    pub fn ease_factor(&self) -> f64 {
        self.ease_factor
    }

    #[must_use]
    pub fn due_at(&self) -> DateTime<Utc> {
        self.due_at
    }

    /// Due date as epoch milliseconds.
    #[must_use]
    pub fn due_at_millis(&self) -> i64 {
        self.due_at.timestamp_millis()
    }

    #[must_use]
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.due_at <= now
    }
}

/// Wire shape checked by `CardState::from_persisted` on deserialization.
#[derive(Deserialize)]
struct PersistedCardState {
    question_id: QuestionId,
    interval_days: u32,
    ease_factor: f64,
    due_at: DateTime<Utc>,
}

impl TryFrom<PersistedCardState> for CardState {
    type Error = CardStateError;

    fn try_from(raw: PersistedCardState) -> Result<Self, Self::Error> {
        Self::from_persisted(raw.question_id, raw.interval_days, raw.ease_factor, raw.due_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;
    use chrono::Duration;

    #[test]
    fn new_card_uses_defaults_and_is_due() {
        let card = CardState::new(QuestionId::new(3));
        assert_eq!(card.interval_days(), 1);
        assert_eq!(card.ease_factor(), 2.5);
        assert_eq!(card.due_at_millis(), 0);
        assert!(card.is_due(fixed_now()));
    }

    #[test]
    fn due_boundary_is_inclusive() {
        let now = fixed_now();
        let card = CardState::from_persisted(QuestionId::new(1), 3, 2.5, now).unwrap();
        assert!(card.is_due(now));
        assert!(!card.is_due(now - Duration::milliseconds(1)));
    }

    #[test]
    fn from_persisted_validates() {
        let now = fixed_now();
        assert!(matches!(
            CardState::from_persisted(QuestionId::new(1), 0, 2.5, now),
            Err(CardStateError::InvalidInterval(0))
        ));
        assert!(matches!(
            CardState::from_persisted(QuestionId::new(1), 1, 1.1, now),
            Err(CardStateError::InvalidEaseFactor(_))
        ));
        assert!(matches!(
            CardState::from_persisted(QuestionId::new(1), 1, f64::NAN, now),
            Err(CardStateError::InvalidEaseFactor(_))
        ));
        assert!(CardState::from_persisted(QuestionId::new(1), 1, MIN_EASE_FACTOR, now).is_ok());
    }

    #[test]
    fn deserialize_runs_persisted_checks() {
        let card = CardState::from_persisted(QuestionId::new(5), 4, 1.9, fixed_now()).unwrap();
        let json = serde_json::to_string(&card).unwrap();
        assert_eq!(serde_json::from_str::<CardState>(&json).unwrap(), card);

        let zero_interval = json.replace("\"interval_days\":4", "\"interval_days\":0");
        assert!(serde_json::from_str::<CardState>(&zero_interval).is_err());

        let low_ease = json.replace("\"ease_factor\":1.9", "\"ease_factor\":1.0");
        assert!(serde_json::from_str::<CardState>(&low_ease).is_err());
    }
}
