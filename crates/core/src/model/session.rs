use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionRecordError {
    #[error("correct answers ({correct}) exceed total questions ({total})")]
    CorrectExceedsTotal { correct: u32, total: u32 },

    #[error("highest streak ({streak}) exceeds correct answers ({correct})")]
    StreakExceedsCorrect { streak: u32, correct: u32 },
}

/// Rollup of one completed quiz session. Append-only once persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "PersistedSessionRecord")]
pub struct SessionRecord {
    completed_at: DateTime<Utc>,
    score: u32,
    highest_streak: u32,
    total_questions: u32,
    correct_answers: u32,
}

impl SessionRecord {
    /// Build a record, checking that the counters are mutually consistent.
    ///
    /// # Errors
    ///
    /// Returns `SessionRecordError` if more answers were correct than asked,
    /// or the streak is longer than the number of correct answers.
    pub fn new(
        completed_at: DateTime<Utc>,
        score: u32,
        highest_streak: u32,
        total_questions: u32,
        correct_answers: u32,
    ) -> Result<Self, SessionRecordError> {
        if correct_answers > total_questions {
            return Err(SessionRecordError::CorrectExceedsTotal {
                correct: correct_answers,
                total: total_questions,
            });
        }
        if highest_streak > correct_answers {
            return Err(SessionRecordError::StreakExceedsCorrect {
                streak: highest_streak,
                correct: correct_answers,
            });
        }

        Ok(Self {
            completed_at,
            score,
            highest_streak,
            total_questions,
            correct_answers,
        })
    }

    #[must_use]
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn highest_streak(&self) -> u32 {
        self.highest_streak
    }

    #[must_use]
    pub fn total_questions(&self) -> u32 {
        self.total_questions
    }

    #[must_use]
    pub fn correct_answers(&self) -> u32 {
        self.correct_answers
    }

    /// Share of correct answers as a whole percentage, rounded down.
    ///
    /// Zero when the session had no questions.
    #[must_use]
    pub fn accuracy_percent(&self) -> u32 {
        if self.total_questions == 0 {
            return 0;
        }
        let pct = u64::from(self.correct_answers) * 100 / u64::from(self.total_questions);
        u32::try_from(pct).unwrap_or(100)
    }
}

#[derive(Deserialize)]
struct PersistedSessionRecord {
    completed_at: DateTime<Utc>,
    score: u32,
    highest_streak: u32,
    total_questions: u32,
    correct_answers: u32,
}

impl TryFrom<PersistedSessionRecord> for SessionRecord {
    type Error = SessionRecordError;

    fn try_from(raw: PersistedSessionRecord) -> Result<Self, Self::Error> {
        Self::new(
            raw.completed_at,
            raw.score,
            raw.highest_streak,
            raw.total_questions,
            raw.correct_answers,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    #[test]
    fn accuracy_floors() {
        let r = SessionRecord::new(fixed_now(), 20, 2, 3, 2).unwrap();
        assert_eq!(r.accuracy_percent(), 66);

        let r = SessionRecord::new(fixed_now(), 55, 7, 10, 7).unwrap();
        assert_eq!(r.accuracy_percent(), 70);
    }

    #[test]
    fn empty_session_has_zero_accuracy() {
        let r = SessionRecord::new(fixed_now(), 0, 0, 0, 0).unwrap();
        assert_eq!(r.accuracy_percent(), 0);
    }

    #[test]
    fn rejects_inconsistent_counters() {
        assert!(matches!(
            SessionRecord::new(fixed_now(), 0, 0, 3, 4),
            Err(SessionRecordError::CorrectExceedsTotal { correct: 4, total: 3 })
        ));
        assert!(matches!(
            SessionRecord::new(fixed_now(), 0, 3, 5, 2),
            Err(SessionRecordError::StreakExceedsCorrect { .. })
        ));
    }

    #[test]
    fn deserialize_rejects_inconsistent_counters() {
        let record = SessionRecord::new(fixed_now(), 30, 3, 5, 3).unwrap();
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(serde_json::from_str::<SessionRecord>(&json).unwrap(), record);

        let too_many = json.replace("\"correct_answers\":3", "\"correct_answers\":9");
        assert!(serde_json::from_str::<SessionRecord>(&too_many).is_err());
    }
}
