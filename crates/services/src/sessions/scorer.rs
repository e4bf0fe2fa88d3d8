use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::Mutex;

use quiz_core::AnswerOutcome;
use quiz_core::model::{Question, QuestionId, SessionRecord};
use quiz_storage::repository::SessionRecordId;

use crate::error::SessionError;

pub const POINTS_PER_CORRECT: u32 = 10;
pub const PENALTY_PER_WRONG: u32 = 5;

//
// ─── SCOREBOARD ────────────────────────────────────────────────────────────────
//

/// Running totals for one session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Scoreboard {
    score: u32,
    streak: u32,
    highest_streak: u32,
    correct_answers: u32,
}

impl Scoreboard {
    /// Fold one answer into the totals.
    ///
    /// The score never drops below zero and the highest streak never shrinks.
    #[must_use]
    pub fn record(self, outcome: AnswerOutcome) -> Self {
        match outcome {
            AnswerOutcome::Correct => {
                let streak = self.streak.saturating_add(1);
                Self {
                    score: self.score.saturating_add(POINTS_PER_CORRECT),
                    streak,
                    highest_streak: self.highest_streak.max(streak),
                    correct_answers: self.correct_answers.saturating_add(1),
                }
            }
            AnswerOutcome::Wrong => Self {
                score: self.score.saturating_sub(PENALTY_PER_WRONG),
                streak: 0,
                ..self
            },
        }
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn streak(&self) -> u32 {
        self.streak
    }

    #[must_use]
    pub fn highest_streak(&self) -> u32 {
        self.highest_streak
    }

    #[must_use]
    pub fn correct_answers(&self) -> u32 {
        self.correct_answers
    }
}

//
// ─── SESSION STATE ─────────────────────────────────────────────────────────────
//

/// What the learner picked for a question and whether it was right.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnswerFeedback {
    pub question_id: QuestionId,
    pub selected_index: usize,
    pub correct_index: usize,
    pub outcome: AnswerOutcome,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizPhase {
    /// Showing question `index`; `answer` is set once it has been answered.
    AwaitingAnswer {
        index: usize,
        answer: Option<AnswerFeedback>,
    },
    Finished,
}

/// How far the learner is through a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionProgress {
    pub total: usize,
    /// Questions with a scored answer, including the one on screen.
    pub answered: usize,
    pub remaining: usize,
    pub is_complete: bool,
}

/// History id of a session once it has been recorded. Shared by every
/// snapshot derived from the same `QuizSession::new` call.
pub(crate) type RecordSlot = Arc<Mutex<Option<SessionRecordId>>>;

/// Immutable snapshot of a quiz session.
///
/// Transitions return a new `QuizSession`; the previous value stays valid so a
/// host can diff or re-render from it.
#[derive(Debug, Clone)]
pub struct QuizSession {
    questions: Arc<[Question]>,
    phase: QuizPhase,
    scoreboard: Scoreboard,
    recorded: RecordSlot,
}

impl QuizSession {
    /// Start a session over `questions`. An empty list is finished right away.
    #[must_use]
    pub fn new(questions: Vec<Question>) -> Self {
        let phase = if questions.is_empty() {
            QuizPhase::Finished
        } else {
            QuizPhase::AwaitingAnswer {
                index: 0,
                answer: None,
            }
        };
        Self {
            questions: questions.into(),
            phase,
            scoreboard: Scoreboard::default(),
            recorded: RecordSlot::default(),
        }
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn phase(&self) -> QuizPhase {
        self.phase
    }

    #[must_use]
    pub fn scoreboard(&self) -> Scoreboard {
        self.scoreboard
    }

    #[must_use]
    pub fn total_questions(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        matches!(self.phase, QuizPhase::Finished)
    }

    /// The question being shown, or `None` once finished.
    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        match self.phase {
            QuizPhase::AwaitingAnswer { index, .. } => self.questions.get(index),
            QuizPhase::Finished => None,
        }
    }

    /// Score the current question.
    ///
    /// Returns the next state and the feedback. If the current question was
    /// already answered, or the session is finished, the state is returned
    /// unchanged with `None`.
    #[must_use]
    pub fn submit_answer(&self, selected_index: usize) -> (Self, Option<AnswerFeedback>) {
        let QuizPhase::AwaitingAnswer {
            index,
            answer: None,
        } = self.phase
        else {
            return (self.clone(), None);
        };
        let Some(question) = self.questions.get(index) else {
            return (self.clone(), None);
        };

        let outcome = AnswerOutcome::from_correct(question.is_correct(selected_index));
        let feedback = AnswerFeedback {
            question_id: question.id(),
            selected_index,
            correct_index: question.correct_index(),
            outcome,
        };
        let next = Self {
            questions: Arc::clone(&self.questions),
            phase: QuizPhase::AwaitingAnswer {
                index,
                answer: Some(feedback),
            },
            scoreboard: self.scoreboard.record(outcome),
            recorded: Arc::clone(&self.recorded),
        };
        (next, Some(feedback))
    }

    /// Move past an answered question.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotAnswered` if the current question has no answer
    /// yet, or `SessionError::Completed` if the session is already finished.
    pub fn advance(&self) -> Result<Self, SessionError> {
        let index = match self.phase {
            QuizPhase::AwaitingAnswer {
                answer: Some(_),
                index,
            } => index,
            QuizPhase::AwaitingAnswer { answer: None, .. } => {
                return Err(SessionError::NotAnswered);
            }
            QuizPhase::Finished => return Err(SessionError::Completed),
        };

        let next = index + 1;
        let phase = if next < self.questions.len() {
            QuizPhase::AwaitingAnswer {
                index: next,
                answer: None,
            }
        } else {
            QuizPhase::Finished
        };
        Ok(Self {
            questions: Arc::clone(&self.questions),
            phase,
            scoreboard: self.scoreboard,
            recorded: Arc::clone(&self.recorded),
        })
    }

    /// Snapshot the totals as a history record completed at `now`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Record` if the counters cannot form a valid record.
    pub fn to_record(&self, now: DateTime<Utc>) -> Result<SessionRecord, SessionError> {
        let total = u32::try_from(self.questions.len()).unwrap_or(u32::MAX);
        Ok(SessionRecord::new(
            now,
            self.scoreboard.score(),
            self.scoreboard.highest_streak(),
            total,
            self.scoreboard.correct_answers(),
        )?)
    }

    pub(crate) fn record_slot(&self) -> &RecordSlot {
        &self.recorded
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        let total = self.questions.len();
        let answered = match self.phase {
            QuizPhase::AwaitingAnswer { index, answer } => index + usize::from(answer.is_some()),
            QuizPhase::Finished => total,
        };
        SessionProgress {
            total,
            answered,
            remaining: total.saturating_sub(answered),
            is_complete: self.is_finished(),
        }
    }
}
