use std::sync::Arc;
use tracing::info;

use quiz_core::QuestionBank;
use quiz_core::model::SessionRecord;
use quiz_storage::repository::{
    CardStateRepository, SessionHistoryRepository, SessionRecordId, SettingsRepository,
};

use super::plan::SessionBuilder;
use super::scorer::{AnswerFeedback, QuizSession};
use super::writer::CardStateWriter;
use crate::Clock;
use crate::error::SessionError;

/// A finished session after its record was appended to history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinishedSession {
    pub id: SessionRecordId,
    pub record: SessionRecord,
}

/// Orchestrates session start, answering and completion.
///
/// Scoring stays in memory; each answer is handed to a `CardStateWriter` so the
/// caller gets feedback without waiting for storage.
#[derive(Clone)]
pub struct QuizLoopService {
    clock: Clock,
    bank: Arc<QuestionBank>,
    cards: Arc<dyn CardStateRepository>,
    history: Arc<dyn SessionHistoryRepository>,
    settings: Arc<dyn SettingsRepository>,
    writer: CardStateWriter,
    shuffle: bool,
}

impl QuizLoopService {
    /// Wire the loop to its repositories and start the card state writer.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    #[must_use]
    pub fn new(
        clock: Clock,
        bank: Arc<QuestionBank>,
        cards: Arc<dyn CardStateRepository>,
        history: Arc<dyn SessionHistoryRepository>,
        settings: Arc<dyn SettingsRepository>,
    ) -> Self {
        let writer = CardStateWriter::spawn(Arc::clone(&cards));
        Self {
            clock,
            bank,
            cards,
            history,
            settings,
            writer,
            shuffle: true,
        }
    }

    #[must_use]
    pub fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    /// Start a new session from the enabled domains.
    ///
    /// Pending card updates are flushed first so the plan sees every earlier answer.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if settings or card states cannot be read.
    pub async fn start_session(&self) -> Result<QuizSession, SessionError> {
        self.writer.flush().await;

        let settings = self.settings.get_settings().await?.unwrap_or_default();
        let pool = settings.filter_pool(&self.bank);
        let states = self.cards.list_cards().await?;
        let length = usize::try_from(settings.questions_per_session()).unwrap_or(usize::MAX);

        let plan = SessionBuilder::new(length)
            .with_shuffle(self.shuffle)
            .build(&pool, &states, self.clock.now());

        info!(
            questions = plan.total(),
            due = plan.due_selected,
            new = plan.new_selected,
            old = plan.old_selected,
            "session started"
        );
        Ok(QuizSession::new(plan.questions))
    }

    /// Score the current question and queue its card state update.
    ///
    /// Ignored answers (already answered, or finished) queue nothing.
    #[must_use]
    pub fn submit_answer(
        &self,
        session: &QuizSession,
        selected_index: usize,
    ) -> (QuizSession, Option<AnswerFeedback>) {
        let (next, feedback) = session.submit_answer(selected_index);
        if let Some(feedback) = feedback {
            self.writer
                .enqueue(feedback.question_id, feedback.outcome, self.clock.now());
        }
        (next, feedback)
    }

    /// Move to the next question or to `Finished`.
    ///
    /// # Errors
    ///
    /// See `QuizSession::advance`.
    pub fn advance(&self, session: &QuizSession) -> Result<QuizSession, SessionError> {
        session.advance()
    }

    /// Append the finished session to history.
    ///
    /// A session is recorded at most once, whichever snapshot of it is passed.
    /// A failed append leaves it unrecorded so the call can be retried.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotFinished` before the last question was advanced
    /// past, `SessionError::AlreadyRecorded` on a repeat call, or
    /// `SessionError::Storage` if the record cannot be appended.
    pub async fn finish(&self, session: &QuizSession) -> Result<FinishedSession, SessionError> {
        if !session.is_finished() {
            return Err(SessionError::NotFinished);
        }
        let mut recorded = session.record_slot().lock().await;
        if let Some(id) = *recorded {
            return Err(SessionError::AlreadyRecorded(id));
        }
        self.writer.flush().await;

        let record = session.to_record(self.clock.now())?;
        let id = self.history.append_record(&record).await?;
        *recorded = Some(id);
        info!(
            id,
            score = record.score(),
            accuracy = record.accuracy_percent(),
            "session recorded"
        );
        Ok(FinishedSession { id, record })
    }

    /// Wait for queued card state updates to be written.
    pub async fn flush(&self) {
        self.writer.flush().await;
    }
}
