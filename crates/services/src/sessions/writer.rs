use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use quiz_core::AnswerOutcome;
use quiz_core::model::{CardState, QuestionId};
use quiz_core::scheduler;
use quiz_storage::repository::{CardStateRepository, StorageError};

/// One answer waiting to be folded into its card state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CardUpdate {
    pub question_id: QuestionId,
    pub outcome: AnswerOutcome,
    pub answered_at: DateTime<Utc>,
}

#[derive(Debug)]
enum WriterMessage {
    Apply(CardUpdate),
    Flush(oneshot::Sender<()>),
}

/// Handle to the background task that persists card states after each answer.
///
/// Updates are applied one at a time in the order they were enqueued, so two
/// answers to the same question never race. Storage failures are logged and
/// dropped; scoring never waits on them.
#[derive(Clone)]
pub struct CardStateWriter {
    sender: mpsc::UnboundedSender<WriterMessage>,
}

impl CardStateWriter {
    /// Start the writer task on the current Tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    #[must_use]
    pub fn spawn(cards: Arc<dyn CardStateRepository>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(writer_loop(cards, rx));
        Self { sender: tx }
    }

    /// Queue an answer for persistence. Never blocks.
    pub fn enqueue(
        &self,
        question_id: QuestionId,
        outcome: AnswerOutcome,
        answered_at: DateTime<Utc>,
    ) {
        let update = CardUpdate {
            question_id,
            outcome,
            answered_at,
        };
        if self.sender.send(WriterMessage::Apply(update)).is_err() {
            warn!(%question_id, "card state writer stopped; update dropped");
        }
    }

    /// Wait until every update enqueued before this call has been processed.
    pub async fn flush(&self) {
        let (tx, rx) = oneshot::channel();
        if self.sender.send(WriterMessage::Flush(tx)).is_err() {
            return;
        }
        let _ = rx.await;
    }
}

async fn writer_loop(
    cards: Arc<dyn CardStateRepository>,
    mut rx: mpsc::UnboundedReceiver<WriterMessage>,
) {
    while let Some(message) = rx.recv().await {
        match message {
            WriterMessage::Apply(update) => {
                if let Err(err) = apply_update(cards.as_ref(), update).await {
                    warn!(
                        question_id = %update.question_id,
                        error = %err,
                        "failed to persist card state"
                    );
                }
            }
            WriterMessage::Flush(done) => {
                let _ = done.send(());
            }
        }
    }
    debug!("card state writer shut down");
}

async fn apply_update(
    cards: &dyn CardStateRepository,
    update: CardUpdate,
) -> Result<(), StorageError> {
    let current = cards
        .get_card(update.question_id)
        .await?
        .unwrap_or_else(|| CardState::new(update.question_id));
    let next = scheduler::apply(&current, update.outcome, update.answered_at);
    cards.put_card(&next).await?;
    debug!(
        question_id = %update.question_id,
        interval_days = next.interval_days(),
        "card state persisted"
    );
    Ok(())
}
