use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{CardState, MIN_EASE_FACTOR};

/// Length of one scheduling day.
pub const MILLIS_PER_DAY: i64 = 86_400_000;

/// Ease lost on every wrong answer, down to `MIN_EASE_FACTOR`.
pub const EASE_PENALTY: f64 = 0.2;

//
// ─── ANSWER OUTCOME ────────────────────────────────────────────────────────────
//

/// Binary result of answering a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnswerOutcome {
    Correct,
    Wrong,
}

impl AnswerOutcome {
    #[must_use]
    pub fn from_correct(correct: bool) -> Self {
        if correct { Self::Correct } else { Self::Wrong }
    }

    #[must_use]
    pub fn is_correct(self) -> bool {
        matches!(self, Self::Correct)
    }
}

//
// ─── SCHEDULING ────────────────────────────────────────────────────────────────
//

/// Schedule the next review after a correct answer.
///
/// The interval becomes `round(interval * ease)`, rounding half away from
/// zero (`f64::round`), and the card falls due that many days after `now`.
/// The ease factor is left untouched.
///
/// # Examples
///
/// ```
/// # use quiz_core::model::{CardState, QuestionId};
/// # use quiz_core::scheduler::{on_correct, MILLIS_PER_DAY};
/// let now = quiz_core::time::epoch();
/// let card = CardState::from_persisted(QuestionId::new(1), 2, 2.5, now).unwrap();
/// let next = on_correct(&card, now);
/// assert_eq!(next.interval_days(), 5);
/// assert_eq!(next.due_at_millis(), 5 * MILLIS_PER_DAY);
/// ```
#[must_use]
pub fn on_correct(card: &CardState, now: DateTime<Utc>) -> CardState {
    let interval = scaled_interval(card.interval_days(), card.ease_factor());
    card.rescheduled(interval, card.ease_factor(), due_after_days(now, interval))
}

/// Reset a card after a wrong answer.
///
/// The card becomes due immediately with a one-day interval, and its ease
/// drops by `EASE_PENALTY` without going below `MIN_EASE_FACTOR`.
#[must_use]
pub fn on_wrong(card: &CardState, now: DateTime<Utc>) -> CardState {
    let ease = (card.ease_factor() - EASE_PENALTY).max(MIN_EASE_FACTOR);
    card.rescheduled(1, ease, now)
}

/// Dispatch to `on_correct` or `on_wrong`.
#[must_use]
pub fn apply(card: &CardState, outcome: AnswerOutcome, now: DateTime<Utc>) -> CardState {
    match outcome {
        AnswerOutcome::Correct => on_correct(card, now),
        AnswerOutcome::Wrong => on_wrong(card, now),
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn scaled_interval(interval_days: u32, ease_factor: f64) -> u32 {
    let scaled = (f64::from(interval_days) * ease_factor).round();
    if scaled >= f64::from(u32::MAX) {
        u32::MAX
    } else {
        (scaled as u32).max(1)
    }
}

fn due_after_days(now: DateTime<Utc>, days: u32) -> DateTime<Utc> {
    let delta = Duration::milliseconds(i64::from(days) * MILLIS_PER_DAY);
    now.checked_add_signed(delta)
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
