mod plan;
mod scorer;
mod view;
mod workflow;
mod writer;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use plan::{SessionBuilder, SessionPlan};
pub use scorer::{
    AnswerFeedback, PENALTY_PER_WRONG, POINTS_PER_CORRECT, QuizPhase, QuizSession, Scoreboard,
    SessionProgress,
};
pub use view::{SessionHistoryItem, SessionHistoryService};
pub use workflow::{FinishedSession, QuizLoopService};
pub use writer::{CardStateWriter, CardUpdate};
