#![forbid(unsafe_code)]

pub mod bank;
pub mod model;
pub mod scheduler;
pub mod time;

pub use bank::{BankError, QuestionBank};
pub use scheduler::AnswerOutcome;
pub use time::Clock;
