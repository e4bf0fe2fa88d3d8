mod card_state;
mod ids;
mod question;
mod session;
mod settings;

pub use ids::{ParseIdError, QuestionId};

pub use card_state::{
    CardState, CardStateError, DEFAULT_EASE_FACTOR, DEFAULT_INTERVAL_DAYS, MIN_EASE_FACTOR,
};
pub use question::{
    Domain, MAX_OPTION_CHARS, OPTION_COUNT, Question, QuestionDraft, QuestionError,
};
pub use session::{SessionRecord, SessionRecordError};
pub use settings::{
    DEFAULT_QUESTIONS_PER_SESSION, MAX_QUESTIONS_PER_SESSION, MIN_QUESTIONS_PER_SESSION,
    QuizSettings, QuizSettingsDraft, SettingsError,
};
