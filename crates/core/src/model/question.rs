use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::model::ids::QuestionId;

/// Every question offers exactly this many answer options.
pub const OPTION_COUNT: usize = 4;

/// Longest option text (in characters) that still fits the 2x2 answer grid.
pub const MAX_OPTION_CHARS: usize = 28;

//
// ─── DOMAIN ────────────────────────────────────────────────────────────────────
//

/// Topic domain a question belongs to. Sessions can be filtered by domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Domain {
    Memory,
    Interrupts,
    Protocols,
    Rtos,
    Power,
    Firmware,
}

impl Domain {
    pub const ALL: [Domain; 6] = [
        Domain::Memory,
        Domain::Interrupts,
        Domain::Protocols,
        Domain::Rtos,
        Domain::Power,
        Domain::Firmware,
    ];

    /// Storage key, stable across releases.
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Domain::Memory => "MEMORY",
            Domain::Interrupts => "INTERRUPTS",
            Domain::Protocols => "PROTOCOLS",
            Domain::Rtos => "RTOS",
            Domain::Power => "POWER",
            Domain::Firmware => "FIRMWARE",
        }
    }

    /// Parses a storage key. Unknown keys yield `None`.
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.key() == key.trim())
    }

    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Domain::Memory => "Memory",
            Domain::Interrupts => "Interrupts",
            Domain::Protocols => "Communication Protocols",
            Domain::Rtos => "RTOS Concepts",
            Domain::Power => "Power Management",
            Domain::Firmware => "Firmware & Code",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question {id} must have exactly 4 options, got {count}")]
    OptionCount { id: QuestionId, count: usize },

    #[error("question {id} has correct index {index} outside 0..=3")]
    CorrectIndexOutOfRange { id: QuestionId, index: usize },

    #[error("question {id} text cannot be blank")]
    BlankText { id: QuestionId },

    #[error("question {id} explanation cannot be blank")]
    BlankExplanation { id: QuestionId },

    #[error("question {id} option {index} cannot be blank")]
    BlankOption { id: QuestionId, index: usize },

    #[error("question {id} option {index} is {len} chars (max {max})")]
    OptionTooLong {
        id: QuestionId,
        index: usize,
        len: usize,
        max: usize,
    },
}

//
// ─── QUESTION TYPES ────────────────────────────────────────────────────────────
//

/// Unvalidated question as it appears in the catalog file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct QuestionDraft {
    pub id: QuestionId,
    pub text: String,
    pub options: Vec<String>,
    pub correct_index: usize,
    pub explanation: String,
    pub domain: Domain,
    #[serde(default)]
    pub has_code_block: bool,
}

impl QuestionDraft {
    /// Check the display and content constraints and produce an immutable `Question`.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` naming the first violated constraint.
    pub fn validate(self) -> Result<Question, QuestionError> {
        let id = self.id;

        let count = self.options.len();
        let options: [String; OPTION_COUNT] = self
            .options
            .try_into()
            .map_err(|_| QuestionError::OptionCount { id, count })?;

        if self.correct_index >= OPTION_COUNT {
            return Err(QuestionError::CorrectIndexOutOfRange {
                id,
                index: self.correct_index,
            });
        }
        if self.text.trim().is_empty() {
            return Err(QuestionError::BlankText { id });
        }
        if self.explanation.trim().is_empty() {
            return Err(QuestionError::BlankExplanation { id });
        }
        for (index, option) in options.iter().enumerate() {
            if option.trim().is_empty() {
                return Err(QuestionError::BlankOption { id, index });
            }
            let len = option.chars().count();
            if len > MAX_OPTION_CHARS {
                return Err(QuestionError::OptionTooLong {
                    id,
                    index,
                    len,
                    max: MAX_OPTION_CHARS,
                });
            }
        }

        Ok(Question {
            id,
            text: self.text,
            options,
            correct_index: self.correct_index,
            explanation: self.explanation,
            domain: self.domain,
            has_code_block: self.has_code_block,
        })
    }
}

/// A validated multiple-choice question. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Question {
    id: QuestionId,
    text: String,
    options: [String; OPTION_COUNT],
    correct_index: usize,
    explanation: String,
    domain: Domain,
    has_code_block: bool,
}

impl Question {
    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn options(&self) -> &[String; OPTION_COUNT] {
        &self.options
    }

    #[must_use]
    pub fn correct_index(&self) -> usize {
        self.correct_index
    }

    #[must_use]
    pub fn explanation(&self) -> &str {
        &self.explanation
    }

    #[must_use]
    pub fn domain(&self) -> Domain {
        self.domain
    }

    /// Whether `text` embeds a fenced code block that should render monospace.
    #[must_use]
    pub fn has_code_block(&self) -> bool {
        self.has_code_block
    }

    #[must_use]
    pub fn is_correct(&self, selected_index: usize) -> bool {
        selected_index == self.correct_index
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
