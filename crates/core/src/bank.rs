//! Read-only question pool.
//!
//! The bundled catalog is compiled into the binary and validated on load.

use std::collections::{BTreeSet, HashSet};

use thiserror::Error;

use crate::model::{Domain, Question, QuestionDraft, QuestionError, QuestionId};

const BUNDLED_CATALOG: &str = include_str!("../data/questions.json");

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BankError {
    #[error("question catalog is malformed: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error(transparent)]
    InvalidQuestion(#[from] QuestionError),

    #[error("duplicate question id {0}")]
    DuplicateId(QuestionId),
}

/// Immutable, ordered collection of validated questions with unique ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionBank {
    questions: Vec<Question>,
}

impl QuestionBank {
    /// Build a bank from already validated questions.
    ///
    /// # Errors
    ///
    /// Returns `BankError::DuplicateId` if two questions share an id.
    pub fn new(questions: Vec<Question>) -> Result<Self, BankError> {
        let mut seen = HashSet::with_capacity(questions.len());
        for q in &questions {
            if !seen.insert(q.id()) {
                return Err(BankError::DuplicateId(q.id()));
            }
        }
        Ok(Self { questions })
    }

    /// Parse and validate a JSON array of question drafts.
    ///
    /// # Errors
    ///
    /// Returns `BankError` for malformed JSON, invalid questions or duplicate ids.
    pub fn from_json(json: &str) -> Result<Self, BankError> {
        let drafts: Vec<QuestionDraft> = serde_json::from_str(json)?;
        let questions = drafts
            .into_iter()
            .map(QuestionDraft::validate)
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(questions)
    }

    /// The embedded-systems catalog shipped with the crate.
    ///
    /// # Errors
    ///
    /// Returns `BankError` if the bundled catalog fails validation.
    pub fn bundled() -> Result<Self, BankError> {
        Self::from_json(BUNDLED_CATALOG)
    }

    #[must_use]
    pub fn all(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    #[must_use]
    pub fn by_id(&self, id: QuestionId) -> Option<&Question> {
        self.questions.iter().find(|q| q.id() == id)
    }

    /// Questions in any of `domains`, in catalog order.
    #[must_use]
    pub fn for_domains(&self, domains: &BTreeSet<Domain>) -> Vec<Question> {
        self.questions
            .iter()
            .filter(|q| domains.contains(&q.domain()))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MAX_OPTION_CHARS;

    #[test]
    fn bundled_catalog_loads() {
        let bank = QuestionBank::bundled().unwrap();
        assert!(bank.len() >= 40);
        assert!(!bank.is_empty());
    }

    #[test]
    fn bundled_catalog_covers_every_domain() {
        let bank = QuestionBank::bundled().unwrap();
        let covered: BTreeSet<Domain> = bank.all().iter().map(Question::domain).collect();
        for domain in Domain::ALL {
            assert!(covered.contains(&domain), "{domain:?} has no questions");
        }
    }

    #[test]
    fn bundled_options_fit_the_grid() {
        let bank = QuestionBank::bundled().unwrap();
        for q in bank.all() {
            for option in q.options() {
                assert!(option.chars().count() <= MAX_OPTION_CHARS, "{}: {option}", q.id());
            }
        }
    }

    #[test]
    fn by_id_finds_known_and_misses_unknown() {
        let bank = QuestionBank::bundled().unwrap();
        assert_eq!(bank.by_id(QuestionId::new(1)).unwrap().id(), QuestionId::new(1));
        assert!(bank.by_id(QuestionId::new(9999)).is_none());
    }

    #[test]
    fn for_domains_filters() {
        let bank = QuestionBank::bundled().unwrap();
        let memory: BTreeSet<Domain> = [Domain::Memory].into_iter().collect();
        let only = bank.for_domains(&memory);
        assert!(!only.is_empty());
        assert!(only.iter().all(|q| q.domain() == Domain::Memory));
    }

    #[test]
    fn code_block_flag_is_carried() {
        let bank = QuestionBank::bundled().unwrap();
        let with_code: Vec<_> = bank.all().iter().filter(|q| q.has_code_block()).collect();
        assert!(!with_code.is_empty());
        assert!(with_code.iter().all(|q| q.text().contains("```")));
    }

    #[test]
    fn rejects_duplicate_ids() {
        let json = r#"[
            {"id": 1, "text": "Q", "options": ["a","b","c","d"], "correct_index": 0,
             "explanation": "E", "domain": "MEMORY"},
            {"id": 1, "text": "Q2", "options": ["a","b","c","d"], "correct_index": 1,
             "explanation": "E", "domain": "RTOS"}
        ]"#;
        assert!(matches!(
            QuestionBank::from_json(json),
            Err(BankError::DuplicateId(id)) if id == QuestionId::new(1)
        ));
    }

    #[test]
    fn rejects_invalid_entries_and_bad_json() {
        let json = r#"[{"id": 2, "text": "Q", "options": ["a","b","c"], "correct_index": 0,
                        "explanation": "E", "domain": "POWER"}]"#;
        assert!(matches!(
            QuestionBank::from_json(json),
            Err(BankError::InvalidQuestion(QuestionError::OptionCount { .. }))
        ));
        assert!(matches!(
            QuestionBank::from_json("not json"),
            Err(BankError::Malformed(_))
        ));
    }
}
