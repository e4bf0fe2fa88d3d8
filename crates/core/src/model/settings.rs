use std::collections::BTreeSet;

use thiserror::Error;

use crate::bank::QuestionBank;
use crate::model::{Domain, Question};

pub const DEFAULT_QUESTIONS_PER_SESSION: u32 = 10;
pub const MIN_QUESTIONS_PER_SESSION: u32 = 1;
pub const MAX_QUESTIONS_PER_SESSION: u32 = 40;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SettingsError {
    #[error("at least one domain must be enabled")]
    NoDomains,
}

/// Learner preferences that shape the question pool for each session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuizSettings {
    questions_per_session: u32,
    enabled_domains: BTreeSet<Domain>,
}

#[derive(Clone, Debug)]
pub struct QuizSettingsDraft {
    pub questions_per_session: u32,
    pub enabled_domains: BTreeSet<Domain>,
}

impl Default for QuizSettingsDraft {
    fn default() -> Self {
        Self {
            questions_per_session: DEFAULT_QUESTIONS_PER_SESSION,
            enabled_domains: Domain::ALL.into_iter().collect(),
        }
    }
}

impl QuizSettingsDraft {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Clamp the session length into range and check the domain selection.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError::NoDomains` if no domain is enabled.
    pub fn validate(self) -> Result<QuizSettings, SettingsError> {
        if self.enabled_domains.is_empty() {
            return Err(SettingsError::NoDomains);
        }

        Ok(QuizSettings {
            questions_per_session: clamp_questions(self.questions_per_session),
            enabled_domains: self.enabled_domains,
        })
    }
}

impl QuizSettings {
    /// Rehydrate settings from storage.
    ///
    /// Unknown domain keys are dropped; if none remain, every domain is enabled.
    #[must_use]
    pub fn from_persisted<I, S>(questions_per_session: u32, domain_keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut enabled_domains: BTreeSet<Domain> = domain_keys
            .into_iter()
            .filter_map(|key| Domain::from_key(key.as_ref()))
            .collect();
        if enabled_domains.is_empty() {
            enabled_domains = Domain::ALL.into_iter().collect();
        }

        Self {
            questions_per_session: clamp_questions(questions_per_session),
            enabled_domains,
        }
    }

    #[must_use]
    pub fn questions_per_session(&self) -> u32 {
        self.questions_per_session
    }

    #[must_use]
    pub fn enabled_domains(&self) -> &BTreeSet<Domain> {
        &self.enabled_domains
    }

    /// Storage keys of the enabled domains, in `Domain::ALL` order.
    #[must_use]
    pub fn domain_keys(&self) -> Vec<&'static str> {
        self.enabled_domains.iter().map(|d| d.key()).collect()
    }

    /// Questions from the bank that belong to an enabled domain.
    #[must_use]
    pub fn filter_pool(&self, bank: &QuestionBank) -> Vec<Question> {
        bank.for_domains(&self.enabled_domains)
    }

    #[must_use]
    pub fn to_draft(&self) -> QuizSettingsDraft {
        QuizSettingsDraft {
            questions_per_session: self.questions_per_session,
            enabled_domains: self.enabled_domains.clone(),
        }
    }
}

impl Default for QuizSettings {
    fn default() -> Self {
        Self {
            questions_per_session: DEFAULT_QUESTIONS_PER_SESSION,
            enabled_domains: Domain::ALL.into_iter().collect(),
        }
    }
}

fn clamp_questions(value: u32) -> u32 {
    value.clamp(MIN_QUESTIONS_PER_SESSION, MAX_QUESTIONS_PER_SESSION)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_all_domains() {
        let s = QuizSettings::default();
        assert_eq!(s.questions_per_session(), 10);
        assert_eq!(s.enabled_domains().len(), Domain::ALL.len());
    }

    #[test]
    fn draft_clamps_session_length() {
        let mut draft = QuizSettingsDraft::new();
        draft.questions_per_session = 0;
        assert_eq!(draft.clone().validate().unwrap().questions_per_session(), 1);

        draft.questions_per_session = 99;
        assert_eq!(draft.validate().unwrap().questions_per_session(), 40);
    }

    #[test]
    fn draft_rejects_empty_domains() {
        let draft = QuizSettingsDraft {
            questions_per_session: 10,
            enabled_domains: BTreeSet::new(),
        };
        assert_eq!(draft.validate().unwrap_err(), SettingsError::NoDomains);
    }

    #[test]
    fn persisted_unknown_domains_fall_back_to_all() {
        let s = QuizSettings::from_persisted(12, ["RTOS", "ANALOG"]);
        assert_eq!(s.domain_keys(), vec!["RTOS"]);

        let s = QuizSettings::from_persisted(12, ["ANALOG"]);
        assert_eq!(s.enabled_domains().len(), Domain::ALL.len());
    }

    #[test]
    fn filter_pool_keeps_only_enabled_domains() {
        let bank = QuestionBank::bundled().unwrap();
        let s = QuizSettings::from_persisted(10, ["POWER"]);
        let pool = s.filter_pool(&bank);
        assert!(!pool.is_empty());
        assert!(pool.iter().all(|q| q.domain() == Domain::Power));
    }
}
