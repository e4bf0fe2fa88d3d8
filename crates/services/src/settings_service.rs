use std::sync::Arc;

use quiz_core::model::{QuizSettings, QuizSettingsDraft};
use quiz_storage::repository::SettingsRepository;

use crate::error::SettingsServiceError;

#[derive(Clone)]
pub struct SettingsService {
    repo: Arc<dyn SettingsRepository>,
}

impl SettingsService {
    #[must_use]
    pub fn new(repo: Arc<dyn SettingsRepository>) -> Self {
        Self { repo }
    }

    /// Load persisted settings (or defaults if missing).
    ///
    /// # Errors
    ///
    /// Returns `SettingsServiceError` on storage failures.
    pub async fn load(&self) -> Result<QuizSettings, SettingsServiceError> {
        let settings = self.repo.get_settings().await?;
        Ok(settings.unwrap_or_default())
    }

    /// Validate and persist new settings.
    ///
    /// The session length is clamped into range; an empty domain selection is
    /// rejected and leaves the stored settings untouched.
    ///
    /// # Errors
    ///
    /// Returns `SettingsServiceError` if validation fails or persistence fails.
    pub async fn save(
        &self,
        draft: QuizSettingsDraft,
    ) -> Result<QuizSettings, SettingsServiceError> {
        let settings = draft.validate()?;
        self.repo.save_settings(&settings).await?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{Domain, SettingsError};
    use quiz_storage::repository::InMemoryRepository;
    use std::collections::BTreeSet;

    #[tokio::test]
    async fn load_defaults_then_save_clamped() {
        let service = SettingsService::new(Arc::new(InMemoryRepository::new()));
        assert_eq!(service.load().await.unwrap(), QuizSettings::default());

        let mut draft = service.load().await.unwrap().to_draft();
        draft.questions_per_session = 100;
        let saved = service.save(draft).await.unwrap();
        assert_eq!(saved.questions_per_session(), 40);
        assert_eq!(service.load().await.unwrap(), saved);
    }

    #[tokio::test]
    async fn empty_domain_selection_keeps_previous_settings() {
        let service = SettingsService::new(Arc::new(InMemoryRepository::new()));
        let mut draft = QuizSettingsDraft::new();
        draft.enabled_domains = [Domain::Memory].into_iter().collect();
        let kept = service.save(draft).await.unwrap();

        let empty = QuizSettingsDraft {
            questions_per_session: 5,
            enabled_domains: BTreeSet::new(),
        };
        assert!(matches!(
            service.save(empty).await,
            Err(SettingsServiceError::Settings(SettingsError::NoDomains))
        ));
        assert_eq!(service.load().await.unwrap(), kept);
    }
}
