use thiserror::Error;

use crate::model::Quest;
use crate::resolver::{ActiveSectionResolver, DEFAULT_ACTIVATION_MARGIN, ResolverError};

/// Key under which the progress record is stored.
pub const DEFAULT_STORAGE_KEY: &str = "guide.progress";

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum ConfigError {
    #[error(transparent)]
    Resolver(#[from] ResolverError),

    #[error("storage key cannot be empty")]
    EmptyStorageKey,
}

/// Validated engine configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct GuideConfig {
    resolver: ActiveSectionResolver,
    storage_key: String,
    quest: Quest,
}

/// Unvalidated configuration as collected from flags or the environment.
#[derive(Clone, Debug, Default)]
pub struct GuideConfigDraft {
    pub activation_margin: Option<f64>,
    pub storage_key: Option<String>,
    pub quest: Option<Quest>,
}

impl GuideConfigDraft {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the draft, filling unset values with defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the margin is negative or not finite, or the
    /// storage key is blank.
    pub fn validate(self) -> Result<GuideConfig, ConfigError> {
        let resolver = ActiveSectionResolver::with_margin(
            self.activation_margin.unwrap_or(DEFAULT_ACTIVATION_MARGIN),
        )?;

        let storage_key = match self.storage_key {
            Some(key) => {
                let key = key.trim().to_string();
                if key.is_empty() {
                    return Err(ConfigError::EmptyStorageKey);
                }
                key
            }
            None => DEFAULT_STORAGE_KEY.to_string(),
        };

        Ok(GuideConfig {
            resolver,
            storage_key,
            quest: self.quest.unwrap_or_default(),
        })
    }
}

impl GuideConfig {
    #[must_use]
    pub fn resolver(&self) -> ActiveSectionResolver {
        self.resolver
    }

    #[must_use]
    pub fn activation_margin(&self) -> f64 {
        self.resolver.margin()
    }

    #[must_use]
    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    #[must_use]
    pub fn quest(&self) -> &Quest {
        &self.quest
    }
}

impl Default for GuideConfig {
    fn default() -> Self {
        Self {
            resolver: ActiveSectionResolver::new(),
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            quest: Quest::lost_temple(),
        }
    }
}
