//! Session configuration.
//!
//! # Responsibility
//! - Hold the storage key and import list minimums for one editing session.
//! - Accept partial JSON from the host and fill gaps with defaults.
//!
//! # Invariants
//! - A validated config has a non-blank storage key and minimums >= 1.

use crate::model::plan::DEFAULT_STEP_COUNT;
use crate::reconcile::ReconcileOptions;
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Storage key shared with earlier browser-stored plans.
pub const DEFAULT_STORAGE_KEY: &str = "teaching-plan-v5";

/// Editing session settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct PlanConfig {
    /// Key under which the current plan is stored.
    pub storage_key: String,
    /// Minimum number of games after an import.
    pub import_min_games: usize,
    /// Minimum number of steps after an import.
    pub import_min_steps: usize,
}

impl Default for PlanConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            import_min_games: 1,
            import_min_steps: DEFAULT_STEP_COUNT,
        }
    }
}

impl PlanConfig {
    /// Parses a (possibly partial) JSON object and validates it.
    ///
    /// # Errors
    /// - `ConfigError::Parse` for malformed JSON or unknown keys.
    /// - Validation errors from [`PlanConfig::validate`].
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage_key.trim().is_empty() {
            return Err(ConfigError::BlankStorageKey);
        }
        if self.import_min_games == 0 {
            return Err(ConfigError::ZeroMinimum("importMinGames"));
        }
        if self.import_min_steps == 0 {
            return Err(ConfigError::ZeroMinimum("importMinSteps"));
        }
        Ok(())
    }

    /// Reconciliation options used for imports.
    pub fn import_options(&self) -> ReconcileOptions {
        ReconcileOptions {
            min_games: self.import_min_games,
            min_steps: self.import_min_steps,
        }
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    Parse(serde_json::Error),
    BlankStorageKey,
    ZeroMinimum(&'static str),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "invalid plan config: {err}"),
            Self::BlankStorageKey => write!(f, "storageKey must not be blank"),
            Self::ZeroMinimum(field) => write!(f, "{field} must be at least 1"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Parse(err) => Some(err),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, PlanConfig, DEFAULT_STORAGE_KEY};

    #[test]
    fn empty_object_yields_defaults() {
        let config = PlanConfig::from_json("{}").expect("empty config should parse");
        assert_eq!(config, PlanConfig::default());
        assert_eq!(config.storage_key, DEFAULT_STORAGE_KEY);
        assert_eq!(config.import_options().min_steps, 5);
    }

    #[test]
    fn partial_object_overrides_named_fields() {
        let config = PlanConfig::from_json(r#"{"importMinSteps": 6}"#).unwrap();
        assert_eq!(config.import_min_steps, 6);
        assert_eq!(config.import_min_games, 1);
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(matches!(
            PlanConfig::from_json(r#"{"storageKey": "  "}"#),
            Err(ConfigError::BlankStorageKey)
        ));
        assert!(matches!(
            PlanConfig::from_json(r#"{"importMinGames": 0}"#),
            Err(ConfigError::ZeroMinimum("importMinGames"))
        ));
        assert!(matches!(
            PlanConfig::from_json(r#"{"minSteps": 3}"#),
            Err(ConfigError::Parse(_))
        ));
    }
}
