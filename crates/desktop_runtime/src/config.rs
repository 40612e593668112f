//! Typed runtime configuration and TOML loading.

use std::{collections::HashSet, fs, path::Path, time::Duration};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    apps::{default_apps, default_quick_launch, AppCatalog, AppDefinition},
    crash::DEFAULT_UNSTABLE_RESOURCE_PREFIX,
    history::MAX_HISTORY_LENGTH_LIMIT,
    model::SessionSettings,
    wallpaper::DEFAULT_WALLPAPER_REFRESH,
};

/// History bound used when no configuration overrides it.
pub const DEFAULT_MAX_HISTORY_LENGTH: usize = 3;
/// Interaction id that closes the active app.
pub const DEFAULT_CLOSE_BUTTON_ID: &str = "app_close_button";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("failed to read {path}: {message}")]
    Read { path: String, message: String },
    #[error("failed to parse config: {0}")]
    Parse(String),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
/// Session defaults and policy knobs for [`crate::DesktopRuntime`].
///
/// Every field is optional in TOML; omitted fields keep their defaults.
pub struct RuntimeConfig {
    pub initial_max_history_length: usize,
    pub statefulness_enabled: bool,
    pub wallpaper_refresh_secs: u64,
    pub unstable_resource_prefix: String,
    pub close_button_id: String,
    /// Seed for the crash RNG; `None` seeds from OS entropy.
    pub crash_seed: Option<u64>,
    pub apps: Vec<AppDefinition>,
    pub quick_launch: Vec<String>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            initial_max_history_length: DEFAULT_MAX_HISTORY_LENGTH,
            statefulness_enabled: false,
            wallpaper_refresh_secs: DEFAULT_WALLPAPER_REFRESH.as_secs(),
            unstable_resource_prefix: DEFAULT_UNSTABLE_RESOURCE_PREFIX.to_string(),
            close_button_id: DEFAULT_CLOSE_BUTTON_ID.to_string(),
            crash_seed: None,
            apps: default_apps(),
            quick_launch: default_quick_launch(),
        }
    }
}

impl RuntimeConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML and [`ConfigError::Invalid`] when
    /// validation fails.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses, and validates a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] when the file cannot be read, otherwise the errors of
    /// [`RuntimeConfig::from_toml_str`].
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let body = fs::read_to_string(path).map_err(|err| ConfigError::Read {
            path: path.display().to_string(),
            message: err.to_string(),
        })?;
        Self::from_toml_str(&body)
    }

    /// Checks semantic constraints that serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first violated constraint.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.initial_max_history_length > MAX_HISTORY_LENGTH_LIMIT {
            return Err(ConfigError::Invalid(format!(
                "initial_max_history_length must be within 0..={MAX_HISTORY_LENGTH_LIMIT}, got {}",
                self.initial_max_history_length
            )));
        }
        if self.wallpaper_refresh_secs == 0 {
            return Err(ConfigError::Invalid(
                "wallpaper_refresh_secs must be positive".to_string(),
            ));
        }
        if self.unstable_resource_prefix.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "unstable_resource_prefix must not be empty".to_string(),
            ));
        }
        let mut seen = HashSet::new();
        for app in &self.apps {
            if app.id.trim().is_empty() {
                return Err(ConfigError::Invalid("app ids must not be empty".to_string()));
            }
            if !seen.insert(app.id.as_str()) {
                return Err(ConfigError::Invalid(format!("duplicate app id `{}`", app.id)));
            }
        }
        Ok(())
    }

    pub fn wallpaper_refresh_period(&self) -> Duration {
        Duration::from_secs(self.wallpaper_refresh_secs)
    }

    pub fn catalog(&self) -> AppCatalog {
        AppCatalog::new(self.apps.clone(), self.quick_launch.clone())
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            max_history_length: self.initial_max_history_length,
            statefulness_enabled: self.statefulness_enabled,
            wallpaper_refresh: self.wallpaper_refresh_period(),
            unstable_resource_prefix: self.unstable_resource_prefix.clone(),
            close_button_id: self.close_button_id.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config = RuntimeConfig::from_toml_str("").expect("parse");
        assert_eq!(config, RuntimeConfig::default());
        assert_eq!(config.wallpaper_refresh_period(), Duration::from_secs(300));
    }

    #[test]
    fn overrides_and_custom_catalog_are_read() {
        let config = RuntimeConfig::from_toml_str(
            r#"
initial_max_history_length = 5
statefulness_enabled = true
crash_seed = 9
quick_launch = ["notes"]

[[apps]]
id = "notes"
name = "Notes"
icon = "N"
"#,
        )
        .expect("parse");

        assert_eq!(config.initial_max_history_length, 5);
        assert!(config.statefulness_enabled);
        assert_eq!(config.crash_seed, Some(9));
        assert_eq!(config.catalog().quick_launch_apps().len(), 1);
        assert_eq!(config.close_button_id, DEFAULT_CLOSE_BUTTON_ID);
    }

    #[test]
    fn out_of_range_history_length_is_rejected() {
        let err = RuntimeConfig::from_toml_str("initial_max_history_length = 11")
            .expect_err("invalid");
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn duplicate_app_ids_are_rejected() {
        let mut config = RuntimeConfig::default();
        config.apps.push(AppDefinition::new("notepad", "Again", "?"));
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = RuntimeConfig::from_toml_str("wallpaper_refresh_secs = \"soon\"").expect_err("bad");
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn load_reports_missing_files() {
        let err = RuntimeConfig::load(Path::new("/nonexistent/desktop.toml")).expect_err("missing");
        assert!(err.to_string().contains("desktop.toml"));
    }
}
