//! CLI bootstrap - the composition root.
//!
//! Resolves settings from their layers and builds the store every command
//! works on.

use std::fs;
use std::path::Path;
use std::str::FromStr;

use spanlog_core::{CoreError, Settings, SettingsUpdate, SharedLogStore, validate_settings};
use tracing::debug;

use crate::error::CliError;

pub const ENV_MAX_LOG_LENGTH: &str = "SPANLOG_MAX_LOG_LENGTH";
pub const ENV_RENDER_WINDOW: &str = "SPANLOG_RENDER_WINDOW";
pub const ENV_FRAME_INTERVAL_MS: &str = "SPANLOG_FRAME_INTERVAL_MS";
pub const ENV_EXPORT_MAX_BYTES: &str = "SPANLOG_EXPORT_MAX_BYTES";

/// Bootstrap configuration for the CLI.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub settings: Settings,
    /// Style output with terminal colors.
    pub color: bool,
}

impl CliConfig {
    /// Resolve settings: defaults, then the settings file, then the
    /// environment, then flags. The result is validated.
    pub fn load(
        config_path: Option<&Path>,
        flags: &SettingsUpdate,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, CliError> {
        let mut settings = Settings::with_defaults();

        if let Some(path) = config_path {
            let file = read_settings_file(path)?;
            settings.merge(&file_layer(&file));
        }
        settings.merge(&env_overrides(env)?);
        settings.merge(flags);

        validate_settings(&settings).map_err(CoreError::from)?;
        debug!(?settings, "Resolved settings");

        Ok(Self {
            settings,
            color: false,
        })
    }

    #[must_use]
    pub const fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }
}

/// Fully composed context handed to command handlers.
#[derive(Debug, Clone)]
pub struct CliContext {
    pub settings: Settings,
    pub store: SharedLogStore,
    pub color: bool,
}

/// Build the store from resolved settings.
pub fn bootstrap(config: CliConfig) -> CliContext {
    let store = SharedLogStore::with_settings(&config.settings);
    CliContext {
        settings: config.settings,
        store,
        color: config.color,
    }
}

fn read_settings_file(path: &Path) -> Result<Settings, CliError> {
    let content = fs::read_to_string(path)
        .map_err(|e| CliError::Io(format!("{}: {e}", path.display())))?;
    serde_json::from_str(&content)
        .map_err(|e| CliError::Config(format!("{}: {e}", path.display())))
}

/// Only the fields the file sets override earlier layers.
const fn file_layer(file: &Settings) -> SettingsUpdate {
    SettingsUpdate {
        max_log_length: some_if_set(file.max_log_length),
        render_window: some_if_set(file.render_window),
        frame_interval_ms: some_if_set(file.frame_interval_ms),
        export_max_bytes: some_if_set(file.export_max_bytes),
    }
}

const fn some_if_set<T: Copy>(value: Option<T>) -> Option<Option<T>> {
    match value {
        Some(value) => Some(Some(value)),
        None => None,
    }
}

/// Read `SPANLOG_*` overrides through `env`.
pub fn env_overrides(env: impl Fn(&str) -> Option<String>) -> Result<SettingsUpdate, CliError> {
    Ok(SettingsUpdate {
        max_log_length: parse_env(&env, ENV_MAX_LOG_LENGTH)?,
        render_window: parse_env(&env, ENV_RENDER_WINDOW)?,
        frame_interval_ms: parse_env(&env, ENV_FRAME_INTERVAL_MS)?,
        export_max_bytes: parse_env(&env, ENV_EXPORT_MAX_BYTES)?,
    })
}

fn parse_env<T: FromStr>(
    env: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<Option<T>>, CliError> {
    let Some(raw) = env(key) else {
        return Ok(None);
    };
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse()
        .map(|value| Some(Some(value)))
        .map_err(|_| CliError::Config(format!("{key}: expected a number, got '{raw}'")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use spanlog_core::{DEFAULT_MAX_LOG_LENGTH, DEFAULT_RENDER_WINDOW};

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_layers() {
        let config = CliConfig::load(None, &SettingsUpdate::default(), env_from(&[])).unwrap();
        assert_eq!(config.settings.max_log_length, Some(DEFAULT_MAX_LOG_LENGTH));
        assert_eq!(config.settings.render_window, Some(DEFAULT_RENDER_WINDOW));
        assert!(!config.color);
    }

    #[test]
    fn test_layers_apply_in_order() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"max_log_length": 8192, "render_window": 50}}"#).unwrap();

        let env = env_from(&[(ENV_RENDER_WINDOW, "75"), (ENV_FRAME_INTERVAL_MS, "32")]);
        let flags = SettingsUpdate {
            frame_interval_ms: Some(Some(8)),
            ..SettingsUpdate::default()
        };

        let config = CliConfig::load(Some(file.path()), &flags, env).unwrap();
        assert_eq!(config.settings.max_log_length, Some(8192));
        assert_eq!(config.settings.render_window, Some(75));
        assert_eq!(config.settings.frame_interval_ms, Some(8));
    }

    #[test]
    fn test_invalid_env_value() {
        let err = env_overrides(env_from(&[(ENV_MAX_LOG_LENGTH, "lots")])).unwrap_err();
        assert!(matches!(err, CliError::Config(ref msg) if msg.contains(ENV_MAX_LOG_LENGTH)));
    }

    #[test]
    fn test_blank_env_value_is_ignored() {
        let update = env_overrides(env_from(&[(ENV_RENDER_WINDOW, "  ")])).unwrap();
        assert!(update.is_empty());
    }

    #[test]
    fn test_validation_failure_is_config_error() {
        let flags = SettingsUpdate {
            max_log_length: Some(Some(10)),
            ..SettingsUpdate::default()
        };
        let err = CliConfig::load(None, &flags, env_from(&[])).unwrap_err();
        assert_eq!(err.exit_code(), 78);
    }

    #[test]
    fn test_missing_settings_file() {
        let err = CliConfig::load(
            Some(Path::new("/nonexistent/spanlog.json")),
            &SettingsUpdate::default(),
            env_from(&[]),
        )
        .unwrap_err();
        assert!(matches!(err, CliError::Io(_)));
    }

    #[test]
    fn test_bootstrap_uses_settings() {
        let flags = SettingsUpdate {
            max_log_length: Some(Some(4096)),
            ..SettingsUpdate::default()
        };
        let config = CliConfig::load(None, &flags, env_from(&[])).unwrap();
        let ctx = bootstrap(config.with_color(true));
        assert_eq!(ctx.store.read().max_log_length(), 4096);
        assert!(ctx.color);
    }
}
