//! Settings domain types and validation.
//!
//! Store and viewport tunables. All fields are optional so that partial
//! configuration layers (file, environment, flags) can be merged in order.

use serde::{Deserialize, Serialize};

/// Byte size above which the store truncates its oldest output.
pub const DEFAULT_MAX_LOG_LENGTH: usize = 2_000_000;

/// Number of lines materialized per render tick and direction.
pub const DEFAULT_RENDER_WINDOW: usize = 250;

/// Interval between render ticks when frame-paced.
pub const DEFAULT_FRAME_INTERVAL_MS: u64 = 16;

/// Lower bound for `max_log_length`; anything smaller would thrash.
const MIN_MAX_LOG_LENGTH: usize = 1024;

const MAX_FRAME_INTERVAL_MS: u64 = 1000;

/// Application settings structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Soft byte cap on the store.
    pub max_log_length: Option<usize>,

    /// Lines per render tick and direction.
    pub render_window: Option<usize>,

    /// Milliseconds between frame-paced render ticks.
    pub frame_interval_ms: Option<u64>,

    /// Byte budget for exported log lists. `None` exports everything.
    pub export_max_bytes: Option<usize>,
}

impl Settings {
    /// Create settings with sensible defaults.
    #[must_use]
    pub const fn with_defaults() -> Self {
        Self {
            max_log_length: Some(DEFAULT_MAX_LOG_LENGTH),
            render_window: Some(DEFAULT_RENDER_WINDOW),
            frame_interval_ms: Some(DEFAULT_FRAME_INTERVAL_MS),
            export_max_bytes: None,
        }
    }

    #[must_use]
    pub const fn effective_max_log_length(&self) -> usize {
        match self.max_log_length {
            Some(len) => len,
            None => DEFAULT_MAX_LOG_LENGTH,
        }
    }

    #[must_use]
    pub const fn effective_render_window(&self) -> usize {
        match self.render_window {
            Some(window) => window,
            None => DEFAULT_RENDER_WINDOW,
        }
    }

    #[must_use]
    pub const fn effective_frame_interval_ms(&self) -> u64 {
        match self.frame_interval_ms {
            Some(ms) => ms,
            None => DEFAULT_FRAME_INTERVAL_MS,
        }
    }

    /// Merge an update into this one, only touching fields that are `Some`.
    pub const fn merge(&mut self, other: &SettingsUpdate) {
        if let Some(len) = other.max_log_length {
            self.max_log_length = len;
        }
        if let Some(window) = other.render_window {
            self.render_window = window;
        }
        if let Some(ms) = other.frame_interval_ms {
            self.frame_interval_ms = ms;
        }
        if let Some(bytes) = other.export_max_bytes {
            self.export_max_bytes = bytes;
        }
    }
}

/// Partial settings update.
///
/// Each field is `Option<Option<T>>`:
/// - `None` = don't change this field
/// - `Some(None)` = reset the field (fall back to the default)
/// - `Some(Some(value))` = set field to value
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SettingsUpdate {
    pub max_log_length: Option<Option<usize>>,
    pub render_window: Option<Option<usize>>,
    pub frame_interval_ms: Option<Option<u64>>,
    pub export_max_bytes: Option<Option<usize>>,
}

impl SettingsUpdate {
    pub const fn is_empty(&self) -> bool {
        self.max_log_length.is_none()
            && self.render_window.is_none()
            && self.frame_interval_ms.is_none()
            && self.export_max_bytes.is_none()
    }
}

/// Settings validation error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    #[error("Max log length must be at least {MIN_MAX_LOG_LENGTH} bytes, got {0}")]
    InvalidMaxLogLength(usize),

    #[error("Render window must be at least 1 line, got {0}")]
    InvalidRenderWindow(usize),

    #[error("Frame interval must be between 1 and {MAX_FRAME_INTERVAL_MS} ms, got {0}")]
    InvalidFrameInterval(u64),

    #[error("Export byte budget must be greater than zero")]
    EmptyExportBudget,
}

/// Validate settings values.
pub fn validate_settings(settings: &Settings) -> Result<(), SettingsError> {
    if let Some(len) = settings.max_log_length
        && len < MIN_MAX_LOG_LENGTH
    {
        return Err(SettingsError::InvalidMaxLogLength(len));
    }

    if let Some(window) = settings.render_window
        && window == 0
    {
        return Err(SettingsError::InvalidRenderWindow(window));
    }

    if let Some(ms) = settings.frame_interval_ms
        && !(1..=MAX_FRAME_INTERVAL_MS).contains(&ms)
    {
        return Err(SettingsError::InvalidFrameInterval(ms));
    }

    if settings.export_max_bytes == Some(0) {
        return Err(SettingsError::EmptyExportBudget);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::with_defaults();
        assert_eq!(settings.max_log_length, Some(DEFAULT_MAX_LOG_LENGTH));
        assert_eq!(settings.render_window, Some(DEFAULT_RENDER_WINDOW));
        assert_eq!(settings.frame_interval_ms, Some(16));
        assert!(settings.export_max_bytes.is_none());
        assert!(validate_settings(&settings).is_ok());
    }

    #[test]
    fn test_effective_values_fall_back() {
        let settings = Settings::default();
        assert_eq!(settings.effective_max_log_length(), DEFAULT_MAX_LOG_LENGTH);
        assert_eq!(settings.effective_render_window(), DEFAULT_RENDER_WINDOW);
        assert_eq!(
            settings.effective_frame_interval_ms(),
            DEFAULT_FRAME_INTERVAL_MS
        );
    }

    #[test]
    fn test_merge_settings() {
        let mut settings = Settings::with_defaults();
        let update = SettingsUpdate {
            render_window: Some(Some(50)),
            frame_interval_ms: Some(None),
            ..Default::default()
        };
        settings.merge(&update);

        assert_eq!(settings.render_window, Some(50));
        assert_eq!(settings.frame_interval_ms, None);
        assert_eq!(settings.max_log_length, Some(DEFAULT_MAX_LOG_LENGTH));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let settings = Settings {
            max_log_length: Some(10),
            ..Settings::with_defaults()
        };
        assert_eq!(
            validate_settings(&settings),
            Err(SettingsError::InvalidMaxLogLength(10))
        );

        let settings = Settings {
            render_window: Some(0),
            ..Settings::with_defaults()
        };
        assert!(validate_settings(&settings).is_err());

        let settings = Settings {
            frame_interval_ms: Some(5000),
            ..Settings::with_defaults()
        };
        assert!(validate_settings(&settings).is_err());

        let settings = Settings {
            export_max_bytes: Some(0),
            ..Settings::with_defaults()
        };
        assert_eq!(
            validate_settings(&settings),
            Err(SettingsError::EmptyExportBudget)
        );
    }

    #[test]
    fn test_settings_deserialize_partial() {
        let settings: Settings = serde_json::from_str(r#"{"render_window": 10}"#).unwrap();
        assert_eq!(settings.render_window, Some(10));
        assert!(settings.max_log_length.is_none());
    }
}
