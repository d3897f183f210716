use std::fmt;

use serde::{Deserialize, Serialize};

/// Severity attached to a segment.
///
/// Serialized in upper case (`"INFO"`, `"WARN"`, ...) to match the ingestion
/// format. Segments without a level are `Info`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Wire name of the level.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
        }
    }

    /// Whether a line opened at this level is indexed as an alert.
    pub const fn is_alert(self) -> bool {
        matches!(self, Self::Warn | Self::Error)
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_level_is_info() {
        assert_eq!(LogLevel::default(), LogLevel::Info);
    }

    #[test]
    fn test_level_wire_names() {
        let json = serde_json::to_string(&LogLevel::Warn).unwrap();
        assert_eq!(json, "\"WARN\"");

        let level: LogLevel = serde_json::from_str("\"ERROR\"").unwrap();
        assert_eq!(level, LogLevel::Error);
        assert_eq!(level.to_string(), "ERROR");
    }

    #[test]
    fn test_alert_levels() {
        assert!(LogLevel::Warn.is_alert());
        assert!(LogLevel::Error.is_alert());
        assert!(!LogLevel::Info.is_alert());
        assert!(!LogLevel::Debug.is_alert());
    }
}
