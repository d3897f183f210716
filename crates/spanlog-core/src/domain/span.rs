use std::fmt;

use serde::{Deserialize, Serialize};

use super::LogLevel;

/// Key of the global (unscoped) span.
///
/// Some storage backends cannot hold an empty map key, so the empty span key
/// is normalized to this value everywhere.
pub const GLOBAL_SPAN_ID: &str = "_";

const BUILD_SPAN_PREFIXES: [&str; 2] = ["build:", "cmdimage:"];

/// Identifier of a span (one sub-stream of log output).
///
/// Construction normalizes the empty key to [`GLOBAL_SPAN_ID`], so `""` and
/// `"_"` always address the same span.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct SpanId(String);

impl SpanId {
    /// Create a span id, normalizing the empty key to the global span.
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        if raw.is_empty() {
            Self::global()
        } else {
            Self(raw)
        }
    }

    /// The global span id.
    pub fn global() -> Self {
        Self(GLOBAL_SPAN_ID.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_global(&self) -> bool {
        self.0 == GLOBAL_SPAN_ID
    }

    /// Whether this span carries build output (as opposed to runtime output).
    pub fn is_build(&self) -> bool {
        BUILD_SPAN_PREFIXES
            .iter()
            .any(|prefix| self.0.starts_with(prefix))
    }
}

impl Default for SpanId {
    fn default() -> Self {
        Self::global()
    }
}

impl From<&str> for SpanId {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for SpanId {
    fn from(raw: String) -> Self {
        Self::new(raw)
    }
}

impl From<SpanId> for String {
    fn from(id: SpanId) -> Self {
        id.0
    }
}

impl fmt::Display for SpanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A warning or error line, indexed per span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogAlert {
    pub line_index: usize,
    pub level: LogLevel,
}

/// Read-only view of a span as the store tracks it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogSpan {
    pub span_id: SpanId,
    /// Owning manifest; empty for global output.
    pub manifest_name: String,
    /// First stored line index of this span, if it has any lines.
    pub first_line_index: Option<usize>,
    /// Last stored line index of this span, if it has any lines.
    pub last_line_index: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_span_id_is_global() {
        assert_eq!(SpanId::new(""), SpanId::global());
        assert_eq!(SpanId::from("_"), SpanId::global());
        assert!(SpanId::new("").is_global());
        assert!(!SpanId::new("pod:fe").is_global());
    }

    #[test]
    fn test_build_span_detection() {
        assert!(SpanId::new("build:1").is_build());
        assert!(SpanId::new("cmdimage:fe").is_build());
        assert!(!SpanId::new("pod:fe-123").is_build());
        assert!(!SpanId::global().is_build());
    }

    #[test]
    fn test_span_id_serde_normalizes() {
        let id: SpanId = serde_json::from_str("\"\"").unwrap();
        assert!(id.is_global());
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"_\"");
    }
}
