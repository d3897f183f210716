//! Log filters applied by viewports before materializing lines.
//!
//! A filter narrows by source (build vs runtime output), by level, and by a
//! free-text term. A term that fails to compile is kept in an error state
//! instead of failing: the filter then matches nothing and callers can show
//! the message to the user.

use std::fmt;
use std::str::FromStr;

use regex::{Regex, RegexBuilder};
use thiserror::Error;

use crate::domain::{LogLevel, LogLine};

/// Which kind of span output to show.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum FilterSource {
    #[default]
    All,
    /// Only `build:` / `cmdimage:` spans.
    Build,
    /// Everything except build spans.
    Runtime,
}

/// Which levels to show.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum FilterLevel {
    #[default]
    All,
    Warn,
    Error,
}

/// Error parsing a filter keyword.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterParseError {
    #[error("unknown source '{0}' (expected all, build or runtime)")]
    Source(String),

    #[error("unknown level '{0}' (expected all, warn or error)")]
    Level(String),
}

impl FromStr for FilterSource {
    type Err = FilterParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "all" => Ok(Self::All),
            "build" => Ok(Self::Build),
            "runtime" => Ok(Self::Runtime),
            _ => Err(FilterParseError::Source(s.to_string())),
        }
    }
}

impl FromStr for FilterLevel {
    type Err = FilterParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "all" => Ok(Self::All),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            _ => Err(FilterParseError::Level(s.to_string())),
        }
    }
}

impl fmt::Display for FilterSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::All => "all",
            Self::Build => "build",
            Self::Runtime => "runtime",
        })
    }
}

impl fmt::Display for FilterLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::All => "all",
            Self::Warn => "warn",
            Self::Error => "error",
        })
    }
}

impl FilterLevel {
    fn matches(self, level: LogLevel) -> bool {
        match self {
            Self::All => true,
            Self::Warn => level == LogLevel::Warn,
            Self::Error => level == LogLevel::Error,
        }
    }
}

/// Compiled state of a search term.
#[derive(Debug, Clone)]
pub enum TermState {
    /// Blank input; matches everything.
    Empty,
    Parsed(Regex),
    /// The input did not compile; matches nothing.
    Error(String),
}

/// A free-text or `/regex/` search term.
#[derive(Debug, Clone)]
pub struct FilterTerm {
    input: String,
    state: TermState,
}

impl FilterTerm {
    /// Parse user input.
    ///
    /// `/pattern/` is compiled as a case-insensitive regular expression;
    /// anything else is matched as a case-insensitive literal.
    pub fn parse(input: impl Into<String>) -> Self {
        let input = input.into();
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Self {
                input,
                state: TermState::Empty,
            };
        }

        let pattern = match trimmed
            .strip_prefix('/')
            .and_then(|rest| rest.strip_suffix('/'))
        {
            Some(re) if !re.is_empty() => re.to_string(),
            _ => regex::escape(trimmed),
        };

        let state = match RegexBuilder::new(&pattern).case_insensitive(true).build() {
            Ok(re) => TermState::Parsed(re),
            Err(e) => TermState::Error(e.to_string()),
        };

        Self { input, state }
    }

    pub fn empty() -> Self {
        Self {
            input: String::new(),
            state: TermState::Empty,
        }
    }

    /// The raw input as typed.
    pub fn input(&self) -> &str {
        &self.input
    }

    pub const fn state(&self) -> &TermState {
        &self.state
    }

    pub const fn is_empty(&self) -> bool {
        matches!(self.state, TermState::Empty)
    }

    /// Compilation error, if the term is invalid.
    pub fn error(&self) -> Option<&str> {
        match &self.state {
            TermState::Error(message) => Some(message),
            _ => None,
        }
    }

    pub fn matches(&self, text: &str) -> bool {
        match &self.state {
            TermState::Empty => true,
            TermState::Parsed(re) => re.is_match(text),
            TermState::Error(_) => false,
        }
    }
}

impl Default for FilterTerm {
    fn default() -> Self {
        Self::empty()
    }
}

impl PartialEq for FilterTerm {
    fn eq(&self, other: &Self) -> bool {
        self.input == other.input
    }
}

impl Eq for FilterTerm {}

/// Combined source, level and term filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogFilter {
    pub source: FilterSource,
    pub level: FilterLevel,
    pub term: FilterTerm,
}

impl LogFilter {
    pub fn new(source: FilterSource, level: FilterLevel, term: FilterTerm) -> Self {
        Self {
            source,
            level,
            term,
        }
    }

    /// Filter that lets everything through.
    pub fn all() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn with_source(mut self, source: FilterSource) -> Self {
        self.source = source;
        self
    }

    #[must_use]
    pub const fn with_level(mut self, level: FilterLevel) -> Self {
        self.level = level;
        self
    }

    #[must_use]
    pub fn with_term(mut self, term: impl Into<String>) -> Self {
        self.term = FilterTerm::parse(term);
        self
    }

    /// Term compilation error, if any.
    pub fn error(&self) -> Option<&str> {
        self.term.error()
    }

    pub fn is_pass_through(&self) -> bool {
        self.source == FilterSource::All && self.level == FilterLevel::All && self.term.is_empty()
    }

    pub fn matches(&self, line: &LogLine) -> bool {
        if !self.term.matches(&line.text) {
            return false;
        }

        // Build lifecycle markers stay visible so builds remain delimited.
        if line.build_event.is_some() {
            return true;
        }

        let is_build = line.span_id.is_build();
        match self.source {
            FilterSource::Build if !is_build => return false,
            FilterSource::Runtime if is_build => return false,
            _ => {}
        }

        self.level.matches(line.level)
    }

    /// Keep only matching lines.
    pub fn apply(&self, lines: Vec<LogLine>) -> Vec<LogLine> {
        if self.is_pass_through() {
            return lines;
        }
        lines.into_iter().filter(|line| self.matches(line)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BuildEvent, SpanId};

    fn line(span: &str, level: LogLevel, text: &str) -> LogLine {
        LogLine {
            text: text.to_string(),
            level,
            manifest_name: "fe".to_string(),
            span_id: SpanId::new(span),
            stored_line_index: 0,
            build_event: None,
            progress_id: None,
            time: String::new(),
        }
    }

    #[test]
    fn test_source_filter() {
        let build = line("build:1", LogLevel::Info, "compiling");
        let runtime = line("pod:fe", LogLevel::Info, "listening");

        let f = LogFilter::all().with_source(FilterSource::Build);
        assert!(f.matches(&build));
        assert!(!f.matches(&runtime));

        let f = LogFilter::all().with_source(FilterSource::Runtime);
        assert!(!f.matches(&build));
        assert!(f.matches(&runtime));
    }

    #[test]
    fn test_level_filter_is_exact() {
        let f = LogFilter::all().with_level(FilterLevel::Warn);
        assert!(f.matches(&line("pod:fe", LogLevel::Warn, "w")));
        assert!(!f.matches(&line("pod:fe", LogLevel::Error, "e")));
        assert!(!f.matches(&line("pod:fe", LogLevel::Info, "i")));
    }

    #[test]
    fn test_build_event_bypasses_source_and_level() {
        let mut marker = line("build:1", LogLevel::Info, "Initial Build");
        marker.build_event = Some(BuildEvent::Init);
        let f = LogFilter::all()
            .with_source(FilterSource::Runtime)
            .with_level(FilterLevel::Error);
        assert!(f.matches(&marker));

        let f = f.with_term("nothing here");
        assert!(!f.matches(&marker));
    }

    #[test]
    fn test_literal_term_is_case_insensitive() {
        let f = LogFilter::all().with_term("GET /health");
        assert!(f.matches(&line("pod:fe", LogLevel::Info, "get /health 200")));
        assert!(!f.matches(&line("pod:fe", LogLevel::Info, "POST /api")));
    }

    #[test]
    fn test_regex_term() {
        let f = LogFilter::all().with_term("/err(or)?\\s+\\d+/");
        assert!(f.error().is_none());
        assert!(f.matches(&line("pod:fe", LogLevel::Info, "ERROR 42")));
        assert!(!f.matches(&line("pod:fe", LogLevel::Info, "error: none")));
    }

    #[test]
    fn test_invalid_regex_matches_nothing() {
        let f = LogFilter::all().with_term("/(unclosed/");
        assert!(f.error().is_some());
        assert!(!f.matches(&line("pod:fe", LogLevel::Info, "(unclosed")));
        assert!(f.apply(vec![line("pod:fe", LogLevel::Info, "x")]).is_empty());
    }

    #[test]
    fn test_apply_keeps_order_and_skips_filtering_when_pass_through() {
        let lines = vec![
            line("pod:fe", LogLevel::Info, "a"),
            line("build:fe", LogLevel::Warn, "b"),
            line("pod:fe", LogLevel::Error, "c"),
        ];
        assert!(LogFilter::all().is_pass_through());
        assert_eq!(LogFilter::all().apply(lines.clone()), lines);

        let warn = LogFilter::all().with_level(FilterLevel::Warn);
        assert!(!warn.is_pass_through());
        let kept: Vec<String> = warn.apply(lines).into_iter().map(|l| l.text).collect();
        assert_eq!(kept, vec!["b"]);
    }

    #[test]
    fn test_blank_term_is_empty() {
        let term = FilterTerm::parse("   ");
        assert!(term.is_empty());
        assert!(term.matches("anything"));
    }

    #[test]
    fn test_parse_keywords() {
        assert_eq!("runtime".parse::<FilterSource>(), Ok(FilterSource::Runtime));
        assert_eq!("ERROR".parse::<FilterLevel>(), Ok(FilterLevel::Error));
        assert!("loud".parse::<FilterLevel>().is_err());
        assert!("pods".parse::<FilterSource>().is_err());
    }
}
