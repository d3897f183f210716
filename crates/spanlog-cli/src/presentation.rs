//! Terminal formatting for command output.
//!
//! Format-only: no domain transforms. Every function takes a `color` flag so
//! output stays plain when stdout is not a terminal.

use crossterm::style::Stylize;
use spanlog_core::{LogLevel, LogLine, RenderedLine};

/// Style text by level. INFO is left as is.
pub fn style_level(text: &str, level: LogLevel, color: bool) -> String {
    if !color {
        return text.to_string();
    }
    match level {
        LogLevel::Error => text.red().to_string(),
        LogLevel::Warn => text.yellow().to_string(),
        LogLevel::Debug => text.dark_grey().to_string(),
        LogLevel::Info => text.to_string(),
    }
}

/// One materialized viewport line: dimmed prefix, then styled text.
pub fn format_rendered_line(line: &RenderedLine, color: bool) -> String {
    let body = style_level(&line.text, line.level, color);
    match &line.prefix {
        Some(prefix) if color => format!("{}{body}", prefix.as_str().dark_grey()),
        Some(prefix) => format!("{prefix}{body}"),
        None => body,
    }
}

pub fn format_log_line(line: &LogLine, color: bool) -> String {
    style_level(&line.text, line.level, color)
}

/// Message shown instead of lines when the filter term does not compile.
pub fn format_filter_error(message: &str, color: bool) -> String {
    let label = "filter error:";
    if color {
        format!("{} {message}", label.red().bold())
    } else {
        format!("{label} {message}")
    }
}

/// Truncate a string to at most `max_len` characters, marking the cut.
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        return s.to_string();
    }
    let kept: String = s.chars().take(max_len.saturating_sub(1)).collect();
    format!("{kept}…")
}

pub fn separator(width: usize) -> String {
    "-".repeat(width)
}
