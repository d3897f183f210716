//! Tail command handler.

use std::path::Path;

use crate::bootstrap::CliContext;
use crate::error::CliError;
use crate::input;

/// Last `lines` lines of the recording, or of one span.
pub fn execute(
    ctx: &CliContext,
    file: &Path,
    lines: usize,
    span: Option<&str>,
) -> Result<String, CliError> {
    input::load(&ctx.store, file)?;
    let store = ctx.store.read();

    let text = match span {
        Some(span) if !store.has_lines_for_span(span) => {
            return Err(CliError::Arguments(format!("no output for span '{span}'")));
        }
        Some(span) => store.tail_span(lines, span),
        None => store.tail(lines),
    };
    Ok(text.trim_end_matches('\n').to_string())
}
