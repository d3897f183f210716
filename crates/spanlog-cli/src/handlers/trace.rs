//! Trace command handler.

use std::path::Path;

use spanlog_core::SpanId;

use crate::bootstrap::CliContext;
use crate::error::CliError;
use crate::input;
use crate::presentation::format_log_line;

/// Build output of `build_span` plus the runtime output that followed it,
/// up to the next build of the same manifest.
pub fn execute(ctx: &CliContext, file: &Path, build_span: &str) -> Result<String, CliError> {
    if !SpanId::new(build_span).is_build() {
        return Err(CliError::Arguments(format!(
            "'{build_span}' is not a build span (expected build:<id> or cmdimage:<id>)"
        )));
    }

    input::load(&ctx.store, file)?;
    let lines = ctx.store.read().trace_log(build_span);
    if lines.is_empty() {
        return Ok(format!("No output for build span '{build_span}'."));
    }

    Ok(lines
        .iter()
        .map(|line| format_log_line(line, ctx.color))
        .collect::<Vec<_>>()
        .join("\n"))
}
