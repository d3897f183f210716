//! Spans command handler.
//!
//! Lists spans in a table: key, owning manifest, line range and alerts.

use std::fmt::Write;
use std::path::Path;

use crate::bootstrap::CliContext;
use crate::error::CliError;
use crate::input;
use crate::presentation::{separator, truncate_string};

const GLOBAL_MANIFEST_LABEL: &str = "(global)";

pub fn execute(ctx: &CliContext, file: &Path, manifest: Option<&str>) -> Result<String, CliError> {
    input::load(&ctx.store, file)?;
    let store = ctx.store.read();

    let spans = match manifest {
        Some(name) => store.spans_for_manifest(name),
        None => store.all_spans(),
    };
    if spans.is_empty() {
        return Ok("No spans found.".to_string());
    }

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<24} {:<16} {:>7} {:>7} {:>6}",
        "Span", "Manifest", "First", "Last", "Alerts"
    );
    let _ = writeln!(out, "{}", separator(64));

    for (span_id, span) in &spans {
        let manifest_label = if span.manifest_name.is_empty() {
            GLOBAL_MANIFEST_LABEL
        } else {
            span.manifest_name.as_str()
        };
        let _ = writeln!(
            out,
            "{:<24} {:<16} {:>7} {:>7} {:>6}",
            truncate_string(span_id.as_str(), 24),
            truncate_string(manifest_label, 16),
            format_index(span.first_line_index),
            format_index(span.last_line_index),
            store.alerts_for_span(span_id.as_str()).len(),
        );
    }
    Ok(out.trim_end().to_string())
}

fn format_index(index: Option<usize>) -> String {
    index.map_or_else(|| "--".to_string(), |index| index.to_string())
}
