//! Reading recordings into the store.

use std::fs;
use std::path::Path;

use spanlog_core::{AppendBatch, Checkpoint, LogList, SharedLogStore};
use tracing::debug;

use crate::error::CliError;

/// Parse a JSON Lines recording. Blank lines are skipped.
pub fn read_recording(path: &Path) -> Result<Vec<LogList>, CliError> {
    let content = fs::read_to_string(path)
        .map_err(|e| CliError::Io(format!("{}: {e}", path.display())))?;
    let batches = LogList::parse_json_lines(&content)?;
    debug!(path = %path.display(), batches = batches.len(), "Read recording");
    Ok(batches)
}

/// Append every batch in order. Returns the store checkpoint afterwards.
pub fn ingest(store: &SharedLogStore, batches: Vec<LogList>) -> Checkpoint {
    let mut checkpoint = store.read().checkpoint();
    for batch in batches {
        checkpoint = store.append(AppendBatch::from(batch));
    }
    checkpoint
}

/// Read a recording and append it to `store`.
pub fn load(store: &SharedLogStore, path: &Path) -> Result<Checkpoint, CliError> {
    let batches = read_recording(path)?;
    Ok(ingest(store, batches))
}
