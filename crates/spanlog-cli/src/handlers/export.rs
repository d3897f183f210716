//! Export command handler.

use std::path::Path;

use crate::bootstrap::CliContext;
use crate::error::CliError;
use crate::input;

/// Print the store as an ingestion batch, bounded by `export_max_bytes`.
///
/// The output can be fed back as a one-line recording.
pub fn execute(ctx: &CliContext, file: &Path) -> Result<String, CliError> {
    input::load(&ctx.store, file)?;
    let list = ctx.store.read().to_log_list(ctx.settings.export_max_bytes);
    Ok(list.to_json_pretty()?)
}
