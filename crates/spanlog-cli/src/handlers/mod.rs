//! Command handlers.
//!
//! Handlers follow one pattern:
//! - Signature: `execute(ctx: &CliContext, ...) -> Result<String, CliError>`
//! - Load the recording into `ctx.store`, query or render it, and return
//!   the text to print
//!
//! Printing and exit codes stay in `main`.

pub mod export;
pub mod replay;
pub mod spans;
pub mod tail;
pub mod trace;
