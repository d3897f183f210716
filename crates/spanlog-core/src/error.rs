//! Root error type for the core crate.

use thiserror::Error;

use crate::contracts::ContractError;
use crate::settings::SettingsError;

/// Error surface shared by the store, its contracts, and settings.
///
/// Store operations themselves never fail: malformed input is skipped and
/// logged. Errors arise only at the edges (parsing, configuration).
#[derive(Debug, Error)]
pub enum CoreError {
    /// Settings validation error.
    #[error(transparent)]
    Settings(#[from] SettingsError),

    /// Wire payload could not be decoded.
    #[error(transparent)]
    Contract(#[from] ContractError),
}
