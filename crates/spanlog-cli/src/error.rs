//! CLI-specific error types and mappings.
//!
//! Maps core errors to exit codes and user-facing messages.

use spanlog_core::{ContractError, CoreError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    /// Core domain error.
    #[error("{0}")]
    Core(String),

    /// Argument error.
    #[error("Invalid arguments: {0}")]
    Arguments(String),

    /// IO error (file not found, permission denied, etc.).
    #[error("IO error: {0}")]
    Io(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Recording could not be decoded.
    #[error("Invalid recording: {0}")]
    Input(String),
}

impl CliError {
    /// Map error to an exit code.
    ///
    /// - 1: General error
    /// - 2: Invalid arguments
    /// - 64-78: sysexits.h categories
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Core(_) => 1,
            Self::Arguments(_) => 2,
            Self::Input(_) => 65,  // EX_DATAERR
            Self::Io(_) => 74,     // EX_IOERR
            Self::Config(_) => 78, // EX_CONFIG
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Settings(settings_err) => Self::Config(settings_err.to_string()),
            CoreError::Contract(contract_err) => Self::from(contract_err),
        }
    }
}

impl From<ContractError> for CliError {
    fn from(err: ContractError) -> Self {
        match err {
            ContractError::Json { .. } => Self::Input(err.to_string()),
            ContractError::Encode(msg) => Self::Core(msg),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
