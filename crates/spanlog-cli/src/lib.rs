#![doc = include_str!(concat!(env!("OUT_DIR"), "/README_GENERATED.md"))]
#![deny(unused_crate_dependencies)]

#[cfg(test)]
use tokio_test as _;

// Used by the binary only
use anyhow as _;
use dotenvy as _;
use tracing_subscriber as _;

pub mod bootstrap;
pub mod commands;
pub mod error;
pub mod handlers;
pub mod input;
pub mod parser;
pub mod presentation;

pub use bootstrap::{CliConfig, CliContext, bootstrap};
pub use commands::{Commands, ReplayArgs};
pub use error::CliError;
pub use parser::Cli;
