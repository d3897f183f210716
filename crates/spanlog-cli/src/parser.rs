//! Main CLI parser and top-level argument handling.

use std::path::PathBuf;

use clap::Parser;
use spanlog_core::SettingsUpdate;

use crate::commands::Commands;

/// Replay, render and export recorded dashboard logs.
#[derive(Parser)]
#[command(name = "spanlog")]
#[command(about = "Replay, render and export recorded dashboard logs")]
#[command(version)]
pub struct Cli {
    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    /// JSON settings file
    #[arg(long = "config", global = true, env = "SPANLOG_CONFIG")]
    pub config: Option<PathBuf>,

    /// Byte size above which the store truncates old output
    #[arg(long = "max-log-length", global = true)]
    pub max_log_length: Option<usize>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Settings given as flags, the last configuration layer.
    pub fn settings_flags(&self) -> SettingsUpdate {
        let mut update = SettingsUpdate {
            max_log_length: self.max_log_length.map(Some),
            ..SettingsUpdate::default()
        };
        match &self.command {
            Some(Commands::Replay(args)) => update.render_window = args.window.map(Some),
            Some(Commands::Export { max_bytes, .. }) => {
                update.export_max_bytes = max_bytes.map(Some);
            }
            _ => {}
        }
        update
    }
}
