//! Subcommands and their arguments.

use std::path::PathBuf;

use clap::{Args, Subcommand};
use spanlog_core::{FilterLevel, FilterSource};

#[derive(Subcommand)]
pub enum Commands {
    /// Render a recording through a viewport and print the result
    Replay(ReplayArgs),

    /// Print the byte-bounded export of a recording as JSON
    Export {
        /// Recording (JSON Lines, one ingestion batch per line)
        file: PathBuf,
        /// Keep at most this many bytes of the most recent output
        #[arg(long)]
        max_bytes: Option<usize>,
    },

    /// Print the last lines of a recording
    Tail {
        /// Recording (JSON Lines, one ingestion batch per line)
        file: PathBuf,
        /// Number of lines
        #[arg(short = 'n', long = "lines", default_value = "20")]
        lines: usize,
        /// Only this span, without manifest prefixes
        #[arg(long)]
        span: Option<String>,
    },

    /// Print the build and runtime output of one build
    Trace {
        /// Recording (JSON Lines, one ingestion batch per line)
        file: PathBuf,
        /// Build span key, e.g. "build:1"
        build_span: String,
    },

    /// List spans with their manifest, line range and alerts
    Spans {
        /// Recording (JSON Lines, one ingestion batch per line)
        file: PathBuf,
        /// Only spans of this manifest
        #[arg(long)]
        manifest: Option<String>,
    },
}

#[derive(Args, Debug, Clone)]
pub struct ReplayArgs {
    /// Recording (JSON Lines, one ingestion batch per line)
    pub file: PathBuf,

    /// Show one manifest
    #[arg(long, conflicts_with = "starred")]
    pub manifest: Option<String>,

    /// Show several manifests (comma separated)
    #[arg(long, value_delimiter = ',')]
    pub starred: Vec<String>,

    /// all, build or runtime
    #[arg(long, default_value = "all")]
    pub source: FilterSource,

    /// all, warn or error
    #[arg(long, default_value = "all")]
    pub level: FilterLevel,

    /// Text to search for; wrap in slashes for a regular expression
    #[arg(long)]
    pub term: Option<String>,

    /// Lines materialized per render tick
    #[arg(long)]
    pub window: Option<usize>,

    /// Render on a timer instead of synchronously
    #[arg(long)]
    pub frame_paced: bool,

    /// Open positioned on this stored line index
    #[arg(long = "scroll-to")]
    pub scroll_to: Option<usize>,
}
