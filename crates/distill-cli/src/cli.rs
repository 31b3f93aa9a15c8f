//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use distill_core::Window;

use crate::commands::util::parse_window;

/// Behavioral log distillation.
///
/// Validates interaction logs, assigns each record a deterministic
/// identifier and segments the resulting stream into named time windows.
#[derive(Debug, Parser)]
#[command(name = "distill", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Options shared by every command that reads a log file.
#[derive(Debug, Clone, Args)]
pub struct InputArgs {
    /// Log file holding a JSON array or one JSON object per line (`-` for stdin).
    pub file: PathBuf,

    /// Skip records that fail validation instead of aborting.
    #[arg(long)]
    pub skip_invalid: bool,

    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List records in stream order with their keys and identifiers.
    Ids {
        #[command(flatten)]
        input: InputArgs,
    },

    /// Segment records into explicitly named windows.
    Segment {
        #[command(flatten)]
        input: InputArgs,

        /// Window as `NAME=START..END`; times are epoch milliseconds or RFC 3339.
        #[arg(
            long = "window",
            value_name = "NAME=START..END",
            required = true,
            value_parser = parse_window
        )]
        windows: Vec<Window>,
    },

    /// Segment the idle stretches between records.
    Gaps {
        #[command(flatten)]
        input: InputArgs,

        /// Smallest gap, in milliseconds, that opens a window.
        #[arg(long, value_name = "MS")]
        min_gap_ms: u64,

        /// Prefix for generated segment names.
        #[arg(long, default_value = "gap")]
        label: String,
    },

    /// Segment the time around records whose field matches a value.
    Around {
        #[command(flatten)]
        input: InputArgs,

        /// Top-level payload field to match.
        #[arg(long)]
        field: String,

        /// Value to match; parsed as JSON when possible, otherwise a string.
        #[arg(long)]
        value: String,

        /// Milliseconds to include before each match.
        #[arg(long, value_name = "MS", default_value_t = 0)]
        before_ms: u64,

        /// Milliseconds to include after each match.
        #[arg(long, value_name = "MS", default_value_t = 0)]
        after_ms: u64,

        /// Prefix for generated segment names.
        #[arg(long, default_value = "around")]
        label: String,
    },
}
