//! Command-Line Interface

use crate::landmark::types::{HandUse, SignMovement};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Sign Capture - record, reconcile, and submit community sign contributions
#[derive(Parser, Debug)]
#[command(name = "signcap")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Record attempts for a word from a landmark stream
    Record {
        /// The vocabulary word being signed
        word: String,

        /// Landmark stream to replay (JSONL, one engine frame per line)
        #[arg(short, long)]
        input: PathBuf,

        /// Attempts to capture (defaults to the configured target)
        #[arg(short, long)]
        attempts: Option<usize>,

        /// Movement class of the sign
        #[arg(long, value_enum, default_value = "dynamic")]
        movement: SignMovement,

        /// How many hands the sign uses
        #[arg(long, value_enum, default_value = "two-handed")]
        hands: HandUse,

        /// Output file name (without extension)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Derive and score the consensus sequence of a saved session
    Process {
        /// Session file
        input: PathBuf,

        /// Also write the consensus frames to this JSON file
        #[arg(long)]
        consensus_out: Option<PathBuf>,
    },

    /// Assemble a session and submit it to the contribution endpoint
    Submit {
        /// Session file
        input: PathBuf,

        /// Override the configured endpoint
        #[arg(long)]
        endpoint: Option<String>,
    },

    /// Print environment readings for a landmark stream
    Monitor {
        /// Landmark stream (JSONL)
        input: PathBuf,
    },

    /// List saved sessions
    List {
        /// Show detailed information
        #[arg(short, long)]
        detailed: bool,
    },

    /// Initialize configuration
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },

    /// View or modify configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Get a configuration value
    Get {
        /// Configuration key (e.g. "recorder.min_frames")
        key: String,
    },

    /// Set a configuration value
    Set {
        /// Configuration key (e.g. "recorder.countdown_secs")
        key: String,

        /// Value to set
        value: String,
    },

    /// Reset configuration to defaults
    Reset {
        /// Skip confirmation
        #[arg(short, long)]
        force: bool,
    },
}

impl Cli {
    /// Parse from the process arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Directory where sessions are stored
    pub fn sessions_dir() -> PathBuf {
        dirs::home_dir()
            .map(|h| h.join(".signcap").join("sessions"))
            .unwrap_or_else(|| PathBuf::from("sessions"))
    }
}
