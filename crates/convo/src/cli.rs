//! CLI argument definitions using clap derive macros.

use clap::{Args, Parser, Subcommand};

/// convo - hosted video conversations from the terminal
///
/// Creates a conversation on the Conversation API and joins its call.
#[derive(Parser, Debug)]
#[command(name = "convo")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a conversation and drive it interactively (join / end)
    Run,

    /// Create a conversation and print its join URL
    Create {
        /// Don't end existing conversations first
        #[arg(long)]
        no_cleanup: bool,
    },

    /// List conversations owned by the API key
    List {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// End a conversation
    End {
        /// Conversation ID to end
        conversation_id: String,
    },

    /// End every conversation owned by the API key
    Cleanup,

    /// Configuration management
    Config(ConfigCommand),

    /// Run diagnostics
    Doctor,

    /// Show version
    Version,
}

// ─────────────────────────────────────────────────────────────────────────────
// Config Commands
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Args, Debug)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the effective configuration (API key masked)
    Show,

    /// Print the config file path
    Path,

    /// Write a config file with default values
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}
