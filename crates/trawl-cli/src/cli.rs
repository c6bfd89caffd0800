//! Command-line argument parsing with clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// trawl - fetch, follow and list grouped log streams.
#[derive(Parser, Debug, Clone)]
#[command(name = "trawl")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// JSON fixture holding the log store to read from.
    #[arg(long, global = true, env = "TRAWL_FIXTURE", value_name = "PATH")]
    pub fixture: Option<PathBuf>,

    /// Output format for listings.
    #[arg(long, global = true, value_enum, default_value_t = Format::Table)]
    pub format: Format,

    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum Format {
    /// Human-readable table format.
    #[default]
    Table,
    /// JSON output for scripting.
    Json,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Get logs from a group or stream.
    Get(GetArgs),

    /// List groups or streams.
    List {
        /// What to list.
        #[command(subcommand)]
        command: ListCommands,
    },
}

/// Time bounds shared by `get` and `list streams`.
#[derive(Args, Debug, Clone)]
pub struct WindowArgs {
    /// Fetch logs since a timestamp (e.g. 2013-01-02T13:23:37), a relative
    /// time (e.g. 42m for 42 minutes), or `all` for all logs.
    #[arg(short, long, default_value = "1h")]
    pub since: String,

    /// Fetch logs until a timestamp or relative time. Defaults to now.
    #[arg(short, long)]
    pub until: Option<String>,
}

/// Arguments for the get command.
#[derive(Args, Debug, Clone)]
pub struct GetArgs {
    /// Log group name.
    #[arg(default_value = "/")]
    pub group: String,

    /// Stream name or prefix.
    #[arg(short, long)]
    pub prefix: Option<String>,

    /// Follow log streams.
    #[arg(short, long)]
    pub follow: bool,

    /// Time bounds.
    #[command(flatten)]
    pub window: WindowArgs,

    /// Maximum number of streams to fetch from (for prefix search).
    #[arg(short, long, default_value_t = trawl_core::DEFAULT_MAX_STREAMS)]
    pub max_streams: usize,

    /// Print each event as pretty JSON.
    #[arg(short, long)]
    pub raw: bool,
}

/// List subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum ListCommands {
    /// List log groups.
    Groups {
        /// Group name prefix.
        #[arg(default_value = "/")]
        prefix: String,
    },

    /// List the streams of a group active in a time window.
    Streams(ListStreamsArgs),
}

/// Arguments for `list streams`.
#[derive(Args, Debug, Clone)]
pub struct ListStreamsArgs {
    /// Log group name.
    #[arg(default_value = "/")]
    pub group: String,

    /// Stream name or prefix.
    #[arg(short, long)]
    pub prefix: Option<String>,

    /// Time bounds.
    #[command(flatten)]
    pub window: WindowArgs,

    /// Maximum number of streams to list.
    #[arg(short, long, default_value_t = 50)]
    pub max_streams: usize,
}
