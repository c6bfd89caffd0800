//! # trawl-cli
//!
//! Command-line interface for reading grouped log streams.
//!
//! Provides commands for:
//! - Fetching the events of a group within a time window (`get`)
//! - Following a group for new events (`get --follow`)
//! - Listing groups and the streams active in a window (`list`)
//!
//! The commands read from a [`trawl_core::LogService`]; the binary loads a
//! [`trawl_core::MemoryLogService`] from the JSON fixture named by
//! `--fixture` or `TRAWL_FIXTURE`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod commands;
pub mod error;
pub mod output;
pub mod timespec;

pub use cli::{Cli, Commands, Format, GetArgs, ListCommands, ListStreamsArgs, WindowArgs};
pub use error::{CliError, Result};
pub use output::{EventFormat, OutputFormat};
