//! List command implementation.

use std::io::Write;

use chrono::Utc;
use trawl_core::{list_groups, LogQuery, LogService, Reader, ReaderConfig, TimeWindow};

use crate::cli::{ListCommands, ListStreamsArgs};
use crate::error::Result;
use crate::output::{GroupList, OutputFormat, StreamList};
use crate::timespec::parse_time;

/// Handler for the list command.
pub struct ListCommand<S> {
    service: S,
}

impl<S: LogService> ListCommand<S> {
    /// Creates a new list command handler.
    #[must_use]
    pub const fn new(service: S) -> Self {
        Self { service }
    }

    /// Executes the list command.
    ///
    /// # Errors
    ///
    /// Returns error if the arguments are invalid, the store fails or
    /// writing fails.
    pub async fn execute<W: Write>(
        self,
        out: &mut W,
        format: &OutputFormat,
        command: &ListCommands,
    ) -> Result<()> {
        match command {
            ListCommands::Groups { prefix } => {
                let groups = list_groups(&self.service, prefix).await?;
                format.write(out, &GroupList { groups })
            }
            ListCommands::Streams(args) => {
                let streams = self.streams(args).await?;
                format.write(out, &StreamList { streams })
            }
        }
    }

    async fn streams(self, args: &ListStreamsArgs) -> Result<Vec<trawl_core::LogStream>> {
        let now = Utc::now();
        let start = parse_time(&args.window.since, now)?;
        let end = match &args.window.until {
            Some(until) => parse_time(until, now)?,
            None => now,
        };

        let mut query = LogQuery::new(&args.group, TimeWindow::new(start, Some(end))?);
        if let Some(prefix) = &args.prefix {
            query = query.with_stream_prefix(prefix.as_str());
        }
        let config = ReaderConfig::default().with_max_streams(args.max_streams);
        let reader = Reader::open(self.service, query, config).await?;
        Ok(reader.list_streams().await?)
    }
}
