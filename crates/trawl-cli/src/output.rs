//! Output formatting for CLI commands.
//!
//! Listings support table (human-readable) and JSON output. Events are
//! printed one per line, or as pretty JSON with `--raw`.

use std::io::Write;

use chrono::{DateTime, Local, Utc};
use serde::Serialize;
use trawl_core::{Event, LogGroup, LogStream};

use crate::cli::Format;
use crate::error::{CliError, Result};

/// Timestamp format used in listings.
const LISTING_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Timestamp format used on event lines.
const EVENT_TIME_FORMAT: &str = "%H:%M:%S";

/// Output formatter that handles both table and JSON output.
#[derive(Debug, Clone)]
pub struct OutputFormat {
    format: Format,
}

impl OutputFormat {
    /// Create a new output formatter.
    #[must_use]
    pub const fn new(format: Format) -> Self {
        Self { format }
    }

    /// Get the current format.
    #[must_use]
    pub const fn format(&self) -> Format {
        self.format
    }

    /// Write a serializable value to the output.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write<W, T>(&self, writer: &mut W, value: &T) -> Result<()>
    where
        W: Write,
        T: Serialize + TableDisplay,
    {
        match self.format {
            Format::Json => {
                serde_json::to_writer_pretty(&mut *writer, value)
                    .map_err(|e| CliError::Format(format!("JSON serialization failed: {e}")))?;
                writeln!(writer)?;
            }
            Format::Table => value.write_table(writer)?,
        }
        Ok(())
    }
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::new(Format::Table)
    }
}

/// Trait for types that can be displayed as a table.
pub trait TableDisplay {
    /// Write the value as a human-readable table.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<()>;
}

fn local_time(instant: DateTime<Utc>, format: &str) -> String {
    instant.with_timezone(&Local).format(format).to_string()
}

fn column_width<'a>(header: &str, values: impl Iterator<Item = &'a str>) -> usize {
    values.map(str::len).chain([header.len()]).max().unwrap_or(0)
}

/// Groups for `list groups`.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct GroupList {
    /// Groups in store order.
    pub groups: Vec<LogGroup>,
}

impl TableDisplay for GroupList {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<()> {
        let width = column_width("Group", self.groups.iter().map(|g| g.name.as_str()));
        writeln!(writer, "{:<width$}  Creation", "Group")?;
        for group in &self.groups {
            writeln!(
                writer,
                "{:<width$}  {}",
                group.name,
                local_time(group.created_at, LISTING_TIME_FORMAT)
            )?;
        }
        Ok(())
    }
}

/// Streams for `list streams`.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct StreamList {
    /// Streams, most recently ingested first.
    pub streams: Vec<LogStream>,
}

impl TableDisplay for StreamList {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<()> {
        let width = column_width("Stream", self.streams.iter().map(|s| s.name.as_str()));
        let time_width = LISTING_TIME_FORMAT.len().max("Last Event".len());
        writeln!(writer, "{:<width$}  {:<time_width$}  Creation", "Stream", "Last Event")?;
        for stream in &self.streams {
            writeln!(
                writer,
                "{:<width$}  {:<time_width$}  {}",
                stream.name,
                local_time(stream.last_ingested_at, LISTING_TIME_FORMAT),
                local_time(stream.created_at, LISTING_TIME_FORMAT)
            )?;
        }
        Ok(())
    }
}

/// How `get` prints each event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EventFormat {
    /// `[ stream ] HH:MM:SS - message`
    #[default]
    Line,
    /// The whole event as pretty JSON.
    Raw,
}

impl EventFormat {
    /// Writes one event followed by a newline.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write_event<W: Write>(self, writer: &mut W, event: &Event) -> Result<()> {
        match self {
            Self::Line => {
                let time = local_time(event.created_at, EVENT_TIME_FORMAT);
                match event.message() {
                    Some(message) => writeln!(writer, "[ {} ] {time} - {message}", event.stream)?,
                    None => {
                        let body = serde_json::to_string(&event.body)
                            .map_err(|e| CliError::Format(format!("JSON serialization failed: {e}")))?;
                        writeln!(writer, "[ {} ] {time} - {body}", event.stream)?;
                    }
                }
            }
            Self::Raw => {
                serde_json::to_writer_pretty(&mut *writer, event)
                    .map_err(|e| CliError::Format(format!("JSON serialization failed: {e}")))?;
                writeln!(writer)?;
            }
        }
        Ok(())
    }
}
