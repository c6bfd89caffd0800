//! Core types for log retrieval.
//!
//! This module provides:
//! - [`LogGroup`] and [`LogStream`]: Normalized store metadata
//! - [`Event`]: A normalized log event with a structured body
//! - [`TimeWindow`]: The time bounds of a query
//! - [`GroupRecord`], [`StreamRecord`], [`EventRecord`]: Raw store records
//! - [`Page`]: One page of a paginated store response

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ReaderError, Result};

/// Converts epoch milliseconds into an absolute instant.
///
/// Values outside chrono's representable range collapse to the epoch.
#[must_use]
pub fn from_millis(millis: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(millis).unwrap_or(DateTime::UNIX_EPOCH)
}

/// Converts an absolute instant into epoch milliseconds.
#[must_use]
pub fn to_millis(instant: DateTime<Utc>) -> i64 {
    instant.timestamp_millis()
}

// ============================================================================
// Raw store records
// ============================================================================

/// A log group as returned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupRecord {
    /// Group name.
    pub name: String,
    /// Creation time in epoch milliseconds.
    #[serde(default)]
    pub creation_time: i64,
}

/// A log stream as returned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamRecord {
    /// Stream name.
    pub name: String,
    /// Creation time in epoch milliseconds.
    #[serde(default)]
    pub creation_time: i64,
    /// Last ingestion time in epoch milliseconds, absent if nothing was ever ingested.
    #[serde(default)]
    pub last_ingestion_time: Option<i64>,
}

/// A log event as returned by a filter call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Store-assigned identifier, unique within a group.
    pub event_id: String,
    /// Name of the stream the event was written to.
    pub stream_name: String,
    /// Raw message text.
    pub message: String,
    /// Origin time in epoch milliseconds.
    pub timestamp: i64,
    /// Ingestion time in epoch milliseconds.
    pub ingestion_time: i64,
}

/// One page of a paginated store response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    /// Items on this page.
    pub items: Vec<T>,
    /// Token for the next page, `None` on the last page.
    pub next_token: Option<String>,
}

impl<T> Page<T> {
    /// Creates a page.
    #[must_use]
    pub const fn new(items: Vec<T>, next_token: Option<String>) -> Self {
        Self { items, next_token }
    }

    /// Creates the final page of a response.
    #[must_use]
    pub const fn last(items: Vec<T>) -> Self {
        Self {
            items,
            next_token: None,
        }
    }

    /// Returns true if the store has more pages.
    #[must_use]
    pub const fn has_more(&self) -> bool {
        self.next_token.is_some()
    }
}

// ============================================================================
// Normalized types
// ============================================================================

/// A named collection of log streams.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogGroup {
    /// Group name, unique within the account.
    pub name: String,
    /// When the group was created.
    pub created_at: DateTime<Utc>,
}

impl From<GroupRecord> for LogGroup {
    fn from(record: GroupRecord) -> Self {
        Self {
            name: record.name,
            created_at: from_millis(record.creation_time),
        }
    }
}

/// A time-ordered source of log records within a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogStream {
    /// Stream name, unique within its group.
    pub name: String,
    /// When the stream was created.
    pub created_at: DateTime<Utc>,
    /// When the stream last ingested an event; the epoch if it never did.
    pub last_ingested_at: DateTime<Utc>,
}

impl From<StreamRecord> for LogStream {
    fn from(record: StreamRecord) -> Self {
        Self {
            name: record.name,
            created_at: from_millis(record.creation_time),
            last_ingested_at: from_millis(record.last_ingestion_time.unwrap_or(0)),
        }
    }
}

/// A normalized log event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Store-assigned identifier.
    pub id: String,
    /// Stream the event came from.
    pub stream: String,
    /// Group the event belongs to.
    pub group: String,
    /// When the store ingested the event.
    pub ingested_at: DateTime<Utc>,
    /// When the event was produced.
    pub created_at: DateTime<Utc>,
    /// Structured body.
    pub body: serde_json::Map<String, serde_json::Value>,
}

impl Event {
    /// Returns the `message` field of the body if it is a string.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.body.get("message").and_then(serde_json::Value::as_str)
    }
}

/// Time bounds of a query.
///
/// An unset `end` means the window is open: "now" for a one-shot read and
/// "forever" while following.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    /// Window start.
    pub start: DateTime<Utc>,
    /// Window end, `None` if open.
    pub end: Option<DateTime<Utc>>,
}

impl TimeWindow {
    /// Creates a window, rejecting one that ends before it starts.
    ///
    /// # Errors
    ///
    /// Returns [`ReaderError::InvalidTimeWindow`] if `end < start`.
    pub fn new(start: DateTime<Utc>, end: Option<DateTime<Utc>>) -> Result<Self> {
        if let Some(end) = end {
            if end < start {
                return Err(ReaderError::InvalidTimeWindow { start, end });
            }
        }
        Ok(Self { start, end })
    }

    /// Creates an open window starting at `start`.
    #[must_use]
    pub const fn since(start: DateTime<Utc>) -> Self {
        Self { start, end: None }
    }

    /// Creates a window covering all history.
    #[must_use]
    pub const fn all() -> Self {
        Self::since(DateTime::UNIX_EPOCH)
    }

    /// Returns true if the window has no end.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.end.is_none()
    }

    /// Start in epoch milliseconds.
    #[must_use]
    pub fn start_millis(&self) -> i64 {
        to_millis(self.start)
    }

    /// End in epoch milliseconds, if set.
    #[must_use]
    pub fn end_millis(&self) -> Option<i64> {
        self.end.map(to_millis)
    }

    /// Returns the window an event fetch should use.
    ///
    /// A set end is kept. An open end becomes `now` for a one-shot read and
    /// stays open while following.
    #[must_use]
    pub fn for_fetch(&self, follow: bool, now: DateTime<Utc>) -> Self {
        match self.end {
            Some(_) => *self,
            None if follow => *self,
            None => Self {
                start: self.start,
                end: Some(now.max(self.start)),
            },
        }
    }
}
