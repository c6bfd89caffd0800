//! Error types for log retrieval.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Maximum number of alternative group names offered when a lookup is ambiguous.
pub const MAX_GROUP_SUGGESTIONS: usize = 5;

/// Category of a failure reported by the remote log store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpstreamErrorKind {
    /// Transport or connectivity failure.
    Network,
    /// The store rejected the call because of rate limits.
    Throttled,
    /// The caller is not allowed to perform the call.
    AccessDenied,
    /// Anything else the store reports.
    Other,
}

impl UpstreamErrorKind {
    /// Returns the string representation of this kind.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Throttled => "throttled",
            Self::AccessDenied => "access denied",
            Self::Other => "upstream",
        }
    }
}

impl std::fmt::Display for UpstreamErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An error returned verbatim by the remote log store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} error: {message}")]
pub struct UpstreamError {
    /// Failure category.
    pub kind: UpstreamErrorKind,
    /// Message as reported by the store.
    pub message: String,
}

impl UpstreamError {
    /// Creates a new upstream error.
    #[must_use]
    pub fn new(kind: UpstreamErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Shorthand for a network failure.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(UpstreamErrorKind::Network, message)
    }

    /// Shorthand for a throttling failure.
    #[must_use]
    pub fn throttled(message: impl Into<String>) -> Self {
        Self::new(UpstreamErrorKind::Throttled, message)
    }
}

/// Errors that can occur while resolving, selecting or streaming logs.
#[derive(Debug, Error)]
pub enum ReaderError {
    /// No group matches the given name.
    #[error("could not find log group '{name}'")]
    GroupNotFound {
        /// The name that was looked up.
        name: String,
    },

    /// Groups share the prefix but none matches exactly.
    #[error("could not find log group '{name}'\n\ndid you mean:\n\n{}", .suggestions.join("\n"))]
    AmbiguousGroup {
        /// The name that was looked up.
        name: String,
        /// Up to [`MAX_GROUP_SUGGESTIONS`] candidate names, in store order.
        suggestions: Vec<String>,
    },

    /// No stream in the group had activity inside the time window.
    #[error("{}", no_streams_message(.prefix.as_deref()))]
    NoStreamsFound {
        /// The stream prefix that was searched, if any.
        prefix: Option<String>,
    },

    /// The window ends before it starts.
    #[error("invalid time window: end {end} is before start {start}")]
    InvalidTimeWindow {
        /// Window start.
        start: DateTime<Utc>,
        /// Window end.
        end: DateTime<Utc>,
    },

    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The remote store failed.
    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    /// Streaming was stopped by an external cancellation request.
    #[error("operation cancelled")]
    Cancelled,

    /// The background producer ended abnormally.
    #[error("event producer failed: {0}")]
    Producer(String),

    /// Serialization or deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ReaderError {
    /// Returns true if this error only reports an external cancellation.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Returns true if this error was raised while resolving the group or its streams.
    #[must_use]
    pub const fn is_resolution(&self) -> bool {
        matches!(
            self,
            Self::GroupNotFound { .. } | Self::AmbiguousGroup { .. } | Self::NoStreamsFound { .. }
        )
    }
}

fn no_streams_message(prefix: Option<&str>) -> String {
    match prefix {
        Some(prefix) => format!(
            "no log streams found matching prefix '{prefix}' in your time window, \
             consider adjusting it with --since and/or --until"
        ),
        None => "no log streams found in your time window, \
                 consider adjusting it with --since and/or --until"
            .to_string(),
    }
}

/// Result type alias for reader operations.
pub type Result<T> = std::result::Result<T, ReaderError>;
