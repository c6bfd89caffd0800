//! Reader configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ReaderError, Result};

/// Maximum number of events a single filter call returns.
pub const MAX_EVENTS_PER_CALL: usize = 10_000;

/// Default cap on the number of streams handed to a filter call.
pub const DEFAULT_MAX_STREAMS: usize = 100;

/// Default pause between exhausted passes while following.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Configuration for a [`Reader`](crate::Reader).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    /// Maximum number of streams returned by stream selection.
    pub max_streams: usize,
    /// Pause between exhausted passes while following.
    #[serde(with = "duration_millis")]
    pub poll_interval: Duration,
    /// Number of event IDs remembered for deduplication.
    pub dedup_capacity: usize,
    /// Events buffered between the producer and the consumer.
    pub channel_capacity: usize,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            max_streams: DEFAULT_MAX_STREAMS,
            poll_interval: DEFAULT_POLL_INTERVAL,
            dedup_capacity: MAX_EVENTS_PER_CALL,
            channel_capacity: 1,
        }
    }
}

impl ReaderConfig {
    /// Sets the stream cap.
    #[must_use]
    pub const fn with_max_streams(mut self, max_streams: usize) -> Self {
        self.max_streams = max_streams;
        self
    }

    /// Sets the follow-mode poll interval.
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Sets the dedup cache capacity.
    #[must_use]
    pub const fn with_dedup_capacity(mut self, dedup_capacity: usize) -> Self {
        self.dedup_capacity = dedup_capacity;
        self
    }

    /// Sets the event channel capacity.
    #[must_use]
    pub const fn with_channel_capacity(mut self, channel_capacity: usize) -> Self {
        self.channel_capacity = channel_capacity;
        self
    }

    /// Checks that every limit is non-zero.
    ///
    /// # Errors
    ///
    /// Returns [`ReaderError::InvalidConfig`] naming the first zero limit.
    pub fn validate(&self) -> Result<()> {
        let limits = [
            ("max_streams", self.max_streams),
            ("dedup_capacity", self.dedup_capacity),
            ("channel_capacity", self.channel_capacity),
        ];
        for (name, value) in limits {
            if value == 0 {
                return Err(ReaderError::InvalidConfig(format!(
                    "{name} must be greater than zero"
                )));
            }
        }
        Ok(())
    }
}

mod duration_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
