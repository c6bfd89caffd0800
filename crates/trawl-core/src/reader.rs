//! The [`Reader`]: one group, an optional stream prefix and a time window.

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config::ReaderConfig;
use crate::dedup::DedupCache;
use crate::engine::{self, EngineParams, EventStream};
use crate::error::Result;
use crate::resolver::{list_groups, resolve_group};
use crate::selector::StreamSelector;
use crate::service::LogService;
use crate::types::{LogGroup, LogStream, TimeWindow};

/// What to read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogQuery {
    /// Exact group name.
    pub group: String,
    /// Restrict to streams whose name starts with this prefix.
    pub stream_prefix: Option<String>,
    /// Time bounds.
    pub window: TimeWindow,
}

impl LogQuery {
    /// Creates a query over a whole group.
    #[must_use]
    pub fn new(group: impl Into<String>, window: TimeWindow) -> Self {
        Self {
            group: group.into(),
            stream_prefix: None,
            window,
        }
    }

    /// Restricts the query to streams starting with `prefix`. An empty prefix is ignored.
    #[must_use]
    pub fn with_stream_prefix(mut self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        self.stream_prefix = (!prefix.is_empty()).then_some(prefix);
        self
    }
}

/// Reads log events of one group from a [`LogService`].
///
/// Opening a reader resolves the group, so a missing or ambiguous name
/// fails before any streaming starts.
pub struct Reader<S> {
    service: S,
    group: LogGroup,
    query: LogQuery,
    config: ReaderConfig,
    cache: DedupCache,
}

impl<S: LogService> Reader<S> {
    /// Validates the configuration and resolves the query's group.
    ///
    /// # Errors
    ///
    /// - [`ReaderError::InvalidConfig`](crate::ReaderError::InvalidConfig) for zero limits
    /// - [`ReaderError::InvalidTimeWindow`](crate::ReaderError::InvalidTimeWindow) if the
    ///   window ends before it starts
    /// - [`ReaderError::GroupNotFound`](crate::ReaderError::GroupNotFound) or
    ///   [`ReaderError::AmbiguousGroup`](crate::ReaderError::AmbiguousGroup)
    /// - [`ReaderError::Upstream`](crate::ReaderError::Upstream) if the store fails
    pub async fn open(service: S, query: LogQuery, config: ReaderConfig) -> Result<Self> {
        config.validate()?;
        let window = query.window;
        TimeWindow::new(window.start, window.end)?;
        let group = resolve_group(&service, &query.group).await?;
        debug!(group = %group.name, prefix = ?query.stream_prefix, "opened reader");

        Ok(Self {
            cache: DedupCache::new(config.dedup_capacity),
            service,
            group,
            query,
            config,
        })
    }

    /// The resolved group.
    #[must_use]
    pub const fn group(&self) -> &LogGroup {
        &self.group
    }

    /// The query this reader was opened with.
    #[must_use]
    pub const fn query(&self) -> &LogQuery {
        &self.query
    }

    /// The reader configuration.
    #[must_use]
    pub const fn config(&self) -> &ReaderConfig {
        &self.config
    }

    /// Lists every group whose name starts with the query's group name.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn list_groups(&self) -> Result<Vec<LogGroup>> {
        list_groups(&self.service, &self.query.group).await
    }

    /// Selects the streams that are active in the query window.
    ///
    /// The group is looked up again first, since it may have been deleted
    /// since the reader was opened.
    ///
    /// # Errors
    ///
    /// - Group resolution errors, as for [`open`](Self::open)
    /// - [`ReaderError::NoStreamsFound`](crate::ReaderError::NoStreamsFound)
    /// - [`ReaderError::Upstream`](crate::ReaderError::Upstream) if the store fails
    pub async fn list_streams(&self) -> Result<Vec<LogStream>> {
        resolve_group(&self.service, &self.query.group).await?;
        StreamSelector::new(
            &self.service,
            &self.group.name,
            self.query.stream_prefix.as_deref(),
            self.query.window,
            self.config.max_streams,
        )
        .select()
        .await
    }

    /// Starts streaming events on a background task.
    ///
    /// Without `follow` the stream ends once every page of the window has
    /// been read. With `follow` it keeps polling for new events until
    /// `cancel` fires or the returned stream is dropped.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn stream(self, follow: bool, cancel: &CancellationToken) -> EventStream {
        engine::spawn(
            EngineParams {
                service: self.service,
                group: self.group.name,
                prefix: self.query.stream_prefix,
                window: self.query.window,
                config: self.config,
                cache: self.cache,
            },
            follow,
            cancel,
        )
    }
}

impl<S> std::fmt::Debug for Reader<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reader")
            .field("group", &self.group)
            .field("query", &self.query)
            .field("config", &self.config)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}
