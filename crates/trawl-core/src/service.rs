//! Remote log store abstraction.
//!
//! This module provides the [`LogService`] trait for the paginated query
//! service that holds groups, streams and events, plus the request types
//! its operations take. Times exchanged with the service are epoch
//! milliseconds.

use std::future::Future;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::UpstreamError;
use crate::types::{EventRecord, GroupRecord, Page, StreamRecord};

/// Result type for calls against the remote store.
pub type ServiceResult<T> = std::result::Result<T, UpstreamError>;

/// Server-side ordering for stream listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamOrder {
    /// Lexicographic by stream name.
    #[default]
    Name,
    /// By the time of the last event written to the stream.
    LastEventTime,
}

/// Parameters for listing groups.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListGroupsRequest {
    /// Only groups whose name starts with this prefix.
    pub prefix: String,
    /// Continuation token from a previous page.
    pub next_token: Option<String>,
}

impl ListGroupsRequest {
    /// Creates a request for the first page.
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next_token: None,
        }
    }
}

/// Parameters for listing streams in a group.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListStreamsRequest {
    /// Owning group.
    pub group: String,
    /// Only streams whose name starts with this prefix.
    pub prefix: Option<String>,
    /// Requested ordering.
    pub order_by: StreamOrder,
    /// Reverse the ordering.
    pub descending: bool,
    /// Continuation token from a previous page.
    pub next_token: Option<String>,
}

/// Parameters for fetching events from a group.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterEventsRequest {
    /// Owning group.
    pub group: String,
    /// Restrict the query to these streams; `None` searches the whole group.
    pub stream_names: Option<Vec<String>>,
    /// Inclusive start, epoch milliseconds.
    pub start_time: i64,
    /// Inclusive end, epoch milliseconds; `None` is unbounded.
    pub end_time: Option<i64>,
    /// Merge events from all streams into one time-ordered result.
    pub interleaved: bool,
    /// Continuation token from a previous page.
    pub next_token: Option<String>,
}

/// A paginated remote log store.
///
/// Implementations are expected to apply their own bounded transport
/// retries; callers propagate any error they return.
pub trait LogService: Send + Sync + 'static {
    /// Lists groups whose name starts with the request prefix.
    fn list_groups(
        &self,
        request: ListGroupsRequest,
    ) -> impl Future<Output = ServiceResult<Page<GroupRecord>>> + Send;

    /// Lists streams of a group.
    fn list_streams(
        &self,
        request: ListStreamsRequest,
    ) -> impl Future<Output = ServiceResult<Page<StreamRecord>>> + Send;

    /// Fetches one page of events.
    fn filter_events(
        &self,
        request: FilterEventsRequest,
    ) -> impl Future<Output = ServiceResult<Page<EventRecord>>> + Send;
}

impl<S: LogService> LogService for Arc<S> {
    fn list_groups(
        &self,
        request: ListGroupsRequest,
    ) -> impl Future<Output = ServiceResult<Page<GroupRecord>>> + Send {
        (**self).list_groups(request)
    }

    fn list_streams(
        &self,
        request: ListStreamsRequest,
    ) -> impl Future<Output = ServiceResult<Page<StreamRecord>>> + Send {
        (**self).list_streams(request)
    }

    fn filter_events(
        &self,
        request: FilterEventsRequest,
    ) -> impl Future<Output = ServiceResult<Page<EventRecord>>> + Send {
        (**self).filter_events(request)
    }
}
