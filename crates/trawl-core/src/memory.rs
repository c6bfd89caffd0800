//! In-memory implementation of [`LogService`].
//!
//! This module provides:
//! - [`MemoryLogService`]: A paginated store held in memory, with call
//!   counters and failure injection for tests
//! - [`MemoryServiceConfig`]: Page sizes and simulated latency
//! - JSON fixture loading so the store can stand in for a remote one

use std::collections::HashMap;
use std::future::Future;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::MAX_EVENTS_PER_CALL;
use crate::error::{Result, UpstreamError, UpstreamErrorKind};
use crate::service::{
    FilterEventsRequest, ListGroupsRequest, ListStreamsRequest, LogService, ServiceResult,
    StreamOrder,
};
use crate::types::{EventRecord, GroupRecord, Page, StreamRecord};

/// A store operation, used to count calls and inject failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// [`LogService::list_groups`].
    ListGroups,
    /// [`LogService::list_streams`].
    ListStreams,
    /// [`LogService::filter_events`].
    FilterEvents,
}

impl Operation {
    const fn index(self) -> usize {
        match self {
            Self::ListGroups => 0,
            Self::ListStreams => 1,
            Self::FilterEvents => 2,
        }
    }
}

/// Configuration for the in-memory store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryServiceConfig {
    /// Groups per `list_groups` page.
    pub group_page_size: usize,
    /// Streams per `list_streams` page.
    pub stream_page_size: usize,
    /// Events per `filter_events` page.
    pub event_page_size: usize,
    /// Delay applied to every `filter_events` call.
    pub filter_latency: Option<Duration>,
}

impl Default for MemoryServiceConfig {
    fn default() -> Self {
        Self {
            group_page_size: 50,
            stream_page_size: 50,
            event_page_size: MAX_EVENTS_PER_CALL,
            filter_latency: None,
        }
    }
}

impl MemoryServiceConfig {
    /// Sets all page sizes to the same value.
    #[must_use]
    pub const fn with_page_size(mut self, size: usize) -> Self {
        self.group_page_size = size;
        self.stream_page_size = size;
        self.event_page_size = size;
        self
    }

    /// Sets the `filter_events` page size.
    #[must_use]
    pub const fn with_event_page_size(mut self, size: usize) -> Self {
        self.event_page_size = size;
        self
    }

    /// Sets the simulated `filter_events` latency.
    #[must_use]
    pub const fn with_filter_latency(mut self, latency: Duration) -> Self {
        self.filter_latency = Some(latency);
        self
    }
}

#[derive(Debug, Clone)]
struct StoredStream {
    record: StreamRecord,
    events: Vec<EventRecord>,
}

#[derive(Debug, Clone)]
struct StoredGroup {
    record: GroupRecord,
    streams: Vec<StoredStream>,
}

/// Paginated in-memory log store.
pub struct MemoryLogService {
    config: MemoryServiceConfig,
    /// Groups kept sorted by name
    groups: RwLock<Vec<StoredGroup>>,
    calls: [AtomicUsize; 3],
    /// Failures keyed by operation and 1-based call number
    failures: Mutex<HashMap<(Operation, usize), UpstreamError>>,
}

impl Default for MemoryLogService {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryLogService {
    /// Creates an empty store with default page sizes.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(MemoryServiceConfig::default())
    }

    /// Creates an empty store with the given configuration.
    #[must_use]
    pub fn with_config(config: MemoryServiceConfig) -> Self {
        Self {
            config,
            groups: RwLock::new(Vec::new()),
            calls: [AtomicUsize::new(0), AtomicUsize::new(0), AtomicUsize::new(0)],
            failures: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &MemoryServiceConfig {
        &self.config
    }

    /// Adds a group, replacing any group with the same name.
    pub fn add_group(&self, name: impl Into<String>, creation_time: i64) {
        let record = GroupRecord {
            name: name.into(),
            creation_time,
        };
        let mut groups = self.groups.write();
        match groups.binary_search_by(|g| g.record.name.cmp(&record.name)) {
            Ok(ix) => groups[ix].record = record,
            Err(ix) => groups.insert(
                ix,
                StoredGroup {
                    record,
                    streams: Vec::new(),
                },
            ),
        }
    }

    /// Adds a stream to an existing group, replacing one with the same name.
    ///
    /// Returns false if the group does not exist.
    pub fn add_stream(&self, group: &str, record: StreamRecord) -> bool {
        let mut groups = self.groups.write();
        let Some(stored) = groups.iter_mut().find(|g| g.record.name == group) else {
            return false;
        };
        match stored.streams.iter_mut().find(|s| s.record.name == record.name) {
            Some(existing) => existing.record = record,
            None => stored.streams.push(StoredStream {
                record,
                events: Vec::new(),
            }),
        }
        true
    }

    /// Appends an event to a stream, creating the stream if needed.
    ///
    /// The stream's last ingestion time advances to the event's ingestion time.
    /// Returns false if the group does not exist.
    pub fn push_event(&self, group: &str, event: EventRecord) -> bool {
        let mut groups = self.groups.write();
        let Some(stored) = groups.iter_mut().find(|g| g.record.name == group) else {
            return false;
        };

        let ix = match stored
            .streams
            .iter()
            .position(|s| s.record.name == event.stream_name)
        {
            Some(ix) => ix,
            None => {
                stored.streams.push(StoredStream {
                    record: StreamRecord {
                        name: event.stream_name.clone(),
                        creation_time: event.timestamp,
                        last_ingestion_time: None,
                    },
                    events: Vec::new(),
                });
                stored.streams.len() - 1
            }
        };

        let stream = &mut stored.streams[ix];
        let last = stream.record.last_ingestion_time.unwrap_or(0);
        stream.record.last_ingestion_time = Some(last.max(event.ingestion_time));
        stream.events.push(event);
        true
    }

    /// Makes the `call`-th invocation (1-based) of `operation` fail with `error`.
    pub fn fail_call(&self, operation: Operation, call: usize, error: UpstreamError) {
        self.failures.lock().insert((operation, call), error);
    }

    /// Returns how many times `operation` has been invoked.
    #[must_use]
    pub fn calls(&self, operation: Operation) -> usize {
        self.calls[operation.index()].load(Ordering::SeqCst)
    }

    fn record_call(&self, operation: Operation) -> ServiceResult<()> {
        let call = self.calls[operation.index()].fetch_add(1, Ordering::SeqCst) + 1;
        match self.failures.lock().remove(&(operation, call)) {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn groups_page(&self, request: &ListGroupsRequest) -> ServiceResult<Page<GroupRecord>> {
        self.record_call(Operation::ListGroups)?;
        let matching: Vec<GroupRecord> = self
            .groups
            .read()
            .iter()
            .filter(|g| g.record.name.starts_with(&request.prefix))
            .map(|g| g.record.clone())
            .collect();
        paginate(
            &matching,
            request.next_token.as_deref(),
            self.config.group_page_size,
        )
    }

    fn streams_page(&self, request: &ListStreamsRequest) -> ServiceResult<Page<StreamRecord>> {
        self.record_call(Operation::ListStreams)?;
        let mut matching: Vec<StreamRecord> = {
            let groups = self.groups.read();
            let group = find_group(&groups, &request.group)?;
            group
                .streams
                .iter()
                .filter(|s| {
                    request
                        .prefix
                        .as_deref()
                        .is_none_or(|prefix| s.record.name.starts_with(prefix))
                })
                .map(|s| s.record.clone())
                .collect()
        };

        match request.order_by {
            StreamOrder::Name => matching.sort_by(|a, b| a.name.cmp(&b.name)),
            StreamOrder::LastEventTime => matching.sort_by(|a, b| {
                a.last_ingestion_time
                    .unwrap_or(0)
                    .cmp(&b.last_ingestion_time.unwrap_or(0))
                    .then_with(|| a.name.cmp(&b.name))
            }),
        }
        if request.descending {
            matching.reverse();
        }

        paginate(
            &matching,
            request.next_token.as_deref(),
            self.config.stream_page_size,
        )
    }

    fn events_page(&self, request: &FilterEventsRequest) -> ServiceResult<Page<EventRecord>> {
        self.record_call(Operation::FilterEvents)?;
        let mut streams: Vec<StoredStream> = {
            let groups = self.groups.read();
            let group = find_group(&groups, &request.group)?;
            group
                .streams
                .iter()
                .filter(|s| {
                    request
                        .stream_names
                        .as_ref()
                        .is_none_or(|names| names.contains(&s.record.name))
                })
                .cloned()
                .collect()
        };
        streams.sort_by(|a, b| a.record.name.cmp(&b.record.name));

        let in_window = |e: &EventRecord| {
            e.timestamp >= request.start_time
                && request.end_time.is_none_or(|end| e.timestamp <= end)
        };
        let mut matching: Vec<EventRecord> = streams
            .into_iter()
            .flat_map(|s| s.events)
            .filter(in_window)
            .collect();
        if request.interleaved {
            // stable sort keeps per-stream order for equal timestamps
            matching.sort_by_key(|e| e.timestamp);
        }

        let page = paginate(
            &matching,
            request.next_token.as_deref(),
            self.config.event_page_size,
        )?;
        debug!(
            group = %request.group,
            events = page.items.len(),
            has_more = page.has_more(),
            "served filter_events page"
        );
        Ok(page)
    }

    /// Loads a store from a JSON fixture file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_fixture(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_fixture_str(&contents)
    }

    /// Loads a store from fixture JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON does not describe a fixture.
    pub fn from_fixture_str(json: &str) -> Result<Self> {
        let fixture: Fixture = serde_json::from_str(json)?;
        let service = Self::new();

        for group in fixture.groups {
            service.add_group(group.name.clone(), group.creation_time);
            for stream in group.streams {
                let derived_ingestion = stream.events.iter().map(|e| e.ingestion()).max();
                service.add_stream(
                    &group.name,
                    StreamRecord {
                        name: stream.name.clone(),
                        creation_time: stream.creation_time,
                        last_ingestion_time: stream.last_ingestion_time.or(derived_ingestion),
                    },
                );
                let records = stream
                    .events
                    .into_iter()
                    .enumerate()
                    .map(|(ix, event)| EventRecord {
                        ingestion_time: event.ingestion(),
                        event_id: event
                            .event_id
                            .unwrap_or_else(|| format!("{}/{}/{ix}", group.name, stream.name)),
                        stream_name: stream.name.clone(),
                        message: event.message,
                        timestamp: event.timestamp,
                    })
                    .collect();
                service.extend_stream(&group.name, &stream.name, records);
            }
        }

        debug!(groups = service.groups.read().len(), "loaded fixture");
        Ok(service)
    }

    /// Appends records to a stream without touching its metadata.
    fn extend_stream(&self, group: &str, stream: &str, records: Vec<EventRecord>) {
        let mut groups = self.groups.write();
        if let Some(stored) = groups
            .iter_mut()
            .find(|g| g.record.name == group)
            .and_then(|g| g.streams.iter_mut().find(|s| s.record.name == stream))
        {
            stored.events.extend(records);
        }
    }
}

fn find_group<'a>(groups: &'a [StoredGroup], name: &str) -> ServiceResult<&'a StoredGroup> {
    groups.iter().find(|g| g.record.name == name).ok_or_else(|| {
        UpstreamError::new(
            UpstreamErrorKind::Other,
            format!("the specified log group does not exist: {name}"),
        )
    })
}

fn paginate<T: Clone>(items: &[T], token: Option<&str>, page_size: usize) -> ServiceResult<Page<T>> {
    let offset = match token {
        None => 0,
        Some(token) => token.parse::<usize>().map_err(|_| {
            UpstreamError::new(
                UpstreamErrorKind::Other,
                format!("invalid pagination token '{token}'"),
            )
        })?,
    };
    let end = offset.saturating_add(page_size.max(1)).min(items.len());
    let page = items.get(offset..end).unwrap_or_default().to_vec();
    let next_token = (end < items.len()).then(|| end.to_string());
    Ok(Page::new(page, next_token))
}

impl LogService for MemoryLogService {
    fn list_groups(
        &self,
        request: ListGroupsRequest,
    ) -> impl Future<Output = ServiceResult<Page<GroupRecord>>> + Send {
        std::future::ready(self.groups_page(&request))
    }

    fn list_streams(
        &self,
        request: ListStreamsRequest,
    ) -> impl Future<Output = ServiceResult<Page<StreamRecord>>> + Send {
        std::future::ready(self.streams_page(&request))
    }

    fn filter_events(
        &self,
        request: FilterEventsRequest,
    ) -> impl Future<Output = ServiceResult<Page<EventRecord>>> + Send {
        let result = self.events_page(&request);
        let latency = self.config.filter_latency;
        async move {
            if let Some(latency) = latency {
                tokio::time::sleep(latency).await;
            }
            result
        }
    }
}

// ============================================================================
// Fixture format
// ============================================================================

#[derive(Debug, Deserialize, Serialize)]
struct Fixture {
    #[serde(default)]
    groups: Vec<FixtureGroup>,
}

#[derive(Debug, Deserialize, Serialize)]
struct FixtureGroup {
    name: String,
    #[serde(default)]
    creation_time: i64,
    #[serde(default)]
    streams: Vec<FixtureStream>,
}

#[derive(Debug, Deserialize, Serialize)]
struct FixtureStream {
    name: String,
    #[serde(default)]
    creation_time: i64,
    #[serde(default)]
    last_ingestion_time: Option<i64>,
    #[serde(default)]
    events: Vec<FixtureEvent>,
}

#[derive(Debug, Deserialize, Serialize)]
struct FixtureEvent {
    #[serde(default)]
    event_id: Option<String>,
    message: String,
    timestamp: i64,
    #[serde(default)]
    ingestion_time: Option<i64>,
}

impl FixtureEvent {
    fn ingestion(&self) -> i64 {
        self.ingestion_time.unwrap_or(self.timestamp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(id: &str, stream: &str, timestamp: i64) -> EventRecord {
        EventRecord {
            event_id: id.to_string(),
            stream_name: stream.to_string(),
            message: format!("message {id}"),
            timestamp,
            ingestion_time: timestamp,
        }
    }

    fn filter(group: &str) -> FilterEventsRequest {
        FilterEventsRequest {
            group: group.to_string(),
            interleaved: true,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn groups_are_sorted_and_prefix_filtered() {
        let service = MemoryLogService::new();
        service.add_group("/app/other", 0);
        service.add_group("/app/foobar", 0);
        service.add_group("/app/foo", 0);
        service.add_group("/db/main", 0);

        let page = service.list_groups(ListGroupsRequest::new("/app/")).await;
        let names: Vec<String> = page.map(|p| p.items.into_iter().map(|g| g.name).collect()).unwrap_or_default();
        assert_eq!(names, vec!["/app/foo", "/app/foobar", "/app/other"]);
    }

    #[tokio::test]
    async fn groups_paginate() {
        let service = MemoryLogService::with_config(MemoryServiceConfig::default().with_page_size(2));
        for name in ["/a", "/b", "/c"] {
            service.add_group(name, 0);
        }

        let first = service.list_groups(ListGroupsRequest::new("/")).await.expect("page");
        assert_eq!(first.items.len(), 2);
        assert!(first.has_more());

        let second = service
            .list_groups(ListGroupsRequest {
                prefix: "/".to_string(),
                next_token: first.next_token,
            })
            .await
            .expect("page");
        assert_eq!(second.items.len(), 1);
        assert!(!second.has_more());
        assert_eq!(service.calls(Operation::ListGroups), 2);
    }

    #[tokio::test]
    async fn streams_order_by_last_event_descending() {
        let service = MemoryLogService::new();
        service.add_group("g", 0);
        for (name, last) in [("a", Some(10)), ("b", Some(30)), ("c", None), ("d", Some(20))] {
            service.add_stream(
                "g",
                StreamRecord {
                    name: name.to_string(),
                    creation_time: 0,
                    last_ingestion_time: last,
                },
            );
        }

        let page = service
            .list_streams(ListStreamsRequest {
                group: "g".to_string(),
                order_by: StreamOrder::LastEventTime,
                descending: true,
                ..Default::default()
            })
            .await
            .expect("page");
        let names: Vec<&str> = page.items.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["b", "d", "a", "c"]);
    }

    #[tokio::test]
    async fn streams_of_unknown_group_fail() {
        let service = MemoryLogService::new();
        let result = service
            .list_streams(ListStreamsRequest {
                group: "missing".to_string(),
                ..Default::default()
            })
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn events_are_interleaved_and_windowed() {
        let service = MemoryLogService::new();
        service.add_group("g", 0);
        service.push_event("g", event("1", "b", 100));
        service.push_event("g", event("2", "a", 200));
        service.push_event("g", event("3", "b", 300));
        service.push_event("g", event("4", "a", 400));

        let mut request = filter("g");
        request.start_time = 150;
        request.end_time = Some(350);
        let page = service.filter_events(request).await.expect("page");
        let ids: Vec<&str> = page.items.iter().map(|e| e.event_id.as_str()).collect();
        assert_eq!(ids, vec!["2", "3"]);
    }

    #[tokio::test]
    async fn events_restricted_to_named_streams() {
        let service = MemoryLogService::new();
        service.add_group("g", 0);
        service.push_event("g", event("1", "a", 100));
        service.push_event("g", event("2", "b", 200));

        let mut request = filter("g");
        request.stream_names = Some(vec!["b".to_string()]);
        let page = service.filter_events(request).await.expect("page");
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].event_id, "2");
    }

    #[tokio::test]
    async fn push_event_advances_last_ingestion() {
        let service = MemoryLogService::new();
        service.add_group("g", 0);
        service.push_event("g", event("1", "a", 100));
        service.push_event("g", event("2", "a", 50));

        let page = service
            .list_streams(ListStreamsRequest {
                group: "g".to_string(),
                ..Default::default()
            })
            .await
            .expect("page");
        assert_eq!(page.items[0].last_ingestion_time, Some(100));
        assert!(!service.push_event("missing", event("3", "a", 1)));
    }

    #[tokio::test]
    async fn injected_failure_hits_requested_call() {
        let service = MemoryLogService::new();
        service.add_group("g", 0);
        service.fail_call(Operation::FilterEvents, 2, UpstreamError::network("reset"));

        assert!(service.filter_events(filter("g")).await.is_ok());
        let second = service.filter_events(filter("g")).await;
        assert_eq!(second, Err(UpstreamError::network("reset")));
        assert!(service.filter_events(filter("g")).await.is_ok());
        assert_eq!(service.calls(Operation::FilterEvents), 3);
    }

    #[tokio::test]
    async fn bad_token_is_an_upstream_error() {
        let service = MemoryLogService::new();
        let result = service
            .list_groups(ListGroupsRequest {
                prefix: String::new(),
                next_token: Some("not-a-number".to_string()),
            })
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn fixture_loads_groups_streams_and_events() {
        let json = r#"{
            "groups": [{
                "name": "/app/web",
                "creation_time": 1000,
                "streams": [{
                    "name": "web/1",
                    "creation_time": 1000,
                    "events": [
                        {"message": "{\"message\":\"started\"}", "timestamp": 2000},
                        {"event_id": "custom", "message": "plain", "timestamp": 3000, "ingestion_time": 3100}
                    ]
                }]
            }]
        }"#;
        let service = MemoryLogService::from_fixture_str(json).expect("fixture");

        let streams = service
            .list_streams(ListStreamsRequest {
                group: "/app/web".to_string(),
                ..Default::default()
            })
            .await
            .expect("streams");
        assert_eq!(streams.items[0].last_ingestion_time, Some(3100));

        let events = service.filter_events(filter("/app/web")).await.expect("events");
        let ids: Vec<&str> = events.items.iter().map(|e| e.event_id.as_str()).collect();
        assert_eq!(ids, vec!["/app/web/web/1/0", "custom"]);
    }

    #[test]
    fn fixture_rejects_invalid_json() {
        assert!(MemoryLogService::from_fixture_str("{").is_err());
    }

    #[test]
    fn fixture_file_missing_is_io_error() {
        let result = MemoryLogService::from_fixture("/nonexistent/fixture.json");
        assert!(matches!(result, Err(crate::error::ReaderError::Io(_))));
    }
}
