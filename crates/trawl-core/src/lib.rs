//! # trawl-core
//!
//! Retrieval of log events from a grouped log store.
//!
//! This crate provides:
//!
//! - [`resolve_group`]: Exact group lookup with suggestions for near misses
//! - [`StreamSelector`]: Picks the streams active in a time window
//! - [`Reader`]: Streams deduplicated events for one group, once or following
//! - [`EventStream`]: The consumer end, usable as a [`futures::Stream`]
//! - [`LogService`]: The store abstraction, with [`MemoryLogService`] as an
//!   in-memory implementation that can load JSON fixtures
//!
//! ## Example
//!
//! ```rust
//! use trawl_core::{CancellationToken, LogQuery, MemoryLogService, Reader, ReaderConfig, TimeWindow};
//!
//! # async fn demo() -> trawl_core::Result<()> {
//! let service = MemoryLogService::new();
//! service.add_group("/app/web", 0);
//!
//! let query = LogQuery::new("/app/web", TimeWindow::all());
//! let reader = Reader::open(service, query, ReaderConfig::default()).await?;
//!
//! let mut events = reader.stream(false, &CancellationToken::new());
//! while let Some(event) = events.recv().await {
//!     println!("[ {} ] {}", event.stream, event.message().unwrap_or_default());
//! }
//! events.finish().await
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod dedup;
pub mod engine;
pub mod error;
pub mod memory;
pub mod normalize;
pub mod reader;
pub mod resolver;
pub mod selector;
pub mod service;
pub mod types;

// Re-export main types
pub use config::{ReaderConfig, DEFAULT_MAX_STREAMS, DEFAULT_POLL_INTERVAL, MAX_EVENTS_PER_CALL};
pub use dedup::DedupCache;
pub use engine::EventStream;
pub use error::{ReaderError, Result, UpstreamError, UpstreamErrorKind, MAX_GROUP_SUGGESTIONS};
pub use memory::{MemoryLogService, MemoryServiceConfig, Operation};
pub use normalize::{normalize, parse_body};
pub use reader::{LogQuery, Reader};
pub use resolver::{list_groups, resolve_group};
pub use selector::{stream_names, StreamSelector};
pub use service::{
    FilterEventsRequest, ListGroupsRequest, ListStreamsRequest, LogService, ServiceResult,
    StreamOrder,
};
pub use tokio_util::sync::CancellationToken;
pub use types::{
    from_millis, to_millis, Event, EventRecord, GroupRecord, LogGroup, LogStream, Page,
    StreamRecord, TimeWindow,
};
