//! Paginated event fetching with deduplication and follow mode.
//!
//! A producer task owns the store handle and the [`DedupCache`] and pushes
//! normalized events into a bounded channel, so a slow consumer blocks the
//! producer instead of growing memory. The producer closes the channel by
//! returning, after which [`EventStream::finish`] yields its outcome.
//!
//! ```text
//! Resolving ──► Fetching ──(more pages)──► Fetching
//!                  │
//!                  ├─(last page, one-shot)──► Done
//!                  ├─(last page, follow)────► Waiting ──► Fetching
//!                  ├─(store error)──────────► Failed
//!                  └─(cancelled)────────────► Cancelled
//! ```

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use chrono::Utc;
use futures::Stream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, info, warn};

use crate::config::ReaderConfig;
use crate::dedup::DedupCache;
use crate::error::{ReaderError, Result};
use crate::selector::{stream_names, StreamSelector};
use crate::service::{FilterEventsRequest, LogService};
use crate::types::{Event, EventRecord, TimeWindow};

/// Everything the producer needs, handed over by the reader.
pub(crate) struct EngineParams<S> {
    pub service: S,
    pub group: String,
    pub prefix: Option<String>,
    pub window: TimeWindow,
    pub config: ReaderConfig,
    pub cache: DedupCache,
}

/// Producer loop phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Fetching,
    Waiting,
}

/// Whether the consumer is still listening.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Delivery {
    Open,
    ConsumerGone,
}

struct Producer<S> {
    service: S,
    group: String,
    prefix: Option<String>,
    window: TimeWindow,
    config: ReaderConfig,
    cache: DedupCache,
    follow: bool,
    sender: mpsc::Sender<Event>,
    cancel: CancellationToken,
}

impl<S: LogService> Producer<S> {
    async fn run(mut self) -> Result<()> {
        let outcome = self.pump().await;
        match &outcome {
            Ok(()) => debug!(group = %self.group, "event stream exhausted"),
            Err(ReaderError::Cancelled) => debug!(group = %self.group, "event stream cancelled"),
            Err(e) => warn!(group = %self.group, error = %e, "event stream failed"),
        }
        // dropping self.sender here closes the channel
        outcome
    }

    async fn pump(&mut self) -> Result<()> {
        let window = self.window.for_fetch(self.follow, Utc::now());

        let names = match self.prefix.as_deref() {
            Some(prefix) => {
                let selector = StreamSelector::new(
                    &self.service,
                    &self.group,
                    Some(prefix),
                    window,
                    self.config.max_streams,
                );
                let streams = self.cancellable(selector.select()).await??;
                Some(stream_names(&streams))
            }
            None => None,
        };

        let mut request = FilterEventsRequest {
            group: self.group.clone(),
            stream_names: names,
            start_time: window.start_millis(),
            end_time: window.end_millis(),
            interleaved: true,
            next_token: None,
        };
        info!(
            group = %self.group,
            streams = request.stream_names.as_ref().map_or(0, Vec::len),
            start = request.start_time,
            end = request.end_time,
            follow = self.follow,
            "streaming events"
        );

        let mut phase = Phase::Fetching;
        loop {
            match phase {
                Phase::Fetching => {
                    let page = self
                        .cancellable(self.service.filter_events(request.clone()))
                        .await??;
                    if self.emit(page.items).await? == Delivery::ConsumerGone {
                        debug!(group = %self.group, "consumer went away");
                        return Ok(());
                    }

                    // request.next_token still names the last page, so the
                    // next poll re-reads only that page and what follows it
                    match page.next_token {
                        Some(token) => request.next_token = Some(token),
                        None if self.follow => phase = Phase::Waiting,
                        None => return Ok(()),
                    }
                }
                Phase::Waiting => {
                    self.cancellable(tokio::time::sleep(self.config.poll_interval))
                        .await?;
                    phase = Phase::Fetching;
                }
            }
        }
    }

    /// Emits every record whose ID has not been seen yet, in page order.
    async fn emit(&mut self, records: Vec<EventRecord>) -> Result<Delivery> {
        let fetched = records.len();
        let mut duplicates = 0usize;

        for record in records {
            if !self.cache.insert(&record.event_id) {
                duplicates += 1;
                continue;
            }
            let event = Event::from_record(record, &self.group);
            if self.cancellable(self.sender.send(event)).await?.is_err() {
                return Ok(Delivery::ConsumerGone);
            }
        }

        debug!(
            group = %self.group,
            fetched,
            duplicates,
            "processed event page"
        );
        Ok(Delivery::Open)
    }

    /// Runs `future` unless cancellation is requested first.
    async fn cancellable<F: Future>(&self, future: F) -> Result<F::Output> {
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => Err(ReaderError::Cancelled),
            output = future => Ok(output),
        }
    }
}

/// Spawns the producer and returns the consumer end.
pub(crate) fn spawn<S: LogService>(
    params: EngineParams<S>,
    follow: bool,
    cancel: &CancellationToken,
) -> EventStream {
    let (sender, receiver) = mpsc::channel(params.config.channel_capacity.max(1));
    let cancel = cancel.child_token();

    let producer = Producer {
        service: params.service,
        group: params.group,
        prefix: params.prefix,
        window: params.window,
        config: params.config,
        cache: params.cache,
        follow,
        sender,
        cancel: cancel.clone(),
    };
    let handle = tokio::spawn(producer.run());

    EventStream {
        receiver,
        handle,
        _guard: cancel.clone().drop_guard(),
        cancel,
        exhausted: false,
    }
}

/// Consumer end of an event stream.
///
/// Yields events until the producer finishes, then [`finish`](Self::finish)
/// reports why it stopped. Dropping the stream cancels the producer.
pub struct EventStream {
    receiver: mpsc::Receiver<Event>,
    handle: JoinHandle<Result<()>>,
    cancel: CancellationToken,
    _guard: DropGuard,
    exhausted: bool,
}

impl EventStream {
    /// Receives the next event, or `None` once the producer has stopped.
    pub async fn recv(&mut self) -> Option<Event> {
        let event = self.receiver.recv().await;
        if event.is_none() {
            self.exhausted = true;
        }
        event
    }

    /// Returns true once the channel has been observed closed.
    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Waits for the producer and returns its terminal outcome.
    ///
    /// If the stream has not been drained, the producer is cancelled first
    /// and the outcome is [`ReaderError::Cancelled`] unless it already
    /// stopped for another reason.
    ///
    /// # Errors
    ///
    /// - [`ReaderError::Cancelled`] if streaming was cancelled
    /// - [`ReaderError::Upstream`] or a resolution error if streaming failed
    /// - [`ReaderError::Producer`] if the producer task panicked
    pub async fn finish(mut self) -> Result<()> {
        if !self.exhausted {
            self.cancel.cancel();
            self.receiver.close();
        }
        match (&mut self.handle).await {
            Ok(outcome) => outcome,
            Err(e) => Err(ReaderError::Producer(e.to_string())),
        }
    }
}

impl Stream for EventStream {
    type Item = Event;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let polled = self.receiver.poll_recv(cx);
        if matches!(polled, Poll::Ready(None)) {
            self.exhausted = true;
        }
        polled
    }
}

impl std::fmt::Debug for EventStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventStream")
            .field("exhausted", &self.exhausted)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}
