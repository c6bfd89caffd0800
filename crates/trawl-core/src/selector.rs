//! Selection of the streams worth querying for a time window.
//!
//! Two modes, picked by whether a stream-name prefix is given:
//!
//! - **Prefix**: the store filters by name and every page is scanned; a
//!   stream is kept if it was created before the window end and ingested
//!   after the window start.
//! - **Recency**: the store orders streams by last event time, newest
//!   first. Streams created after the window end are skipped, and paging
//!   stops at the first stream whose last ingestion precedes the window
//!   start, since every later one was ingested even earlier.
//!
//! Both modes stop at `max_streams` and return the result sorted by last
//! ingestion time, newest first.

use tracing::debug;

use crate::error::{ReaderError, Result};
use crate::service::{ListStreamsRequest, LogService, StreamOrder};
use crate::types::{LogStream, TimeWindow};

/// Outcome of testing one stream against the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verdict {
    Keep,
    Skip,
    /// Stop paging; nothing after this stream can match.
    Stop,
}

/// Selects candidate streams of a group for a time window.
#[derive(Debug, Clone)]
pub struct StreamSelector<'a, S> {
    service: &'a S,
    group: &'a str,
    prefix: Option<&'a str>,
    window: TimeWindow,
    max_streams: usize,
}

impl<'a, S: LogService> StreamSelector<'a, S> {
    /// Creates a selector. An empty prefix is treated as no prefix.
    #[must_use]
    pub fn new(
        service: &'a S,
        group: &'a str,
        prefix: Option<&'a str>,
        window: TimeWindow,
        max_streams: usize,
    ) -> Self {
        Self {
            service,
            group,
            prefix: prefix.filter(|p| !p.is_empty()),
            window,
            max_streams,
        }
    }

    /// Returns true if selection filters by stream-name prefix.
    #[must_use]
    pub const fn is_prefix_mode(&self) -> bool {
        self.prefix.is_some()
    }

    /// Runs the selection.
    ///
    /// # Errors
    ///
    /// - [`ReaderError::NoStreamsFound`] if nothing matches
    /// - [`ReaderError::Upstream`] if the store fails
    pub async fn select(&self) -> Result<Vec<LogStream>> {
        let mut request = ListStreamsRequest {
            group: self.group.to_string(),
            prefix: self.prefix.map(str::to_string),
            ..Default::default()
        };
        if !self.is_prefix_mode() {
            request.order_by = StreamOrder::LastEventTime;
            request.descending = true;
        }

        let mut streams = Vec::new();
        let mut pages = 0usize;

        'paging: while streams.len() < self.max_streams {
            let page = self.service.list_streams(request.clone()).await?;
            pages += 1;

            for record in page.items {
                let stream = LogStream::from(record);
                match self.verdict(&stream) {
                    Verdict::Keep => streams.push(stream),
                    Verdict::Skip => continue,
                    Verdict::Stop => {
                        debug!(
                            group = self.group,
                            stream = %stream.name,
                            "stream predates window, stopping selection"
                        );
                        break 'paging;
                    }
                }
                if streams.len() >= self.max_streams {
                    break 'paging;
                }
            }

            match page.next_token {
                Some(token) => request.next_token = Some(token),
                None => break,
            }
        }

        streams.sort_by(|a, b| b.last_ingested_at.cmp(&a.last_ingested_at));
        debug!(
            group = self.group,
            prefix = self.prefix,
            pages,
            selected = streams.len(),
            "selected streams"
        );

        if streams.is_empty() {
            return Err(ReaderError::NoStreamsFound {
                prefix: self.prefix.map(str::to_string),
            });
        }
        Ok(streams)
    }

    fn verdict(&self, stream: &LogStream) -> Verdict {
        let created_after_end = self.window.end.is_some_and(|end| stream.created_at > end);

        if self.is_prefix_mode() {
            let created_before_end = self.window.end.is_none_or(|end| stream.created_at < end);
            if created_before_end && stream.last_ingested_at > self.window.start {
                Verdict::Keep
            } else {
                Verdict::Skip
            }
        } else if created_after_end {
            Verdict::Skip
        } else if stream.last_ingested_at < self.window.start {
            Verdict::Stop
        } else {
            Verdict::Keep
        }
    }
}

/// Names of the given streams, in order.
#[must_use]
pub fn stream_names(streams: &[LogStream]) -> Vec<String> {
    streams.iter().map(|s| s.name.clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::UpstreamError;
    use crate::memory::{MemoryLogService, MemoryServiceConfig, Operation};
    use crate::types::{from_millis, StreamRecord};

    const GROUP: &str = "/app/web";

    fn service(page_size: usize, streams: &[(&str, i64, Option<i64>)]) -> MemoryLogService {
        let service =
            MemoryLogService::with_config(MemoryServiceConfig::default().with_page_size(page_size));
        service.add_group(GROUP, 0);
        for (name, created, last) in streams {
            service.add_stream(
                GROUP,
                StreamRecord {
                    name: (*name).to_string(),
                    creation_time: *created,
                    last_ingestion_time: *last,
                },
            );
        }
        service
    }

    fn window(start: i64, end: Option<i64>) -> TimeWindow {
        TimeWindow {
            start: from_millis(start),
            end: end.map(from_millis),
        }
    }

    fn names(streams: &[LogStream]) -> Vec<&str> {
        streams.iter().map(|s| s.name.as_str()).collect()
    }

    #[tokio::test]
    async fn recency_mode_orders_newest_first() {
        let service = service(10, &[("a", 0, Some(300)), ("b", 0, Some(500)), ("c", 0, Some(400))]);
        let selector = StreamSelector::new(&service, GROUP, None, window(100, None), 10);
        let streams = selector.select().await.expect("streams");
        assert_eq!(names(&streams), vec!["b", "c", "a"]);
    }

    #[tokio::test]
    async fn recency_mode_stops_paging_before_window_start() {
        let service = service(
            2,
            &[
                ("new", 0, Some(900)),
                ("mid", 0, Some(800)),
                ("old", 0, Some(50)),
                ("older", 0, Some(40)),
                ("oldest", 0, Some(30)),
                ("ancient", 0, Some(20)),
            ],
        );
        let selector = StreamSelector::new(&service, GROUP, None, window(100, None), 10);
        let streams = selector.select().await.expect("streams");

        assert_eq!(names(&streams), vec!["new", "mid"]);
        // third page is never requested
        assert_eq!(service.calls(Operation::ListStreams), 2);
    }

    #[tokio::test]
    async fn recency_mode_skips_streams_created_after_end() {
        let service = service(10, &[("future", 600, Some(900)), ("current", 0, Some(450))]);
        let selector = StreamSelector::new(&service, GROUP, None, window(100, Some(500)), 10);
        let streams = selector.select().await.expect("streams");
        assert_eq!(names(&streams), vec!["current"]);
    }

    #[tokio::test]
    async fn recency_mode_excludes_never_ingested_streams() {
        let service = service(10, &[("live", 0, Some(200)), ("idle", 0, None)]);
        let selector = StreamSelector::new(&service, GROUP, None, window(1, None), 10);
        let streams = selector.select().await.expect("streams");
        assert_eq!(names(&streams), vec!["live"]);
    }

    #[tokio::test]
    async fn recency_mode_stops_at_max_streams() {
        let service = service(
            2,
            &[("a", 0, Some(500)), ("b", 0, Some(400)), ("c", 0, Some(300)), ("d", 0, Some(200))],
        );
        let selector = StreamSelector::new(&service, GROUP, None, window(0, None), 3);
        let streams = selector.select().await.expect("streams");
        assert_eq!(names(&streams), vec!["a", "b", "c"]);
        assert_eq!(service.calls(Operation::ListStreams), 2);
    }

    #[tokio::test]
    async fn prefix_mode_scans_all_pages() {
        let service = service(
            1,
            &[
                ("task/a", 0, Some(50)),
                ("task/b", 0, Some(300)),
                ("other", 0, Some(900)),
                ("task/c", 0, Some(200)),
            ],
        );
        let selector = StreamSelector::new(&service, GROUP, Some("task/"), window(100, None), 10);
        let streams = selector.select().await.expect("streams");

        assert_eq!(names(&streams), vec!["task/b", "task/c"]);
        assert_eq!(service.calls(Operation::ListStreams), 3);
    }

    #[tokio::test]
    async fn prefix_mode_bounds_are_strict() {
        let service = service(
            10,
            &[
                ("task/at-start", 0, Some(100)),
                ("task/created-at-end", 500, Some(600)),
                ("task/inside", 200, Some(300)),
            ],
        );
        let selector =
            StreamSelector::new(&service, GROUP, Some("task/"), window(100, Some(500)), 10);
        let streams = selector.select().await.expect("streams");
        assert_eq!(names(&streams), vec!["task/inside"]);
    }

    #[tokio::test]
    async fn prefix_mode_truncates_at_cap() {
        let service = service(
            1,
            &[("task/a", 0, Some(200)), ("task/b", 0, Some(300)), ("task/c", 0, Some(400))],
        );
        let selector = StreamSelector::new(&service, GROUP, Some("task/"), window(0, None), 2);
        let streams = selector.select().await.expect("streams");
        assert_eq!(names(&streams), vec!["task/b", "task/a"]);
        assert_eq!(service.calls(Operation::ListStreams), 2);
    }

    #[tokio::test]
    async fn empty_prefix_means_recency_mode() {
        let service = service(10, &[("a", 0, Some(200))]);
        let selector = StreamSelector::new(&service, GROUP, Some(""), window(0, None), 10);
        assert!(!selector.is_prefix_mode());
    }

    #[tokio::test]
    async fn no_match_reports_prefix() {
        let service = service(10, &[("task/a", 0, Some(50))]);
        let selector = StreamSelector::new(&service, GROUP, Some("task/"), window(100, None), 10);
        let err = selector.select().await;
        assert!(matches!(
            err,
            Err(ReaderError::NoStreamsFound { prefix: Some(p) }) if p == "task/"
        ));

        let selector = StreamSelector::new(&service, GROUP, None, window(100, None), 10);
        assert!(matches!(
            selector.select().await,
            Err(ReaderError::NoStreamsFound { prefix: None })
        ));
    }

    #[tokio::test]
    async fn upstream_failure_propagates() {
        let service = service(1, &[("a", 0, Some(500)), ("b", 0, Some(400))]);
        service.fail_call(Operation::ListStreams, 2, UpstreamError::throttled("slow down"));
        let selector = StreamSelector::new(&service, GROUP, None, window(0, None), 10);
        assert!(matches!(selector.select().await, Err(ReaderError::Upstream(_))));
    }

    #[test]
    fn stream_names_preserve_order() {
        let streams = vec![
            LogStream::from(StreamRecord {
                name: "b".to_string(),
                creation_time: 0,
                last_ingestion_time: None,
            }),
            LogStream::from(StreamRecord {
                name: "a".to_string(),
                creation_time: 0,
                last_ingestion_time: None,
            }),
        ];
        assert_eq!(stream_names(&streams), vec!["b", "a"]);
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        fn block_on<F: std::future::Future>(future: F) -> F::Output {
            tokio::runtime::Builder::new_current_thread()
                .build()
                .expect("runtime")
                .block_on(future)
        }

        fn arb_streams() -> impl Strategy<Value = Vec<(i64, Option<i64>)>> {
            prop::collection::vec((0i64..1_000, prop::option::of(0i64..1_000)), 0..40)
        }

        proptest! {
            #[test]
            fn never_exceeds_max_streams(
                streams in arb_streams(),
                max in 1usize..10,
                page in 1usize..7,
                start in 0i64..1_000,
                use_prefix in any::<bool>(),
            ) {
                let names: Vec<String> = (0..streams.len()).map(|i| format!("s{i:03}")).collect();
                let specs: Vec<(&str, i64, Option<i64>)> = names
                    .iter()
                    .zip(&streams)
                    .map(|(n, (c, l))| (n.as_str(), *c, *l))
                    .collect();
                let service = service(page, &specs);
                let prefix = use_prefix.then_some("s");
                let selector = StreamSelector::new(&service, GROUP, prefix, window(start, None), max);
                if let Ok(selected) = block_on(selector.select()) {
                    prop_assert!(selected.len() <= max);
                    prop_assert!(!selected.is_empty());
                }
            }

            #[test]
            fn recency_mode_returns_prefix_of_ordering(
                streams in arb_streams(),
                max in 1usize..10,
                page in 1usize..7,
                start in 1i64..1_000,
            ) {
                let names: Vec<String> = (0..streams.len()).map(|i| format!("s{i:03}")).collect();
                let specs: Vec<(&str, i64, Option<i64>)> = names
                    .iter()
                    .zip(&streams)
                    .map(|(n, (c, l))| (n.as_str(), *c, *l))
                    .collect();
                let service = service(page, &specs);
                let selector = StreamSelector::new(&service, GROUP, None, window(start, None), max);

                let mut ordered: Vec<(i64, &str)> = specs
                    .iter()
                    .map(|(n, _, l)| (l.unwrap_or(0), *n))
                    .collect();
                ordered.sort_by(|a, b| b.cmp(a));
                let expected: Vec<&str> = ordered
                    .iter()
                    .take_while(|(last, _)| *last >= start)
                    .take(max)
                    .map(|(_, n)| *n)
                    .collect();

                match block_on(selector.select()) {
                    Ok(selected) => prop_assert_eq!(names_of(&selected), expected),
                    Err(ReaderError::NoStreamsFound { .. }) => prop_assert!(expected.is_empty()),
                    Err(other) => prop_assert!(false, "unexpected error: {other}"),
                }
            }
        }

        fn names_of(streams: &[LogStream]) -> Vec<&str> {
            streams.iter().map(|s| s.name.as_str()).collect()
        }
    }
}
