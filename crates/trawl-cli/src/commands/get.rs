//! Get command implementation.
//!
//! Streams the events of one group to the output until the window is
//! exhausted, or until cancelled when following.

use std::io::Write;
use std::time::Duration;

use chrono::Utc;
use tracing::debug;
use trawl_core::{CancellationToken, LogQuery, LogService, Reader, ReaderConfig, TimeWindow};

use crate::cli::GetArgs;
use crate::error::{CliError, Result};
use crate::output::EventFormat;
use crate::timespec::parse_time;

/// Quiet period after which a one-shot read prints [`SLOW_LOAD_HINT`].
pub const SLOW_LOAD_AFTER: Duration = Duration::from_secs(7);

/// Printed to stderr when a one-shot read goes quiet.
pub const SLOW_LOAD_HINT: &str =
    "logs are taking a while to load... possibly try a smaller time window";

/// Handler for the get command.
pub struct GetCommand<S> {
    service: S,
}

impl<S: LogService> GetCommand<S> {
    /// Creates a new get command handler.
    #[must_use]
    pub const fn new(service: S) -> Self {
        Self { service }
    }

    /// Executes the get command, writing events to `out` and hints to `diag`.
    ///
    /// Cancellation through `cancel` ends the command successfully.
    ///
    /// # Errors
    ///
    /// Returns error if the arguments are invalid, the group does not
    /// resolve, the store fails or writing fails.
    pub async fn execute<W: Write, D: Write>(
        self,
        out: &mut W,
        diag: &mut D,
        args: &GetArgs,
        cancel: &CancellationToken,
    ) -> Result<()> {
        if args.follow && args.window.until.is_some() {
            return Err(CliError::Usage("can't set both --until and --follow".into()));
        }

        let now = Utc::now();
        let start = parse_time(&args.window.since, now)?;
        let end = args
            .window
            .until
            .as_deref()
            .map(|until| parse_time(until, now))
            .transpose()?;

        let mut query = LogQuery::new(&args.group, TimeWindow::new(start, end)?);
        if let Some(prefix) = &args.prefix {
            query = query.with_stream_prefix(prefix.as_str());
        }
        let config = ReaderConfig::default().with_max_streams(args.max_streams);
        let reader = Reader::open(self.service, query, config).await?;

        let format = if args.raw { EventFormat::Raw } else { EventFormat::Line };
        let mut events = reader.stream(args.follow, cancel);
        let mut hint_armed = !args.follow;

        loop {
            tokio::select! {
                event = events.recv() => {
                    let Some(event) = event else { break };
                    format.write_event(out, &event)?;
                    hint_armed = !args.follow;
                }
                () = tokio::time::sleep(SLOW_LOAD_AFTER), if hint_armed => {
                    writeln!(diag, "{SLOW_LOAD_HINT}")?;
                    hint_armed = false;
                }
            }
        }
        out.flush()?;

        match events.finish().await {
            Err(e) if e.is_cancelled() => {
                debug!("get cancelled");
                Ok(())
            }
            outcome => outcome.map_err(CliError::from),
        }
    }
}
