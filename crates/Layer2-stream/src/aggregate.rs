//! Log aggregation - wires readers, completion tracking and the printer

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info_span, warn, Instrument};

use skiff_foundation::{Error, LogsConfig, Result};

use crate::printer::LogPrinter;
use crate::provider::LogProvider;
use crate::reader::SourceReader;
use crate::status::StatusBoard;
use crate::tracker::CompletionTracker;

/// Runtime settings of one aggregation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamSettings {
    /// Keep streaming and reconnect instead of stopping at end of stream
    pub follow: bool,

    /// Logs of the previous container instance
    pub previous: bool,

    pub window: Duration,
    pub reconnect_delay: Duration,
    pub open_retry_delay: Duration,
    pub channel_capacity_per_source: usize,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self::from_config(&LogsConfig::default(), false, false)
    }
}

impl StreamSettings {
    pub fn from_config(config: &LogsConfig, follow: bool, previous: bool) -> Self {
        Self {
            follow,
            previous,
            window: config.window(),
            reconnect_delay: config.reconnect_delay(),
            open_retry_delay: config.open_retry_delay(),
            channel_capacity_per_source: config.channel_capacity_per_source.max(1),
        }
    }

    /// Whether readers keep streaming. Logs of a previous instance are
    /// complete, so `previous` turns following off.
    pub fn follows(&self) -> bool {
        self.follow && !self.previous
    }

    pub fn with_follow(mut self, follow: bool) -> Self {
        self.follow = follow;
        self
    }
}

/// `logs` for a set of services
#[derive(Debug, Clone)]
pub struct LogsCommand {
    services: Vec<String>,
    settings: StreamSettings,
}

impl LogsCommand {
    /// Duplicate service names are collapsed, keeping the first occurrence
    pub fn new(services: Vec<String>, settings: StreamSettings) -> Result<Self> {
        let mut unique: Vec<String> = Vec::with_capacity(services.len());
        for service in services {
            if !unique.contains(&service) {
                unique.push(service);
            }
        }

        if unique.is_empty() {
            return Err(Error::InvalidInput(
                "at least one service is required".to_string(),
            ));
        }

        Ok(Self {
            services: unique,
            settings,
        })
    }

    pub fn services(&self) -> &[String] {
        &self.services
    }

    pub fn settings(&self) -> &StreamSettings {
        &self.settings
    }

    /// Stream the services' logs to `out`.
    ///
    /// Returns once every reader is done (not following), or when `cancel`
    /// fires. Fails on a transport error while not following.
    pub async fn run<W: Write>(
        &self,
        provider: Arc<dyn LogProvider>,
        board: &StatusBoard,
        out: W,
        cancel: &CancellationToken,
    ) -> Result<()> {
        // Stopping our readers must not cancel the caller
        let cancel = cancel.child_token();
        let sources = self.services.len();

        let (tx, mut rx) = mpsc::channel(sources * self.settings.channel_capacity_per_source);
        let tracker = Arc::new(CompletionTracker::new(sources));

        let mut readers = JoinSet::new();
        for service in &self.services {
            let reader = SourceReader::new(
                service.clone(),
                &self.settings,
                Arc::clone(&provider),
                board.subscribe(service),
                Arc::clone(&tracker),
                tx.clone(),
                cancel.clone(),
            )
            .with_prefix(sources > 1);
            let span = info_span!("reader", service = %service);
            readers.spawn(reader.run().instrument(span));
        }
        // Channel closes once every reader returned
        drop(tx);

        let watcher = (!self.settings.follows()).then(|| {
            tokio::spawn(watch_completion(Arc::clone(&tracker), cancel.clone()))
        });

        let mut printer = LogPrinter::new(out, self.settings.window, sources > 1);
        let result = printer.run(&mut rx, &cancel).await;

        cancel.cancel();
        while let Some(joined) = readers.join_next().await {
            if let Err(e) = joined {
                warn!("Log reader task failed: {}", e);
            }
        }
        if let Some(watcher) = watcher {
            let _ = watcher.await;
        }

        result
    }
}

/// Cancel the run once no reader will produce another line
async fn watch_completion(tracker: Arc<CompletionTracker>, cancel: CancellationToken) {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => {}
        _ = tracker.wait_for_zero() => {
            debug!("All log readers finished");
            cancel.cancel();
        }
    }
}
