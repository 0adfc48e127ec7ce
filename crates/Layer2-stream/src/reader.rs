//! Source reader - one service's log stream, kept alive across drops
//!
//! Each reader pushes [`RawLogLine`]s into the shared channel. While following
//! it reconnects after transport failures and resumes after the service
//! restarts; lines already delivered before a reconnect are filtered out.

use chrono::{DateTime, Utc};
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::aggregate::StreamSettings;
use crate::color::colorize;
use crate::log::{
    RawLogLine, ReadError, Source, EXITED_MESSAGE, RECONNECTING_MESSAGE, RESTARTED_MESSAGE,
};
use crate::provider::{LineStream, LogOptions, LogProvider};
use crate::status::StatusSubscription;
use crate::timestamp::parse_log_line;
use crate::tracker::CompletionTracker;

/// Why one container instance stopped streaming
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InstanceEnd {
    /// Run cancelled or the printer went away
    Cancelled,
    /// Terminal line delivered (not following)
    Finished,
    /// The service exited while following
    Exited,
}

/// Outcome of waiting between connection attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pause {
    Cancelled,
    Exited,
    Retry,
}

pub struct SourceReader {
    source: Source,
    follow: bool,
    previous: bool,
    provider: Arc<dyn LogProvider>,
    status: StatusSubscription,
    tracker: Arc<CompletionTracker>,
    tx: mpsc::Sender<RawLogLine>,
    cancel: CancellationToken,
    reconnect_delay: Duration,
    open_retry_delay: Duration,

    /// Status lines name the source (several sources share the output)
    prefix: bool,

    /// Lines at or before this time were already forwarded
    since: Option<DateTime<Utc>>,

    /// Connection attempts so far, across instances
    attempts: u64,
}

impl SourceReader {
    pub fn new(
        service: impl Into<String>,
        settings: &StreamSettings,
        provider: Arc<dyn LogProvider>,
        status: StatusSubscription,
        tracker: Arc<CompletionTracker>,
        tx: mpsc::Sender<RawLogLine>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            source: Source::new(service),
            follow: settings.follows(),
            previous: settings.previous,
            provider,
            status,
            tracker,
            tx,
            cancel,
            reconnect_delay: settings.reconnect_delay,
            open_retry_delay: settings.open_retry_delay,
            prefix: false,
            since: None,
            attempts: 0,
        }
    }

    pub fn with_prefix(mut self, prefix: bool) -> Self {
        self.prefix = prefix;
        self
    }

    /// Render a status message the way it will be printed
    fn status_text(&self, message: &str) -> String {
        if self.prefix {
            format!("{} › {}", colorize(&self.source.name), message)
        } else {
            message.to_string()
        }
    }

    /// Stream until done. Consumes the reader; its sender closes on return.
    pub async fn run(mut self) {
        loop {
            let end = self.stream_instance().await;
            // Counted after the instance's last line was sent
            self.tracker.decrement();
            debug!("Reader for {} stopped: {:?}", self.source.name, end);

            if end != InstanceEnd::Exited || !self.follow {
                return;
            }

            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return,
                _ = self.status.became_running() => {}
            }

            self.tracker.increment();
            info!("{} restarted, resuming logs", self.source.name);
            let line = RawLogLine::status(&self.source.name, self.status_text(RESTARTED_MESSAGE));
            if !self.emit(line).await {
                self.tracker.decrement();
                return;
            }
        }
    }

    /// Connect, forward and reconnect until this container instance is done
    async fn stream_instance(&mut self) -> InstanceEnd {
        loop {
            if self.attempts > 0 {
                self.since = self.source.last_seen;
            }
            self.attempts += 1;

            let options = LogOptions::new(self.follow, self.previous).with_since(self.since);
            let opened = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return InstanceEnd::Cancelled,
                opened = self.provider.open(&self.source.name, &options) => opened,
            };

            let stream = match opened {
                Ok(stream) => stream,
                Err(e) => {
                    warn!("Failed to open logs for {}: {}", self.source.name, e);
                    if !self.follow {
                        let line = RawLogLine::failed(
                            &self.source.name,
                            ReadError::Transport(format!("start logs stream: {}", e)),
                        );
                        return self.finish(line).await;
                    }

                    match self.pause(self.open_retry_delay).await {
                        Pause::Retry => continue,
                        Pause::Exited => return self.exited().await,
                        Pause::Cancelled => return InstanceEnd::Cancelled,
                    }
                }
            };

            if self.attempts > 1 {
                info!(
                    "Connected to logs for {} via {} (since {:?})",
                    self.source.name,
                    self.provider.name(),
                    self.since
                );
            }

            let Some(err) = self.forward(stream).await else {
                return InstanceEnd::Cancelled;
            };

            if !self.follow {
                return self.finish(RawLogLine::failed(&self.source.name, err)).await;
            }

            let mut line = RawLogLine::failed(&self.source.name, err.clone());
            if let ReadError::Transport(msg) = &err {
                warn!("Lost logs for {}: {}", self.source.name, msg);
                line = line.with_status(self.status_text(RECONNECTING_MESSAGE));
            }
            if !self.emit(line).await {
                return InstanceEnd::Cancelled;
            }

            match self.pause(self.reconnect_delay).await {
                Pause::Retry => continue,
                Pause::Exited => return self.exited().await,
                Pause::Cancelled => return InstanceEnd::Cancelled,
            }
        }
    }

    /// Forward lines until the stream ends. `None` means cancelled.
    async fn forward(&mut self, mut stream: LineStream) -> Option<ReadError> {
        loop {
            let next = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return None,
                next = stream.next() => next,
            };

            let line = match next {
                None => return Some(ReadError::EndOfStream),
                Some(Err(e)) => return Some(ReadError::Transport(e.to_string())),
                Some(Ok(line)) => line,
            };

            if !self.accept(&line) {
                debug!("Dropping already delivered line from {}: {}", self.source.name, line);
                continue;
            }
            if !self.emit(RawLogLine::new(&self.source.name, line)).await {
                return None;
            }
        }
    }

    /// Whether a line is new. Unparseable lines can't be deduplicated and pass.
    fn accept(&mut self, line: &str) -> bool {
        let Ok((_, ts)) = parse_log_line(line) else {
            return true;
        };
        if self.since.is_some_and(|since| ts <= since) {
            return false;
        }
        self.source.observe(ts);
        true
    }

    /// Wait before the next attempt, watching for exit and cancellation
    async fn pause(&mut self, delay: Duration) -> Pause {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Pause::Cancelled,
            _ = self.status.exited() => Pause::Exited,
            _ = tokio::time::sleep(delay) => Pause::Retry,
        }
    }

    async fn exited(&mut self) -> InstanceEnd {
        info!("{} exited", self.source.name);
        let line = RawLogLine::status(&self.source.name, self.status_text(EXITED_MESSAGE));
        if self.emit(line).await {
            InstanceEnd::Exited
        } else {
            InstanceEnd::Cancelled
        }
    }

    async fn finish(&mut self, line: RawLogLine) -> InstanceEnd {
        if self.emit(line).await {
            InstanceEnd::Finished
        } else {
            InstanceEnd::Cancelled
        }
    }

    /// Send a line unless cancelled first. False if it could not be delivered.
    async fn emit(&self, line: RawLogLine) -> bool {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => false,
            sent = self.tx.send(line) => sent.is_ok(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::StatusBoard;
    use async_trait::async_trait;
    use futures::stream;
    use skiff_foundation::Result;

    struct NoLogs;

    #[async_trait]
    impl LogProvider for NoLogs {
        async fn open(&self, _service: &str, _options: &LogOptions) -> Result<LineStream> {
            Ok(stream::empty().boxed())
        }

        fn name(&self) -> &'static str {
            "none"
        }
    }

    fn reader(since: Option<DateTime<Utc>>) -> SourceReader {
        let (tx, _rx) = mpsc::channel(4);
        let mut reader = SourceReader::new(
            "web",
            &StreamSettings::default(),
            Arc::new(NoLogs),
            StatusBoard::new().subscribe("web"),
            Arc::new(CompletionTracker::new(1)),
            tx,
            CancellationToken::new(),
        );
        reader.since = since;
        reader
    }

    #[test]
    fn test_accept_without_since() {
        let mut reader = reader(None);
        assert!(reader.accept("2024-03-01T10:00:00Z a"));
        assert!(reader.accept("2024-03-01T10:00:00Z a"));
        assert!(reader.source.last_seen.is_some());
    }

    #[test]
    fn test_accept_filters_at_or_before_since() {
        let since = crate::timestamp::parse_timestamp("2024-03-01T10:00:00.5Z").unwrap();
        let mut reader = reader(Some(since));

        assert!(!reader.accept("2024-03-01T10:00:00.2Z old"));
        assert!(!reader.accept("2024-03-01T10:00:00.5Z same"));
        assert!(reader.accept("2024-03-01T10:00:00.7Z new"));
        assert!(reader.accept("garbage line"));
    }

    #[test]
    fn test_status_text() {
        let reader = reader(None);
        assert_eq!(reader.status_text(EXITED_MESSAGE), EXITED_MESSAGE);

        let reader = reader.with_prefix(true);
        let text = reader.status_text(EXITED_MESSAGE);
        assert!(text.contains("web"));
        assert!(text.ends_with(" › The container exited."));
    }

    #[tokio::test]
    async fn test_emit_fails_when_cancelled() {
        let reader = reader(None);
        reader.cancel.cancel();
        assert!(!reader.emit(RawLogLine::new("web", "x")).await);
    }
}
