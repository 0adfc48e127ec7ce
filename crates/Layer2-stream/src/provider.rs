//! Log provider trait - implement to add new log backends

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;
use skiff_foundation::Result;

/// Lines of one log stream, without trailing newlines
pub type LineStream = BoxStream<'static, Result<String>>;

/// Options for opening a log stream
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogOptions {
    /// Keep the stream open for new lines
    pub follow: bool,

    /// Logs of the previous instance of the service
    pub previous: bool,

    /// Prefix every line with an RFC3339 timestamp
    pub timestamps: bool,

    /// Only lines at or after this time. Backends may truncate to seconds.
    pub since: Option<DateTime<Utc>>,
}

impl LogOptions {
    pub fn new(follow: bool, previous: bool) -> Self {
        Self {
            follow,
            previous,
            timestamps: true,
            since: None,
        }
    }

    pub fn with_since(mut self, since: Option<DateTime<Utc>>) -> Self {
        self.since = since;
        self
    }
}

/// Source of per-service log streams
#[async_trait]
pub trait LogProvider: Send + Sync {
    /// Open a log stream for a service
    async fn open(&self, service: &str, options: &LogOptions) -> Result<LineStream>;

    /// Get provider name
    fn name(&self) -> &'static str;
}
