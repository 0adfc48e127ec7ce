//! Log line types flowing from source readers to the printer
//!
//! - `RawLogLine`: one line as received, before sorting
//! - `ParsedLogLine`: a raw line with its timestamp extracted, ready to print
//! - `Source`: per-service reader state

use chrono::{DateTime, Utc};
use std::fmt;
use tracing::debug;

use crate::timestamp::parse_log_line;

/// Status line printed when a service's container stops
pub const EXITED_MESSAGE: &str = "The container exited.";

/// Status line printed when a followed stream drops and will be reopened
pub const RECONNECTING_MESSAGE: &str = "Disconnected from logs, reconnecting..";

/// Status line printed when a stopped service comes back
pub const RESTARTED_MESSAGE: &str = "The container restarted, streaming logs..";

/// Terminal condition of one read attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadError {
    /// The stream ended normally
    EndOfStream,
    /// Opening or reading the stream failed
    Transport(String),
}

impl fmt::Display for ReadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadError::EndOfStream => write!(f, "end of stream"),
            ReadError::Transport(msg) => write!(f, "{}", msg),
        }
    }
}

/// One line as received from a source
#[derive(Debug, Clone)]
pub struct RawLogLine {
    /// Service that produced the line
    pub source: String,

    /// Line contents, including the timestamp prefix
    pub message: String,

    /// When the line was read; sort key if the prefix can't be parsed
    pub received_at: DateTime<Utc>,

    /// Set when the read attempt ended. `message` is empty then.
    pub error: Option<ReadError>,

    /// Pre-rendered status text printed verbatim instead of `message`
    pub status: Option<String>,
}

impl RawLogLine {
    pub fn new(source: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            message: message.into(),
            received_at: Utc::now(),
            error: None,
            status: None,
        }
    }

    pub fn failed(source: impl Into<String>, error: ReadError) -> Self {
        Self {
            error: Some(error),
            ..Self::new(source, String::new())
        }
    }

    pub fn status(source: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            status: Some(status.into()),
            ..Self::new(source, String::new())
        }
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn with_received_at(mut self, received_at: DateTime<Utc>) -> Self {
        self.received_at = received_at;
        self
    }

    /// Lines with nothing to print: a silent end of stream
    pub fn is_silent(&self) -> bool {
        self.status.is_none() && matches!(self.error, Some(ReadError::EndOfStream))
    }

    /// Extract the logged-at timestamp, falling back to the receipt time
    pub fn parse(&self) -> ParsedLogLine {
        if let Some(status) = &self.status {
            return ParsedLogLine {
                source: self.source.clone(),
                message: String::new(),
                logged_at: self.received_at,
                format_override: Some(status.clone()),
            };
        }

        let (message, logged_at) = match parse_log_line(&self.message) {
            Ok((message, ts)) => (message.to_string(), ts),
            Err(e) => {
                debug!(
                    source = %self.source,
                    message = %self.message,
                    "Failed to parse timestamp, using receipt time: {}",
                    e
                );
                (self.message.clone(), self.received_at)
            }
        };

        ParsedLogLine {
            source: self.source.clone(),
            message,
            logged_at,
            format_override: None,
        }
    }
}

/// A line ready to be sorted and printed
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedLogLine {
    pub source: String,

    /// Line contents without the timestamp prefix
    pub message: String,

    /// When the application logged the line, per the container's clock
    pub logged_at: DateTime<Utc>,

    /// Printed verbatim, bypassing prefix and color
    pub format_override: Option<String>,
}

/// Reader-side state for one monitored service
#[derive(Debug, Clone)]
pub struct Source {
    pub name: String,

    /// Timestamp of the newest forwarded line
    pub last_seen: Option<DateTime<Utc>>,
}

impl Source {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            last_seen: None,
        }
    }

    /// Record a forwarded line's timestamp
    pub fn observe(&mut self, ts: DateTime<Utc>) {
        if self.last_seen.map_or(true, |seen| ts > seen) {
            self.last_seen = Some(ts);
        }
    }
}
