//! # skiff-stream
//!
//! Log streaming for skiff services.
//!
//! ## Features
//!
//! - One reader per service, reconnecting and resuming across restarts
//! - Windowed printer: lines sorted by logged time within each window
//! - Completion tracking for non-follow runs
//! - Docker backend for sandbox logs and status

pub mod aggregate;
pub mod color;
pub mod docker;
pub mod log;
pub mod printer;
pub mod provider;
pub mod reader;
pub mod status;
pub mod timestamp;
pub mod tracker;

// Aggregation
pub use aggregate::{LogsCommand, StreamSettings};
pub use printer::{sort_window, LogPrinter};
pub use reader::SourceReader;
pub use tracker::CompletionTracker;

// Log lines
pub use log::{
    ParsedLogLine, RawLogLine, ReadError, Source, EXITED_MESSAGE, RECONNECTING_MESSAGE,
    RESTARTED_MESSAGE,
};
pub use timestamp::{format_timestamp, parse_log_line, parse_timestamp};

// Backends
pub use docker::{DockerBackend, StatusPoller};
pub use provider::{LineStream, LogOptions, LogProvider};
pub use status::{ServicePhase, ServiceStatus, StatusBoard, StatusSubscription};

// Colors
pub use color::{color_of, colorize, PALETTE};
