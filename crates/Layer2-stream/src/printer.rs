//! Windowed log printer
//!
//! Lines from all readers are buffered for a short window, sorted by the
//! time they were logged and printed together. Lines within one window come
//! out in order. A line delayed past its window is printed with a later
//! window, out of order; that is the price of bounded latency.

use std::io::Write;
use std::pin::Pin;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Sleep;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use skiff_foundation::{Error, Result};

use crate::color::colorize;
use crate::log::{ParsedLogLine, RawLogLine, ReadError};

/// Parse a window's lines and order them by logged time.
///
/// The sort is stable: lines with equal timestamps keep their arrival order,
/// which is program order for lines from the same source.
pub fn sort_window(window: &[RawLogLine]) -> Vec<ParsedLogLine> {
    let mut parsed: Vec<ParsedLogLine> = window.iter().map(RawLogLine::parse).collect();
    parsed.sort_by_key(|line| line.logged_at);
    parsed
}

pub struct LogPrinter<W: Write> {
    out: W,
    window: Duration,

    /// Prefix lines with their colored source name
    prefix: bool,
}

impl<W: Write> LogPrinter<W> {
    pub fn new(out: W, window: Duration, prefix: bool) -> Self {
        Self {
            out,
            window,
            prefix,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Print lines until the channel closes or `cancel` fires
    pub async fn run(
        &mut self,
        rx: &mut mpsc::Receiver<RawLogLine>,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let mut window: Vec<RawLogLine> = Vec::new();
        let mut flush_at: Option<Pin<Box<Sleep>>> = None;

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    // Print what's already queued, without waiting for more
                    while let Ok(line) = rx.try_recv() {
                        self.buffer(&mut window, line)?;
                    }
                    return self.flush(&mut window);
                }
                line = rx.recv() => match line {
                    Some(line) => {
                        self.buffer(&mut window, line)?;
                        if flush_at.is_none() {
                            flush_at = Some(Box::pin(tokio::time::sleep(self.window)));
                        }
                    }
                    None => return self.flush(&mut window),
                },
                _ = fire(&mut flush_at) => {
                    flush_at = None;
                    self.flush(&mut window)?;
                }
            }
        }
    }

    /// Add a line to the window, or fail on a transport error nobody recovered
    fn buffer(&mut self, window: &mut Vec<RawLogLine>, line: RawLogLine) -> Result<()> {
        if line.is_silent() {
            debug!("Logs for {} ended", line.source);
            return Ok(());
        }

        if let (Some(ReadError::Transport(msg)), None) = (&line.error, &line.status) {
            self.flush(window)?;
            return Err(Error::Transport(format!(
                "read logs for {}: {}",
                line.source, msg
            )));
        }

        window.push(line);
        Ok(())
    }

    /// Print the window in order and clear it
    fn flush(&mut self, window: &mut Vec<RawLogLine>) -> Result<()> {
        let lines = std::mem::take(window);
        if lines.is_empty() {
            return Ok(());
        }

        for line in sort_window(&lines) {
            self.write_line(&line)?;
        }
        self.out.flush()?;
        Ok(())
    }

    fn write_line(&mut self, line: &ParsedLogLine) -> std::io::Result<()> {
        if let Some(status) = &line.format_override {
            // Pre-rendered by the reader
            return writeln!(self.out, "{}", status);
        }
        if self.prefix {
            writeln!(self.out, "{} › {}", colorize(&line.source), line.message)
        } else {
            writeln!(self.out, "{}", line.message)
        }
    }
}

/// Resolves when the flush timer fires; never while none is armed
async fn fire(flush_at: &mut Option<Pin<Box<Sleep>>>) {
    match flush_at {
        Some(sleep) => sleep.as_mut().await,
        None => std::future::pending().await,
    }
}
