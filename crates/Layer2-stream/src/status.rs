//! Service status signals
//!
//! A [`StatusBoard`] holds the latest known status of every service, fed by a
//! poller. Readers hold a [`StatusSubscription`] and wait on its two signals:
//! "exited" and "became running again".

use chrono::{DateTime, Utc};
use crossterm::style::Color;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::watch;

/// Lifecycle phase of a service's container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ServicePhase {
    /// Not polled yet
    #[default]
    Unknown,
    /// Created but not started
    Pending,
    Running,
    Exited,
}

impl ServicePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServicePhase::Unknown => "Unknown",
            ServicePhase::Pending => "Pending",
            ServicePhase::Running => "Running",
            ServicePhase::Exited => "Exited",
        }
    }

    /// Color used when listing services
    pub fn color(&self) -> Color {
        match self {
            ServicePhase::Running => Color::Green,
            ServicePhase::Exited => Color::Red,
            _ => Color::Yellow,
        }
    }
}

/// Latest known status of one service
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceStatus {
    pub phase: ServicePhase,

    /// Start time of the current container instance. Changes on restart.
    pub started_at: Option<DateTime<Utc>>,

    pub exit_code: Option<i64>,

    /// Extra detail from the runtime (e.g. an OOM kill or error)
    pub message: Option<String>,
}

impl ServiceStatus {
    pub fn running(started_at: DateTime<Utc>) -> Self {
        Self {
            phase: ServicePhase::Running,
            started_at: Some(started_at),
            ..Default::default()
        }
    }

    pub fn exited(started_at: Option<DateTime<Utc>>, exit_code: Option<i64>) -> Self {
        Self {
            phase: ServicePhase::Exited,
            started_at,
            exit_code,
            ..Default::default()
        }
    }

    /// One-line description, e.g. `Exited (1): OOMKilled`
    pub fn describe(&self) -> String {
        let mut msg = self.phase.as_str().to_string();
        if let (ServicePhase::Exited, Some(code)) = (self.phase, self.exit_code) {
            msg.push_str(&format!(" ({})", code));
        }
        if let Some(detail) = self.message.as_deref().filter(|m| !m.is_empty()) {
            msg.push_str(": ");
            msg.push_str(detail);
        }
        msg
    }
}

/// Shared registry of per-service status channels
#[derive(Debug, Clone, Default)]
pub struct StatusBoard {
    channels: Arc<RwLock<HashMap<String, watch::Sender<ServiceStatus>>>>,
}

impl StatusBoard {
    pub fn new() -> Self {
        Self::default()
    }

    fn sender(&self, service: &str) -> watch::Sender<ServiceStatus> {
        if let Some(tx) = self.channels.read().get(service) {
            return tx.clone();
        }
        self.channels
            .write()
            .entry(service.to_string())
            .or_insert_with(|| watch::channel(ServiceStatus::default()).0)
            .clone()
    }

    /// Record a service's status. Returns whether it changed.
    pub fn publish(&self, service: &str, status: ServiceStatus) -> bool {
        self.sender(service).send_if_modified(|current| {
            if *current == status {
                false
            } else {
                *current = status;
                true
            }
        })
    }

    pub fn subscribe(&self, service: &str) -> StatusSubscription {
        let rx = self.sender(service).subscribe();
        let instance = rx.borrow().started_at;
        StatusSubscription { rx, instance }
    }
}

/// One reader's view of a service's status
#[derive(Debug)]
pub struct StatusSubscription {
    rx: watch::Receiver<ServiceStatus>,

    /// Instance the reader last saw start or stop
    instance: Option<DateTime<Utc>>,
}

impl StatusSubscription {
    /// Resolves once the service is observed as exited
    pub async fn exited(&mut self) {
        let status = self
            .rx
            .wait_for(|s| s.phase == ServicePhase::Exited)
            .await
            .map(|s| s.clone());
        match status {
            Ok(status) => self.mark_instance(status.started_at),
            // Board dropped: the service can no longer be observed exiting
            Err(_) => std::future::pending::<()>().await,
        }
    }

    /// Resolves once a container instance other than the last one seen is running
    pub async fn became_running(&mut self) {
        let known = self.instance;
        let status = self
            .rx
            .wait_for(|s| s.phase == ServicePhase::Running && s.started_at != known)
            .await
            .map(|s| s.clone());
        match status {
            Ok(status) => self.mark_instance(status.started_at),
            Err(_) => std::future::pending::<()>().await,
        }
    }

    /// Acknowledge a container instance; `became_running` waits for another
    pub fn mark_instance(&mut self, started_at: Option<DateTime<Utc>>) {
        self.instance = started_at;
    }
}
