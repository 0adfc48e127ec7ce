//! Docker backend - sandbox logs and status through the Docker Engine API
//!
//! The sandbox exposes a Docker endpoint. Services are compose services,
//! found through their `com.docker.compose.service` label, falling back to a
//! container of the same name.

use async_trait::async_trait;
use bollard::container::{InspectContainerOptions, ListContainersOptions, LogOutput, LogsOptions};
use bollard::models::{ContainerState, ContainerStateStatusEnum, ContainerSummary};
use bollard::Docker;
use chrono::{DateTime, Datelike, Utc};
use futures::{StreamExt, TryStreamExt};
use skiff_foundation::{Error, Result};
use std::collections::HashMap;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::io::StreamReader;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::provider::{LineStream, LogOptions, LogProvider};
use crate::status::{ServicePhase, ServiceStatus, StatusBoard};

/// Compose label naming a container's service
pub const SERVICE_LABEL: &str = "com.docker.compose.service";

/// Compose label naming a container's project
pub const PROJECT_LABEL: &str = "com.docker.compose.project";

/// Request timeout for non-streaming calls (seconds)
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Docker Engine client scoped to one compose project
#[derive(Debug, Clone)]
pub struct DockerBackend {
    docker: Docker,
    project: Option<String>,
}

impl DockerBackend {
    /// Connect to `host` (`tcp://` / `http://`), or the local defaults
    pub fn connect(host: Option<&str>) -> Result<Self> {
        let docker = match host {
            Some(host) => {
                Docker::connect_with_http(host, DEFAULT_TIMEOUT_SECS, bollard::API_DEFAULT_VERSION)
            }
            None => Docker::connect_with_local_defaults(),
        }
        .map_err(|e| Error::transport("connect to sandbox", e))?;

        Ok(Self {
            docker,
            project: None,
        })
    }

    pub fn with_project(mut self, project: Option<String>) -> Self {
        self.project = project;
        self
    }

    /// Check the endpoint answers
    pub async fn ping(&self) -> Result<()> {
        self.docker
            .ping()
            .await
            .map(|_| ())
            .map_err(|e| Error::transport("ping sandbox", e))
    }

    fn label_filters(&self, service: Option<&str>) -> HashMap<String, Vec<String>> {
        let mut labels = vec![match service {
            Some(service) => format!("{}={}", SERVICE_LABEL, service),
            None => SERVICE_LABEL.to_string(),
        }];
        if let Some(project) = &self.project {
            labels.push(format!("{}={}", PROJECT_LABEL, project));
        }

        let mut filters = HashMap::new();
        filters.insert("label".to_string(), labels);
        filters
    }

    async fn list(&self, service: Option<&str>) -> Result<Vec<ContainerSummary>> {
        let options = ListContainersOptions::<String> {
            all: true,
            filters: self.label_filters(service),
            ..Default::default()
        };
        self.docker
            .list_containers(Some(options))
            .await
            .map_err(|e| Error::transport("list containers", e))
    }

    /// Container id (or name) for a service
    pub async fn resolve(&self, service: &str) -> Result<String> {
        if let Some(id) = self.list(Some(service)).await?.into_iter().find_map(|c| c.id) {
            return Ok(id);
        }

        // Not a compose service: try a container of that name
        match self
            .docker
            .inspect_container(service, None::<InspectContainerOptions>)
            .await
        {
            Ok(found) => Ok(found.id.unwrap_or_else(|| service.to_string())),
            Err(bollard::errors::Error::DockerResponseServerError {
                status_code: 404, ..
            }) => Err(Error::ServiceNotFound(service.to_string())),
            Err(e) => Err(Error::transport(&format!("inspect {}", service), e)),
        }
    }

    pub async fn inspect_status(&self, service: &str) -> Result<ServiceStatus> {
        let container = self.resolve(service).await?;
        let inspected = self
            .docker
            .inspect_container(&container, None::<InspectContainerOptions>)
            .await
            .map_err(|e| Error::transport(&format!("inspect {}", service), e))?;

        Ok(inspected
            .state
            .as_ref()
            .map(status_from_state)
            .unwrap_or_default())
    }

    /// Fail unless the service has started at least once
    pub async fn ensure_started(&self, service: &str) -> Result<ServiceStatus> {
        let status = self.inspect_status(service).await?;
        if status.started_at.is_none() && status.phase != ServicePhase::Running {
            return Err(Error::ServiceNotStarted(service.to_string()));
        }
        Ok(status)
    }

    /// Every service of the project with its status, sorted by name
    pub async fn list_services(&self) -> Result<Vec<(String, ServiceStatus)>> {
        let mut services: Vec<_> = self
            .list(None)
            .await?
            .iter()
            .filter_map(|summary| {
                let name = summary.labels.as_ref()?.get(SERVICE_LABEL)?.clone();
                Some((name, status_from_summary(summary)))
            })
            .collect();
        services.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(services)
    }
}

#[async_trait]
impl LogProvider for DockerBackend {
    async fn open(&self, service: &str, options: &LogOptions) -> Result<LineStream> {
        let container = self.resolve(service).await?;

        let until = if options.previous {
            let status = self.inspect_status(service).await?;
            let started = status
                .started_at
                .ok_or_else(|| Error::ServiceNotStarted(service.to_string()))?;
            started.timestamp()
        } else {
            0
        };

        let logs_options = LogsOptions::<String> {
            follow: options.follow,
            stdout: true,
            stderr: true,
            timestamps: options.timestamps,
            // Whole seconds only; readers drop the overlap themselves
            since: options.since.map(|ts| ts.timestamp()).unwrap_or(0),
            until,
            tail: "all".to_string(),
            ..Default::default()
        };
        debug!(
            "Opening logs for {} ({}): follow={} since={}",
            service, container, logs_options.follow, logs_options.since
        );

        let docker = self.docker.clone();
        let service = service.to_string();
        let stream = async_stream::try_stream! {
            let frames = Box::pin(
                docker
                    .logs(&container, Some(logs_options))
                    .map_ok(LogOutput::into_bytes)
                    .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e)),
            );
            let mut lines = BufReader::new(StreamReader::new(frames)).lines();

            while let Some(line) = lines
                .next_line()
                .await
                .map_err(|e| Error::transport(&format!("log stream of {}", service), e))?
            {
                yield line.trim_end_matches('\r').to_string();
            }
        };

        Ok(stream.boxed())
    }

    fn name(&self) -> &'static str {
        "docker"
    }
}

/// Map a container's inspected state to a service status
pub fn status_from_state(state: &ContainerState) -> ServiceStatus {
    let phase = match state.status {
        Some(ContainerStateStatusEnum::RUNNING) | Some(ContainerStateStatusEnum::PAUSED) => {
            ServicePhase::Running
        }
        Some(ContainerStateStatusEnum::EXITED) | Some(ContainerStateStatusEnum::DEAD) => {
            ServicePhase::Exited
        }
        Some(ContainerStateStatusEnum::CREATED) | Some(ContainerStateStatusEnum::RESTARTING) => {
            ServicePhase::Pending
        }
        _ if state.running == Some(true) => ServicePhase::Running,
        _ => ServicePhase::Unknown,
    };

    let message = if state.oom_killed == Some(true) {
        Some("OOMKilled".to_string())
    } else {
        state.error.clone().filter(|e| !e.is_empty())
    };

    ServiceStatus {
        phase,
        started_at: state.started_at.as_deref().and_then(parse_docker_time),
        exit_code: (phase == ServicePhase::Exited).then_some(state.exit_code).flatten(),
        message,
    }
}

fn status_from_summary(summary: &ContainerSummary) -> ServiceStatus {
    let phase = match summary.state.as_deref() {
        Some("running") | Some("paused") => ServicePhase::Running,
        Some("exited") | Some("dead") => ServicePhase::Exited,
        Some("created") | Some("restarting") => ServicePhase::Pending,
        _ => ServicePhase::Unknown,
    };
    ServiceStatus {
        phase,
        message: summary.status.clone(),
        ..Default::default()
    }
}

/// Docker reports never-started containers as year 1
fn parse_docker_time(raw: &str) -> Option<DateTime<Utc>> {
    crate::timestamp::parse_timestamp(raw)
        .ok()
        .filter(|ts| ts.year() > 1)
}

/// Polls service status into a [`StatusBoard`]
pub struct StatusPoller {
    backend: DockerBackend,
    board: StatusBoard,
    services: Vec<String>,
    interval: Duration,
}

impl StatusPoller {
    pub fn new(
        backend: DockerBackend,
        board: StatusBoard,
        services: Vec<String>,
        interval: Duration,
    ) -> Self {
        Self {
            backend,
            board,
            services,
            interval,
        }
    }

    /// Poll until cancelled
    pub async fn run(self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return,
                _ = ticker.tick() => {}
            }

            for service in &self.services {
                match self.backend.inspect_status(service).await {
                    Ok(status) => {
                        let described = status.describe();
                        if self.board.publish(service, status) {
                            info!("{} is now {}", service, described);
                        }
                    }
                    Err(e) => warn!("Failed to get status of {}: {}", service, e),
                }
            }
        }
    }
}
