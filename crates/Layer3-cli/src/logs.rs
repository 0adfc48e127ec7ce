//! `skiff logs`

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use skiff_stream::{LogsCommand, StatusBoard, StatusPoller, StreamSettings};

use crate::{sandbox, signal};

pub async fn run(
    services: Vec<String>,
    follow: bool,
    previous: bool,
    host: Option<&str>,
) -> anyhow::Result<()> {
    let (auth, config) = sandbox::load()?;

    let settings = StreamSettings::from_config(&config.logs, follow, previous);
    let command = LogsCommand::new(services, settings)?;

    let backend = sandbox::connect(host, &auth, &config).await?;
    let board = StatusBoard::new();
    for service in command.services() {
        let status = backend.ensure_started(service).await?;
        debug!("{}: {}", service, status.describe());
        board.publish(service, status);
    }

    let cancel = CancellationToken::new();
    signal::cancel_on_shutdown(cancel.clone());

    // Exit and restart signals only matter while following
    let poller = command.settings().follows().then(|| {
        let poller = StatusPoller::new(
            backend.clone(),
            board.clone(),
            command.services().to_vec(),
            config.logs.status_poll_interval(),
        );
        tokio::spawn(poller.run(cancel.clone()))
    });

    let result = command
        .run(Arc::new(backend), &board, std::io::stdout(), &cancel)
        .await;

    cancel.cancel();
    if let Some(poller) = poller {
        let _ = poller.await;
    }

    Ok(result?)
}
