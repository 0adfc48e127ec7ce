//! Sandbox connection shared by the commands

use anyhow::Context;
use skiff_foundation::{AuthStore, SkiffConfig};
use skiff_stream::DockerBackend;
use tracing::debug;

/// Endpoint precedence: `--host`, then login, then config, then local defaults
pub fn pick_host<'a>(
    flag: Option<&'a str>,
    auth: &'a AuthStore,
    config: &'a SkiffConfig,
) -> Option<&'a str> {
    flag.or(auth.sandbox_host.as_deref())
        .or(config.docker_host.as_deref())
}

/// Credentials and config for a command that talks to the sandbox
pub fn load() -> anyhow::Result<(AuthStore, SkiffConfig)> {
    let auth = AuthStore::load().context("Failed to read credentials")?;
    auth.require_login()?;
    let config = SkiffConfig::load().context("Failed to load config")?;
    Ok((auth, config))
}

pub async fn connect(
    flag: Option<&str>,
    auth: &AuthStore,
    config: &SkiffConfig,
) -> anyhow::Result<DockerBackend> {
    let host = pick_host(flag, auth, config);
    debug!("Connecting to sandbox at {}", host.unwrap_or("local defaults"));

    let backend = DockerBackend::connect(host)?.with_project(config.project.clone());
    backend.ping().await.context("Failed to connect to sandbox")?;
    Ok(backend)
}
