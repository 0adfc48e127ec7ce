//! `skiff ps`

use crossterm::style::Stylize;
use skiff_stream::ServiceStatus;

use crate::sandbox;

pub async fn run(host: Option<&str>) -> anyhow::Result<()> {
    let (auth, config) = sandbox::load()?;
    let backend = sandbox::connect(host, &auth, &config).await?;

    let services = backend.list_services().await?;
    if services.is_empty() {
        println!("No services found.");
        return Ok(());
    }

    for line in render(&services) {
        println!("{}", line);
    }
    Ok(())
}

/// Table rows, header first. Status is colored by phase.
fn render(services: &[(String, ServiceStatus)]) -> Vec<String> {
    let width = services
        .iter()
        .map(|(name, _)| name.len())
        .chain(std::iter::once("SERVICE".len()))
        .max()
        .unwrap_or(0);

    let mut lines = vec![format!("{:<width$}  {}", "SERVICE", "STATUS", width = width)];
    for (name, status) in services {
        lines.push(format!(
            "{:<width$}  {}",
            name,
            status.describe().with(status.phase.color()),
            width = width
        ));
    }
    lines
}
