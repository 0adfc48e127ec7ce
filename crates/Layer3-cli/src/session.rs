//! `skiff login` / `skiff logout`

use anyhow::Context;
use skiff_foundation::{AuthStore, JsonStore};
use tracing::info;

pub fn login(token: &str, host: Option<String>) -> anyhow::Result<()> {
    let token = token.trim();
    if token.is_empty() {
        anyhow::bail!("The token must not be empty");
    }

    let auth = AuthStore {
        auth_token: token.to_string(),
        sandbox_host: host,
    };
    auth.save().context("Failed to save credentials")?;
    info!("Saved credentials (sandbox: {:?})", auth.sandbox_host);

    println!("Logged in.");
    Ok(())
}

pub fn logout() -> anyhow::Result<()> {
    let store = JsonStore::global()?;
    AuthStore::clear_from(&store).context("Failed to remove credentials")?;
    println!("Logged out.");
    Ok(())
}
