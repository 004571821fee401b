pub mod check;
pub mod env;
pub mod target;
pub mod update;

use anyhow::{Context, Result};
use launchpad_core::settings;
use launchpad_http::{HttpClient, TransportConfig};

use crate::GlobalArgs;

/// Build an HTTP client from stored settings plus command-line overrides.
pub(crate) fn connect(global: &GlobalArgs) -> Result<HttpClient> {
    let stored = settings::load().context("failed to load ~/.launchpad/config.yaml")?;
    let settings = stored.merge(global.overrides());
    tracing::debug!("target: {}", settings.target_url());
    HttpClient::new(TransportConfig::from_settings(&settings))
        .with_context(|| format!("cannot reach target '{}'", settings.target))
}
