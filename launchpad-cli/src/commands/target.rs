//! `launchpad target [url]` — show or persist the hosting service URL.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use launchpad_core::settings;

use crate::GlobalArgs;

/// Arguments for `launchpad target`.
#[derive(Args, Debug)]
pub struct TargetArgs {
    /// New target URL. Omit to print the current one.
    pub url: Option<String>,
}

impl TargetArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<()> {
        let stored = settings::load().context("failed to load ~/.launchpad/config.yaml")?;

        let Some(url) = self.url else {
            let effective = stored.merge(global.overrides());
            println!("[{}]", effective.target_url());
            return Ok(());
        };

        let mut updated = stored;
        updated.target = url;
        settings::save(&updated).context("failed to save ~/.launchpad/config.yaml")?;
        println!(
            "{} Successfully targeted to [{}]",
            "✓".green(),
            updated.target_url()
        );
        Ok(())
    }
}
