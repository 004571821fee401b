//! `launchpad check [path]` — local containment check, no network.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use launchpad_sync::{bundle, containment};

/// Arguments for `launchpad check`.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Bundle root to inspect.
    #[arg(default_value = ".")]
    pub path: PathBuf,
}

impl CheckArgs {
    pub fn run(self) -> Result<()> {
        let local = bundle::scan(&self.path)
            .with_context(|| format!("failed to scan {}", self.path.display()))?;
        containment::validate(local.root(), &local.entries)?;

        println!(
            "{} {} contained ({} files, {} links, {} bytes)",
            "✓".green(),
            self.path.display(),
            local.files().count(),
            local.links().count(),
            local.total_size()
        );
        Ok(())
    }
}
