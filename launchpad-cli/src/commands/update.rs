//! `launchpad update` — push the local bundle and apply launchpad.yml.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use launchpad_core::{config::DEFAULT_CONFIG_FILE, AppConfig, AppName};
use launchpad_sync::{AppUpdater, UpdateOptions, UpdateReport};

use super::connect;
use crate::GlobalArgs;

/// Arguments for `launchpad update`.
#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Application to update (defaults to `name` in the config file).
    pub name: Option<String>,

    /// Path to the application config file.
    #[arg(long, short = 'c', default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Compute the upload plan without uploading or reconfiguring anything.
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Tabled)]
struct PlanRow {
    #[tabled(rename = "file")]
    path: String,
    #[tabled(rename = "size")]
    size: u64,
    #[tabled(rename = "action")]
    action: &'static str,
}

impl UpdateArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<()> {
        let config = AppConfig::load(&self.config)
            .with_context(|| format!("failed to load {}", self.config.display()))?;
        let name = self
            .name
            .clone()
            .map(AppName::from)
            .unwrap_or_else(|| config.name.clone());
        let client = connect(global)?;

        let report = AppUpdater::new(&client, &config)
            .update(&name, UpdateOptions { dry_run: self.dry_run })
            .with_context(|| format!("update failed for '{name}'"))?;

        print_report(&report, global.verbose > 0);
        Ok(())
    }
}

fn print_report(report: &UpdateReport, detailed: bool) {
    let prefix = if report.dry_run { "[dry-run] " } else { "" };
    let elapsed = report.finished_at - report.started_at;

    println!(
        "{prefix}{} '{}' {} ({} to upload, {} reused, {} bytes) in {}ms",
        "✓".green(),
        report.app,
        if report.dry_run { "planned" } else { "updated" },
        report.plan.uploads.len(),
        report.plan.reused.len(),
        report.plan.upload_bytes(),
        elapsed.num_milliseconds()
    );

    if !detailed {
        return;
    }

    let rows: Vec<PlanRow> = report
        .plan
        .uploads
        .iter()
        .map(|e| PlanRow {
            path: e.path.display().to_string(),
            size: e.size,
            action: "upload",
        })
        .chain(report.plan.reused.iter().map(|e| PlanRow {
            path: e.path.display().to_string(),
            size: e.size,
            action: "reuse",
        }))
        .collect();
    if rows.is_empty() {
        return;
    }
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
}
