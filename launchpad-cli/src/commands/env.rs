//! `launchpad env list|set|unset|clone`

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use launchpad_core::AppName;
use launchpad_sync::{env, HostingClient};

use super::connect;
use crate::GlobalArgs;

/// Inspect and edit application environment variables.
#[derive(Subcommand, Debug)]
pub enum EnvCommand {
    /// Show an application's environment variables.
    List(ListArgs),

    /// Add or update one variable.
    Set {
        app: String,
        /// `KEY=VALUE`
        assignment: String,
    },

    /// Remove one variable.
    Unset { app: String, key: String },

    /// Copy every variable of <source> onto <target>, keeping target-only keys.
    Clone { source: String, target: String },
}

#[derive(Args, Debug)]
pub struct ListArgs {
    pub app: String,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Tabled, Serialize)]
struct EnvRow {
    #[tabled(rename = "key")]
    key: String,
    #[tabled(rename = "value")]
    value: String,
}

pub fn run(cmd: EnvCommand, global: &GlobalArgs) -> Result<()> {
    let client = connect(global)?;
    match cmd {
        EnvCommand::List(args) => list(&client, args),
        EnvCommand::Set { app, assignment } => {
            let Some((key, value)) = env::parse_assignment(&assignment) else {
                bail!("expected KEY=VALUE, got '{assignment}'");
            };
            let app = AppName::from(app);
            env::set_var(&client, &app, key, value)
                .with_context(|| format!("failed to set {key} on '{app}'"))?;
            println!("{} set {key} on '{app}'", "✓".green());
            Ok(())
        }
        EnvCommand::Unset { app, key } => {
            let app = AppName::from(app);
            env::unset_var(&client, &app, &key)
                .with_context(|| format!("failed to unset {key} on '{app}'"))?;
            println!("{} unset {key} on '{app}'", "✓".green());
            Ok(())
        }
        EnvCommand::Clone { source, target } => {
            let source = AppName::from(source);
            let target = AppName::from(target);
            let result = env::clone_environment(&client, &source, &target)
                .with_context(|| format!("failed to clone environment '{source}' → '{target}'"))?;
            println!(
                "{} '{target}' now has {} environment variables (cloned from '{source}')",
                "✓".green(),
                result.env.len()
            );
            Ok(())
        }
    }
}

fn list(client: &impl HostingClient, args: ListArgs) -> Result<()> {
    let app = AppName::from(args.app);
    let manifest = client
        .get_app(&app)
        .with_context(|| format!("failed to fetch '{app}'"))?;
    let rows: Vec<EnvRow> = manifest
        .env
        .iter()
        .map(|(k, v)| EnvRow {
            key: k.to_string(),
            value: v.to_string(),
        })
        .collect();

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&rows).context("failed to serialize environment JSON")?
        );
        return Ok(());
    }

    if rows.is_empty() {
        println!("No environment variables set for '{app}'.");
        return Ok(());
    }
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
    Ok(())
}
