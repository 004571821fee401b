//! Launchpad — push applications to a hosting service and manage their environment.
//!
//! # Usage
//!
//! ```text
//! launchpad update [<name>] [--config launchpad.yml] [--dry-run]
//! launchpad check [<path>]
//! launchpad target [<url>]
//! launchpad env list <app> [--json]
//! launchpad env set <app> KEY=VALUE
//! launchpad env unset <app> KEY
//! launchpad env clone <source> <target>
//! ```
//!
//! Global flags: `--target`, `--token`, `--proxy`, `-v`.

mod commands;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};

use commands::{check::CheckArgs, env::EnvCommand, target::TargetArgs, update::UpdateArgs};
use launchpad_core::settings::SettingsOverrides;

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "launchpad",
    version,
    about = "Deploy applications and propagate their configuration",
    long_about = None,
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Connection flags shared by every networked command.
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Hosting service URL (overrides ~/.launchpad/config.yaml).
    #[arg(long, global = true, env = "LAUNCHPAD_TARGET")]
    pub target: Option<String>,

    /// Authentication token for an already-established session.
    #[arg(long, global = true, env = "LAUNCHPAD_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// HTTP proxy handed to the transport.
    #[arg(long, global = true, env = "LAUNCHPAD_PROXY")]
    pub proxy: Option<String>,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl GlobalArgs {
    pub fn overrides(&self) -> SettingsOverrides {
        SettingsOverrides {
            target: self.target.clone(),
            token: self.token.clone(),
            proxy: self.proxy.clone(),
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Upload the local bundle and apply launchpad.yml to a deployed application.
    Update(UpdateArgs),

    /// Verify that every link in a bundle stays inside it. No network access.
    Check(CheckArgs),

    /// Show the hosting service URL, or save a new one.
    Target(TargetArgs),

    /// Inspect and edit application environment variables.
    Env {
        #[command(subcommand)]
        command: EnvCommand,
    },
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.global.verbose);
    match cli.command {
        Commands::Update(args) => args.run(&cli.global),
        Commands::Check(args) => args.run(),
        Commands::Target(args) => args.run(&cli.global),
        Commands::Env { command } => commands::env::run(command, &cli.global),
    }
}

fn init_tracing(verbose: u8) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
