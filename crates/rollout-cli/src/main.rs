//! Rollout - unattended deployment session runner
//!
//! Usage:
//!   rollout install              # Run the configured install action
//!   rollout uninstall --silent   # Unattended removal, no prompts
//!   rollout repair               # Repair the installed package
//!
//! The process exit code is the stable contract orchestrators branch on:
//! 0 success, 3010 success + reboot required, 1603 failure, 1618 retry
//! shortly, 1602 cancelled by user, 60012 blocked by deferral expiry.

mod capabilities;
mod prompt;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use console::style;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rollout_core::commands::{DeployCommand, DeployOptions};
use rollout_core::context::AppContext;
use rollout_core::countdown::SystemClock;
use rollout_core::process::SystemObserver;
use rollout_core::session::SessionServices;
use rollout_core::types::{DeploymentMode, DeploymentType, SessionOutcome};

use crate::capabilities::{CommandActionRunner, MarkerRebootScheduler, SystemTerminator};
use crate::prompt::ConsolePrompt;

#[derive(Parser)]
#[command(name = "rollout")]
#[command(about = "Unattended deployment session runner", long_about = None)]
struct Cli {
    /// Path to rollout.toml (defaults to the working directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Package identity override for deferral accounting
    #[arg(long)]
    package: Option<String>,

    /// Run silently: no prompts, blocking apps handled per configuration
    #[arg(long, conflicts_with = "non_interactive")]
    silent: bool,

    /// Run without a user but allow notices to be shown
    #[arg(long)]
    non_interactive: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Install the configured package
    Install,
    /// Uninstall the configured package
    Uninstall,
    /// Repair the configured package
    Repair,
}

impl Commands {
    fn deployment_type(&self) -> DeploymentType {
        match self {
            Commands::Install => DeploymentType::Install,
            Commands::Uninstall => DeploymentType::Uninstall,
            Commands::Repair => DeploymentType::Repair,
        }
    }
}

fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rollout=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let exit_code = run(cli);
    std::process::exit(exit_code);
}

fn run(cli: Cli) -> i32 {
    let ctx = match AppContext::new(cli.config) {
        Ok(ctx) => ctx,
        Err(err) => {
            eprintln!("{} {err:#}", style("error:").red().bold());
            return rollout_core::exitcode::FAILURE;
        }
    };

    let config = match ctx.config_store().load() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{} {err:#}", style("error:").red().bold());
            return rollout_core::exitcode::FAILURE;
        }
    };

    let mut options = DeployOptions::new(cli.command.deployment_type());
    if cli.silent {
        options = options.with_mode(DeploymentMode::Silent);
    } else if cli.non_interactive {
        options = options.with_mode(DeploymentMode::NonInteractive);
    }
    if let Some(package) = cli.package {
        options = options.with_package(package);
    }

    let mut observer = SystemObserver::new();
    let mut prompt = ConsolePrompt::new();
    let mut terminator = SystemTerminator::new();
    let mut runner = CommandActionRunner::new(config.action.clone());
    let mut reboot = MarkerRebootScheduler::new(config.reboot.clone());
    let clock = SystemClock;

    let mut services = SessionServices {
        observer: &mut observer,
        prompt: &mut prompt,
        terminator: &mut terminator,
        runner: &mut runner,
        reboot: &mut reboot,
        clock: &clock,
    };

    let report = DeployCommand::execute(&ctx, &config, &mut services, options);
    print_summary(&report.outcome, report.exit_code);
    report.exit_code
}

fn print_summary(outcome: &SessionOutcome, exit_code: i32) {
    let label = match outcome {
        SessionOutcome::DeploymentSuccess => style("deployment succeeded").green(),
        SessionOutcome::DeploymentSuccessRebootRequired => {
            style("deployment succeeded; reboot required").green()
        }
        SessionOutcome::DeploymentFailed => style("deployment failed").red(),
        SessionOutcome::DeploymentFastRetryNeeded => {
            style("deployment blocked; retry shortly").yellow()
        }
        SessionOutcome::DeploymentCancelledByUser => style("deployment cancelled").yellow(),
        SessionOutcome::DeploymentBlockedByDeferralExpiry => {
            style("deployment blocked after deferral expiry").red()
        }
    };
    eprintln!("\n{label} (exit code {exit_code})");
}
