//! # crosspost CLI Interface (Module)
//!
//! This module implements the full CLI interface for crosspost, handling
//! command parsing, argument validation, main entrypoints, and user-visible
//! invocations.
//!
//! All core business logic (policy checks, lifecycle moves, the pipeline)
//! lives in the `crosspost-core` crate. This module is strictly for CLI glue,
//! ergonomic argument exposure, and orchestration.
//!
//! ## Features
//! - Entry struct [`Cli`] defines all user-facing options and subcommands.
//! - Running with no subcommand performs a full pipeline run, so a cron entry
//!   is just the bare binary.
//! - Async entrypoint ([`run`]) for programmatic invocation and integration
//!   testing.
//! - The process exit code reflects the run: non-zero when any item was
//!   quarantined, failed, or left behind by a failed file move.
//!
//! ## How To Use
//! - For command-line users: use the installed `crosspost` binary with `--help`.
//! - For programmatic/integration use: call [`run`] with a constructed [`Cli`].
//!
//! ## Extending
//! When adding subcommands, update [`Commands`] below and keep all
//! non-trivial business logic inside `crosspost-core`.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use futures::future::join_all;

use crosspost_core::pipeline::{Disposition, Orchestrator, RunReport};

use crate::load_config::{load_config, LoadedConfig};
use crate::platforms;

/// CLI for crosspost: check media against policy and publish it everywhere.
#[derive(Parser)]
#[clap(
    name = "crosspost",
    version,
    about = "Check a directory of media against content policy and cross-post it to Facebook, YouTube, Instagram and TikTok"
)]
pub struct Cli {
    /// Path to the YAML config file
    #[clap(long, global = true, default_value = "crosspost.yaml")]
    pub config: PathBuf,

    #[clap(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the full pipeline once: discover, check, publish, file away (the default)
    Run,
    /// Report credential status for every configured platform without publishing
    Check,
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli.config);
    config.trace_loaded();

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_pipeline(&config).await,
        Commands::Check => check_credentials(&config).await,
    }
}

async fn run_pipeline(config: &LoadedConfig) -> Result<()> {
    let registry = platforms::build_registry(&config.platforms);
    tracing::info!(command = "run", "Starting publishing run");

    let orchestrator = Orchestrator::new(
        config.policy.clone(),
        &config.directories,
        config.targets.clone(),
        config.publish_timeout,
    );
    let report = match orchestrator.run(&registry).await {
        Ok(report) => report,
        Err(e) => {
            tracing::error!(command = "run", error = %e, "Publishing run failed");
            return Err(e.into());
        }
    };

    render_report(&report);

    let summary = report.summary();
    if report.has_failures() {
        anyhow::bail!(
            "run finished with failures: {} published, {} quarantined, {} failed of {} total",
            summary.published,
            summary.quarantined,
            summary.failed,
            summary.total
        );
    }
    Ok(())
}

fn render_report(report: &RunReport) {
    for result in &report.results {
        match result.disposition {
            Disposition::Processed => {
                let platforms: Vec<&str> = result
                    .outcomes
                    .values()
                    .filter(|o| o.success)
                    .map(|o| o.platform.as_str())
                    .collect();
                println!(
                    "  ✓ PASS: {} - published to {}",
                    result.file_name,
                    platforms.join(", ")
                );
            }
            Disposition::Quarantined => {
                println!(
                    "  ✗ FAIL: {} - {} (quarantined)",
                    result.file_name,
                    result.reason.as_deref().unwrap_or("policy violation")
                );
            }
            Disposition::Failed => {
                println!(
                    "  ✗ FAIL: {} - no platform accepted the upload (moved to failed)",
                    result.file_name
                );
            }
        }
        if let Some(e) = &result.lifecycle_error {
            println!("    ! file move failed: {e}");
        }
    }
    let summary = report.summary();
    println!(
        "Run {} complete: {} total, {} published, {} quarantined, {} failed",
        report.run_id, summary.total, summary.published, summary.quarantined, summary.failed
    );
}

async fn check_credentials(config: &LoadedConfig) -> Result<()> {
    let registry = platforms::build_registry(&config.platforms);
    tracing::info!(command = "check", "Probing platform credentials");

    if registry.is_empty() {
        println!("No platforms configured; set credentials in the config file or environment.");
        return Ok(());
    }

    let probes = registry.iter().map(|(name, publisher)| async move {
        let valid = publisher.validate_credentials();
        let authenticated = if valid { publisher.authenticate().await } else { false };
        (name, valid, authenticated)
    });
    for (name, valid, authenticated) in join_all(probes).await {
        let status = if !valid {
            "credentials missing"
        } else if authenticated {
            "credentials ok, authenticated"
        } else {
            "credentials present, authentication failed"
        };
        println!("  {name}: {status}");
    }
    Ok(())
}
