mod app;
mod collaborators;

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::{error, info};

use polysub_core::{init_tracing, PipelineConfig};

/// polysub process entrypoint.
#[derive(Parser, Debug)]
#[command(name = "polysub")]
#[command(about = "Subtitle pipeline engine: scheduler, worker and TTL sweep", long_about = None)]
#[command(version)]
struct Cli {
    /// Emit structured logs as JSON instead of human-readable text.
    #[arg(long, env = "POLYSUB_LOG_JSON")]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the scheduler and periodic cleaner together.
    Serve,
    /// Run the scheduler only, no cleaner sweep.
    Worker,
    /// Run one TTL sweep and exit.
    Clean,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    let config = PipelineConfig::from_env();
    if let Err(reason) = config.validate() {
        error!(%reason, "fatal configuration error");
        return ExitCode::from(1);
    }
    info!(api_host = %config.api_host, api_port = config.api_port, "configuration loaded");

    if let Some(code) = migration_required(&config) {
        error!("relational store schema migration required, refusing to start");
        return code;
    }

    match cli.command {
        Commands::Serve => run_serve(&config).await,
        Commands::Worker => run_worker(&config).await,
        Commands::Clean => run_clean(&config).await,
    }
}

async fn run_serve(config: &PipelineConfig) -> ExitCode {
    let mut wiring = app::build(config);
    wiring.scheduler.start();
    info!("scheduler started, running periodic cleaner");

    let cleaner = wiring.cleaner;
    tokio::spawn(async move {
        cleaner.run_forever().await;
    });

    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(%err, "failed to listen for shutdown signal");
        return ExitCode::from(1);
    }

    info!("shutdown signal received, draining workers");
    match wiring.scheduler.shutdown().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(%err, "scheduler shutdown failed");
            ExitCode::from(1)
        }
    }
}

async fn run_worker(config: &PipelineConfig) -> ExitCode {
    let mut wiring = app::build(config);
    wiring.scheduler.start();
    info!("worker scheduler started");

    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(%err, "failed to listen for shutdown signal");
        return ExitCode::from(1);
    }

    match wiring.scheduler.shutdown().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(%err, "scheduler shutdown failed");
            ExitCode::from(1)
        }
    }
}

async fn run_clean(config: &PipelineConfig) -> ExitCode {
    let wiring = app::build(config);
    let report = wiring.cleaner.sweep().await;
    info!(?report, "one-shot cleaner sweep complete");
    ExitCode::SUCCESS
}

/// The relational store (`DB_URL`) is an external collaborator this
/// workspace doesn't wire a concrete driver for, so there is no
/// schema version to compare against yet. This always returns `None`; it
/// documents where exit code 2 belongs once a real store is plugged in.
fn migration_required(_config: &PipelineConfig) -> Option<ExitCode> {
    None
}
