//! patchscan CLI
//!
//! Reports pending OS updates of the host it runs on

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::Result;
use patchscan_exec::LocalExecutor;
use patchscan_pkg::{FetchError, LinuxUpdate, UpToDate};
use serde_json::{Value, json};
use tracing_subscriber::EnvFilter;

mod config;

use config::{Config, LoggingConfig};

#[derive(Parser)]
#[command(name = "patchscan")]
#[command(about = "Inspect pending OS package updates", long_about = None)]
struct Cli {
    /// Configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Prefix package manager commands with sudo
    #[arg(long, global = true)]
    sudo: bool,

    /// Log as JSON lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the detected OS family
    Family,
    /// List available updates
    Updates,
    /// List installed packages
    Packages,
    /// List pending patches
    Patches,
    /// Report whether the host is up to date (exit 0: yes, 1: no, 2: unknown)
    Status,
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(logging.level.as_str()));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Keep real failures, but give an unsupported host the empty result
fn or_neutral<T: Default>(result: Result<T, FetchError>) -> Result<T, FetchError> {
    match result {
        Err(e) if e.is_unsupported() => Ok(T::default()),
        other => other,
    }
}

/// Run one query and return the JSON to print with the process exit code
async fn report(command: &Commands, linux_update: &LinuxUpdate) -> Result<(Value, u8)> {
    let value = match command {
        Commands::Family => json!({
            "family": linux_update.family(),
            "supported": linux_update.is_supported(),
        }),
        Commands::Updates => {
            serde_json::to_value(or_neutral(linux_update.fetch_updates().await)?)?
        }
        Commands::Packages => {
            serde_json::to_value(or_neutral(linux_update.fetch_packages().await)?)?
        }
        Commands::Patches => {
            json!({ "patches": or_neutral(linux_update.fetch_patches().await)? })
        }
        Commands::Status => {
            let state = linux_update.up_to_date().await;
            let code = match state {
                UpToDate::UpToDate => 0,
                UpToDate::Behind => 1,
                UpToDate::Unknown => 2,
            };
            return Ok((
                json!({
                    "family": linux_update.family(),
                    "state": state,
                    "up_to_date": state.as_bool(),
                }),
                code,
            ));
        }
    };

    Ok((value, 0))
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    color_eyre::install()?;
    let cli = Cli::parse();

    let mut config = Config::load_default(cli.config.as_deref())?;
    config.logging.json |= cli.json;
    config.fetcher.use_sudo |= cli.sudo;
    init_tracing(&config.logging);

    let linux_update = LinuxUpdate::detect(Arc::new(LocalExecutor::new()), &config.fetcher).await;
    tracing::debug!(
        family = %linux_update.family(),
        supported = linux_update.is_supported(),
        "host family detected"
    );

    let (value, code) = report(&cli.command, &linux_update).await?;
    println!("{}", serde_json::to_string_pretty(&value)?);

    Ok(ExitCode::from(code))
}
