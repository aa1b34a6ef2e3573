//! hooked-jenkins entry point.
//!
//! This binary is the composition root. Responsibilities:
//!
//! 1. **Parse arguments** with `clap`.
//! 2. **Wire observability**: a JSON `tracing-subscriber` layer, plus an
//!    OpenTelemetry OTLP exporter when one is configured (see [`telemetry`]).
//! 3. **Load configuration**: read the JSON document named by `--config`.
//!    Any failure here exits with status 31.
//! 4. **Construct infrastructure**: a [`jenkins::JenkinsClient`] injected into
//!    the webhook listener, which then runs until the process is stopped.

mod telemetry;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use jenkins::JenkinsClient;
use tracing::{error, info, warn};
use triggers::Config;

use crate::telemetry::LogLevel;

/// Exit status used when the configuration cannot be read or parsed.
const CONFIG_ERROR_EXIT_CODE: u8 = 31;

/// Receives GitHub webhooks and starts Jenkins jobs.
#[derive(Parser, Debug)]
#[command(name = "hooked-jenkins", author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Starts the webhook listener.
    Start {
        /// Path to the JSON configuration file
        #[arg(short, long)]
        config: PathBuf,

        /// Log level (overrides RUST_LOG)
        #[arg(long, value_enum, ignore_case = true)]
        loglevel: Option<LogLevel>,
    },
    /// Prints the version.
    Version,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Command::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            ExitCode::SUCCESS
        }
        Command::Start { config, loglevel } => {
            let telemetry = match telemetry::init(loglevel) {
                Ok(t) => t,
                Err(e) => {
                    eprintln!("{e:#}");
                    return ExitCode::FAILURE;
                }
            };
            let code = start(&config).await;
            telemetry.shutdown();
            code
        }
    }
}

async fn start(path: &Path) -> ExitCode {
    let config = match load_config(path) {
        Ok(config) => config,
        Err(e) => {
            error!(path = %path.display(), error = %format!("{e:#}"), "Error reading config file");
            return ExitCode::from(CONFIG_ERROR_EXIT_CODE);
        }
    };

    match run(Arc::new(config)).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %format!("{e:#}"), "Listener stopped");
            ExitCode::FAILURE
        }
    }
}

fn load_config(path: &Path) -> anyhow::Result<Config> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let config = Config::from_json(&text)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    config.port()?;

    for id in config.duplicate_endpoints() {
        warn!(endpoint = %id, "Duplicate endpoint id; the last definition is used");
    }
    Ok(config)
}

async fn run(config: Arc<Config>) -> anyhow::Result<()> {
    let jenkins = JenkinsClient::new(&config.jenkins).context("failed to build Jenkins client")?;
    info!(
        base_url = %config.jenkins.base_url,
        triggers = config.triggers.len(),
        forward_targets = config.forward.len(),
        "Configuration loaded"
    );

    listener::serve(config, Arc::new(jenkins)).await?;
    Ok(())
}
