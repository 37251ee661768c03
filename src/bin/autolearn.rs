//! CLI binary for autolearn.

use autolearn::gateway;
use autolearn::paths;
use autolearn::state::StateFile;
use autolearn::{LearnConfig, LearnedRecord, LearningService};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Autolearn: a background learning loop over web search.
#[derive(Parser)]
#[command(name = "autolearn", version, about)]
struct Cli {
    /// Path to TOML configuration file.
    #[arg(short, long, env = "AUTOLEARN_CONFIG")]
    config: Option<PathBuf>,

    /// Subcommand to run.
    #[command(subcommand)]
    command: Command,
}

/// Available commands.
#[derive(Subcommand)]
enum Command {
    /// Run the HTTP gateway and the background scheduler.
    Serve {
        /// Override the configured listen host.
        #[arg(long)]
        host: Option<String>,
        /// Override the configured listen port.
        #[arg(long)]
        port: Option<u16>,
        /// Do not start the scheduler, whatever the config says.
        #[arg(long)]
        no_scheduler: bool,
    },

    /// Run one learning cycle and print the report.
    Cycle {
        /// Topic to learn instead of the configured list. Repeatable.
        #[arg(long = "topic")]
        topics: Vec<String>,
    },

    /// Print the most recent learned records.
    Recent {
        #[arg(short = 'n', long, default_value_t = 10)]
        limit: usize,
        /// Print raw JSON records.
        #[arg(long)]
        json: bool,
    },

    /// Print the persisted scheduler state.
    Status,

    /// Write a default configuration file.
    InitConfig {
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(LearnConfig::default_config_path);

    if let Command::InitConfig { force } = cli.command {
        return init_config(config_path, force);
    }

    let config = LearnConfig::load(&config_path)?;
    let log_dir = matches!(cli.command, Command::Serve { .. })
        .then(|| paths::logs_dir(&config.data_dir()));
    let _log_guard = autolearn::logging::init(log_dir.as_deref())?;

    match cli.command {
        Command::Serve {
            host,
            port,
            no_scheduler,
        } => serve(config, host, port, no_scheduler).await,
        Command::Cycle { topics } => run_cycle(&config, topics).await,
        Command::Recent { limit, json } => print_recent(&config, limit, json).await,
        Command::Status => print_status(&config),
        Command::InitConfig { .. } => Ok(()),
    }
}

async fn serve(
    mut config: LearnConfig,
    host: Option<String>,
    port: Option<u16>,
    no_scheduler: bool,
) -> anyhow::Result<()> {
    if let Some(host) = host {
        config.gateway.host = host;
    }
    if let Some(port) = port {
        config.gateway.port = port;
    }

    let service = Arc::new(LearningService::from_config(&config)?);
    if config.scheduler.autostart && !no_scheduler {
        service.scheduler_start(None, None)?;
    }

    let cancel = CancellationToken::new();
    let cancel_clone = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("received Ctrl+C, shutting down");
            cancel_clone.cancel();
        }
    });

    let shutdown = cancel.clone();
    let result = gateway::run_gateway(&config.gateway, Arc::clone(&service), async move {
        shutdown.cancelled().await;
    })
    .await;

    service.shutdown().await;
    result?;
    Ok(())
}

async fn run_cycle(config: &LearnConfig, topics: Vec<String>) -> anyhow::Result<()> {
    let service = LearningService::from_config(config)?;
    let topics = (!topics.is_empty()).then_some(topics);
    let report = service.run_cycle_now(topics.as_deref()).await;
    println!("{}", report.summary_message);
    Ok(())
}

async fn print_recent(config: &LearnConfig, limit: usize, json: bool) -> anyhow::Result<()> {
    let service = LearningService::from_config(config)?;
    let records = service.recent_results(limit).await?;
    if records.is_empty() {
        println!("No learned records yet.");
        return Ok(());
    }
    for record in &records {
        if json {
            println!("{}", serde_json::to_string(record)?);
        } else {
            print_record(record);
        }
    }
    Ok(())
}

fn print_record(record: &LearnedRecord) {
    let marker = if record.is_error() { " [error]" } else { "" };
    println!(
        "{} {:?} ({} results){marker}",
        record.timestamp.format("%Y-%m-%d %H:%M:%S"),
        record.query,
        record.results.len()
    );
    for line in record.summary.lines() {
        println!("    {line}");
    }
    println!();
}

fn print_status(config: &LearnConfig) -> anyhow::Result<()> {
    let state = StateFile::new(paths::state_file(&config.data_dir())).load()?;
    println!("{}", serde_json::to_string_pretty(&state)?);
    Ok(())
}

fn init_config(path: PathBuf, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists; pass --force to overwrite",
            path.display()
        );
    }
    LearnConfig::default().save_to_file(&path)?;
    println!("Wrote default config to {}", path.display());
    Ok(())
}
