mod cmd;
mod output;

use anyhow::Context;
use clap::{Parser, Subcommand};
use cmd::config::ConfigSubcommand;
use fanout_core::config::Config;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "fanout",
    about = "Concurrent fan-out/fan-in executor — run worker batches locally or over HTTP",
    version,
    propagate_version = true
)]
struct Cli {
    /// Config file (default: ./fanout.yaml if present, else built-in defaults)
    #[arg(long, global = true, env = "FANOUT_CONFIG")]
    config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Address to bind (overrides server.host)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on, 0 = OS-assigned (overrides server.port)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Run one batch of workers and print their records
    Run {
        /// Number of workers (default: tasks.default_count)
        #[arg(long, short = 'n', allow_negative_numbers = true)]
        count: Option<i64>,
    },

    /// Print the current time
    Time {
        /// Include milliseconds
        #[arg(long)]
        precise: bool,
    },

    /// Inspect the configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Serve { .. } => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = dispatch(cli) {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn dispatch(cli: Cli) -> anyhow::Result<()> {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let config =
        Config::load(cli.config.as_deref(), &cwd).context("failed to load configuration")?;

    match cli.command {
        Commands::Serve { host, port } => cmd::serve::run(config, host, port),
        Commands::Run { count } => cmd::run::run(&config, count, cli.json),
        Commands::Time { precise } => cmd::time::run(&config, precise, cli.json),
        Commands::Config { subcommand } => cmd::config::run(&config, subcommand, cli.json),
    }
}
