use std::path::PathBuf;

use clap::{Parser, Subcommand};
use lolstalk::{Config, OutputFormat, StalkClient};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Parser)]
#[command(name = "lolstalk", version, about = "Stalk League of Legends amateur rosters and tournaments")]
struct Cli {
    /// Config file; defaults to ./config.toml when present.
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List every team and player behind a tournament, league or match URL.
    Stalk {
        url: String,
        /// Look up every player's rank.
        #[arg(short, long)]
        extended: bool,
        /// Print a full report instead of a condensed overview.
        #[arg(short, long)]
        report: bool,
    },
    /// Scrape upcoming tournaments, e.g. `scrape bat 5v5 week`.
    Scrape {
        #[arg(required = true, num_args = 1..)]
        args: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> lolstalk::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::load_default()?,
    };
    init_logging(&config.log_level);
    debug!(?config, "configuration loaded");

    let client = StalkClient::with_config(config)?;
    let output = match cli.command {
        Command::Stalk {
            url,
            extended,
            report,
        } => {
            let format = if report {
                OutputFormat::Report
            } else {
                OutputFormat::Chat
            };
            info!(%url, extended, %format, "stalk requested");
            client.stalk(&url, extended, format).await
        }
        Command::Scrape { args } => {
            info!(?args, "scrape requested");
            client.scrape(&args).await
        }
    };

    println!("{output}");
    Ok(())
}

fn init_logging(log_level: &str) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}
