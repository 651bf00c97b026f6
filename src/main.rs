//! churn-guard CLI: serve the API or run one workflow step.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use churn_guard::config::load_config;
use churn_guard::context::ServiceContext;

/// Customer-churn model training, promotion and batch prediction
#[derive(Parser, Debug)]
#[command(name = "churn-guard", version, about, long_about = None)]
struct Cli {
    /// Configuration file (defaults to $config_path, then ./configs/parameters.yaml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve the HTTP API
    Serve {
        /// Override the configured bind address
        #[arg(long)]
        host: Option<String>,
        /// Override the configured port
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Train a model and record the run
    Train,
    /// Select, register and maybe promote the best run
    Deploy,
    /// Score the data table with the production model
    Predict,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let default_filter = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_filter(filter),
        )
        .init();

    let config = load_config(cli.config.as_deref()).context("loading configuration")?;
    let server = config.server.clone();
    let context = ServiceContext::from_config(config).context("opening stores")?;

    match cli.command {
        Commands::Serve { host, port } => {
            let host = host.unwrap_or(server.host);
            let port = port.unwrap_or(server.port);
            let addr: SocketAddr = format!("{host}:{port}")
                .parse()
                .with_context(|| format!("invalid bind address {host}:{port}"))?;
            churn_guard::server::serve(context, addr).await?;
        }
        Commands::Train => {
            let report = tokio::task::spawn_blocking(move || context.train()).await??;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Deploy => {
            let outcome = tokio::task::spawn_blocking(move || context.deploy()).await?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        Commands::Predict => {
            let outcome = tokio::task::spawn_blocking(move || context.predict()).await?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
    }

    Ok(())
}
