mod config;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use collabadoku_core::RandomSudokuGenerator;
use collabadoku_gateway::{start_server, GatewayState, SessionManager};

use config::Config;

#[derive(Parser)]
#[command(name = "collabadoku")]
#[command(about = "Shared Sudoku room server")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the room server
    Serve {
        /// Port to bind the HTTP/WebSocket server to
        #[arg(short, long)]
        port: Option<u16>,
        /// Address to bind to
        #[arg(short, long)]
        bind: Option<String>,
    },
    /// Show the status of a running server
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env();
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { port, bind } => {
            let config = Config {
                port: port.unwrap_or(config.port),
                bind_address: bind.unwrap_or(config.bind_address),
                ..config
            };
            logging::init_logger(config.log_dir.as_deref(), &config.log_level);
            run_server(config).await?;
        }
        Commands::Status => {
            println!("collabadoku status: checking...");
            let client = reqwest::Client::new();
            match client
                .get(format!("http://localhost:{}/api/health", config.port))
                .send()
                .await
            {
                Ok(resp) => {
                    let body: serde_json::Value = resp.json().await?;
                    println!("{}", serde_json::to_string_pretty(&body)?);
                }
                Err(_) => {
                    println!("collabadoku is not running on port {}", config.port);
                }
            }
        }
    }

    Ok(())
}

async fn run_server(config: Config) -> Result<()> {
    info!(
        port = config.port,
        bind = %config.bind_address,
        outbound_buffer = config.outbound_buffer,
        puzzle_givens = config.puzzle_givens,
        "Starting collabadoku room server"
    );

    let generator = Arc::new(RandomSudokuGenerator::new(config.puzzle_givens));
    let manager = SessionManager::new(generator).with_outbound_buffer(config.outbound_buffer);
    let state = GatewayState::new(Arc::new(manager));

    let addr: SocketAddr = format!("{}:{}", config.bind_address, config.port)
        .parse()
        .with_context(|| format!("invalid bind address {}:{}", config.bind_address, config.port))?;

    start_server(addr, state).await
}
