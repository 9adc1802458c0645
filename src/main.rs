use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use todo_api::comms::local_api::{self, AppState};
use todo_api::config::Config;
use todo_api::security::request_signer::compute_signature_base64;
use todo_api::security::{KeyStore, SignedRequest};
use todo_api::todos::MemoryTodoRepository;
use todo_api::utils;

#[derive(Parser)]
#[command(name = "todo-api", version, about = "Todo API with signed client calls")]
struct AppCli {
    /// Config file path
    #[arg(short, long, default_value = "config.json", global = true)]
    config: String,

    /// Subcommands
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Overrides the configured port
        #[arg(long)]
        port: Option<u16>,
    },
    /// Print the X-Signature a client must send for a protected call
    Sign {
        #[arg(long)]
        secret: String,
        #[arg(long)]
        method: String,
        #[arg(long)]
        path: String,
        #[arg(long)]
        token: String,
        #[arg(long)]
        timestamp: String,
        /// File holding the exact request body; omitted means empty
        #[arg(long)]
        body: Option<String>,
    },
}

async fn run_server(config_path: &str, port: Option<u16>) -> Result<()> {
    let config = Config::from_file(config_path)?;
    utils::logging::init(config.is_production());

    let keys = KeyStore::load(&config).context("loading key material")?;
    let port = port.unwrap_or(config.port);
    info!(
        version = todo_api::VERSION,
        app_mode = %config.app_mode,
        port,
        "Starting todo API"
    );

    let state = Arc::new(AppState::new(
        Arc::new(config),
        keys,
        Arc::new(MemoryTodoRepository::new()),
    ));
    local_api::serve(state, port).await
}

fn sign(
    secret: &str,
    method: &str,
    path: &str,
    token: &str,
    timestamp: &str,
    body: Option<&str>,
) -> Result<String> {
    let body = match body {
        Some(file) => std::fs::read(file).with_context(|| format!("reading body file {file}"))?,
        None => Vec::new(),
    };
    let request = SignedRequest {
        method,
        path,
        token,
        body: &body,
        timestamp,
    };
    compute_signature_base64(secret.as_bytes(), &request).context("computing signature")
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = AppCli::parse();

    match args.command {
        Some(Commands::Serve { port }) => run_server(&args.config, port).await?,
        Some(Commands::Sign {
            secret,
            method,
            path,
            token,
            timestamp,
            body,
        }) => {
            let signature = sign(&secret, &method, &path, &token, &timestamp, body.as_deref())?;
            println!("{signature}");
        }
        None => run_server(&args.config, None).await?,
    }

    Ok(())
}
