use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use taskdeck_db::{DbConfig, SqliteTaskStore};
use taskdeck_server::auth::TokenVerifier;
use taskdeck_server::InnerAppState;
use taskdeck_service::TaskService;
use taskdeck_store::{S3Links, StoreConfig};

#[derive(Parser)]
#[command(name = "taskdeck-server")]
struct Cli {
    /// Address to bind.
    #[arg(long, env = "TASKDECK_BIND", default_value = "0.0.0.0")]
    bind: String,

    /// Port to listen on.
    #[arg(long, env = "TASKDECK_PORT", default_value_t = 3720)]
    port: u16,
}

/// Load the pinned RSA public key. Inline PEM wins over a file path, and the
/// key is read once at startup; rotation means restarting the process with
/// new configuration.
fn load_verifier_key() -> Result<String> {
    if let Ok(pem) = std::env::var("TASKDECK_AUTH_PUBLIC_KEY") {
        return Ok(pem);
    }
    let path = std::env::var("TASKDECK_AUTH_PUBLIC_KEY_FILE")
        .context("TASKDECK_AUTH_PUBLIC_KEY or TASKDECK_AUTH_PUBLIC_KEY_FILE must be set")?;
    std::fs::read_to_string(&path).with_context(|| format!("reading signing key from {path}"))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();

    let pem = load_verifier_key()?;
    let verifier =
        TokenVerifier::from_rsa_pem(pem.as_bytes()).context("parsing signing public key")?;

    let store = Arc::new(SqliteTaskStore::open(&DbConfig::from_env())?);
    let links = Arc::new(S3Links::new(&StoreConfig::from_env())?);
    let service = TaskService::new(store, links);

    let state = Arc::new(InnerAppState { service, verifier });

    let addr = SocketAddr::new(cli.bind.parse()?, cli.port);
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "taskdeck-server listening");

    taskdeck_server::serve(listener, state).await
}
