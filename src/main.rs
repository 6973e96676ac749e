use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use doctxn::web::{self, AppState};
use doctxn::{MemoryStore, SessionManager, StoreConfig, TxnError};

/// Transactional document-write service.
#[derive(Parser, Debug)]
#[command(name = "doctxn", version, about)]
struct Args {
    /// Port for the HTTP listener.
    #[arg(long, env = "HTTP_PORT", default_value_t = 8090)]
    port: u16,

    /// Replicated store descriptor.
    #[arg(
        long,
        env = "STORE_URL",
        default_value = "docstore://store1:27017,store2:27017,store3:27017/?replicaSet=myReplicaSet"
    )]
    store_url: String,

    /// Hostname stamped into demo records.
    #[arg(long, env = "HOSTNAME", default_value = "localhost")]
    hostname: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let config = StoreConfig::from_url(&args.store_url).map_err(TxnError::Connection)?;
    let manager = SessionManager::<MemoryStore>::connect(config).await?;

    let state = Arc::new(AppState {
        manager,
        hostname: args.hostname,
    });

    web::serve(state, args.port).await
}
