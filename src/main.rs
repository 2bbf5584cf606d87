use std::fs;
use std::sync::Arc;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use shellac::config::ServerConfig;
use shellac::server::{AppState, create_router};
use shellac::store::{CatalogStore, SqliteCatalog};

#[derive(Parser)]
#[command(name = "shellac")]
#[command(about = "A media catalog server", long_about = None)]
struct Cli {
    /// Host to bind to
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port to bind to
    #[arg(long, short, default_value = "8080")]
    port: u16,

    /// Data directory for the database and asset blobs
    #[arg(long, default_value = "./data")]
    data_dir: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("shellac=info".parse()?)
                .add_directive("audit=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let config = ServerConfig {
        host: cli.host,
        port: cli.port,
        data_dir: cli.data_dir.into(),
        ..ServerConfig::default()
    };

    fs::create_dir_all(&config.data_dir)?;

    let store = SqliteCatalog::new(config.db_path())?;
    store.initialize()?;

    let state = Arc::new(AppState::new(Arc::new(store), &config));

    // The search index lives in memory; rebuild it from the catalog rows
    // before taking traffic.
    let indexed = state.catalog.rebuild_index()?;
    info!("Search index rebuilt with {} documents", indexed);

    let app = create_router(state);
    let addr = config.socket_addr()?;

    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
