//! Brackets Server binary.

use brackets_server::{app, AppState, Config, DocumentStore, MemoryDocuments, PgDocuments};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "brackets_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    tracing::info!(
        "Starting Brackets Server on {}:{} ({:?} writes)",
        config.host,
        config.port,
        config.write_mode
    );

    let documents: Arc<dyn DocumentStore> = match &config.database_url {
        Some(url) => Arc::new(PgDocuments::connect(url).await?),
        None => {
            tracing::warn!("DATABASE_URL not set, snapshots are kept in memory only");
            MemoryDocuments::new_shared()
        }
    };

    let addr = format!("{}:{}", config.host, config.port);
    let app = app(AppState::new(config, documents));

    // Start server
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
