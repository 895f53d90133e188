use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use linkpixel_server::{config::Config, create_app, database::Database};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;

    let db = Database::new(&config.database_url).await?;
    db.migrate().await?;
    info!("Connected to database");

    let port = config.port;
    let app = create_app(db, config)?;

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    info!("Server is running on port {}", port);
    axum::serve(listener, app).await?;

    Ok(())
}
