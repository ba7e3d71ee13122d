use std::error::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

use rari_market::{build_app, config::AppConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = AppConfig::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn")),
        )
        .init();

    let bind_addr = config.bind_addr.clone();
    let app = build_app(config).await?;

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!(addr = %listener.local_addr()?, "Listening");
    axum::serve(listener, app).await?;

    Ok(())
}
