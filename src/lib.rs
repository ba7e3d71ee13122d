//! Rari: an artisan marketplace backend.

pub mod api;
pub mod cart;
pub mod config;
pub mod entities;
pub mod middleware;
pub mod pricing;

use axum::Router;
use sea_orm::{Database, DbErr};
use std::sync::Arc;
use tracing::info;

use api::{create_api_router, AppState};
use cart::{CartService, SeaOrmStore};
use config::AppConfig;
use entities::{primary_setup, setup_schema};

/// Connects, creates missing tables and wires the shared services.
pub async fn build_state(config: AppConfig) -> Result<AppState, DbErr> {
    let db = Database::connect(&config.database_url).await?;
    setup_schema(&db).await?;

    if config.seed_demo_data {
        primary_setup(&db).await?;
    }

    let db = Arc::new(db);
    let cart = Arc::new(CartService::new(Arc::new(SeaOrmStore::new(db.clone()))));
    info!("Database ready");

    Ok(AppState {
        db,
        config: Arc::new(config),
        cart,
    })
}

pub async fn build_app(config: AppConfig) -> Result<Router, DbErr> {
    Ok(create_api_router(build_state(config).await?))
}
