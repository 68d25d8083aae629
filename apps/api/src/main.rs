//! Schooldesk API composition root.

#![forbid(unsafe_code)]

mod api_config;
mod api_router;
mod api_services;
mod auth;
mod dto;
mod error;
mod handlers;
mod middleware;
mod seed;
mod state;

use schooldesk_core::AppError;
use tracing::info;

use crate::api_config::{ApiCommand, ApiConfig};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    api_config::init_tracing();

    let config = ApiConfig::load()?;
    let pool = api_services::connect_and_migrate(&config.database_url).await?;

    match config.command {
        ApiCommand::Migrate => {
            info!("database migrations applied successfully");
            return Ok(());
        }
        ApiCommand::Seed => return seed::run(pool, config.seed_admin.as_ref()).await,
        ApiCommand::Serve => {}
    }

    let transport = api_services::build_change_transport(&config)?;
    let app_state = api_services::build_app_state(pool.clone(), &config, &transport).await?;
    let session_layer =
        api_services::build_postgres_session_layer(pool, config.cookie_secure).await?;
    let app = api_router::build_router(app_state, &config.frontend_url, session_layer)?;

    let address = config.socket_address()?;
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind api listener: {error}")))?;

    info!(%address, "schooldesk-api listening");

    let served = axum::serve(listener, app)
        .await
        .map_err(|error| AppError::Internal(format!("api server error: {error}")));

    if let Some(relay) = transport.relay {
        relay.abort();
    }

    served
}
