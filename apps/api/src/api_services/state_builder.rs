use std::sync::Arc;

use schooldesk_application::{DcpService, OpcrService};
use schooldesk_core::AppError;
use sqlx::PgPool;

use crate::api_config::ApiConfig;
use crate::state::AppState;

mod repositories;
mod security;
mod transport;

pub use transport::{ChangeTransport, build_change_transport};

use repositories::build_repository_set;

/// Wires repositories, services and the change transport into shared state.
///
/// Runs the permission bootstrap, so the returned state already carries the
/// registry every authorization check consults.
pub async fn build_app_state(
    pool: PgPool,
    config: &ApiConfig,
    transport: &ChangeTransport,
) -> Result<AppState, AppError> {
    let repositories = build_repository_set(&pool);
    let notifier = transport.notifier(config.change_publish_timeout);
    let security_services =
        security::build_security_services(&repositories, notifier.clone()).await?;

    Ok(AppState {
        opcr_service: OpcrService::new(
            security_services.authorization_service.clone(),
            repositories.opcr_repository,
            repositories.audit_repository.clone(),
            notifier.clone(),
        ),
        dcp_service: DcpService::new(
            security_services.authorization_service.clone(),
            repositories.dcp_repository,
            repositories.audit_repository,
            notifier,
        ),
        security_admin_service: security_services.security_admin_service,
        user_service: security_services.user_service,
        authorization_service: security_services.authorization_service,
        change_feed: Arc::clone(&transport.feed),
        frontend_url: config.frontend_url.clone(),
        postgres_pool: pool,
        redis_client: transport.redis_client.clone(),
        redis_required: config.requires_redis(),
    })
}
