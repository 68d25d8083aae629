use std::sync::Arc;

use schooldesk_application::{
    AuthorizationService, ChangeFeed, DcpService, OpcrService, SecurityAdminService, UserService,
};
use sqlx::PgPool;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub authorization_service: AuthorizationService,
    pub security_admin_service: SecurityAdminService,
    pub opcr_service: OpcrService,
    pub dcp_service: DcpService,
    pub user_service: UserService,
    pub change_feed: Arc<dyn ChangeFeed>,
    pub frontend_url: String,
    pub postgres_pool: PgPool,
    pub redis_client: Option<redis::Client>,
    pub redis_required: bool,
}
