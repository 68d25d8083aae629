use axum::Router;
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{delete, get, post, put};
use schooldesk_core::AppError;
use tower_http::trace::TraceLayer;
use tower_sessions::SessionManagerLayer;
use tower_sessions_sqlx_store::PostgresStore;

use crate::state::AppState;
use crate::{auth, handlers, middleware};

mod cors;

pub fn build_router(
    app_state: AppState,
    frontend_url: &str,
    session_layer: SessionManagerLayer<PostgresStore>,
) -> Result<Router, AppError> {
    let protected_routes = Router::new()
        .route(
            "/api/security/permissions",
            get(handlers::security::list_permissions_handler)
                .post(handlers::security::create_permission_handler),
        )
        .route(
            "/api/security/permissions/reload",
            post(handlers::security::reload_permissions_handler),
        )
        .route(
            "/api/security/permissions/{permission_id}",
            delete(handlers::security::delete_permission_handler),
        )
        .route(
            "/api/security/roles",
            get(handlers::security::list_roles_handler)
                .post(handlers::security::create_role_handler),
        )
        .route(
            "/api/security/roles/{role_id}",
            get(handlers::security::get_role_handler)
                .put(handlers::security::update_role_handler)
                .delete(handlers::security::delete_role_handler),
        )
        .route(
            "/api/security/role-assignments",
            get(handlers::security::list_role_assignments_handler)
                .post(handlers::security::assign_role_handler),
        )
        .route(
            "/api/security/role-unassignments",
            post(handlers::security::unassign_role_handler),
        )
        .route(
            "/api/security/permission-grants",
            post(handlers::security::grant_permission_handler),
        )
        .route(
            "/api/security/permission-revocations",
            post(handlers::security::revoke_permission_handler),
        )
        .route(
            "/api/users",
            get(handlers::users::list_users_handler).post(handlers::users::create_user_handler),
        )
        .route(
            "/api/opcrs",
            get(handlers::opcrs::list_opcrs_handler).post(handlers::opcrs::create_opcr_handler),
        )
        .route(
            "/api/opcrs/{opcr_id}",
            get(handlers::opcrs::get_opcr_handler)
                .put(handlers::opcrs::update_opcr_handler)
                .delete(handlers::opcrs::delete_opcr_handler),
        )
        .route(
            "/api/dcps",
            get(handlers::dcps::list_batches_handler).post(handlers::dcps::create_batch_handler),
        )
        .route(
            "/api/dcps/{batch_id}",
            get(handlers::dcps::get_batch_handler)
                .put(handlers::dcps::update_batch_handler)
                .delete(handlers::dcps::delete_batch_handler),
        )
        .route(
            "/api/dcps/{batch_id}/recipients",
            get(handlers::dcps::list_recipients_handler)
                .post(handlers::dcps::create_recipient_handler),
        )
        .route(
            "/api/dcp-recipients/{recipient_id}",
            put(handlers::dcps::update_recipient_handler)
                .delete(handlers::dcps::delete_recipient_handler),
        )
        .route("/api/live/{topic}", get(handlers::live::live_topic_handler))
        .route("/auth/me", get(auth::me_handler))
        .route_layer(from_fn(middleware::require_auth));

    let cors_layer = cors::build_cors_layer(frontend_url)?;

    Ok(Router::new()
        .route("/health", get(handlers::health::health_handler))
        .route("/auth/login", post(auth::login_handler))
        .route("/auth/logout", post(auth::logout_handler))
        .merge(protected_routes)
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::require_same_origin_for_mutations,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .layer(session_layer)
        .with_state(app_state))
}
