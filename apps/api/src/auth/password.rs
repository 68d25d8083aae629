use axum::Json;
use axum::extract::State;
use schooldesk_application::AuthOutcome;
use schooldesk_core::AppError;
use tower_sessions::Session;
use tracing::info;

use crate::dto::{AuthLoginRequest, AuthLoginResponse};
use crate::error::ApiResult;
use crate::state::AppState;

use super::{SESSION_CREATED_AT_KEY, SESSION_USER_KEY};

/// POST /auth/login - Authenticate with email+password.
pub async fn login_handler(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<AuthLoginRequest>,
) -> ApiResult<Json<AuthLoginResponse>> {
    let outcome = state
        .user_service
        .login(&payload.email, &payload.password)
        .await?;

    let AuthOutcome::Authenticated(identity) = outcome else {
        // Same message for unknown email and wrong password.
        return Err(AppError::Unauthorized("invalid email or password".to_owned()).into());
    };

    // Regenerate the session id on privilege change.
    session
        .cycle_id()
        .await
        .map_err(|error| AppError::Internal(format!("failed to cycle session id: {error}")))?;

    session
        .insert(SESSION_USER_KEY, &identity)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to persist session identity: {error}"))
        })?;

    session
        .insert(SESSION_CREATED_AT_KEY, chrono::Utc::now().timestamp())
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to persist session creation time: {error}"))
        })?;

    info!(subject = %identity.subject(), "user signed in");

    Ok(Json(AuthLoginResponse {
        status: "authenticated".to_owned(),
    }))
}
