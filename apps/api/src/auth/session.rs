use axum::Json;
use axum::extract::{Extension, State};
use axum::http::StatusCode;
use schooldesk_core::{AppError, UserIdentity};
use tower_sessions::Session;

use crate::dto::UserIdentityResponse;
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn logout_handler(session: Session) -> ApiResult<StatusCode> {
    session
        .delete()
        .await
        .map_err(|error| AppError::Internal(format!("failed to delete session: {error}")))?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn me_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
) -> ApiResult<Json<UserIdentityResponse>> {
    let permissions = state
        .authorization_service
        .granted_permissions(user.subject())
        .await?;

    Ok(Json(UserIdentityResponse::from_identity_with_permissions(
        user,
        permissions,
    )))
}
