use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use schooldesk_core::UserIdentity;
use uuid::Uuid;

use crate::dto::{OpcrResponse, SaveOpcrRequest};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn list_opcrs_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
) -> ApiResult<Json<Vec<OpcrResponse>>> {
    let opcrs = state
        .opcr_service
        .list(&user)
        .await?
        .into_iter()
        .map(OpcrResponse::from)
        .collect();

    Ok(Json(opcrs))
}

pub async fn get_opcr_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(opcr_id): Path<Uuid>,
) -> ApiResult<Json<OpcrResponse>> {
    let opcr = state.opcr_service.get(&user, opcr_id).await?;

    Ok(Json(OpcrResponse::from(opcr)))
}

pub async fn create_opcr_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Json(payload): Json<SaveOpcrRequest>,
) -> ApiResult<(StatusCode, Json<OpcrResponse>)> {
    let opcr = state
        .opcr_service
        .create(&user, payload.try_into()?)
        .await?;

    Ok((StatusCode::CREATED, Json(OpcrResponse::from(opcr))))
}

pub async fn update_opcr_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(opcr_id): Path<Uuid>,
    Json(payload): Json<SaveOpcrRequest>,
) -> ApiResult<Json<OpcrResponse>> {
    let opcr = state
        .opcr_service
        .update(&user, opcr_id, payload.try_into()?)
        .await?;

    Ok(Json(OpcrResponse::from(opcr)))
}

pub async fn delete_opcr_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(opcr_id): Path<Uuid>,
) -> ApiResult<Json<OpcrResponse>> {
    let opcr = state.opcr_service.delete(&user, opcr_id).await?;

    Ok(Json(OpcrResponse::from(opcr)))
}
