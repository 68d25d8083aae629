use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use schooldesk_core::UserIdentity;
use uuid::Uuid;

use crate::dto::{
    DcpBatchResponse, DcpRecipientResponse, SaveDcpBatchRequest, SaveDcpRecipientRequest,
};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn list_batches_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
) -> ApiResult<Json<Vec<DcpBatchResponse>>> {
    let batches = state
        .dcp_service
        .list_batches(&user)
        .await?
        .into_iter()
        .map(DcpBatchResponse::from)
        .collect();

    Ok(Json(batches))
}

pub async fn get_batch_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(batch_id): Path<Uuid>,
) -> ApiResult<Json<DcpBatchResponse>> {
    let batch = state.dcp_service.get_batch(&user, batch_id).await?;

    Ok(Json(DcpBatchResponse::from(batch)))
}

pub async fn create_batch_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Json(payload): Json<SaveDcpBatchRequest>,
) -> ApiResult<(StatusCode, Json<DcpBatchResponse>)> {
    let batch = state
        .dcp_service
        .create_batch(&user, payload.try_into()?)
        .await?;

    Ok((StatusCode::CREATED, Json(DcpBatchResponse::from(batch))))
}

pub async fn update_batch_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(batch_id): Path<Uuid>,
    Json(payload): Json<SaveDcpBatchRequest>,
) -> ApiResult<Json<DcpBatchResponse>> {
    let batch = state
        .dcp_service
        .update_batch(&user, batch_id, payload.try_into()?)
        .await?;

    Ok(Json(DcpBatchResponse::from(batch)))
}

pub async fn delete_batch_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(batch_id): Path<Uuid>,
) -> ApiResult<Json<DcpBatchResponse>> {
    let batch = state.dcp_service.delete_batch(&user, batch_id).await?;

    Ok(Json(DcpBatchResponse::from(batch)))
}

pub async fn list_recipients_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(batch_id): Path<Uuid>,
) -> ApiResult<Json<Vec<DcpRecipientResponse>>> {
    let recipients = state
        .dcp_service
        .list_recipients(&user, batch_id)
        .await?
        .into_iter()
        .map(DcpRecipientResponse::from)
        .collect();

    Ok(Json(recipients))
}

pub async fn create_recipient_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(batch_id): Path<Uuid>,
    Json(payload): Json<SaveDcpRecipientRequest>,
) -> ApiResult<(StatusCode, Json<DcpRecipientResponse>)> {
    let recipient = state
        .dcp_service
        .create_recipient(&user, batch_id, payload.try_into()?)
        .await?;

    Ok((StatusCode::CREATED, Json(DcpRecipientResponse::from(recipient))))
}

pub async fn update_recipient_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(recipient_id): Path<Uuid>,
    Json(payload): Json<SaveDcpRecipientRequest>,
) -> ApiResult<Json<DcpRecipientResponse>> {
    let recipient = state
        .dcp_service
        .update_recipient(&user, recipient_id, payload.try_into()?)
        .await?;

    Ok(Json(DcpRecipientResponse::from(recipient)))
}

pub async fn delete_recipient_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(recipient_id): Path<Uuid>,
) -> ApiResult<Json<DcpRecipientResponse>> {
    let recipient = state
        .dcp_service
        .delete_recipient(&user, recipient_id)
        .await?;

    Ok(Json(DcpRecipientResponse::from(recipient)))
}
