use super::*;

pub async fn list_permissions_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
) -> ApiResult<Json<Vec<PermissionResponse>>> {
    let permissions = state
        .security_admin_service
        .list_permissions(&user)
        .await?
        .into_iter()
        .map(PermissionResponse::from)
        .collect();

    Ok(Json(permissions))
}

pub async fn create_permission_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Json(payload): Json<CreatePermissionRequest>,
) -> ApiResult<(StatusCode, Json<PermissionResponse>)> {
    let permission = state
        .security_admin_service
        .create_permission(&user, PermissionName::new(payload.name)?)
        .await?;

    Ok((StatusCode::CREATED, Json(PermissionResponse::from(permission))))
}

pub async fn delete_permission_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(permission_id): Path<Uuid>,
) -> ApiResult<Json<PermissionResponse>> {
    let permission = state
        .security_admin_service
        .delete_permission(&user, permission_id)
        .await?;

    Ok(Json(PermissionResponse::from(permission)))
}

pub async fn reload_permissions_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
) -> ApiResult<Json<ReloadPermissionsResponse>> {
    let registered_permissions = state
        .security_admin_service
        .reload_permissions(&user)
        .await?;

    Ok(Json(ReloadPermissionsResponse {
        registered_permissions,
    }))
}
