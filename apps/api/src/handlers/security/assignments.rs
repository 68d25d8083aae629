use super::*;

pub async fn list_role_assignments_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
) -> ApiResult<Json<Vec<RoleAssignmentResponse>>> {
    let assignments = state
        .security_admin_service
        .list_role_assignments(&user)
        .await?
        .into_iter()
        .map(RoleAssignmentResponse::from)
        .collect();

    Ok(Json(assignments))
}

pub async fn assign_role_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Json(payload): Json<RoleAssignmentRequest>,
) -> ApiResult<StatusCode> {
    state
        .security_admin_service
        .assign_role(&user, payload.subject.as_str(), payload.role_uuid()?)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn unassign_role_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Json(payload): Json<RoleAssignmentRequest>,
) -> ApiResult<StatusCode> {
    state
        .security_admin_service
        .unassign_role(&user, payload.subject.as_str(), payload.role_uuid()?)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn grant_permission_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Json(payload): Json<SubjectPermissionRequest>,
) -> ApiResult<StatusCode> {
    state
        .security_admin_service
        .grant_permission(
            &user,
            payload.subject.as_str(),
            PermissionName::new(payload.permission)?,
        )
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn revoke_permission_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Json(payload): Json<SubjectPermissionRequest>,
) -> ApiResult<StatusCode> {
    state
        .security_admin_service
        .revoke_permission(
            &user,
            payload.subject.as_str(),
            PermissionName::new(payload.permission)?,
        )
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
