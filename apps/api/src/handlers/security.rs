use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;

use schooldesk_core::UserIdentity;
use schooldesk_domain::PermissionName;
use uuid::Uuid;

use crate::dto::{
    CreatePermissionRequest, PermissionResponse, ReloadPermissionsResponse,
    RoleAssignmentRequest, RoleAssignmentResponse, RoleResponse, SaveRoleRequest,
    SubjectPermissionRequest,
};
use crate::error::ApiResult;
use crate::state::AppState;

mod assignments;
mod permissions;
mod roles;

pub use assignments::{
    assign_role_handler, grant_permission_handler, list_role_assignments_handler,
    revoke_permission_handler, unassign_role_handler,
};
pub use permissions::{
    create_permission_handler, delete_permission_handler, list_permissions_handler,
    reload_permissions_handler,
};
pub use roles::{
    create_role_handler, delete_role_handler, get_role_handler, list_roles_handler,
    update_role_handler,
};
