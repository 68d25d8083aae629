use schooldesk_application::{RoleAssignment, RoleInput};
use schooldesk_core::AppError;
use schooldesk_domain::{Permission, PermissionName, Role};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Incoming payload for permission creation.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/create-permission-request.ts"
)]
pub struct CreatePermissionRequest {
    pub name: String,
}

/// Incoming payload for role creation and replacement.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/save-role-request.ts"
)]
pub struct SaveRoleRequest {
    pub name: String,
    pub permissions: Vec<String>,
}

/// Incoming payload for role assignment and unassignment.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/role-assignment-request.ts"
)]
pub struct RoleAssignmentRequest {
    pub subject: String,
    pub role_id: String,
}

/// Incoming payload for direct permission grants and revocations.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/subject-permission-request.ts"
)]
pub struct SubjectPermissionRequest {
    pub subject: String,
    pub permission: String,
}

/// API representation of a registered permission.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/permission-response.ts"
)]
pub struct PermissionResponse {
    pub permission_id: String,
    pub name: String,
    pub created_at: String,
}

/// Result of re-reading the permission store.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/reload-permissions-response.ts"
)]
pub struct ReloadPermissionsResponse {
    pub registered_permissions: usize,
}

/// API representation of a role.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/role-response.ts"
)]
pub struct RoleResponse {
    pub role_id: String,
    pub name: String,
    pub permissions: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
    pub deleted_at: Option<String>,
}

/// API representation of a role assignment.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/role-assignment-response.ts"
)]
pub struct RoleAssignmentResponse {
    pub subject: String,
    pub role_id: String,
    pub role_name: String,
    pub assigned_at: String,
}

impl TryFrom<SaveRoleRequest> for RoleInput {
    type Error = AppError;

    fn try_from(value: SaveRoleRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            name: value.name,
            permissions: value
                .permissions
                .into_iter()
                .map(PermissionName::new)
                .collect::<Result<Vec<_>, _>>()?,
        })
    }
}

impl RoleAssignmentRequest {
    /// Parses the role identifier.
    pub fn role_uuid(&self) -> Result<Uuid, AppError> {
        parse_uuid("role_id", &self.role_id)
    }
}

pub(super) fn parse_uuid(field: &str, value: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(value.trim())
        .map_err(|error| AppError::Validation(format!("invalid {field} '{value}': {error}")))
}

impl From<Permission> for PermissionResponse {
    fn from(value: Permission) -> Self {
        Self {
            permission_id: value.id().to_string(),
            name: value.name().as_str().to_owned(),
            created_at: value.created_at().to_rfc3339(),
        }
    }
}

impl From<Role> for RoleResponse {
    fn from(value: Role) -> Self {
        let timestamps = value.timestamps();

        Self {
            role_id: value.id().to_string(),
            name: value.name().as_str().to_owned(),
            permissions: value
                .permissions()
                .iter()
                .map(|permission| permission.as_str().to_owned())
                .collect(),
            created_at: timestamps.created_at().to_rfc3339(),
            updated_at: timestamps.updated_at().to_rfc3339(),
            deleted_at: timestamps.deleted_at().map(|value| value.to_rfc3339()),
        }
    }
}

impl From<RoleAssignment> for RoleAssignmentResponse {
    fn from(value: RoleAssignment) -> Self {
        Self {
            subject: value.subject,
            role_id: value.role_id.to_string(),
            role_name: value.role_name,
            assigned_at: value.assigned_at.to_rfc3339(),
        }
    }
}
