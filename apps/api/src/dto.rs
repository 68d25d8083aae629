mod auth;
mod common;
mod records;
mod security;
mod users;

pub use auth::{AuthLoginRequest, AuthLoginResponse};
pub use common::{HealthDependencyStatus, HealthResponse, UserIdentityResponse};
pub use records::{
    DcpBatchResponse, DcpRecipientResponse, OpcrResponse, SaveDcpBatchRequest,
    SaveDcpRecipientRequest, SaveOpcrRequest,
};
pub use security::{
    CreatePermissionRequest, PermissionResponse, ReloadPermissionsResponse,
    RoleAssignmentRequest, RoleAssignmentResponse, RoleResponse, SaveRoleRequest,
    SubjectPermissionRequest,
};
pub use users::{CreateUserRequest, UserResponse};
