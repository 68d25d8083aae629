use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use schooldesk_core::AppResult;
use schooldesk_domain::{PermissionName, Role};

/// Input payload for creating or replacing a role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleInput {
    /// Unique role name among live roles.
    pub name: String,
    /// Permission names granted by the role.
    pub permissions: Vec<PermissionName>,
}

/// Assignment projection mapping a subject to a role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleAssignment {
    /// Subject identifier.
    pub subject: String,
    /// Role identifier.
    pub role_id: Uuid,
    /// Role name.
    pub role_name: String,
    /// Assignment timestamp.
    pub assigned_at: DateTime<Utc>,
}

/// Repository port for role and grant administration.
#[async_trait]
pub trait RoleRepository: Send + Sync {
    /// Lists live roles with their grants.
    async fn list_roles(&self) -> AppResult<Vec<Role>>;

    /// Finds a live role by id.
    async fn find_role(&self, role_id: Uuid) -> AppResult<Option<Role>>;

    /// Creates a role; names of live roles are unique.
    async fn create_role(&self, input: RoleInput) -> AppResult<Role>;

    /// Renames a role and replaces its grant set.
    async fn update_role(&self, role_id: Uuid, input: RoleInput) -> AppResult<Role>;

    /// Marks a role as deleted and returns its final state.
    async fn soft_delete_role(&self, role_id: Uuid) -> AppResult<Role>;

    /// Assigns a live role to a subject.
    async fn assign_role_to_subject(&self, subject: &str, role_id: Uuid) -> AppResult<()>;

    /// Removes a role assignment from a subject.
    async fn remove_role_from_subject(&self, subject: &str, role_id: Uuid) -> AppResult<()>;

    /// Lists all live role assignments.
    async fn list_role_assignments(&self) -> AppResult<Vec<RoleAssignment>>;

    /// Grants a permission directly to a subject.
    async fn grant_subject_permission(
        &self,
        subject: &str,
        permission: &PermissionName,
    ) -> AppResult<()>;

    /// Revokes a direct permission grant from a subject.
    async fn revoke_subject_permission(
        &self,
        subject: &str,
        permission: &PermissionName,
    ) -> AppResult<()>;
}
