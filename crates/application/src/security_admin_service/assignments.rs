use uuid::Uuid;

use schooldesk_domain::{PermissionName, permission_catalog};

use crate::RoleAssignment;

use super::*;

impl SecurityAdminService {
    /// Lists live role assignments.
    pub async fn list_role_assignments(
        &self,
        actor: &UserIdentity,
    ) -> AppResult<Vec<RoleAssignment>> {
        self.require(actor, permission_catalog::USER_ACCESS).await?;
        self.repository.list_role_assignments().await
    }

    /// Assigns a role to a subject and emits an audit event.
    pub async fn assign_role(
        &self,
        actor: &UserIdentity,
        subject: &str,
        role_id: Uuid,
    ) -> AppResult<()> {
        self.require(actor, permission_catalog::USER_EDIT).await?;

        self.repository
            .assign_role_to_subject(subject, role_id)
            .await?;

        self.audit(
            actor,
            AuditAction::RoleAssigned,
            "subject_role",
            format!("{subject}:{role_id}"),
            format!("assigned role '{role_id}' to '{subject}'"),
        )
        .await
    }

    /// Removes a role assignment from a subject and emits an audit event.
    pub async fn unassign_role(
        &self,
        actor: &UserIdentity,
        subject: &str,
        role_id: Uuid,
    ) -> AppResult<()> {
        self.require(actor, permission_catalog::USER_EDIT).await?;

        self.repository
            .remove_role_from_subject(subject, role_id)
            .await?;

        self.audit(
            actor,
            AuditAction::RoleUnassigned,
            "subject_role",
            format!("{subject}:{role_id}"),
            format!("removed role '{role_id}' from '{subject}'"),
        )
        .await
    }

    /// Grants a permission directly to a subject.
    pub async fn grant_permission(
        &self,
        actor: &UserIdentity,
        subject: &str,
        permission: PermissionName,
    ) -> AppResult<()> {
        self.require(actor, permission_catalog::USER_EDIT).await?;

        self.repository
            .grant_subject_permission(subject, &permission)
            .await?;

        self.audit(
            actor,
            AuditAction::SubjectPermissionGranted,
            "subject_permission",
            format!("{subject}:{permission}"),
            format!("granted '{permission}' to '{subject}'"),
        )
        .await
    }

    /// Revokes a direct permission grant from a subject.
    pub async fn revoke_permission(
        &self,
        actor: &UserIdentity,
        subject: &str,
        permission: PermissionName,
    ) -> AppResult<()> {
        self.require(actor, permission_catalog::USER_EDIT).await?;

        self.repository
            .revoke_subject_permission(subject, &permission)
            .await?;

        self.audit(
            actor,
            AuditAction::SubjectPermissionRevoked,
            "subject_permission",
            format!("{subject}:{permission}"),
            format!("revoked '{permission}' from '{subject}'"),
        )
        .await
    }
}
