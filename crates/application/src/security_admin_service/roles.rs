use uuid::Uuid;

use schooldesk_core::AppError;
use schooldesk_domain::{Role, permission_catalog};

use crate::RoleInput;

use super::*;

impl SecurityAdminService {
    /// Returns live roles for administrative users.
    pub async fn list_roles(&self, actor: &UserIdentity) -> AppResult<Vec<Role>> {
        self.require(actor, permission_catalog::ROLE_ACCESS).await?;
        self.repository.list_roles().await
    }

    /// Returns one live role.
    pub async fn get_role(&self, actor: &UserIdentity, role_id: Uuid) -> AppResult<Role> {
        self.require(actor, permission_catalog::ROLE_ACCESS).await?;
        self.repository
            .find_role(role_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("role '{role_id}' does not exist")))
    }

    /// Creates a role, then audits and broadcasts it.
    pub async fn create_role(&self, actor: &UserIdentity, input: RoleInput) -> AppResult<Role> {
        self.require(actor, permission_catalog::ROLE_CREATE).await?;

        let role = self.repository.create_role(input).await?;
        self.notifier.notify(&role).await;

        self.audit(
            actor,
            AuditAction::RoleCreated,
            "role",
            role.id().to_string(),
            format!("created role '{}'", role.name()),
        )
        .await?;

        Ok(role)
    }

    /// Renames a role and replaces its grants, then audits and broadcasts it.
    ///
    /// Members gain or lose the changed permissions on their next check.
    pub async fn update_role(
        &self,
        actor: &UserIdentity,
        role_id: Uuid,
        input: RoleInput,
    ) -> AppResult<Role> {
        self.require(actor, permission_catalog::ROLE_EDIT).await?;

        let role = self.repository.update_role(role_id, input).await?;
        self.notifier.notify(&role).await;

        self.audit(
            actor,
            AuditAction::RoleUpdated,
            "role",
            role.id().to_string(),
            format!(
                "updated role '{}' with {} permissions",
                role.name(),
                role.permissions().len()
            ),
        )
        .await?;

        Ok(role)
    }

    /// Soft-deletes a role, then audits and broadcasts its final state.
    pub async fn delete_role(&self, actor: &UserIdentity, role_id: Uuid) -> AppResult<Role> {
        self.require(actor, permission_catalog::ROLE_DELETE).await?;

        let role = self.repository.soft_delete_role(role_id).await?;
        self.notifier.notify(&role).await;

        self.audit(
            actor,
            AuditAction::RoleDeleted,
            "role",
            role.id().to_string(),
            format!("deleted role '{}'", role.name()),
        )
        .await?;

        Ok(role)
    }
}
