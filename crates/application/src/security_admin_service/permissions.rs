use uuid::Uuid;

use schooldesk_domain::{Permission, PermissionName, permission_catalog};

use super::*;

impl SecurityAdminService {
    /// Lists stored permission records.
    pub async fn list_permissions(&self, actor: &UserIdentity) -> AppResult<Vec<Permission>> {
        self.require(actor, permission_catalog::PERMISSION_ACCESS)
            .await?;
        self.permission_repository.list_permissions().await
    }

    /// Creates a permission record.
    ///
    /// The new name is not checkable until the registry is reloaded.
    pub async fn create_permission(
        &self,
        actor: &UserIdentity,
        name: PermissionName,
    ) -> AppResult<Permission> {
        self.require(actor, permission_catalog::PERMISSION_CREATE)
            .await?;

        let permission = self.permission_repository.create_permission(&name).await?;

        self.audit(
            actor,
            AuditAction::PermissionCreated,
            "permission",
            permission.id().to_string(),
            format!("created permission '{}'", permission.name()),
        )
        .await?;

        Ok(permission)
    }

    /// Deletes a permission record together with every grant of it.
    pub async fn delete_permission(
        &self,
        actor: &UserIdentity,
        permission_id: Uuid,
    ) -> AppResult<Permission> {
        self.require(actor, permission_catalog::PERMISSION_DELETE)
            .await?;

        let permission = self
            .permission_repository
            .delete_permission(permission_id)
            .await?;

        self.audit(
            actor,
            AuditAction::PermissionDeleted,
            "permission",
            permission.id().to_string(),
            format!("deleted permission '{}'", permission.name()),
        )
        .await?;

        Ok(permission)
    }

    /// Rebuilds the authorization registry from the permission store.
    pub async fn reload_permissions(&self, actor: &UserIdentity) -> AppResult<usize> {
        self.require(actor, permission_catalog::PERMISSION_CREATE)
            .await?;

        let registered = self.authorization_service.reload().await?;

        self.audit(
            actor,
            AuditAction::PermissionRegistryReloaded,
            "permission_registry",
            "registry".to_owned(),
            format!("registered {registered} permissions"),
        )
        .await?;

        Ok(registered)
    }
}
