//! Permission-driven authorization.
//!
//! At startup the service enumerates the permission store once and registers
//! every permission name. A check for a registered name is evaluated against
//! the actor's live role and direct grants on every call; a check for a name
//! that is not registered is always denied.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

use schooldesk_core::{AppError, AppResult, UserIdentity};
use schooldesk_domain::{Permission, PermissionName};

mod registry;

use registry::PermissionRegistry;

/// Repository port for the administrator-managed permission table.
#[async_trait]
pub trait PermissionRepository: Send + Sync {
    /// Lists every stored permission record.
    async fn list_permissions(&self) -> AppResult<Vec<Permission>>;

    /// Creates a permission record; names are globally unique.
    async fn create_permission(&self, name: &PermissionName) -> AppResult<Permission>;

    /// Deletes a permission record and every grant that references it.
    async fn delete_permission(&self, permission_id: Uuid) -> AppResult<Permission>;
}

/// Repository port resolving an actor's effective permissions.
#[async_trait]
pub trait AuthorizationRepository: Send + Sync {
    /// Returns whether the subject holds the permission through a live role
    /// or a direct grant.
    async fn subject_has_permission(&self, subject: &str, permission: &str) -> AppResult<bool>;

    /// Lists the subject's effective permission names.
    async fn list_permissions_for_subject(&self, subject: &str) -> AppResult<Vec<PermissionName>>;
}

/// Application service for authorization checks.
#[derive(Clone)]
pub struct AuthorizationService {
    permission_repository: Arc<dyn PermissionRepository>,
    repository: Arc<dyn AuthorizationRepository>,
    registry: Arc<RwLock<PermissionRegistry>>,
}

impl AuthorizationService {
    /// Builds the service and registers every stored permission name.
    ///
    /// Never fails: when the permission store is unreachable the registry
    /// stays empty and every check is denied until a successful reload.
    pub async fn bootstrap(
        permission_repository: Arc<dyn PermissionRepository>,
        repository: Arc<dyn AuthorizationRepository>,
    ) -> Self {
        let registry = match permission_repository.list_permissions().await {
            Ok(permissions) => {
                if permissions.is_empty() {
                    warn!("permission store is empty; all authorization checks will be denied");
                }
                PermissionRegistry::from_permissions(&permissions)
            }
            Err(error) => {
                warn!(
                    %error,
                    "permission store unavailable at bootstrap; all authorization checks will be denied"
                );
                PermissionRegistry::default()
            }
        };

        info!(
            registered_permissions = registry.registered_count(),
            "authorization bootstrap complete"
        );

        Self {
            permission_repository,
            repository,
            registry: Arc::new(RwLock::new(registry)),
        }
    }

    /// Re-reads the permission store and replaces the registry.
    ///
    /// On failure the previous registry stays in effect.
    pub async fn reload(&self) -> AppResult<usize> {
        let permissions = self.permission_repository.list_permissions().await?;
        let registry = PermissionRegistry::from_permissions(&permissions);
        let registered = registry.registered_count();

        *self.registry.write().await = registry;
        info!(
            registered_permissions = registered,
            "authorization registry reloaded"
        );

        Ok(registered)
    }

    /// Returns how many permission names are registered.
    pub async fn registered_permission_count(&self) -> usize {
        self.registry.read().await.registered_count()
    }

    /// Returns whether a check exists for the permission name.
    pub async fn is_registered(&self, permission: &str) -> bool {
        self.registry.read().await.contains(permission)
    }

    /// Returns whether the subject currently holds a registered permission.
    ///
    /// Unregistered names and store errors both resolve to `false`.
    pub async fn is_authorized(&self, subject: &str, permission: &str) -> bool {
        match self.check(subject, permission).await {
            Ok(allowed) => allowed,
            Err(error) => {
                warn!(
                    %error,
                    subject,
                    permission,
                    "authorization lookup failed; denying"
                );
                false
            }
        }
    }

    /// Ensures the actor holds a registered permission.
    pub async fn require_permission(&self, actor: &UserIdentity, permission: &str) -> AppResult<()> {
        if self.check(actor.subject(), permission).await? {
            return Ok(());
        }

        Err(AppError::Forbidden(format!(
            "subject '{}' is missing permission '{permission}'",
            actor.subject()
        )))
    }

    /// Lists registered permissions the subject currently holds.
    pub async fn granted_permissions(&self, subject: &str) -> AppResult<Vec<PermissionName>> {
        let effective = self.repository.list_permissions_for_subject(subject).await?;
        let registry = self.registry.read().await;

        let mut granted: Vec<PermissionName> = effective
            .into_iter()
            .filter(|permission| registry.contains(permission.as_str()))
            .collect();
        granted.sort();
        granted.dedup();

        Ok(granted)
    }

    async fn check(&self, subject: &str, permission: &str) -> AppResult<bool> {
        if !self.is_registered(permission).await {
            debug!(subject, permission, "denied: permission is not registered");
            return Ok(false);
        }

        self.repository
            .subject_has_permission(subject, permission)
            .await
    }
}

#[cfg(test)]
mod tests;
