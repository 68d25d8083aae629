//! Administration of permissions, roles and subject grants.

use std::sync::Arc;

use schooldesk_core::{AppResult, UserIdentity};
use schooldesk_domain::AuditAction;

use crate::{
    AuditEvent, AuditRepository, AuthorizationService, ChangeNotifier, PermissionRepository,
    RoleRepository,
};

mod assignments;
mod permissions;
mod roles;

/// Application service for security administration.
#[derive(Clone)]
pub struct SecurityAdminService {
    authorization_service: AuthorizationService,
    permission_repository: Arc<dyn PermissionRepository>,
    repository: Arc<dyn RoleRepository>,
    audit_repository: Arc<dyn AuditRepository>,
    notifier: ChangeNotifier,
}

impl SecurityAdminService {
    /// Creates a new security admin service.
    #[must_use]
    pub fn new(
        authorization_service: AuthorizationService,
        permission_repository: Arc<dyn PermissionRepository>,
        repository: Arc<dyn RoleRepository>,
        audit_repository: Arc<dyn AuditRepository>,
        notifier: ChangeNotifier,
    ) -> Self {
        Self {
            authorization_service,
            permission_repository,
            repository,
            audit_repository,
            notifier,
        }
    }

    async fn require(&self, actor: &UserIdentity, permission: &str) -> AppResult<()> {
        self.authorization_service
            .require_permission(actor, permission)
            .await
    }

    async fn audit(
        &self,
        actor: &UserIdentity,
        action: AuditAction,
        resource_type: &str,
        resource_id: String,
        detail: String,
    ) -> AppResult<()> {
        self.audit_repository
            .append_event(AuditEvent {
                subject: actor.subject().to_owned(),
                action,
                resource_type: resource_type.to_owned(),
                resource_id,
                detail: Some(detail),
            })
            .await
    }
}
