use std::sync::Arc;

use schooldesk_application::{
    AuthorizationService, ChangeNotifier, SecurityAdminService, UserService,
};
use schooldesk_core::AppError;
use schooldesk_infrastructure::Argon2PasswordHasher;

use super::repositories::RepositorySet;

pub(crate) struct SecurityServices {
    pub(crate) authorization_service: AuthorizationService,
    pub(crate) security_admin_service: SecurityAdminService,
    pub(crate) user_service: UserService,
}

pub(crate) async fn build_security_services(
    repositories: &RepositorySet,
    notifier: ChangeNotifier,
) -> Result<SecurityServices, AppError> {
    let authorization_service = AuthorizationService::bootstrap(
        repositories.permission_repository.clone(),
        repositories.authorization_repository.clone(),
    )
    .await;

    let security_admin_service = SecurityAdminService::new(
        authorization_service.clone(),
        repositories.permission_repository.clone(),
        repositories.role_repository.clone(),
        repositories.audit_repository.clone(),
        notifier,
    );

    let user_service = UserService::new(
        repositories.user_repository.clone(),
        Arc::new(Argon2PasswordHasher::new()?),
        authorization_service.clone(),
        repositories.audit_repository.clone(),
    );

    Ok(SecurityServices {
        authorization_service,
        security_admin_service,
        user_service,
    })
}
