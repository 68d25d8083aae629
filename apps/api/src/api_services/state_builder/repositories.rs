use std::sync::Arc;

use schooldesk_infrastructure::{
    PostgresAuditRepository, PostgresAuthorizationRepository, PostgresDcpRepository,
    PostgresOpcrRepository, PostgresPermissionRepository, PostgresRoleRepository,
    PostgresUserRepository,
};
use sqlx::PgPool;

pub(crate) struct RepositorySet {
    pub(crate) audit_repository: Arc<PostgresAuditRepository>,
    pub(crate) authorization_repository: Arc<PostgresAuthorizationRepository>,
    pub(crate) permission_repository: Arc<PostgresPermissionRepository>,
    pub(crate) role_repository: Arc<PostgresRoleRepository>,
    pub(crate) user_repository: Arc<PostgresUserRepository>,
    pub(crate) opcr_repository: Arc<PostgresOpcrRepository>,
    pub(crate) dcp_repository: Arc<PostgresDcpRepository>,
}

pub(crate) fn build_repository_set(pool: &PgPool) -> RepositorySet {
    RepositorySet {
        audit_repository: Arc::new(PostgresAuditRepository::new(pool.clone())),
        authorization_repository: Arc::new(PostgresAuthorizationRepository::new(pool.clone())),
        permission_repository: Arc::new(PostgresPermissionRepository::new(pool.clone())),
        role_repository: Arc::new(PostgresRoleRepository::new(pool.clone())),
        user_repository: Arc::new(PostgresUserRepository::new(pool.clone())),
        opcr_repository: Arc::new(PostgresOpcrRepository::new(pool.clone())),
        dcp_repository: Arc::new(PostgresDcpRepository::new(pool.clone())),
    }
}
