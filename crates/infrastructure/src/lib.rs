//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod argon2_password_hasher;
mod in_memory_change_broker;
mod postgres_audit_repository;
mod postgres_authorization_repository;
mod postgres_dcp_repository;
mod postgres_opcr_repository;
mod postgres_permission_repository;
mod postgres_role_repository;
mod postgres_user_repository;
mod redis_change_publisher;
mod redis_change_relay;

#[cfg(test)]
mod postgres_test_support;

pub use argon2_password_hasher::Argon2PasswordHasher;
pub use in_memory_change_broker::InMemoryChangeBroker;
pub use postgres_audit_repository::PostgresAuditRepository;
pub use postgres_authorization_repository::PostgresAuthorizationRepository;
pub use postgres_dcp_repository::PostgresDcpRepository;
pub use postgres_opcr_repository::PostgresOpcrRepository;
pub use postgres_permission_repository::PostgresPermissionRepository;
pub use postgres_role_repository::PostgresRoleRepository;
pub use postgres_user_repository::PostgresUserRepository;
pub use redis_change_publisher::RedisChangePublisher;
pub use redis_change_relay::RedisChangeRelay;

/// Embedded schema migrations for the PostgreSQL store.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");
