use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use schooldesk_application::AuthorizationRepository;
use schooldesk_core::{AppError, AppResult};
use schooldesk_domain::PermissionName;

/// PostgreSQL-backed repository for subject permission lookups.
///
/// Effective permissions are the union of grants from live roles assigned
/// to the subject and permissions granted to the subject directly.
#[derive(Clone)]
pub struct PostgresAuthorizationRepository {
    pool: PgPool,
}

impl PostgresAuthorizationRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct PermissionNameRow {
    name: String,
}

#[async_trait]
impl AuthorizationRepository for PostgresAuthorizationRepository {
    async fn subject_has_permission(&self, subject: &str, permission: &str) -> AppResult<bool> {
        sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1
                FROM user_roles
                INNER JOIN roles
                    ON roles.id = user_roles.role_id
                    AND roles.deleted_at IS NULL
                INNER JOIN role_permissions
                    ON role_permissions.role_id = roles.id
                INNER JOIN permissions
                    ON permissions.id = role_permissions.permission_id
                WHERE user_roles.subject = $1
                    AND permissions.name = $2
                UNION ALL
                SELECT 1
                FROM user_permissions
                INNER JOIN permissions
                    ON permissions.id = user_permissions.permission_id
                WHERE user_permissions.subject = $1
                    AND permissions.name = $2
            )
            "#,
        )
        .bind(subject)
        .bind(permission)
        .fetch_one(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to check permission '{permission}' for subject '{subject}': {error}"
            ))
        })
    }

    async fn list_permissions_for_subject(&self, subject: &str) -> AppResult<Vec<PermissionName>> {
        let rows = sqlx::query_as::<_, PermissionNameRow>(
            r#"
            SELECT permissions.name
            FROM user_roles
            INNER JOIN roles
                ON roles.id = user_roles.role_id
                AND roles.deleted_at IS NULL
            INNER JOIN role_permissions
                ON role_permissions.role_id = roles.id
            INNER JOIN permissions
                ON permissions.id = role_permissions.permission_id
            WHERE user_roles.subject = $1
            UNION
            SELECT permissions.name
            FROM user_permissions
            INNER JOIN permissions
                ON permissions.id = user_permissions.permission_id
            WHERE user_permissions.subject = $1
            ORDER BY name
            "#,
        )
        .bind(subject)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load permissions: {error}")))?;

        rows.into_iter()
            .map(|row| {
                PermissionName::new(row.name.as_str()).map_err(|error| {
                    AppError::Internal(format!(
                        "failed to decode permission '{}' for subject '{subject}': {error}",
                        row.name
                    ))
                })
            })
            .collect()
    }
}
