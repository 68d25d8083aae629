use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use schooldesk_application::PermissionRepository;
use schooldesk_core::{AppError, AppResult};
use schooldesk_domain::{Permission, PermissionName};
use tracing::warn;

/// PostgreSQL-backed repository for the permission table.
#[derive(Clone)]
pub struct PostgresPermissionRepository {
    pool: PgPool,
}

impl PostgresPermissionRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct PermissionRow {
    id: Uuid,
    name: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<PermissionRow> for Permission {
    type Error = AppError;

    fn try_from(row: PermissionRow) -> Result<Self, Self::Error> {
        let name = PermissionName::new(row.name.as_str()).map_err(|error| {
            AppError::Internal(format!(
                "failed to decode stored permission '{}': {error}",
                row.name
            ))
        })?;

        Ok(Permission::new(row.id, name, row.created_at))
    }
}

#[async_trait]
impl PermissionRepository for PostgresPermissionRepository {
    async fn list_permissions(&self) -> AppResult<Vec<Permission>> {
        let rows = sqlx::query_as::<_, PermissionRow>(
            r#"
            SELECT id, name, created_at
            FROM permissions
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list permissions: {error}")))?;

        // A malformed row must not hide the well-formed ones from the registry.
        Ok(rows
            .into_iter()
            .filter_map(|row| match Permission::try_from(row) {
                Ok(permission) => Some(permission),
                Err(error) => {
                    warn!(%error, "skipping undecodable permission row");
                    None
                }
            })
            .collect())
    }

    async fn create_permission(&self, name: &PermissionName) -> AppResult<Permission> {
        let row = sqlx::query_as::<_, PermissionRow>(
            r#"
            INSERT INTO permissions (id, name)
            VALUES ($1, $2)
            RETURNING id, name, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|error| {
            if let sqlx::Error::Database(database_error) = &error
                && database_error.code().as_deref() == Some("23505")
            {
                return AppError::Conflict(format!("permission '{name}' already exists"));
            }

            AppError::Internal(format!("failed to create permission: {error}"))
        })?;

        Permission::try_from(row)
    }

    async fn delete_permission(&self, permission_id: Uuid) -> AppResult<Permission> {
        let row = sqlx::query_as::<_, PermissionRow>(
            r#"
            DELETE FROM permissions
            WHERE id = $1
            RETURNING id, name, created_at
            "#,
        )
        .bind(permission_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to delete permission: {error}")))?
        .ok_or_else(|| {
            AppError::NotFound(format!("permission '{permission_id}' does not exist"))
        })?;

        Permission::try_from(row)
    }
}

#[cfg(test)]
mod tests {
    use schooldesk_application::PermissionRepository;
    use schooldesk_domain::PermissionName;
    use uuid::Uuid;

    use super::PostgresPermissionRepository;
    use crate::postgres_test_support::{test_pool, unique};

    #[tokio::test]
    async fn malformed_stored_name_does_not_hide_valid_permissions() {
        let Some(pool) = test_pool().await else {
            return;
        };

        let repository = PostgresPermissionRepository::new(pool.clone());
        let valid = match PermissionName::new(unique("user_access")) {
            Ok(name) => name,
            Err(error) => panic!("generated permission name is invalid: {error}"),
        };
        assert!(repository.create_permission(&valid).await.is_ok());

        let malformed_id = Uuid::new_v4();
        let inserted = sqlx::query("INSERT INTO permissions (id, name) VALUES ($1, $2)")
            .bind(malformed_id)
            .bind(unique("report-export"))
            .execute(&pool)
            .await;
        assert!(inserted.is_ok());

        let listed = repository.list_permissions().await;
        let _ = sqlx::query("DELETE FROM permissions WHERE id = $1")
            .bind(malformed_id)
            .execute(&pool)
            .await;

        let permissions = match listed {
            Ok(permissions) => permissions,
            Err(error) => panic!("listing permissions failed: {error}"),
        };
        assert!(permissions.iter().any(|permission| permission.name() == &valid));
        assert!(permissions.iter().all(|permission| permission.id() != malformed_id));
    }
}
