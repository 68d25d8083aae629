use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use schooldesk_application::{RoleAssignment, RoleInput, RoleRepository};
use schooldesk_core::{AppError, AppResult, NonEmptyString};
use schooldesk_domain::{PermissionName, RecordTimestamps, Role};

/// PostgreSQL-backed repository for roles, assignments and direct grants.
#[derive(Clone)]
pub struct PostgresRoleRepository {
    pool: PgPool,
}

impl PostgresRoleRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn begin(&self) -> AppResult<Transaction<'_, Postgres>> {
        self.pool
            .begin()
            .await
            .map_err(|error| AppError::Internal(format!("failed to begin transaction: {error}")))
    }
}

#[derive(Debug, FromRow)]
struct RoleRow {
    id: Uuid,
    name: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
    permission: Option<String>,
}

#[derive(Debug, FromRow)]
struct RoleHeaderRow {
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, FromRow)]
struct RoleAssignmentRow {
    subject: String,
    role_id: Uuid,
    role_name: String,
    assigned_at: DateTime<Utc>,
}

#[async_trait]
impl RoleRepository for PostgresRoleRepository {
    async fn list_roles(&self) -> AppResult<Vec<Role>> {
        let rows = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT
                roles.id,
                roles.name,
                roles.created_at,
                roles.updated_at,
                roles.deleted_at,
                permissions.name AS permission
            FROM roles
            LEFT JOIN role_permissions
                ON role_permissions.role_id = roles.id
            LEFT JOIN permissions
                ON permissions.id = role_permissions.permission_id
            WHERE roles.deleted_at IS NULL
            ORDER BY roles.name, roles.id, permissions.name
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list roles: {error}")))?;

        aggregate_roles(rows)
    }

    async fn find_role(&self, role_id: Uuid) -> AppResult<Option<Role>> {
        let rows = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT
                roles.id,
                roles.name,
                roles.created_at,
                roles.updated_at,
                roles.deleted_at,
                permissions.name AS permission
            FROM roles
            LEFT JOIN role_permissions
                ON role_permissions.role_id = roles.id
            LEFT JOIN permissions
                ON permissions.id = role_permissions.permission_id
            WHERE roles.id = $1
                AND roles.deleted_at IS NULL
            ORDER BY permissions.name
            "#,
        )
        .bind(role_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load role: {error}")))?;

        Ok(aggregate_roles(rows)?.into_iter().next())
    }

    async fn create_role(&self, input: RoleInput) -> AppResult<Role> {
        let name = NonEmptyString::new(input.name)?;
        let role_id = Uuid::new_v4();
        let mut transaction = self.begin().await?;

        let header = sqlx::query_as::<_, RoleHeaderRow>(
            r#"
            INSERT INTO roles (id, name)
            VALUES ($1, $2)
            RETURNING created_at, updated_at, deleted_at
            "#,
        )
        .bind(role_id)
        .bind(name.as_str())
        .fetch_one(&mut *transaction)
        .await
        .map_err(|error| map_role_conflict(error, name.as_str()))?;

        replace_role_permissions(&mut transaction, role_id, &input.permissions).await?;
        commit(transaction).await?;

        Role::new(role_id, name, input.permissions, header.timestamps()?)
    }

    async fn update_role(&self, role_id: Uuid, input: RoleInput) -> AppResult<Role> {
        let name = NonEmptyString::new(input.name)?;
        let mut transaction = self.begin().await?;

        let header = sqlx::query_as::<_, RoleHeaderRow>(
            r#"
            UPDATE roles
            SET name = $2, updated_at = now()
            WHERE id = $1
                AND deleted_at IS NULL
            RETURNING created_at, updated_at, deleted_at
            "#,
        )
        .bind(role_id)
        .bind(name.as_str())
        .fetch_optional(&mut *transaction)
        .await
        .map_err(|error| map_role_conflict(error, name.as_str()))?
        .ok_or_else(|| AppError::NotFound(format!("role '{role_id}' does not exist")))?;

        replace_role_permissions(&mut transaction, role_id, &input.permissions).await?;
        commit(transaction).await?;

        Role::new(role_id, name, input.permissions, header.timestamps()?)
    }

    async fn soft_delete_role(&self, role_id: Uuid) -> AppResult<Role> {
        let mut transaction = self.begin().await?;

        let deleted = sqlx::query_as::<_, RoleRow>(
            r#"
            UPDATE roles
            SET deleted_at = now(), updated_at = now()
            WHERE id = $1
                AND deleted_at IS NULL
            RETURNING id, name, created_at, updated_at, deleted_at, NULL::TEXT AS permission
            "#,
        )
        .bind(role_id)
        .fetch_optional(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to delete role: {error}")))?
        .ok_or_else(|| AppError::NotFound(format!("role '{role_id}' does not exist")))?;

        let permissions = sqlx::query_scalar::<_, String>(
            r#"
            SELECT permissions.name
            FROM role_permissions
            INNER JOIN permissions
                ON permissions.id = role_permissions.permission_id
            WHERE role_permissions.role_id = $1
            ORDER BY permissions.name
            "#,
        )
        .bind(role_id)
        .fetch_all(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load role grants: {error}")))?;

        commit(transaction).await?;

        let timestamps = RecordTimestamps::restore(
            deleted.created_at,
            deleted.updated_at,
            deleted.deleted_at,
        )?;
        Role::new(
            deleted.id,
            deleted.name,
            decode_permissions(permissions)?,
            timestamps,
        )
    }

    async fn assign_role_to_subject(&self, subject: &str, role_id: Uuid) -> AppResult<()> {
        let inserted = sqlx::query(
            r#"
            INSERT INTO user_roles (subject, role_id)
            SELECT $1, roles.id
            FROM roles
            WHERE roles.id = $2
                AND roles.deleted_at IS NULL
            ON CONFLICT (subject, role_id) DO NOTHING
            "#,
        )
        .bind(subject)
        .bind(role_id)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to assign role: {error}")))?;

        if inserted.rows_affected() == 0 && self.find_role(role_id).await?.is_none() {
            return Err(AppError::NotFound(format!(
                "role '{role_id}' does not exist"
            )));
        }

        Ok(())
    }

    async fn remove_role_from_subject(&self, subject: &str, role_id: Uuid) -> AppResult<()> {
        sqlx::query(
            r#"
            DELETE FROM user_roles
            WHERE subject = $1
                AND role_id = $2
            "#,
        )
        .bind(subject)
        .bind(role_id)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to remove role: {error}")))?;

        Ok(())
    }

    async fn list_role_assignments(&self) -> AppResult<Vec<RoleAssignment>> {
        let rows = sqlx::query_as::<_, RoleAssignmentRow>(
            r#"
            SELECT
                user_roles.subject,
                roles.id AS role_id,
                roles.name AS role_name,
                user_roles.assigned_at
            FROM user_roles
            INNER JOIN roles
                ON roles.id = user_roles.role_id
                AND roles.deleted_at IS NULL
            ORDER BY user_roles.subject, roles.name
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to list role assignments: {error}"))
        })?;

        Ok(rows
            .into_iter()
            .map(|row| RoleAssignment {
                subject: row.subject,
                role_id: row.role_id,
                role_name: row.role_name,
                assigned_at: row.assigned_at,
            })
            .collect())
    }

    async fn grant_subject_permission(
        &self,
        subject: &str,
        permission: &PermissionName,
    ) -> AppResult<()> {
        let permission_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT id
            FROM permissions
            WHERE name = $1
            "#,
        )
        .bind(permission.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load permission: {error}")))?
        .ok_or_else(|| {
            AppError::Validation(format!("permission '{permission}' does not exist"))
        })?;

        sqlx::query(
            r#"
            INSERT INTO user_permissions (subject, permission_id)
            VALUES ($1, $2)
            ON CONFLICT (subject, permission_id) DO NOTHING
            "#,
        )
        .bind(subject)
        .bind(permission_id)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to grant permission: {error}")))?;

        Ok(())
    }

    async fn revoke_subject_permission(
        &self,
        subject: &str,
        permission: &PermissionName,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            DELETE FROM user_permissions
            USING permissions
            WHERE user_permissions.permission_id = permissions.id
                AND user_permissions.subject = $1
                AND permissions.name = $2
            "#,
        )
        .bind(subject)
        .bind(permission.as_str())
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to revoke permission: {error}")))?;

        Ok(())
    }
}

impl RoleHeaderRow {
    fn timestamps(&self) -> AppResult<RecordTimestamps> {
        RecordTimestamps::restore(self.created_at, self.updated_at, self.deleted_at)
    }
}

async fn replace_role_permissions(
    transaction: &mut Transaction<'_, Postgres>,
    role_id: Uuid,
    permissions: &[PermissionName],
) -> AppResult<()> {
    sqlx::query("DELETE FROM role_permissions WHERE role_id = $1")
        .bind(role_id)
        .execute(&mut **transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to clear role grants: {error}")))?;

    let mut names: Vec<String> = permissions
        .iter()
        .map(|permission| permission.as_str().to_owned())
        .collect();
    names.sort();
    names.dedup();

    let inserted = sqlx::query(
        r#"
        INSERT INTO role_permissions (role_id, permission_id)
        SELECT $1, permissions.id
        FROM permissions
        WHERE permissions.name = ANY($2)
        "#,
    )
    .bind(role_id)
    .bind(&names)
    .execute(&mut **transaction)
    .await
    .map_err(|error| AppError::Internal(format!("failed to persist role grants: {error}")))?;

    if usize::try_from(inserted.rows_affected()).unwrap_or(usize::MAX) != names.len() {
        return Err(AppError::Validation(
            "role references permissions that do not exist".to_owned(),
        ));
    }

    Ok(())
}

async fn commit(transaction: Transaction<'_, Postgres>) -> AppResult<()> {
    transaction
        .commit()
        .await
        .map_err(|error| AppError::Internal(format!("failed to commit transaction: {error}")))
}

fn decode_permissions(names: Vec<String>) -> AppResult<Vec<PermissionName>> {
    names
        .into_iter()
        .map(|name| {
            PermissionName::new(name.as_str()).map_err(|error| {
                AppError::Internal(format!("failed to decode role grant '{name}': {error}"))
            })
        })
        .collect()
}

fn aggregate_roles(rows: Vec<RoleRow>) -> AppResult<Vec<Role>> {
    let mut grouped: Vec<(RoleRow, Vec<String>)> = Vec::new();

    for mut row in rows {
        let permission = row.permission.take();
        match grouped.last_mut() {
            Some((current, permissions)) if current.id == row.id => {
                permissions.extend(permission);
            }
            _ => grouped.push((row, permission.into_iter().collect())),
        }
    }

    grouped
        .into_iter()
        .map(|(row, permissions)| {
            let timestamps =
                RecordTimestamps::restore(row.created_at, row.updated_at, row.deleted_at)?;
            Role::new(row.id, row.name, decode_permissions(permissions)?, timestamps)
        })
        .collect()
}

fn map_role_conflict(error: sqlx::Error, role_name: &str) -> AppError {
    if let sqlx::Error::Database(database_error) = &error
        && database_error.code().as_deref() == Some("23505")
    {
        return AppError::Conflict(format!("role '{role_name}' already exists"));
    }

    AppError::Internal(format!("failed to save role: {error}"))
}
