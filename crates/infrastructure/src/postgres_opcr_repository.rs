use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use schooldesk_application::{OpcrInput, OpcrRepository};
use schooldesk_core::{AppError, AppResult};
use schooldesk_domain::{Opcr, OpcrStatus, RecordTimestamps};

/// PostgreSQL-backed repository for OPCR records.
#[derive(Clone)]
pub struct PostgresOpcrRepository {
    pool: PgPool,
}

impl PostgresOpcrRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct OpcrRow {
    id: Uuid,
    title: String,
    office: String,
    rating_period: String,
    status: String,
    remarks: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl TryFrom<OpcrRow> for Opcr {
    type Error = AppError;

    fn try_from(row: OpcrRow) -> Result<Self, Self::Error> {
        let status = OpcrStatus::from_str(row.status.as_str()).map_err(|error| {
            AppError::Internal(format!(
                "failed to decode status '{}' of opcr '{}': {error}",
                row.status, row.id
            ))
        })?;

        Opcr::new(
            row.id,
            row.title,
            row.office,
            row.rating_period,
            status,
            row.remarks,
            RecordTimestamps::restore(row.created_at, row.updated_at, row.deleted_at)?,
        )
    }
}

#[async_trait]
impl OpcrRepository for PostgresOpcrRepository {
    async fn list_opcrs(&self) -> AppResult<Vec<Opcr>> {
        let rows = sqlx::query_as::<_, OpcrRow>(
            r#"
            SELECT id, title, office, rating_period, status, remarks,
                created_at, updated_at, deleted_at
            FROM opcrs
            WHERE deleted_at IS NULL
            ORDER BY created_at DESC, id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list opcrs: {error}")))?;

        rows.into_iter().map(Opcr::try_from).collect()
    }

    async fn find_opcr(&self, opcr_id: Uuid) -> AppResult<Option<Opcr>> {
        let row = sqlx::query_as::<_, OpcrRow>(
            r#"
            SELECT id, title, office, rating_period, status, remarks,
                created_at, updated_at, deleted_at
            FROM opcrs
            WHERE id = $1
                AND deleted_at IS NULL
            "#,
        )
        .bind(opcr_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load opcr: {error}")))?;

        row.map(Opcr::try_from).transpose()
    }

    async fn create_opcr(&self, input: OpcrInput) -> AppResult<Opcr> {
        let row = sqlx::query_as::<_, OpcrRow>(
            r#"
            INSERT INTO opcrs (id, title, office, rating_period, status, remarks)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, title, office, rating_period, status, remarks,
                created_at, updated_at, deleted_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(input.title.as_str())
        .bind(input.office.as_str())
        .bind(input.rating_period.as_str())
        .bind(input.status.as_str())
        .bind(input.remarks)
        .fetch_one(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to create opcr: {error}")))?;

        Opcr::try_from(row)
    }

    async fn update_opcr(&self, opcr_id: Uuid, input: OpcrInput) -> AppResult<Opcr> {
        let row = sqlx::query_as::<_, OpcrRow>(
            r#"
            UPDATE opcrs
            SET title = $2,
                office = $3,
                rating_period = $4,
                status = $5,
                remarks = $6,
                updated_at = now()
            WHERE id = $1
                AND deleted_at IS NULL
            RETURNING id, title, office, rating_period, status, remarks,
                created_at, updated_at, deleted_at
            "#,
        )
        .bind(opcr_id)
        .bind(input.title.as_str())
        .bind(input.office.as_str())
        .bind(input.rating_period.as_str())
        .bind(input.status.as_str())
        .bind(input.remarks)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to update opcr: {error}")))?
        .ok_or_else(|| AppError::NotFound(format!("opcr '{opcr_id}' does not exist")))?;

        Opcr::try_from(row)
    }

    async fn soft_delete_opcr(&self, opcr_id: Uuid) -> AppResult<Opcr> {
        let row = sqlx::query_as::<_, OpcrRow>(
            r#"
            UPDATE opcrs
            SET deleted_at = now(), updated_at = now()
            WHERE id = $1
                AND deleted_at IS NULL
            RETURNING id, title, office, rating_period, status, remarks,
                created_at, updated_at, deleted_at
            "#,
        )
        .bind(opcr_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to delete opcr: {error}")))?
        .ok_or_else(|| AppError::NotFound(format!("opcr '{opcr_id}' does not exist")))?;

        Opcr::try_from(row)
    }
}

#[cfg(test)]
mod tests {
    use schooldesk_application::{OpcrInput, OpcrRepository};
    use schooldesk_core::{AppError, NonEmptyString};
    use schooldesk_domain::OpcrStatus;
    use uuid::Uuid;

    use crate::postgres_test_support::{test_pool, unique};

    use super::PostgresOpcrRepository;

    fn input(title: &str, status: OpcrStatus) -> OpcrInput {
        let text = |value: &str| match NonEmptyString::new(value) {
            Ok(value) => value,
            Err(error) => panic!("invalid test input: {error}"),
        };

        OpcrInput {
            title: text(title),
            office: text("Schools Division Office"),
            rating_period: text("2026 Q3"),
            status,
            remarks: Some("  ".to_owned()),
        }
    }

    #[tokio::test]
    async fn update_returns_committed_state() {
        let Some(pool) = test_pool().await else {
            return;
        };
        let repository = PostgresOpcrRepository::new(pool);
        let title = unique("opcr");

        let created = match repository.create_opcr(input(&title, OpcrStatus::Draft)).await {
            Ok(opcr) => opcr,
            Err(error) => panic!("failed to create opcr: {error}"),
        };

        let updated = repository
            .update_opcr(created.id(), input(&title, OpcrStatus::Reviewed))
            .await;
        assert!(matches!(
            &updated,
            Ok(opcr) if opcr.status() == OpcrStatus::Reviewed
                && opcr.timestamps().updated_at() >= created.timestamps().updated_at()
        ));

        let loaded = repository.find_opcr(created.id()).await;
        assert!(matches!(loaded, Ok(Some(opcr)) if opcr.status() == OpcrStatus::Reviewed));
    }

    #[tokio::test]
    async fn soft_deleted_opcr_disappears_from_reads() {
        let Some(pool) = test_pool().await else {
            return;
        };
        let repository = PostgresOpcrRepository::new(pool);

        let created = match repository
            .create_opcr(input(&unique("opcr"), OpcrStatus::Submitted))
            .await
        {
            Ok(opcr) => opcr,
            Err(error) => panic!("failed to create opcr: {error}"),
        };

        let deleted = repository.soft_delete_opcr(created.id()).await;
        assert!(matches!(&deleted, Ok(opcr) if opcr.timestamps().is_deleted()));
        assert!(matches!(repository.find_opcr(created.id()).await, Ok(None)));
        assert!(matches!(
            repository.soft_delete_opcr(created.id()).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            repository
                .update_opcr(Uuid::new_v4(), input("missing", OpcrStatus::Draft))
                .await,
            Err(AppError::NotFound(_))
        ));
    }
}
