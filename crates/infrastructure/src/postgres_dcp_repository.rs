use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use schooldesk_application::{DcpBatchInput, DcpRecipientInput, DcpRepository};
use schooldesk_core::{AppError, AppResult};
use schooldesk_domain::{DcpBatch, DcpRecipient, EquipmentCondition, RecordTimestamps};

/// PostgreSQL-backed repository for DCP batches and recipient allocations.
#[derive(Clone)]
pub struct PostgresDcpRepository {
    pool: PgPool,
}

impl PostgresDcpRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct BatchRow {
    id: Uuid,
    batch_name: String,
    school_name: String,
    delivery_date: Option<NaiveDate>,
    status: bool,
    remarks: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl TryFrom<BatchRow> for DcpBatch {
    type Error = AppError;

    fn try_from(row: BatchRow) -> Result<Self, Self::Error> {
        DcpBatch::new(
            row.id,
            row.batch_name,
            row.school_name,
            row.delivery_date,
            row.status,
            row.remarks,
            RecordTimestamps::restore(row.created_at, row.updated_at, row.deleted_at)?,
        )
    }
}

#[derive(Debug, FromRow)]
struct RecipientRow {
    id: Uuid,
    dcp_batch_id: Uuid,
    recipient_name: String,
    quantity: i32,
    condition: String,
    remarks: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl TryFrom<RecipientRow> for DcpRecipient {
    type Error = AppError;

    fn try_from(row: RecipientRow) -> Result<Self, Self::Error> {
        let condition = EquipmentCondition::from_str(row.condition.as_str()).map_err(|error| {
            AppError::Internal(format!(
                "failed to decode condition '{}' of recipient '{}': {error}",
                row.condition, row.id
            ))
        })?;

        DcpRecipient::new(
            row.id,
            row.dcp_batch_id,
            row.recipient_name,
            row.quantity,
            condition,
            row.remarks,
            RecordTimestamps::restore(row.created_at, row.updated_at, row.deleted_at)?,
        )
    }
}

fn batch_not_found(batch_id: Uuid) -> AppError {
    AppError::NotFound(format!("dcp batch '{batch_id}' does not exist"))
}

fn recipient_not_found(recipient_id: Uuid) -> AppError {
    AppError::NotFound(format!("dcp recipient '{recipient_id}' does not exist"))
}

#[async_trait]
impl DcpRepository for PostgresDcpRepository {
    async fn list_batches(&self) -> AppResult<Vec<DcpBatch>> {
        let rows = sqlx::query_as::<_, BatchRow>(
            r#"
            SELECT id, batch_name, school_name, delivery_date, status, remarks,
                created_at, updated_at, deleted_at
            FROM dcp_batches
            WHERE deleted_at IS NULL
            ORDER BY created_at DESC, id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list dcp batches: {error}")))?;

        rows.into_iter().map(DcpBatch::try_from).collect()
    }

    async fn find_batch(&self, batch_id: Uuid) -> AppResult<Option<DcpBatch>> {
        let row = sqlx::query_as::<_, BatchRow>(
            r#"
            SELECT id, batch_name, school_name, delivery_date, status, remarks,
                created_at, updated_at, deleted_at
            FROM dcp_batches
            WHERE id = $1
                AND deleted_at IS NULL
            "#,
        )
        .bind(batch_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load dcp batch: {error}")))?;

        row.map(DcpBatch::try_from).transpose()
    }

    async fn create_batch(&self, input: DcpBatchInput) -> AppResult<DcpBatch> {
        let row = sqlx::query_as::<_, BatchRow>(
            r#"
            INSERT INTO dcp_batches (id, batch_name, school_name, delivery_date, status, remarks)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, batch_name, school_name, delivery_date, status, remarks,
                created_at, updated_at, deleted_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(input.batch_name.as_str())
        .bind(input.school_name.as_str())
        .bind(input.delivery_date)
        .bind(input.status)
        .bind(input.remarks)
        .fetch_one(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to create dcp batch: {error}")))?;

        DcpBatch::try_from(row)
    }

    async fn update_batch(&self, batch_id: Uuid, input: DcpBatchInput) -> AppResult<DcpBatch> {
        let row = sqlx::query_as::<_, BatchRow>(
            r#"
            UPDATE dcp_batches
            SET batch_name = $2,
                school_name = $3,
                delivery_date = $4,
                status = $5,
                remarks = $6,
                updated_at = now()
            WHERE id = $1
                AND deleted_at IS NULL
            RETURNING id, batch_name, school_name, delivery_date, status, remarks,
                created_at, updated_at, deleted_at
            "#,
        )
        .bind(batch_id)
        .bind(input.batch_name.as_str())
        .bind(input.school_name.as_str())
        .bind(input.delivery_date)
        .bind(input.status)
        .bind(input.remarks)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to update dcp batch: {error}")))?
        .ok_or_else(|| batch_not_found(batch_id))?;

        DcpBatch::try_from(row)
    }

    async fn soft_delete_batch(&self, batch_id: Uuid) -> AppResult<DcpBatch> {
        let row = sqlx::query_as::<_, BatchRow>(
            r#"
            UPDATE dcp_batches
            SET deleted_at = now(), updated_at = now()
            WHERE id = $1
                AND deleted_at IS NULL
            RETURNING id, batch_name, school_name, delivery_date, status, remarks,
                created_at, updated_at, deleted_at
            "#,
        )
        .bind(batch_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to delete dcp batch: {error}")))?
        .ok_or_else(|| batch_not_found(batch_id))?;

        DcpBatch::try_from(row)
    }

    async fn list_recipients(&self, batch_id: Uuid) -> AppResult<Vec<DcpRecipient>> {
        let rows = sqlx::query_as::<_, RecipientRow>(
            r#"
            SELECT id, dcp_batch_id, recipient_name, quantity, condition, remarks,
                created_at, updated_at, deleted_at
            FROM dcp_recipients
            WHERE dcp_batch_id = $1
                AND deleted_at IS NULL
            ORDER BY created_at, id
            "#,
        )
        .bind(batch_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to list dcp recipients: {error}"))
        })?;

        rows.into_iter().map(DcpRecipient::try_from).collect()
    }

    async fn create_recipient(
        &self,
        batch_id: Uuid,
        input: DcpRecipientInput,
    ) -> AppResult<DcpRecipient> {
        let row = sqlx::query_as::<_, RecipientRow>(
            r#"
            INSERT INTO dcp_recipients (
                id, dcp_batch_id, recipient_name, quantity, condition, remarks
            )
            SELECT $1, dcp_batches.id, $3, $4, $5, $6
            FROM dcp_batches
            WHERE dcp_batches.id = $2
                AND dcp_batches.deleted_at IS NULL
            RETURNING id, dcp_batch_id, recipient_name, quantity, condition, remarks,
                created_at, updated_at, deleted_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(batch_id)
        .bind(input.recipient_name.as_str())
        .bind(input.quantity)
        .bind(input.condition.as_str())
        .bind(input.remarks)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to create dcp recipient: {error}"))
        })?
        .ok_or_else(|| batch_not_found(batch_id))?;

        DcpRecipient::try_from(row)
    }

    async fn update_recipient(
        &self,
        recipient_id: Uuid,
        input: DcpRecipientInput,
    ) -> AppResult<DcpRecipient> {
        let row = sqlx::query_as::<_, RecipientRow>(
            r#"
            UPDATE dcp_recipients
            SET recipient_name = $2,
                quantity = $3,
                condition = $4,
                remarks = $5,
                updated_at = now()
            WHERE id = $1
                AND deleted_at IS NULL
            RETURNING id, dcp_batch_id, recipient_name, quantity, condition, remarks,
                created_at, updated_at, deleted_at
            "#,
        )
        .bind(recipient_id)
        .bind(input.recipient_name.as_str())
        .bind(input.quantity)
        .bind(input.condition.as_str())
        .bind(input.remarks)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to update dcp recipient: {error}"))
        })?
        .ok_or_else(|| recipient_not_found(recipient_id))?;

        DcpRecipient::try_from(row)
    }

    async fn soft_delete_recipient(&self, recipient_id: Uuid) -> AppResult<DcpRecipient> {
        let row = sqlx::query_as::<_, RecipientRow>(
            r#"
            UPDATE dcp_recipients
            SET deleted_at = now(), updated_at = now()
            WHERE id = $1
                AND deleted_at IS NULL
            RETURNING id, dcp_batch_id, recipient_name, quantity, condition, remarks,
                created_at, updated_at, deleted_at
            "#,
        )
        .bind(recipient_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to delete dcp recipient: {error}"))
        })?
        .ok_or_else(|| recipient_not_found(recipient_id))?;

        DcpRecipient::try_from(row)
    }
}
