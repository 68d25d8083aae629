use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use schooldesk_application::{AuditEvent, AuditRepository};
use schooldesk_core::{AppError, AppResult};

/// Append-only audit trail stored in `audit_log_entries`.
#[derive(Clone)]
pub struct PostgresAuditRepository {
    pool: PgPool,
}

impl PostgresAuditRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditRepository for PostgresAuditRepository {
    async fn append_event(&self, event: AuditEvent) -> AppResult<()> {
        let entry_id = Uuid::new_v4();

        sqlx::query(
            r#"
            INSERT INTO audit_log_entries (id, subject, action, resource_type, resource_id, detail)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(entry_id)
        .bind(event.subject.as_str())
        .bind(event.action.as_str())
        .bind(event.resource_type.as_str())
        .bind(event.resource_id.as_str())
        .bind(event.detail.as_deref())
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to append audit event '{}' for {} {}: {error}",
                event.action.as_str(),
                event.resource_type,
                event.resource_id
            ))
        })?;

        Ok(())
    }
}
