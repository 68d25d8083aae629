//! DepEd Computerization Program deliveries.
//!
//! Batches broadcast on `dcps`; recipient allocations broadcast on
//! `dcp_recipients`. Recipient writes are gated by `dcp_edit` because they
//! change the contents of an existing batch.

use std::sync::Arc;

use uuid::Uuid;

use schooldesk_core::{AppError, AppResult, UserIdentity};
use schooldesk_domain::{AuditAction, DcpBatch, DcpRecipient, permission_catalog};

use crate::{
    AuditEvent, AuditRepository, AuthorizationService, ChangeNotifier, DcpBatchInput,
    DcpRecipientInput, DcpRepository,
};

/// Application service for DCP batches and recipients.
#[derive(Clone)]
pub struct DcpService {
    authorization_service: AuthorizationService,
    repository: Arc<dyn DcpRepository>,
    audit_repository: Arc<dyn AuditRepository>,
    notifier: ChangeNotifier,
}

impl DcpService {
    /// Creates a new DCP service.
    #[must_use]
    pub fn new(
        authorization_service: AuthorizationService,
        repository: Arc<dyn DcpRepository>,
        audit_repository: Arc<dyn AuditRepository>,
        notifier: ChangeNotifier,
    ) -> Self {
        Self {
            authorization_service,
            repository,
            audit_repository,
            notifier,
        }
    }

    /// Lists live batches.
    pub async fn list_batches(&self, actor: &UserIdentity) -> AppResult<Vec<DcpBatch>> {
        self.require(actor, permission_catalog::DCP_ACCESS).await?;
        self.repository.list_batches().await
    }

    /// Returns one live batch.
    pub async fn get_batch(&self, actor: &UserIdentity, batch_id: Uuid) -> AppResult<DcpBatch> {
        self.require(actor, permission_catalog::DCP_ACCESS).await?;
        self.find_live_batch(batch_id).await
    }

    /// Creates a batch and broadcasts it.
    pub async fn create_batch(
        &self,
        actor: &UserIdentity,
        input: DcpBatchInput,
    ) -> AppResult<DcpBatch> {
        self.require(actor, permission_catalog::DCP_CREATE).await?;

        let batch = self.repository.create_batch(input).await?;
        self.notifier.notify(&batch).await;
        self.audit_batch(actor, AuditAction::DcpCreated, &batch).await?;

        Ok(batch)
    }

    /// Replaces a batch's fields, including its delivery status, and
    /// broadcasts the new state.
    pub async fn update_batch(
        &self,
        actor: &UserIdentity,
        batch_id: Uuid,
        input: DcpBatchInput,
    ) -> AppResult<DcpBatch> {
        self.require(actor, permission_catalog::DCP_EDIT).await?;

        let batch = self.repository.update_batch(batch_id, input).await?;
        self.notifier.notify(&batch).await;
        self.audit_batch(actor, AuditAction::DcpUpdated, &batch).await?;

        Ok(batch)
    }

    /// Soft-deletes a batch and broadcasts its final state.
    pub async fn delete_batch(&self, actor: &UserIdentity, batch_id: Uuid) -> AppResult<DcpBatch> {
        self.require(actor, permission_catalog::DCP_DELETE).await?;

        let batch = self.repository.soft_delete_batch(batch_id).await?;
        self.notifier.notify(&batch).await;
        self.audit_batch(actor, AuditAction::DcpDeleted, &batch).await?;

        Ok(batch)
    }

    /// Lists live recipients of a live batch.
    pub async fn list_recipients(
        &self,
        actor: &UserIdentity,
        batch_id: Uuid,
    ) -> AppResult<Vec<DcpRecipient>> {
        self.require(actor, permission_catalog::DCP_ACCESS).await?;
        self.find_live_batch(batch_id).await?;
        self.repository.list_recipients(batch_id).await
    }

    /// Adds a recipient allocation to a batch and broadcasts it.
    pub async fn create_recipient(
        &self,
        actor: &UserIdentity,
        batch_id: Uuid,
        input: DcpRecipientInput,
    ) -> AppResult<DcpRecipient> {
        self.require(actor, permission_catalog::DCP_EDIT).await?;
        validate_quantity(input.quantity)?;

        let recipient = self.repository.create_recipient(batch_id, input).await?;
        self.notifier.notify(&recipient).await;
        self.audit_recipient(actor, AuditAction::DcpRecipientCreated, &recipient).await?;

        Ok(recipient)
    }

    /// Replaces a recipient allocation and broadcasts the new state.
    pub async fn update_recipient(
        &self,
        actor: &UserIdentity,
        recipient_id: Uuid,
        input: DcpRecipientInput,
    ) -> AppResult<DcpRecipient> {
        self.require(actor, permission_catalog::DCP_EDIT).await?;
        validate_quantity(input.quantity)?;

        let recipient = self
            .repository
            .update_recipient(recipient_id, input)
            .await?;
        self.notifier.notify(&recipient).await;
        self.audit_recipient(actor, AuditAction::DcpRecipientUpdated, &recipient).await?;

        Ok(recipient)
    }

    /// Soft-deletes a recipient allocation and broadcasts its final state.
    pub async fn delete_recipient(
        &self,
        actor: &UserIdentity,
        recipient_id: Uuid,
    ) -> AppResult<DcpRecipient> {
        self.require(actor, permission_catalog::DCP_EDIT).await?;

        let recipient = self.repository.soft_delete_recipient(recipient_id).await?;
        self.notifier.notify(&recipient).await;
        self.audit_recipient(actor, AuditAction::DcpRecipientDeleted, &recipient).await?;

        Ok(recipient)
    }

    async fn require(&self, actor: &UserIdentity, permission: &str) -> AppResult<()> {
        self.authorization_service
            .require_permission(actor, permission)
            .await
    }

    async fn find_live_batch(&self, batch_id: Uuid) -> AppResult<DcpBatch> {
        self.repository
            .find_batch(batch_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("dcp batch '{batch_id}' does not exist")))
    }

    async fn audit_batch(
        &self,
        actor: &UserIdentity,
        action: AuditAction,
        batch: &DcpBatch,
    ) -> AppResult<()> {
        self.audit_repository
            .append_event(AuditEvent {
                subject: actor.subject().to_owned(),
                action,
                resource_type: "dcp_batch".to_owned(),
                resource_id: batch.id().to_string(),
                detail: Some(format!(
                    "batch '{}' for '{}' (delivered: {})",
                    batch.batch_name(),
                    batch.school_name(),
                    batch.status()
                )),
            })
            .await
    }

    async fn audit_recipient(
        &self,
        actor: &UserIdentity,
        action: AuditAction,
        recipient: &DcpRecipient,
    ) -> AppResult<()> {
        self.audit_repository
            .append_event(AuditEvent {
                subject: actor.subject().to_owned(),
                action,
                resource_type: "dcp_recipient".to_owned(),
                resource_id: recipient.id().to_string(),
                detail: Some(format!(
                    "{} x{} in batch '{}'",
                    recipient.recipient_name(),
                    recipient.quantity(),
                    recipient.dcp_batch_id()
                )),
            })
            .await
    }
}

fn validate_quantity(quantity: i32) -> AppResult<()> {
    if quantity < 0 {
        return Err(AppError::Validation(
            "quantity must be greater than or equal to zero".to_owned(),
        ));
    }

    Ok(())
}
