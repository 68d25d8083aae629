use std::sync::Arc;

use uuid::Uuid;

use schooldesk_core::{AppError, AppResult, UserIdentity};
use schooldesk_domain::{AuditAction, Opcr, permission_catalog};

use crate::{
    AuditEvent, AuditRepository, AuthorizationService, ChangeNotifier, OpcrInput, OpcrRepository,
};

/// Application service for Office Performance Commitment and Review records.
#[derive(Clone)]
pub struct OpcrService {
    authorization_service: AuthorizationService,
    repository: Arc<dyn OpcrRepository>,
    audit_repository: Arc<dyn AuditRepository>,
    notifier: ChangeNotifier,
}

impl OpcrService {
    /// Creates a new OPCR service.
    #[must_use]
    pub fn new(
        authorization_service: AuthorizationService,
        repository: Arc<dyn OpcrRepository>,
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

    /// Lists live OPCRs.
    pub async fn list(&self, actor: &UserIdentity) -> AppResult<Vec<Opcr>> {
        self.authorization_service
            .require_permission(actor, permission_catalog::OPCR_ACCESS)
            .await?;
        self.repository.list_opcrs().await
    }

    /// Returns one live OPCR.
    pub async fn get(&self, actor: &UserIdentity, opcr_id: Uuid) -> AppResult<Opcr> {
        self.authorization_service
            .require_permission(actor, permission_catalog::OPCR_ACCESS)
            .await?;
        self.repository
            .find_opcr(opcr_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("opcr '{opcr_id}' does not exist")))
    }

    /// Creates an OPCR and broadcasts it on `opcrs`.
    pub async fn create(&self, actor: &UserIdentity, input: OpcrInput) -> AppResult<Opcr> {
        self.authorization_service
            .require_permission(actor, permission_catalog::OPCR_CREATE)
            .await?;

        let opcr = self.repository.create_opcr(input).await?;
        self.notifier.notify(&opcr).await;
        self.record(actor, AuditAction::OpcrCreated, &opcr).await?;

        Ok(opcr)
    }

    /// Replaces an OPCR's fields and broadcasts the new state.
    pub async fn update(
        &self,
        actor: &UserIdentity,
        opcr_id: Uuid,
        input: OpcrInput,
    ) -> AppResult<Opcr> {
        self.authorization_service
            .require_permission(actor, permission_catalog::OPCR_EDIT)
            .await?;

        let opcr = self.repository.update_opcr(opcr_id, input).await?;
        self.notifier.notify(&opcr).await;
        self.record(actor, AuditAction::OpcrUpdated, &opcr).await?;

        Ok(opcr)
    }

    /// Soft-deletes an OPCR and broadcasts its final state.
    pub async fn delete(&self, actor: &UserIdentity, opcr_id: Uuid) -> AppResult<Opcr> {
        self.authorization_service
            .require_permission(actor, permission_catalog::OPCR_DELETE)
            .await?;

        let opcr = self.repository.soft_delete_opcr(opcr_id).await?;
        self.notifier.notify(&opcr).await;
        self.record(actor, AuditAction::OpcrDeleted, &opcr).await?;

        Ok(opcr)
    }

    async fn record(&self, actor: &UserIdentity, action: AuditAction, opcr: &Opcr) -> AppResult<()> {
        self.audit_repository
            .append_event(AuditEvent {
                subject: actor.subject().to_owned(),
                action,
                resource_type: "opcr".to_owned(),
                resource_id: opcr.id().to_string(),
                detail: Some(format!(
                    "{} '{}' ({})",
                    action.as_str(),
                    opcr.title(),
                    opcr.status().as_str()
                )),
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use schooldesk_core::{AppError, AppResult, NonEmptyString};
    use schooldesk_domain::{OpcrStatus, Topic, permission_catalog};
    use uuid::Uuid;

    use crate::OpcrInput;
    use crate::test_support::{Harness, actor};

    use super::OpcrService;

    fn service(harness: &Harness) -> OpcrService {
        OpcrService::new(
            harness.authorization.clone(),
            harness.records.clone(),
            harness.audit.clone(),
            harness.notifier.clone(),
        )
    }

    fn input(status: OpcrStatus) -> AppResult<OpcrInput> {
        Ok(OpcrInput {
            title: NonEmptyString::new("Learner support commitments")?,
            office: NonEmptyString::new("Curriculum Implementation Division")?,
            rating_period: NonEmptyString::new("2026 Q2")?,
            status,
            remarks: None,
        })
    }

    #[tokio::test]
    async fn update_publishes_post_commit_state_once() -> AppResult<()> {
        let harness = Harness::with_grants(
            "officer",
            &[
                permission_catalog::OPCR_CREATE,
                permission_catalog::OPCR_EDIT,
            ],
        )
        .await?;
        let service = service(&harness);
        let officer = actor("officer");

        let created = service.create(&officer, input(OpcrStatus::Draft)?).await?;
        let updated = service
            .update(&officer, created.id(), input(OpcrStatus::Submitted)?)
            .await?;

        let published = harness.publisher.published().await;
        assert_eq!(published.len(), 2);
        assert_eq!(published[1].topic(), Topic::Opcrs);
        assert_eq!(published[1].entity_id(), updated.id());
        assert_eq!(published[1].snapshot()["status"], "submitted");
        assert_eq!(harness.audit.events().await.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn failed_update_publishes_nothing() -> AppResult<()> {
        let harness = Harness::with_grants("officer", &[permission_catalog::OPCR_EDIT]).await?;
        let service = service(&harness);

        let result = service
            .update(&actor("officer"), Uuid::new_v4(), input(OpcrStatus::Approved)?)
            .await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
        assert!(harness.publisher.published().await.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn delete_broadcasts_soft_deleted_snapshot() -> AppResult<()> {
        let harness = Harness::with_grants(
            "officer",
            &[
                permission_catalog::OPCR_CREATE,
                permission_catalog::OPCR_DELETE,
                permission_catalog::OPCR_ACCESS,
            ],
        )
        .await?;
        let service = service(&harness);
        let officer = actor("officer");

        let created = service.create(&officer, input(OpcrStatus::Draft)?).await?;
        service.delete(&officer, created.id()).await?;

        let published = harness.publisher.published().await;
        assert_eq!(published.len(), 2);
        assert!(!published[1].snapshot()["deleted_at"].is_null());
        assert!(service.list(&officer).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn create_without_permission_is_forbidden() -> AppResult<()> {
        let harness = Harness::with_grants("viewer", &[permission_catalog::OPCR_ACCESS]).await?;
        let service = service(&harness);

        let result = service
            .create(&actor("viewer"), input(OpcrStatus::Draft)?)
            .await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
        assert!(harness.publisher.published().await.is_empty());
        Ok(())
    }
}
