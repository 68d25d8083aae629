use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use schooldesk_core::{AppResult, NonEmptyString};
use schooldesk_domain::{DcpBatch, DcpRecipient, EquipmentCondition, Opcr, OpcrStatus};

/// Input payload for creating or replacing an OPCR.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpcrInput {
    /// Commitment title.
    pub title: NonEmptyString,
    /// Office that owns the commitment.
    pub office: NonEmptyString,
    /// Rating period label.
    pub rating_period: NonEmptyString,
    /// Review status.
    pub status: OpcrStatus,
    /// Optional remarks.
    pub remarks: Option<String>,
}

/// Input payload for creating or replacing a DCP batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DcpBatchInput {
    /// Batch label.
    pub batch_name: NonEmptyString,
    /// Receiving school.
    pub school_name: NonEmptyString,
    /// Delivery date, once scheduled.
    pub delivery_date: Option<NaiveDate>,
    /// Whether the batch has been delivered.
    pub status: bool,
    /// Optional remarks.
    pub remarks: Option<String>,
}

/// Input payload for creating or replacing a DCP recipient allocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DcpRecipientInput {
    /// Receiving person or office.
    pub recipient_name: NonEmptyString,
    /// Allocated unit count.
    pub quantity: i32,
    /// Reported equipment condition.
    pub condition: EquipmentCondition,
    /// Optional remarks.
    pub remarks: Option<String>,
}

/// Repository port for OPCR records.
#[async_trait]
pub trait OpcrRepository: Send + Sync {
    /// Lists live OPCRs, newest first.
    async fn list_opcrs(&self) -> AppResult<Vec<Opcr>>;

    /// Finds a live OPCR by id.
    async fn find_opcr(&self, opcr_id: Uuid) -> AppResult<Option<Opcr>>;

    /// Persists a new OPCR.
    async fn create_opcr(&self, input: OpcrInput) -> AppResult<Opcr>;

    /// Replaces a live OPCR's fields.
    async fn update_opcr(&self, opcr_id: Uuid, input: OpcrInput) -> AppResult<Opcr>;

    /// Marks an OPCR as deleted and returns its final state.
    async fn soft_delete_opcr(&self, opcr_id: Uuid) -> AppResult<Opcr>;
}

/// Repository port for DCP batches and their recipients.
#[async_trait]
pub trait DcpRepository: Send + Sync {
    /// Lists live batches, newest first.
    async fn list_batches(&self) -> AppResult<Vec<DcpBatch>>;

    /// Finds a live batch by id.
    async fn find_batch(&self, batch_id: Uuid) -> AppResult<Option<DcpBatch>>;

    /// Persists a new batch.
    async fn create_batch(&self, input: DcpBatchInput) -> AppResult<DcpBatch>;

    /// Replaces a live batch's fields.
    async fn update_batch(&self, batch_id: Uuid, input: DcpBatchInput) -> AppResult<DcpBatch>;

    /// Marks a batch as deleted and returns its final state.
    async fn soft_delete_batch(&self, batch_id: Uuid) -> AppResult<DcpBatch>;

    /// Lists live recipients of a batch in creation order.
    async fn list_recipients(&self, batch_id: Uuid) -> AppResult<Vec<DcpRecipient>>;

    /// Persists a new recipient under a live batch.
    async fn create_recipient(
        &self,
        batch_id: Uuid,
        input: DcpRecipientInput,
    ) -> AppResult<DcpRecipient>;

    /// Replaces a live recipient's fields.
    async fn update_recipient(
        &self,
        recipient_id: Uuid,
        input: DcpRecipientInput,
    ) -> AppResult<DcpRecipient>;

    /// Marks a recipient as deleted and returns its final state.
    async fn soft_delete_recipient(&self, recipient_id: Uuid) -> AppResult<DcpRecipient>;
}
