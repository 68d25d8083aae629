use chrono::NaiveDate;
use schooldesk_application::{DcpBatchInput, DcpRecipientInput, OpcrInput};
use schooldesk_core::{AppError, NonEmptyString};
use schooldesk_domain::{DcpBatch, DcpRecipient, Opcr, RecordTimestamps};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Incoming payload for OPCR creation and replacement.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/save-opcr-request.ts"
)]
pub struct SaveOpcrRequest {
    pub title: String,
    pub office: String,
    pub rating_period: String,
    /// One of `draft`, `submitted`, `reviewed`, `approved`.
    pub status: String,
    pub remarks: Option<String>,
}

/// Incoming payload for DCP batch creation and replacement.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/save-dcp-batch-request.ts"
)]
pub struct SaveDcpBatchRequest {
    pub batch_name: String,
    pub school_name: String,
    /// Calendar date as `YYYY-MM-DD`.
    pub delivery_date: Option<String>,
    /// Whether the batch has been delivered.
    pub status: bool,
    pub remarks: Option<String>,
}

/// Incoming payload for DCP recipient creation and replacement.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/save-dcp-recipient-request.ts"
)]
pub struct SaveDcpRecipientRequest {
    pub recipient_name: String,
    pub quantity: i32,
    /// One of `working`, `for_repair`, `unserviceable`.
    pub condition: String,
    pub remarks: Option<String>,
}

/// API representation of an OPCR.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/opcr-response.ts"
)]
pub struct OpcrResponse {
    pub id: String,
    pub title: String,
    pub office: String,
    pub rating_period: String,
    pub status: String,
    pub remarks: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub deleted_at: Option<String>,
}

/// API representation of a DCP batch.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/dcp-batch-response.ts"
)]
pub struct DcpBatchResponse {
    pub id: String,
    pub batch_name: String,
    pub school_name: String,
    pub delivery_date: Option<String>,
    pub status: bool,
    pub remarks: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub deleted_at: Option<String>,
}

/// API representation of a DCP recipient.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/dcp-recipient-response.ts"
)]
pub struct DcpRecipientResponse {
    pub id: String,
    pub dcp_batch_id: String,
    pub recipient_name: String,
    pub quantity: i32,
    pub condition: String,
    pub remarks: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub deleted_at: Option<String>,
}

impl TryFrom<SaveOpcrRequest> for OpcrInput {
    type Error = AppError;

    fn try_from(value: SaveOpcrRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            title: NonEmptyString::new(value.title)?,
            office: NonEmptyString::new(value.office)?,
            rating_period: NonEmptyString::new(value.rating_period)?,
            status: value.status.parse()?,
            remarks: value.remarks,
        })
    }
}

impl TryFrom<SaveDcpBatchRequest> for DcpBatchInput {
    type Error = AppError;

    fn try_from(value: SaveDcpBatchRequest) -> Result<Self, Self::Error> {
        let delivery_date = value
            .delivery_date
            .as_deref()
            .map(str::trim)
            .filter(|date| !date.is_empty())
            .map(|date| {
                NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|error| {
                    AppError::Validation(format!("invalid delivery_date '{date}': {error}"))
                })
            })
            .transpose()?;

        Ok(Self {
            batch_name: NonEmptyString::new(value.batch_name)?,
            school_name: NonEmptyString::new(value.school_name)?,
            delivery_date,
            status: value.status,
            remarks: value.remarks,
        })
    }
}

impl TryFrom<SaveDcpRecipientRequest> for DcpRecipientInput {
    type Error = AppError;

    fn try_from(value: SaveDcpRecipientRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            recipient_name: NonEmptyString::new(value.recipient_name)?,
            quantity: value.quantity,
            condition: value.condition.parse()?,
            remarks: value.remarks,
        })
    }
}

struct TimestampFields {
    created_at: String,
    updated_at: String,
    deleted_at: Option<String>,
}

impl From<&RecordTimestamps> for TimestampFields {
    fn from(value: &RecordTimestamps) -> Self {
        Self {
            created_at: value.created_at().to_rfc3339(),
            updated_at: value.updated_at().to_rfc3339(),
            deleted_at: value.deleted_at().map(|value| value.to_rfc3339()),
        }
    }
}

impl From<Opcr> for OpcrResponse {
    fn from(value: Opcr) -> Self {
        let timestamps = TimestampFields::from(value.timestamps());

        Self {
            id: value.id().to_string(),
            title: value.title().as_str().to_owned(),
            office: value.office().as_str().to_owned(),
            rating_period: value.rating_period().as_str().to_owned(),
            status: value.status().as_str().to_owned(),
            remarks: value.remarks().map(ToOwned::to_owned),
            created_at: timestamps.created_at,
            updated_at: timestamps.updated_at,
            deleted_at: timestamps.deleted_at,
        }
    }
}

impl From<DcpBatch> for DcpBatchResponse {
    fn from(value: DcpBatch) -> Self {
        let timestamps = TimestampFields::from(value.timestamps());

        Self {
            id: value.id().to_string(),
            batch_name: value.batch_name().as_str().to_owned(),
            school_name: value.school_name().as_str().to_owned(),
            delivery_date: value
                .delivery_date()
                .map(|date| date.format("%Y-%m-%d").to_string()),
            status: value.status(),
            remarks: value.remarks().map(ToOwned::to_owned),
            created_at: timestamps.created_at,
            updated_at: timestamps.updated_at,
            deleted_at: timestamps.deleted_at,
        }
    }
}

impl From<DcpRecipient> for DcpRecipientResponse {
    fn from(value: DcpRecipient) -> Self {
        let timestamps = TimestampFields::from(value.timestamps());

        Self {
            id: value.id().to_string(),
            dcp_batch_id: value.dcp_batch_id().to_string(),
            recipient_name: value.recipient_name().as_str().to_owned(),
            quantity: value.quantity(),
            condition: value.condition().as_str().to_owned(),
            remarks: value.remarks().map(ToOwned::to_owned),
            created_at: timestamps.created_at,
            updated_at: timestamps.updated_at,
            deleted_at: timestamps.deleted_at,
        }
    }
}
