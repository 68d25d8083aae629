use std::str::FromStr;

use chrono::NaiveDate;
use schooldesk_core::{AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::change::{Topic, TrackableEntity};
use crate::lifecycle::RecordTimestamps;

fn normalize_remarks(remarks: Option<String>) -> Option<String> {
    remarks.and_then(|value| {
        let trimmed = value.trim().to_owned();
        (!trimmed.is_empty()).then_some(trimmed)
    })
}

/// DepEd Computerization Program equipment batch delivered to a school.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DcpBatch {
    id: Uuid,
    batch_name: NonEmptyString,
    school_name: NonEmptyString,
    delivery_date: Option<NaiveDate>,
    status: bool,
    remarks: Option<String>,
    #[serde(flatten)]
    timestamps: RecordTimestamps,
}

impl DcpBatch {
    /// Creates a validated batch record.
    pub fn new(
        id: Uuid,
        batch_name: impl Into<String>,
        school_name: impl Into<String>,
        delivery_date: Option<NaiveDate>,
        status: bool,
        remarks: Option<String>,
        timestamps: RecordTimestamps,
    ) -> AppResult<Self> {
        Ok(Self {
            id,
            batch_name: NonEmptyString::new(batch_name)?,
            school_name: NonEmptyString::new(school_name)?,
            delivery_date,
            status,
            remarks: normalize_remarks(remarks),
            timestamps,
        })
    }

    /// Returns the stable batch identifier.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Returns the batch label.
    #[must_use]
    pub fn batch_name(&self) -> &NonEmptyString {
        &self.batch_name
    }

    /// Returns the receiving school.
    #[must_use]
    pub fn school_name(&self) -> &NonEmptyString {
        &self.school_name
    }

    /// Returns the delivery date, when known.
    #[must_use]
    pub fn delivery_date(&self) -> Option<NaiveDate> {
        self.delivery_date
    }

    /// Returns whether the batch is marked complete and in good order.
    #[must_use]
    pub fn status(&self) -> bool {
        self.status
    }

    /// Returns optional remarks.
    #[must_use]
    pub fn remarks(&self) -> Option<&str> {
        self.remarks.as_deref()
    }

    /// Returns persistence timestamps.
    #[must_use]
    pub fn timestamps(&self) -> &RecordTimestamps {
        &self.timestamps
    }
}

impl TrackableEntity for DcpBatch {
    const TOPIC: Topic = Topic::Dcps;

    fn entity_id(&self) -> Uuid {
        self.id
    }
}

/// Physical condition of allocated equipment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EquipmentCondition {
    /// In service.
    Working,
    /// Awaiting repair.
    ForRepair,
    /// Beyond repair.
    Unserviceable,
}

impl EquipmentCondition {
    /// Returns a stable storage value for this condition.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Working => "working",
            Self::ForRepair => "for_repair",
            Self::Unserviceable => "unserviceable",
        }
    }
}

impl FromStr for EquipmentCondition {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "working" => Ok(Self::Working),
            "for_repair" => Ok(Self::ForRepair),
            "unserviceable" => Ok(Self::Unserviceable),
            _ => Err(AppError::Validation(format!(
                "unknown equipment condition '{value}'"
            ))),
        }
    }
}

/// Allocation of a DCP batch's equipment to one recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DcpRecipient {
    id: Uuid,
    dcp_batch_id: Uuid,
    recipient_name: NonEmptyString,
    quantity: i32,
    condition: EquipmentCondition,
    remarks: Option<String>,
    #[serde(flatten)]
    timestamps: RecordTimestamps,
}

impl DcpRecipient {
    /// Creates a validated recipient allocation.
    pub fn new(
        id: Uuid,
        dcp_batch_id: Uuid,
        recipient_name: impl Into<String>,
        quantity: i32,
        condition: EquipmentCondition,
        remarks: Option<String>,
        timestamps: RecordTimestamps,
    ) -> AppResult<Self> {
        if quantity < 0 {
            return Err(AppError::Validation(
                "quantity must be greater than or equal to zero".to_owned(),
            ));
        }

        Ok(Self {
            id,
            dcp_batch_id,
            recipient_name: NonEmptyString::new(recipient_name)?,
            quantity,
            condition,
            remarks: normalize_remarks(remarks),
            timestamps,
        })
    }

    /// Returns the stable allocation identifier.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Returns the parent batch identifier.
    #[must_use]
    pub fn dcp_batch_id(&self) -> Uuid {
        self.dcp_batch_id
    }

    /// Returns the recipient label (school, office or personnel).
    #[must_use]
    pub fn recipient_name(&self) -> &NonEmptyString {
        &self.recipient_name
    }

    /// Returns the allocated unit count.
    #[must_use]
    pub fn quantity(&self) -> i32 {
        self.quantity
    }

    /// Returns the recorded equipment condition.
    #[must_use]
    pub fn condition(&self) -> EquipmentCondition {
        self.condition
    }

    /// Returns optional remarks.
    #[must_use]
    pub fn remarks(&self) -> Option<&str> {
        self.remarks.as_deref()
    }

    /// Returns persistence timestamps.
    #[must_use]
    pub fn timestamps(&self) -> &RecordTimestamps {
        &self.timestamps
    }
}

impl TrackableEntity for DcpRecipient {
    const TOPIC: Topic = Topic::DcpRecipients;

    fn entity_id(&self) -> Uuid {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::{DcpBatch, DcpRecipient, EquipmentCondition};
    use crate::lifecycle::RecordTimestamps;

    #[test]
    fn negative_quantity_is_rejected() {
        let result = DcpRecipient::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            "Central Elementary School",
            -1,
            EquipmentCondition::Working,
            None,
            RecordTimestamps::created(Utc::now()),
        );
        assert!(result.is_err());
    }

    #[test]
    fn batch_requires_school_name() {
        let result = DcpBatch::new(
            Uuid::new_v4(),
            "Batch 2026-A",
            " ",
            None,
            true,
            None,
            RecordTimestamps::created(Utc::now()),
        );
        assert!(result.is_err());
    }

    #[test]
    fn condition_serializes_as_snake_case() {
        let value = serde_json::to_value(EquipmentCondition::ForRepair).ok();
        assert_eq!(value, Some(serde_json::Value::from("for_repair")));
    }
}
