use std::str::FromStr;

use schooldesk_core::{AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::change::{Topic, TrackableEntity};
use crate::lifecycle::RecordTimestamps;

/// Review state of an OPCR document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpcrStatus {
    /// Being prepared by the office.
    Draft,
    /// Handed in for review.
    Submitted,
    /// Reviewed, awaiting approval.
    Reviewed,
    /// Final.
    Approved,
}

impl OpcrStatus {
    /// Returns a stable storage value for this status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Submitted => "submitted",
            Self::Reviewed => "reviewed",
            Self::Approved => "approved",
        }
    }
}

impl FromStr for OpcrStatus {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "draft" => Ok(Self::Draft),
            "submitted" => Ok(Self::Submitted),
            "reviewed" => Ok(Self::Reviewed),
            "approved" => Ok(Self::Approved),
            _ => Err(AppError::Validation(format!(
                "unknown opcr status '{value}'"
            ))),
        }
    }
}

/// Office Performance Commitment and Review document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Opcr {
    id: Uuid,
    title: NonEmptyString,
    office: NonEmptyString,
    rating_period: NonEmptyString,
    status: OpcrStatus,
    remarks: Option<String>,
    #[serde(flatten)]
    timestamps: RecordTimestamps,
}

impl Opcr {
    /// Creates a validated OPCR record.
    pub fn new(
        id: Uuid,
        title: impl Into<String>,
        office: impl Into<String>,
        rating_period: impl Into<String>,
        status: OpcrStatus,
        remarks: Option<String>,
        timestamps: RecordTimestamps,
    ) -> AppResult<Self> {
        let remarks = remarks.and_then(|value| {
            let trimmed = value.trim().to_owned();
            (!trimmed.is_empty()).then_some(trimmed)
        });

        Ok(Self {
            id,
            title: NonEmptyString::new(title)?,
            office: NonEmptyString::new(office)?,
            rating_period: NonEmptyString::new(rating_period)?,
            status,
            remarks,
            timestamps,
        })
    }

    /// Returns the stable record identifier.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Returns the document title.
    #[must_use]
    pub fn title(&self) -> &NonEmptyString {
        &self.title
    }

    /// Returns the office the commitments belong to.
    #[must_use]
    pub fn office(&self) -> &NonEmptyString {
        &self.office
    }

    /// Returns the rating period label, for example `2026 Q1`.
    #[must_use]
    pub fn rating_period(&self) -> &NonEmptyString {
        &self.rating_period
    }

    /// Returns the review state.
    #[must_use]
    pub fn status(&self) -> OpcrStatus {
        self.status
    }

    /// Returns optional reviewer remarks.
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

impl TrackableEntity for Opcr {
    const TOPIC: Topic = Topic::Opcrs;

    fn entity_id(&self) -> Uuid {
        self.id
    }
}
