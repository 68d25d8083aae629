use chrono::{DateTime, Utc};
use schooldesk_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Persistence timestamps carried by every trackable record.
///
/// A record with `deleted_at` set is soft-deleted: it stays in storage for
/// audit and is hidden from list views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordTimestamps {
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl RecordTimestamps {
    /// Creates timestamps for a record that was just inserted.
    #[must_use]
    pub fn created(at: DateTime<Utc>) -> Self {
        Self {
            created_at: at,
            updated_at: at,
            deleted_at: None,
        }
    }

    /// Restores timestamps loaded from storage.
    pub fn restore(
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
        deleted_at: Option<DateTime<Utc>>,
    ) -> AppResult<Self> {
        if updated_at < created_at {
            return Err(AppError::Validation(
                "updated_at must not precede created_at".to_owned(),
            ));
        }

        Ok(Self {
            created_at,
            updated_at,
            deleted_at,
        })
    }

    /// Returns the insert timestamp.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the last write timestamp.
    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns the soft-delete timestamp, if any.
    #[must_use]
    pub fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }

    /// Returns whether the record has been soft-deleted.
    #[must_use]
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}
