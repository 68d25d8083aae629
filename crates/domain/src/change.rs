use std::str::FromStr;

use chrono::{DateTime, Utc};
use schooldesk_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::permission_catalog;

/// Publish/subscribe channel carrying notifications for one entity collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topic {
    /// Role records.
    Roles,
    /// OPCR performance-review records.
    Opcrs,
    /// DCP equipment batches.
    Dcps,
    /// DCP recipient allocations.
    DcpRecipients,
}

impl Topic {
    /// Returns the stable topic name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Roles => "roles",
            Self::Opcrs => "opcrs",
            Self::Dcps => "dcps",
            Self::DcpRecipients => "dcp_recipients",
        }
    }

    /// Returns every known topic.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[Topic] = &[Topic::Roles, Topic::Opcrs, Topic::Dcps, Topic::DcpRecipients];

        ALL
    }

    /// Returns the permission a subscriber needs to join this topic.
    #[must_use]
    pub fn access_permission(&self) -> &'static str {
        match self {
            Self::Roles => permission_catalog::ROLE_ACCESS,
            Self::Opcrs => permission_catalog::OPCR_ACCESS,
            Self::Dcps | Self::DcpRecipients => permission_catalog::DCP_ACCESS,
        }
    }
}

impl FromStr for Topic {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "roles" => Ok(Self::Roles),
            "opcrs" => Ok(Self::Opcrs),
            "dcps" => Ok(Self::Dcps),
            "dcp_recipients" => Ok(Self::DcpRecipients),
            _ => Err(AppError::Validation(format!("unknown topic '{value}'"))),
        }
    }
}

impl std::fmt::Display for Topic {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Persisted record whose viewers receive live update notifications.
pub trait TrackableEntity: Serialize {
    /// Topic shared by every instance of the entity type.
    const TOPIC: Topic;

    /// Returns the identifier subscribers merge on.
    fn entity_id(&self) -> Uuid;
}

/// Full post-commit snapshot of a trackable entity, addressed to its topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeNotification {
    topic: Topic,
    entity_id: Uuid,
    snapshot: Value,
    published_at: DateTime<Utc>,
}

impl ChangeNotification {
    /// Serializes an entity into a notification for its topic.
    pub fn from_entity<E: TrackableEntity>(entity: &E) -> AppResult<Self> {
        let snapshot = serde_json::to_value(entity).map_err(|error| {
            AppError::Internal(format!(
                "failed to serialize '{}' snapshot for entity '{}': {error}",
                E::TOPIC,
                entity.entity_id()
            ))
        })?;

        if !snapshot.is_object() {
            return Err(AppError::Internal(format!(
                "snapshot for topic '{}' must serialize to an object",
                E::TOPIC
            )));
        }

        Ok(Self {
            topic: E::TOPIC,
            entity_id: entity.entity_id(),
            snapshot,
            published_at: Utc::now(),
        })
    }

    /// Returns the destination topic.
    #[must_use]
    pub fn topic(&self) -> Topic {
        self.topic
    }

    /// Returns the changed entity identifier.
    #[must_use]
    pub fn entity_id(&self) -> Uuid {
        self.entity_id
    }

    /// Returns the serialized field values.
    #[must_use]
    pub fn snapshot(&self) -> &Value {
        &self.snapshot
    }

    /// Returns when the notification was built.
    #[must_use]
    pub fn published_at(&self) -> DateTime<Utc> {
        self.published_at
    }
}
