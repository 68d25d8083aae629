//! Client-side merge of change notifications into a cached list.
//!
//! This is the reference behavior for consumers of the live feed: a
//! notification replaces the matching record in place and never adds,
//! removes or reorders entries.

use serde::de::DeserializeOwned;
use tracing::debug;
use uuid::Uuid;

use schooldesk_core::{AppError, AppResult};
use schooldesk_domain::{ChangeNotification, Topic, TrackableEntity};

/// What a merge did to the collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The record with the notification's id was replaced.
    Replaced,
    /// No record with that id is cached.
    Ignored,
    /// The notification belongs to another topic.
    ForeignTopic,
}

/// Cached list of tracked records kept in sync with a topic.
#[derive(Debug, Clone, PartialEq)]
pub struct LiveCollection<T> {
    items: Vec<T>,
}

impl<T> LiveCollection<T>
where
    T: TrackableEntity + DeserializeOwned,
{
    /// Wraps the list returned by the initial load.
    #[must_use]
    pub fn new(items: Vec<T>) -> Self {
        Self { items }
    }

    /// Returns the cached records in load order.
    #[must_use]
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Finds a cached record by id.
    #[must_use]
    pub fn get(&self, id: Uuid) -> Option<&T> {
        self.items.iter().find(|item| item.entity_id() == id)
    }

    /// Applies one notification.
    ///
    /// Notifications are applied in arrival order; the last one for an id
    /// wins.
    pub fn apply(&mut self, notification: &ChangeNotification) -> AppResult<MergeOutcome> {
        if notification.topic() != T::TOPIC {
            return Ok(MergeOutcome::ForeignTopic);
        }

        let Some(slot) = self
            .items
            .iter_mut()
            .find(|item| item.entity_id() == notification.entity_id())
        else {
            debug!(
                topic = %T::TOPIC,
                entity_id = %notification.entity_id(),
                "ignoring change for uncached record"
            );
            return Ok(MergeOutcome::Ignored);
        };

        *slot = serde_json::from_value(notification.snapshot().clone()).map_err(|error| {
            AppError::Validation(format!(
                "invalid {} snapshot for '{}': {error}",
                T::TOPIC,
                notification.entity_id()
            ))
        })?;

        Ok(MergeOutcome::Replaced)
    }

    /// Returns the topic this collection follows.
    #[must_use]
    pub fn topic(&self) -> Topic {
        T::TOPIC
    }
}
