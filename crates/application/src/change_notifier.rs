//! Post-commit change broadcasting.
//!
//! Every successful create, update or soft delete of a tracked record calls
//! [`ChangeNotifier::notify`] exactly once, after the write has been
//! committed. Delivery is best effort: transport failures are logged and
//! never surface to the caller whose write already succeeded.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use schooldesk_domain::{ChangeNotification, TrackableEntity};

use crate::ChangePublisher;

/// Result of a notification attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyOutcome {
    /// The transport accepted the notification.
    Delivered {
        /// Subscribers the transport reported as reached.
        subscribers: usize,
    },
    /// The notification was dropped and logged.
    Dropped,
}

/// Broadcasts post-commit snapshots of tracked records.
#[derive(Clone)]
pub struct ChangeNotifier {
    publisher: Arc<dyn ChangePublisher>,
    publish_timeout: Duration,
}

impl ChangeNotifier {
    /// Creates a notifier that bounds each handoff by `publish_timeout`.
    #[must_use]
    pub fn new(publisher: Arc<dyn ChangePublisher>, publish_timeout: Duration) -> Self {
        Self {
            publisher,
            publish_timeout,
        }
    }

    /// Publishes the entity's current state on its topic.
    pub async fn notify<E>(&self, entity: &E) -> NotifyOutcome
    where
        E: TrackableEntity + Sync,
    {
        let notification = match ChangeNotification::from_entity(entity) {
            Ok(notification) => notification,
            Err(error) => {
                warn!(
                    %error,
                    topic = %E::TOPIC,
                    entity_id = %entity.entity_id(),
                    "failed to build change notification"
                );
                return NotifyOutcome::Dropped;
            }
        };

        self.publish(&notification).await
    }

    /// Publishes a prepared notification.
    pub async fn publish(&self, notification: &ChangeNotification) -> NotifyOutcome {
        let topic = notification.topic();
        let entity_id = notification.entity_id();

        match tokio::time::timeout(self.publish_timeout, self.publisher.publish(notification)).await
        {
            Ok(Ok(subscribers)) => {
                debug!(%topic, %entity_id, subscribers, "change notification published");
                NotifyOutcome::Delivered { subscribers }
            }
            Ok(Err(error)) => {
                warn!(%error, %topic, %entity_id, "change notification dropped");
                NotifyOutcome::Dropped
            }
            Err(_) => {
                warn!(
                    %topic,
                    %entity_id,
                    timeout_ms = u64::try_from(self.publish_timeout.as_millis()).unwrap_or(u64::MAX),
                    "change notification timed out"
                );
                NotifyOutcome::Dropped
            }
        }
    }
}
