//! Process-local change transport.
//!
//! One bounded broadcast channel per topic. Publishing never blocks on slow
//! subscribers: a subscriber that falls behind by more than the channel
//! capacity loses the oldest notifications.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::trace;

use schooldesk_application::{ChangeFeed, ChangePublisher, ChangeSubscription};
use schooldesk_core::{AppError, AppResult};
use schooldesk_domain::{ChangeNotification, Topic};

/// In-memory publish/subscribe broker for change notifications.
#[derive(Clone)]
pub struct InMemoryChangeBroker {
    senders: HashMap<Topic, broadcast::Sender<ChangeNotification>>,
}

impl InMemoryChangeBroker {
    /// Creates a broker whose per-topic buffer holds `capacity` notifications.
    pub fn new(capacity: usize) -> AppResult<Self> {
        if capacity == 0 {
            return Err(AppError::Validation(
                "change topic capacity must be greater than zero".to_owned(),
            ));
        }

        Ok(Self {
            senders: Topic::all()
                .iter()
                .map(|topic| (*topic, broadcast::channel(capacity).0))
                .collect(),
        })
    }

    /// Hands a notification to local subscribers of its topic.
    ///
    /// Returns the number of subscribers that will receive it.
    pub fn deliver(&self, notification: ChangeNotification) -> usize {
        let topic = notification.topic();
        let Some(sender) = self.senders.get(&topic) else {
            return 0;
        };

        // A send error only means nobody is subscribed right now.
        let delivered = sender.send(notification).unwrap_or(0);
        trace!(%topic, delivered, "change notification fanned out");
        delivered
    }

    /// Returns the number of live subscriptions on a topic.
    #[must_use]
    pub fn subscriber_count(&self, topic: Topic) -> usize {
        self.senders
            .get(&topic)
            .map_or(0, broadcast::Sender::receiver_count)
    }
}

#[async_trait]
impl ChangePublisher for InMemoryChangeBroker {
    async fn publish(&self, notification: &ChangeNotification) -> AppResult<usize> {
        Ok(self.deliver(notification.clone()))
    }
}

impl ChangeFeed for InMemoryChangeBroker {
    fn subscribe(&self, topic: Topic) -> ChangeSubscription {
        let receiver = match self.senders.get(&topic) {
            Some(sender) => sender.subscribe(),
            // Every topic is registered in `new`; keep the arm total anyway.
            None => broadcast::channel(1).1,
        };
        ChangeSubscription::new(topic, receiver)
    }
}
