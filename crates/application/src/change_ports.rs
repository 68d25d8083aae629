use async_trait::async_trait;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tracing::warn;

use schooldesk_core::AppResult;
use schooldesk_domain::{ChangeNotification, Topic};

/// Outbound port that hands a change notification to the transport.
#[async_trait]
pub trait ChangePublisher: Send + Sync {
    /// Publishes one notification on its topic.
    ///
    /// Returns the number of subscribers the transport reports as reached.
    async fn publish(&self, notification: &ChangeNotification) -> AppResult<usize>;
}

/// Inbound port that lets clients subscribe to a topic.
pub trait ChangeFeed: Send + Sync {
    /// Opens a subscription that receives every notification published on
    /// the topic from now on.
    fn subscribe(&self, topic: Topic) -> ChangeSubscription;
}

/// Live subscription to a single topic.
///
/// Dropping the subscription unregisters it.
#[derive(Debug)]
pub struct ChangeSubscription {
    topic: Topic,
    receiver: broadcast::Receiver<ChangeNotification>,
}

impl ChangeSubscription {
    /// Wraps a broadcast receiver for a topic.
    #[must_use]
    pub fn new(topic: Topic, receiver: broadcast::Receiver<ChangeNotification>) -> Self {
        Self { topic, receiver }
    }

    /// Returns the subscribed topic.
    #[must_use]
    pub fn topic(&self) -> Topic {
        self.topic
    }

    /// Waits for the next notification.
    ///
    /// A subscriber that falls behind skips the overwritten notifications and
    /// continues with the oldest one still buffered. Returns `None` once the
    /// topic is closed.
    pub async fn recv(&mut self) -> Option<ChangeNotification> {
        loop {
            match self.receiver.recv().await {
                Ok(notification) => return Some(notification),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(
                        topic = %self.topic,
                        skipped,
                        "change subscriber lagged; skipping notifications"
                    );
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}
