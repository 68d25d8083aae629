//! Redis pub/sub change publisher for multi-instance deployments.

use async_trait::async_trait;
use redis::AsyncCommands;

use schooldesk_application::ChangePublisher;
use schooldesk_core::{AppError, AppResult};
use schooldesk_domain::{ChangeNotification, Topic};

/// Publishes change notifications on `{prefix}:{topic}` Redis channels.
///
/// The returned count is the number of Redis subscribers, which is the number
/// of relaying API instances rather than end viewers.
#[derive(Clone)]
pub struct RedisChangePublisher {
    client: redis::Client,
    channel_prefix: String,
}

impl RedisChangePublisher {
    /// Creates a publisher with a configured Redis client and channel prefix.
    #[must_use]
    pub fn new(client: redis::Client, channel_prefix: impl Into<String>) -> Self {
        Self {
            client,
            channel_prefix: channel_prefix.into(),
        }
    }

    pub(crate) fn channel_for(channel_prefix: &str, topic: Topic) -> String {
        format!("{channel_prefix}:{topic}")
    }
}

#[async_trait]
impl ChangePublisher for RedisChangePublisher {
    async fn publish(&self, notification: &ChangeNotification) -> AppResult<usize> {
        let payload = serde_json::to_string(notification).map_err(|error| {
            AppError::Internal(format!(
                "failed to encode change notification for '{}': {error}",
                notification.topic()
            ))
        })?;
        let channel = Self::channel_for(&self.channel_prefix, notification.topic());

        let mut connection = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|error| AppError::Internal(format!("failed to connect to redis: {error}")))?;

        let receivers: usize = connection.publish(&channel, payload).await.map_err(|error| {
            AppError::Internal(format!(
                "failed to publish change notification on '{channel}': {error}"
            ))
        })?;

        Ok(receivers)
    }
}
