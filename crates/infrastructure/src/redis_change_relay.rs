//! Forwards change notifications from Redis pub/sub into the local broker.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use schooldesk_core::{AppError, AppResult};
use schooldesk_domain::{ChangeNotification, Topic};

use crate::InMemoryChangeBroker;

const INITIAL_RETRY_DELAY: Duration = Duration::from_millis(250);
const MAX_RETRY_DELAY: Duration = Duration::from_secs(30);

/// Background task that pattern-subscribes to `{prefix}:*` and fans every
/// received notification out to this instance's local subscribers.
pub struct RedisChangeRelay {
    client: redis::Client,
    channel_prefix: String,
    broker: Arc<InMemoryChangeBroker>,
}

impl RedisChangeRelay {
    /// Creates a relay feeding the given local broker.
    #[must_use]
    pub fn new(
        client: redis::Client,
        channel_prefix: impl Into<String>,
        broker: Arc<InMemoryChangeBroker>,
    ) -> Self {
        Self {
            client,
            channel_prefix: channel_prefix.into(),
            broker,
        }
    }

    /// Starts relaying on the current runtime. The task reconnects until aborted.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move { self.run().await })
    }

    async fn run(self) {
        let mut retry_delay = INITIAL_RETRY_DELAY;

        loop {
            if let Err(error) = self.relay_until_disconnected(&mut retry_delay).await {
                warn!(
                    error = %error,
                    retry_in_ms = retry_delay.as_millis(),
                    "change relay lost its redis subscription"
                );
            }

            tokio::time::sleep(retry_delay).await;
            retry_delay = retry_delay.saturating_mul(2).min(MAX_RETRY_DELAY);
        }
    }

    async fn relay_until_disconnected(&self, retry_delay: &mut Duration) -> AppResult<()> {
        let pattern = format!("{}:*", self.channel_prefix);
        let mut pubsub = self
            .client
            .get_async_pubsub()
            .await
            .map_err(|error| AppError::Internal(format!("failed to connect to redis: {error}")))?;
        pubsub.psubscribe(&pattern).await.map_err(|error| {
            AppError::Internal(format!("failed to subscribe to '{pattern}': {error}"))
        })?;

        *retry_delay = INITIAL_RETRY_DELAY;
        info!(%pattern, "change relay subscribed");

        let mut messages = pubsub.on_message();
        while let Some(message) = messages.next().await {
            let channel = message.get_channel_name().to_owned();
            let payload = match message.get_payload::<String>() {
                Ok(payload) => payload,
                Err(error) => {
                    warn!(%channel, error = %error, "dropping unreadable change payload");
                    continue;
                }
            };

            match decode_notification(&self.channel_prefix, &channel, &payload) {
                Ok(notification) => {
                    let delivered = self.broker.deliver(notification);
                    debug!(%channel, delivered, "relayed change notification");
                }
                Err(error) => warn!(%channel, error = %error, "dropping malformed change payload"),
            }
        }

        Err(AppError::Internal("redis pub/sub stream ended".to_owned()))
    }
}

fn decode_notification(
    channel_prefix: &str,
    channel: &str,
    payload: &str,
) -> AppResult<ChangeNotification> {
    let topic = channel
        .strip_prefix(channel_prefix)
        .and_then(|rest| rest.strip_prefix(':'))
        .ok_or_else(|| {
            AppError::Validation(format!(
                "channel '{channel}' is outside prefix '{channel_prefix}'"
            ))
        })?
        .parse::<Topic>()?;

    let notification: ChangeNotification = serde_json::from_str(payload).map_err(|error| {
        AppError::Validation(format!("invalid change notification payload: {error}"))
    })?;

    if notification.topic() != topic {
        return Err(AppError::Validation(format!(
            "notification for '{}' arrived on channel '{channel}'",
            notification.topic()
        )));
    }

    Ok(notification)
}
