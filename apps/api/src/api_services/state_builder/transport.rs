use std::sync::Arc;
use std::time::Duration;

use schooldesk_application::{ChangeFeed, ChangeNotifier, ChangePublisher};
use schooldesk_core::AppError;
use schooldesk_infrastructure::{InMemoryChangeBroker, RedisChangePublisher, RedisChangeRelay};
use tokio::task::JoinHandle;
use tracing::info;

use crate::api_config::{ApiConfig, ChangeTransportConfig};

use super::super::redis::build_redis_client;

/// Publisher and feed halves of the configured change transport.
///
/// Live subscribers always read from the process-local broker. With Redis
/// the publisher goes through Redis and a relay task feeds the local broker,
/// so every API instance sees every change.
pub struct ChangeTransport {
    pub publisher: Arc<dyn ChangePublisher>,
    pub feed: Arc<dyn ChangeFeed>,
    pub redis_client: Option<redis::Client>,
    pub relay: Option<JoinHandle<()>>,
}

impl ChangeTransport {
    pub fn notifier(&self, publish_timeout: Duration) -> ChangeNotifier {
        ChangeNotifier::new(Arc::clone(&self.publisher), publish_timeout)
    }
}

/// Builds the transport selected by `CHANGE_TRANSPORT`. Must run inside the runtime.
pub fn build_change_transport(config: &ApiConfig) -> Result<ChangeTransport, AppError> {
    let broker = Arc::new(InMemoryChangeBroker::new(config.change_topic_capacity)?);

    match &config.change_transport {
        ChangeTransportConfig::Memory => {
            info!(
                capacity = config.change_topic_capacity,
                "using in-process change transport"
            );

            Ok(ChangeTransport {
                publisher: broker.clone(),
                feed: broker,
                redis_client: None,
                relay: None,
            })
        }
        ChangeTransportConfig::Redis {
            redis_url,
            channel_prefix,
        } => {
            let client = build_redis_client(redis_url)?;
            let relay =
                RedisChangeRelay::new(client.clone(), channel_prefix.as_str(), broker.clone())
                    .spawn();
            info!(%channel_prefix, "using redis change transport");

            Ok(ChangeTransport {
                publisher: Arc::new(RedisChangePublisher::new(
                    client.clone(),
                    channel_prefix.as_str(),
                )),
                feed: broker,
                redis_client: Some(client),
                relay: Some(relay),
            })
        }
    }
}
