use std::time::Duration;

use axum::extract::{Extension, Path, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use futures::stream;
use schooldesk_application::ChangeSubscription;
use schooldesk_core::UserIdentity;
use schooldesk_domain::Topic;
use tracing::debug;

use crate::error::ApiResult;
use crate::state::AppState;

const UPDATE_EVENT: &str = "updated";
const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);

/// GET /api/live/{topic} - Stream post-commit snapshots for one topic.
///
/// The subscription is dropped with the response body when the client
/// disconnects, which unregisters it from the broker.
pub async fn live_topic_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(topic): Path<String>,
) -> ApiResult<Sse<impl Stream<Item = Result<Event, axum::Error>>>> {
    let topic = topic.parse::<Topic>()?;
    state
        .authorization_service
        .require_permission(&user, topic.access_permission())
        .await?;

    let subscription = state.change_feed.subscribe(topic);
    debug!(%topic, subject = %user.subject(), "live subscriber joined");

    Ok(Sse::new(update_events(subscription))
        .keep_alive(KeepAlive::new().interval(KEEP_ALIVE_INTERVAL)))
}

fn update_events(
    subscription: ChangeSubscription,
) -> impl Stream<Item = Result<Event, axum::Error>> {
    stream::unfold(subscription, |mut subscription| async move {
        let notification = subscription.recv().await?;
        let event = Event::default()
            .event(UPDATE_EVENT)
            .id(notification.entity_id().to_string())
            .json_data(&notification);

        Some((event, subscription))
    })
}
