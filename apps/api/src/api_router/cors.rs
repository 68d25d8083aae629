use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderName, HeaderValue, Method};
use schooldesk_core::AppError;
use tower_http::cors::CorsLayer;

/// Sent by `EventSource` when it resumes a live feed.
const LAST_EVENT_ID: HeaderName = HeaderName::from_static("last-event-id");

/// Credentialed CORS for the single frontend origin.
pub(super) fn build_cors_layer(frontend_url: &str) -> Result<CorsLayer, AppError> {
    let origin = HeaderValue::from_str(frontend_url.trim_end_matches('/'))
        .map_err(|error| AppError::Validation(format!("invalid FRONTEND_URL: {error}")))?;

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE, LAST_EVENT_ID]))
}
