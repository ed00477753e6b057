//! HTTP surface of the battle service
//!
//! Every route lives under `/api/battle` and expects the caller's participant
//! id in the `X-User-Id` header.

pub mod error;
pub mod extract;
pub mod handlers;

pub use error::ApiError;
pub use extract::{CurrentUser, USER_ID_HEADER};

use crate::service::AppState;
use axum::{
    extract::{MatchedPath, Request, State},
    http::HeaderValue,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use std::time::Instant;
use tracing::{debug, info_span, Instrument};
use uuid::Uuid;

/// Correlation id echoed on every response; a valid incoming UUID is kept
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Build the battle router
pub fn router(state: AppState) -> Router {
    let battle = Router::new()
        .route("/quick-match", post(handlers::quick_match))
        .route("/ranked-match", post(handlers::ranked_match))
        .route("/submit-result", post(handlers::submit_result))
        .route("/leaderboard", get(handlers::leaderboard))
        .route("/history", get(handlers::history))
        .route("/stats", get(handlers::stats))
        .route_layer(middleware::from_fn_with_state(state.clone(), track_request));

    Router::new()
        .nest("/api/battle", battle)
        .with_state(state)
}

/// Tag each request with an id and record its outcome
async fn track_request(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_owned())
        .unwrap_or_else(|| request.uri().path().to_owned());
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| Uuid::parse_str(value).ok())
        .unwrap_or_else(Uuid::new_v4);
    let started = Instant::now();

    let mut response = next
        .run(request)
        .instrument(info_span!("request", %request_id, route = %route))
        .await;

    let elapsed = started.elapsed();
    let status = response.status().as_u16();
    state.metrics().record_http_request(&route, status, elapsed);
    debug!(
        "{} -> {} in {:?} (request {})",
        route, status, elapsed, request_id
    );

    if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}
