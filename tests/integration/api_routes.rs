//! HTTP router integration tests
//!
//! Requests go through the real axum router with `oneshot`, checking the
//! JSON shapes clients depend on.

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use battle_room::api::{self, USER_ID_HEADER};
use battle_room::service::AppState;
use serde_json::{json, Value};
use tower::ServiceExt;

use crate::fixtures::create_test_state;

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    user: Option<u64>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header(USER_ID_HEADER, user.to_string());
    }
    let body = match body {
        Some(body) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(body.to_string())
        }
        None => Body::empty(),
    };

    let response = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

fn app(state: &AppState) -> Router {
    api::router(state.clone())
}

#[tokio::test]
async fn test_requires_user_header() {
    let state = create_test_state(&[1500]);
    let app = app(&state);

    let (status, body) = send(&app, "POST", "/api/battle/quick-match", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_quick_match_shape() {
    let state = create_test_state(&[1500]);
    let app = app(&state);

    let (status, body) = send(&app, "POST", "/api/battle/quick-match", Some(1), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["mode"], "quick");
    assert_eq!(body["questions"], 5);
    assert_eq!(body["time_limit"], 15);
    assert_eq!(body["status"], "starting");
    assert_eq!(body["opponent"]["id"], "ai");
    assert_eq!(body["opponent"]["username"], "AI Opponent");
    assert_eq!(body["opponent"]["avatar"], "🤖");
    assert!(body.get("rating_change_preview").is_none());
    assert!(body["battle_id"].as_str().unwrap().starts_with("battle_"));

    let rating = body["opponent"]["rating"].as_i64().unwrap();
    assert!((1400..=1600).contains(&rating));
}

#[tokio::test]
async fn test_quick_match_with_empty_body() {
    let state = create_test_state(&[1500]);
    let app = app(&state);

    let (status, _) = send(
        &app,
        "POST",
        "/api/battle/quick-match",
        Some(1),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_ranked_match_shapes() {
    let state = create_test_state(&[1500, 1650, 1900]);
    let app = app(&state);

    let (status, body) = send(&app, "POST", "/api/battle/ranked-match", Some(1), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["mode"], "ranked");
    assert_eq!(body["questions"], 10);
    assert_eq!(body["time_limit"], 20);
    assert_eq!(body["status"], "waiting_for_opponent");
    assert_eq!(body["opponent"]["id"], 2);
    assert!(body["rating_change_preview"]["win"].as_i64().unwrap() > 0);
    assert!(body["rating_change_preview"]["loss"].as_i64().unwrap() < 0);

    // 1900 is more than 200 away from everyone else
    let (status, body) = send(&app, "POST", "/api/battle/ranked-match", Some(3), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "No opponents found in your rating range"}));
}

#[tokio::test]
async fn test_unknown_participant() {
    let state = create_test_state(&[1500]);
    let app = app(&state);

    let (status, body) = send(&app, "POST", "/api/battle/ranked-match", Some(77), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Participant not found: 77");
}

#[tokio::test]
async fn test_submit_result_flow() {
    let state = create_test_state(&[1500, 1500]);
    let app = app(&state);

    let (status, body) = send(
        &app,
        "POST",
        "/api/battle/submit-result",
        Some(1),
        Some(json!({
            "battle_id": "ranked_00000000000000aa",
            "score": 900,
            "questions_correct": 9,
            "total_questions": 10,
            "is_winner": true,
            "mode": "ranked",
            "opponent_id": 2
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"message": "Battle result saved", "rating_change": 16, "new_rating": 1516})
    );

    let (status, body) = send(
        &app,
        "POST",
        "/api/battle/submit-result",
        Some(2),
        Some(json!({
            "battle_id": "ranked_00000000000000aa",
            "score": 500,
            "questions_correct": 5,
            "total_questions": 10,
            "is_winner": false,
            "mode": "ranked",
            "opponent_id": 1
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["rating_change"], -16);
    assert_eq!(body["new_rating"], 1484);

    let (status, body) = send(&app, "GET", "/api/battle/history", Some(1), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["battles"].as_array().unwrap().len(), 1);
    assert_eq!(body["battles"][0]["rating_change"], 16);
    assert_eq!(body["total"], 1);

    let (status, body) = send(&app, "GET", "/api/battle/stats", Some(1), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 2);
    assert_eq!(body["by_mode"]["ranked"], 2);
    assert_eq!(body["by_mode"]["quick"], 0);
}

#[tokio::test]
async fn test_submit_result_validation() {
    let state = create_test_state(&[1500]);
    let app = app(&state);

    let (status, body) = send(
        &app,
        "POST",
        "/api/battle/submit-result",
        Some(1),
        Some(json!({"battle_id": "battle_1", "score": 10})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "Missing required fields"}));

    let (status, body) = send(
        &app,
        "POST",
        "/api/battle/submit-result",
        Some(1),
        Some(json!({
            "battle_id": "battle_1",
            "score": 10,
            "questions_correct": 6,
            "is_winner": true
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("Invalid result payload"));

    assert_eq!(state.stats().unwrap().total, 0);
}

#[tokio::test]
async fn test_leaderboard_query() {
    let state = create_test_state(&[1500, 1700, 900]);
    let app = app(&state);

    let (status, body) = send(&app, "GET", "/api/battle/leaderboard", Some(1), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_players"], 2);
    assert_eq!(body["current_user_rank"], 2);
    assert_eq!(body["leaderboard"][0]["rank"], 1);
    assert_eq!(body["leaderboard"][0]["username"], "player2");
    assert!(body["leaderboard"][0].get("participant_id").is_none());

    let (status, body) = send(
        &app,
        "GET",
        "/api/battle/leaderboard?period=week&limit=5",
        Some(3),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_players"], 0);
    assert_eq!(body["current_user_rank"], Value::Null);

    // Unknown periods are served as all-time
    let (status, body) = send(
        &app,
        "GET",
        "/api/battle/leaderboard?period=year",
        Some(1),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_players"], 2);
    assert_eq!(body["current_user_rank"], 2);

    let (status, body) = send(
        &app,
        "GET",
        "/api/battle/leaderboard?limit=many",
        Some(1),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_requests_are_tagged_and_counted() {
    let state = create_test_state(&[1500]);
    let app = app(&state);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/battle/quick-match")
                .header(USER_ID_HEADER, "1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert!(response.headers().contains_key("x-request-id"));

    let counted = state
        .metrics()
        .service()
        .http_requests_total
        .with_label_values(&["/api/battle/quick-match", "200"])
        .get();
    assert_eq!(counted, 1);
}
