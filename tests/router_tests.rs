// tests/router_tests.rs

use std::{collections::BTreeMap, sync::Arc};

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use quiz_backend::{
    config::{Config, PLAYER_TOKEN_HEADER, SESSION_COOKIE},
    create_router,
    gateway::{GenerationError, GenerationRequest, QuizGenerator},
    models::quiz::QuestionRecord,
    state::AppState,
};
use serde_json::{Value, json};
use tower::ServiceExt;

struct OneQuestion;

#[async_trait]
impl QuizGenerator for OneQuestion {
    async fn generate(
        &self,
        _request: &GenerationRequest,
    ) -> Result<Vec<QuestionRecord>, GenerationError> {
        Ok(vec![QuestionRecord {
            text: "2 + 2?".to_string(),
            options: BTreeMap::from([
                ("A".to_string(), "3".to_string()),
                ("B".to_string(), "4".to_string()),
            ]),
            correct_letter: "B".to_string(),
        }])
    }
}

fn app() -> Router {
    let config = Config {
        session_secret: "router_test_secret".to_string(),
        ..Config::default()
    };
    create_router(AppState::new(config, Arc::new(OneQuestion)))
}

fn post_json(uri: &str, body: Value, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn leaderboard_starts_empty() {
    let response = app()
        .oneshot(
            Request::builder()
                .uri("/api/quiz/leaderboard")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!([]));
}

#[tokio::test]
async fn session_cookie_carries_identity_between_requests() {
    let app = app();

    let response = app
        .clone()
        .oneshot(post_json("/api/quiz/generate", json!({}), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get(PLAYER_TOKEN_HEADER).is_some());

    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(set_cookie.starts_with(&format!("{SESSION_COOKIE}=")));
    assert!(set_cookie.contains("HttpOnly"));
    let cookie = set_cookie.split(';').next().unwrap().to_string();

    let quiz = body_json(response).await;
    assert_eq!(quiz["topic"], "General Knowledge");
    let quiz_id = quiz["quiz_id"].as_str().unwrap();

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/quiz/submit",
            json!({
                "quiz_id": quiz_id,
                "username": "<b>carol</b>",
                "user_answers": [{ "question_index": 0, "selected_option_letter": "B" }]
            }),
            Some(&cookie),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get(PLAYER_TOKEN_HEADER).is_none());
    let report = body_json(response).await;
    assert_eq!(report["score"], 1);
    assert_eq!(report["total_questions"], 1);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/quiz/leaderboard")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let board = body_json(response).await;
    assert_eq!(board[0]["username"], "carol");
    assert_eq!(board[0]["score"], 1);
}

#[tokio::test]
async fn forged_cookie_gets_a_fresh_identity() {
    let app = app();

    let response = app
        .clone()
        .oneshot(post_json("/api/quiz/generate", json!({}), None))
        .await
        .unwrap();
    let quiz = body_json(response).await;

    let response = app
        .oneshot(post_json(
            "/api/quiz/submit",
            json!({ "quiz_id": quiz["quiz_id"], "user_answers": [] }),
            Some(&format!("{SESSION_COOKIE}=not-a-valid-token")),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(response.headers().get(PLAYER_TOKEN_HEADER).is_some());
}

#[tokio::test]
async fn unknown_quiz_is_not_found() {
    let response = app()
        .oneshot(post_json(
            "/api/quiz/submit",
            json!({ "quiz_id": "no-such-quiz", "user_answers": [] }),
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(body_json(response).await["error"].is_string());
}

#[tokio::test]
async fn flat_paths_serve_the_same_handlers() {
    let app = app();

    let response = app
        .clone()
        .oneshot(post_json("/generate-quiz", json!({ "topic": "Math" }), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    let cookie = set_cookie.split(';').next().unwrap().to_string();
    let quiz = body_json(response).await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/submit-quiz",
            json!({
                "quiz_id": quiz["quiz_id"],
                "user_answers": [{ "question_index": 0, "selected_option_letter": "b" }]
            }),
            Some(&cookie),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["score"], 1);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/leaderboard")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let board = body_json(response).await;
    assert_eq!(board[0]["username"], "Anonymous");
    assert_eq!(board[0]["topic"], "Math");
}
