// tests/api_tests.rs

use std::{collections::BTreeMap, sync::Arc};

use async_trait::async_trait;
use quiz_backend::{
    config::{Config, PLAYER_TOKEN_HEADER},
    gateway::{GenerationError, GenerationRequest, QuizGenerator},
    models::quiz::QuestionRecord,
    routes,
    state::AppState,
};
use serde_json::{Value, json};

/// Always returns the same two questions: A is correct, then B is correct.
struct StubGenerator;

#[async_trait]
impl QuizGenerator for StubGenerator {
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<Vec<QuestionRecord>, GenerationError> {
        let question = |text: &str, a: &str, b: &str, correct: &str| QuestionRecord {
            text: format!("{} ({})", text, request.topic),
            options: BTreeMap::from([
                ("A".to_string(), a.to_string()),
                ("B".to_string(), b.to_string()),
            ]),
            correct_letter: correct.to_string(),
        };
        Ok(vec![
            question("first", "x", "y", "A"),
            question("second", "p", "q", "B"),
        ])
    }
}

struct BrokenGenerator;

#[async_trait]
impl QuizGenerator for BrokenGenerator {
    async fn generate(
        &self,
        _request: &GenerationRequest,
    ) -> Result<Vec<QuestionRecord>, GenerationError> {
        Err(GenerationError::BadResponse("not json".to_string()))
    }
}

/// Helper function to spawn the app on a random port for testing.
/// Returns the base URL (e.g., "http://127.0.0.1:12345").
async fn spawn_app(generator: Arc<dyn QuizGenerator>) -> String {
    let config = Config {
        session_secret: "test_secret_for_integration_tests".to_string(),
        ..Config::default()
    };
    let state = AppState::new(config, generator);
    let app = routes::create_router(state);

    // Bind to port 0 to get a random available port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");

    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    address
}

/// A client that keeps the session token it was handed on first contact.
struct Player {
    client: reqwest::Client,
    address: String,
    token: Option<String>,
}

impl Player {
    fn new(address: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            address: address.to_string(),
            token: None,
        }
    }

    async fn post(&mut self, path: &str, body: Value) -> reqwest::Response {
        let mut request = self
            .client
            .post(format!("{}{}", self.address, path))
            .json(&body);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        let response = request.send().await.expect("Failed to execute request");
        if let Some(token) = response.headers().get(PLAYER_TOKEN_HEADER) {
            self.token = Some(token.to_str().unwrap().to_string());
        }
        response
    }

    async fn generate(&mut self) -> Value {
        let response = self
            .post(
                "/api/quiz/generate",
                json!({ "topic": "Letters", "count": 2, "difficulty": "easy" }),
            )
            .await;
        assert_eq!(response.status().as_u16(), 200);
        response.json().await.unwrap()
    }

    async fn submit(&mut self, quiz_id: &str, answers: Value) -> reqwest::Response {
        self.post(
            "/api/quiz/submit",
            json!({ "quiz_id": quiz_id, "username": "alice", "user_answers": answers }),
        )
        .await
    }
}

async fn leaderboard(address: &str) -> Vec<Value> {
    reqwest::get(format!("{}/api/quiz/leaderboard", address))
        .await
        .unwrap()
        .json()
        .await
        .unwrap()
}

#[tokio::test]
async fn health_check_404() {
    let address = spawn_app(Arc::new(StubGenerator)).await;
    let response = reqwest::get(format!("{}/random_path_that_does_not_exist", address))
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn generated_quiz_hides_answers_and_binds_identity() {
    let address = spawn_app(Arc::new(StubGenerator)).await;
    let mut player = Player::new(&address);

    let response = player
        .post("/api/quiz/generate", json!({ "topic": "Letters" }))
        .await;
    assert_eq!(response.status().as_u16(), 200);
    assert!(response.headers().get("set-cookie").is_some());
    assert!(player.token.is_some());

    let body: Value = response.json().await.unwrap();
    assert!(body["quiz_id"].as_str().is_some());
    assert_eq!(body["topic"], "Letters");
    let questions = body["questions"].as_array().unwrap();
    assert_eq!(questions.len(), 2);
    for question in questions {
        assert!(question.get("correct_letter").is_none());
        assert!(question["options"]["A"].is_string());
    }

    // A known identity is not re-minted.
    let response = player
        .post("/api/quiz/generate", json!({ "topic": "Letters" }))
        .await;
    assert!(response.headers().get(PLAYER_TOKEN_HEADER).is_none());
}

#[tokio::test]
async fn full_marks_with_lowercase_letters() {
    let address = spawn_app(Arc::new(StubGenerator)).await;
    let mut player = Player::new(&address);
    let quiz = player.generate().await;
    let quiz_id = quiz["quiz_id"].as_str().unwrap();

    let response = player
        .submit(
            quiz_id,
            json!([
                { "question_index": 0, "selected_option_letter": "a" },
                { "question_index": 1, "selected_option_letter": "b" }
            ]),
        )
        .await;
    assert_eq!(response.status().as_u16(), 200);

    let result: Value = response.json().await.unwrap();
    assert_eq!(result["score"], 2);
    assert_eq!(result["total_questions"], 2);
    let results = result["results"].as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["is_correct"], true);
    assert_eq!(results[0]["user_selected_letter"], "A");
    assert_eq!(results[1]["is_correct"], true);
    assert_eq!(results[1]["user_selected_letter"], "B");

    let board = leaderboard(&address).await;
    assert_eq!(board.len(), 1);
    assert_eq!(board[0]["username"], "alice");
    assert_eq!(board[0]["score"], 2);
    assert_eq!(board[0]["topic"], "Letters");
}

#[tokio::test]
async fn out_of_bounds_answer_is_reported_not_scored() {
    let address = spawn_app(Arc::new(StubGenerator)).await;
    let mut player = Player::new(&address);
    let quiz = player.generate().await;

    let result: Value = player
        .submit(
            quiz["quiz_id"].as_str().unwrap(),
            json!([
                { "question_index": 5, "selected_option_letter": "A" },
                { "question_index": 0, "selected_option_letter": "A" },
                { "question_index": 1 }
            ]),
        )
        .await
        .json()
        .await
        .unwrap();

    assert_eq!(result["score"], 1);
    let results = result["results"].as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["status"], "graded");
    assert_eq!(results[1]["status"], "out_of_bounds");
    assert_eq!(results[1]["question_index"], 5);
}

#[tokio::test]
async fn cross_identity_submission_is_forbidden() {
    let address = spawn_app(Arc::new(StubGenerator)).await;
    let mut alice = Player::new(&address);
    let mut bob = Player::new(&address);

    let alice_quiz = alice.generate().await;
    let alice_quiz_id = alice_quiz["quiz_id"].as_str().unwrap();
    bob.generate().await;

    let response = bob
        .submit(
            alice_quiz_id,
            json!([{ "question_index": 0, "selected_option_letter": "A" }]),
        )
        .await;
    assert_eq!(response.status().as_u16(), 403);
    assert!(leaderboard(&address).await.is_empty());

    // The rejected attempt consumed nothing.
    let response = alice.submit(alice_quiz_id, json!([])).await;
    assert_eq!(response.status().as_u16(), 200);
}

#[tokio::test]
async fn quiz_cannot_be_submitted_twice() {
    let address = spawn_app(Arc::new(StubGenerator)).await;
    let mut player = Player::new(&address);
    let quiz = player.generate().await;
    let quiz_id = quiz["quiz_id"].as_str().unwrap();

    assert_eq!(player.submit(quiz_id, json!([])).await.status().as_u16(), 200);

    let response = player.submit(quiz_id, json!([])).await;
    assert_eq!(response.status().as_u16(), 404);
    let body: Value = response.json().await.unwrap();
    assert!(body["error"].as_str().is_some());
}

#[tokio::test]
async fn leaderboard_keeps_only_the_latest_result() {
    let address = spawn_app(Arc::new(StubGenerator)).await;
    let mut player = Player::new(&address);

    let quiz = player.generate().await;
    player
        .submit(
            quiz["quiz_id"].as_str().unwrap(),
            json!([
                { "question_index": 0, "selected_option_letter": "A" },
                { "question_index": 1, "selected_option_letter": "B" }
            ]),
        )
        .await;

    let quiz = player.generate().await;
    player
        .submit(
            quiz["quiz_id"].as_str().unwrap(),
            json!([{ "question_index": 0, "selected_option_letter": "B" }]),
        )
        .await;

    let board = leaderboard(&address).await;
    assert_eq!(board.len(), 1);
    assert_eq!(board[0]["score"], 0);
    assert_eq!(board[0]["total_questions"], 2);
}

#[tokio::test]
async fn upstream_failure_is_bad_gateway() {
    let address = spawn_app(Arc::new(BrokenGenerator)).await;
    let mut player = Player::new(&address);

    let response = player
        .post("/api/quiz/generate", json!({ "topic": "Letters" }))
        .await;
    assert_eq!(response.status().as_u16(), 502);
}

#[tokio::test]
async fn invalid_requests_are_rejected() {
    let address = spawn_app(Arc::new(StubGenerator)).await;
    let mut player = Player::new(&address);

    let response = player
        .post("/api/quiz/generate", json!({ "topic": "Letters", "count": 0 }))
        .await;
    assert_eq!(response.status().as_u16(), 400);

    let response = player
        .post("/api/quiz/submit", json!({ "quiz_id": "", "user_answers": [] }))
        .await;
    assert_eq!(response.status().as_u16(), 400);

    let response = player
        .post("/api/quiz/submit", json!({ "user_answers": [] }))
        .await;
    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn mistyped_answers_are_skipped_not_rejected() {
    let address = spawn_app(Arc::new(StubGenerator)).await;
    let mut player = Player::new(&address);
    let quiz = player.generate().await;

    let response = player
        .submit(
            quiz["quiz_id"].as_str().unwrap(),
            json!([
                { "question_index": 0, "selected_option_letter": "A" },
                { "question_index": "1", "selected_option_letter": "B" },
                { "question_index": 1, "selected_option_letter": 7 }
            ]),
        )
        .await;
    assert_eq!(response.status().as_u16(), 200);

    let result: Value = response.json().await.unwrap();
    assert_eq!(result["score"], 1);
    assert_eq!(result["total_questions"], 2);
    assert_eq!(result["results"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn display_names_keep_plain_text_and_lose_markup() {
    let address = spawn_app(Arc::new(StubGenerator)).await;
    let mut player = Player::new(&address);
    let quiz = player.generate().await;

    let response = player
        .post(
            "/api/quiz/submit",
            json!({
                "quiz_id": quiz["quiz_id"],
                "username": "Tom & Jerry <i>x</i>",
                "user_answers": []
            }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 200);

    let board = leaderboard(&address).await;
    assert_eq!(board[0]["username"], "Tom & Jerry x");
}

#[tokio::test]
async fn blank_username_becomes_anonymous() {
    let address = spawn_app(Arc::new(StubGenerator)).await;
    let mut player = Player::new(&address);
    let quiz = player.generate().await;

    let response = player
        .post(
            "/api/quiz/submit",
            json!({ "quiz_id": quiz["quiz_id"], "username": "", "user_answers": [] }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 200);

    let board = leaderboard(&address).await;
    assert_eq!(board[0]["username"], "Anonymous");
}
