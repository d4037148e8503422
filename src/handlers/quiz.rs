// src/handlers/quiz.rs

use std::sync::Arc;

use axum::{Extension, Json, extract::State, response::IntoResponse};
use validator::Validate;

use crate::{
    engine::{QuizEngine, Submission},
    error::AppError,
    gateway::GenerationRequest,
    models::{
        quiz::{GenerateQuizRequest, default_topic},
        submission::{SubmitQuizRequest, SubmittedAnswer},
    },
    utils::{html::sanitize_display, identity::PlayerIdentity},
};

const ANONYMOUS: &str = "Anonymous";

/// Generates a quiz on the requested topic.
///
/// * Calls the generation service (bounded by the configured timeout).
/// * Stores the answer-bearing quiz and entitles the caller to it.
/// * Returns the quiz id and the questions without their answers.
pub async fn generate_quiz(
    State(engine): State<Arc<QuizEngine>>,
    Extension(identity): Extension<PlayerIdentity>,
    Json(payload): Json<GenerateQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let topic = match sanitize_display(&payload.topic) {
        topic if topic.is_empty() => default_topic(),
        topic => topic,
    };

    let request = GenerationRequest {
        topic,
        count: payload.count as usize,
        difficulty: payload.difficulty,
    };

    let quiz = engine
        .generate_quiz(&identity.player_id, request)
        .await
        .inspect_err(|e| {
            tracing::warn!(player_id = %identity.player_id, "Quiz generation failed: {}", e);
        })?;

    Ok(Json(quiz))
}

/// Submits answers for a previously generated quiz.
///
/// * Rejects quizzes that are unknown (404) or not owned by the caller (403).
/// * Grades, records the result on the leaderboard and pushes the update to the room.
/// * The quiz cannot be submitted twice.
pub async fn submit_quiz(
    State(engine): State<Arc<QuizEngine>>,
    Extension(identity): Extension<PlayerIdentity>,
    Json(payload): Json<SubmitQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let submitted = payload.user_answers.len();
    let answers: Vec<_> = payload
        .user_answers
        .into_iter()
        .filter_map(SubmittedAnswer::into_entry)
        .collect();
    if answers.len() < submitted {
        tracing::debug!(
            skipped = submitted - answers.len(),
            "Skipping malformed answers"
        );
    }

    let username = payload
        .username
        .as_deref()
        .map(sanitize_display)
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| ANONYMOUS.to_string());

    let submission = Submission {
        quiz_id: payload.quiz_id,
        username,
        answers,
        room_id: payload.room_id,
    };

    let report = engine.submit_quiz(&identity.player_id, submission).await?;

    Ok(Json(report))
}

/// Retrieves the current leaderboard projection.
pub async fn get_leaderboard(
    State(engine): State<Arc<QuizEngine>>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(engine.top_k().await))
}
