// src/engine/mod.rs

//! Quiz lifecycle and leaderboard engine.
//!
//! Owns the shared tables (one lock each) and sequences multi-table operations
//! so they never leave the store and the entitlements out of step: results are
//! computed first, mutations are committed next, broadcasting happens last.

pub mod broadcaster;
pub mod grader;
pub mod leaderboard;
pub mod quiz_store;
pub mod session_index;

use std::{sync::Arc, time::Duration};

use tokio::sync::mpsc;

use crate::{
    config::Config,
    error::AppError,
    gateway::{GenerationError, GenerationRequest, QuizGenerator},
    models::{
        leaderboard::PlayerResult,
        quiz::{GenerateQuizResponse, PublicQuestion, QuestionRecord},
        realtime::ServerMessage,
        submission::{AnswerEntry, GradeReport},
    },
};

use self::{
    broadcaster::{Broadcaster, ConnectionId},
    leaderboard::Leaderboard,
    quiz_store::QuizStore,
    session_index::SessionIndex,
};

/// Tunables the engine reads on every operation.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub leaderboard_size: usize,
    pub default_room: String,
    pub generation_timeout: Duration,
    pub subscriber_buffer: usize,
}

impl From<&Config> for EngineSettings {
    fn from(config: &Config) -> Self {
        Self {
            leaderboard_size: config.leaderboard_size,
            default_room: config.default_room.clone(),
            generation_timeout: config.generation_timeout(),
            subscriber_buffer: config.subscriber_buffer,
        }
    }
}

/// A validated submission, after the handler has resolved identity and defaults.
#[derive(Debug, Clone)]
pub struct Submission {
    pub quiz_id: String,
    pub username: String,
    pub answers: Vec<AnswerEntry>,
    pub room_id: Option<String>,
}

pub struct QuizEngine {
    store: QuizStore,
    sessions: SessionIndex,
    leaderboard: Leaderboard,
    broadcaster: Broadcaster,
    generator: Arc<dyn QuizGenerator>,
    settings: EngineSettings,
}

impl QuizEngine {
    pub fn new(generator: Arc<dyn QuizGenerator>, settings: EngineSettings) -> Self {
        Self {
            store: QuizStore::new(),
            sessions: SessionIndex::new(),
            leaderboard: Leaderboard::new(),
            broadcaster: Broadcaster::new(),
            generator,
            settings,
        }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn store(&self) -> &QuizStore {
        &self.store
    }

    pub fn sessions(&self) -> &SessionIndex {
        &self.sessions
    }

    pub fn leaderboard(&self) -> &Leaderboard {
        &self.leaderboard
    }

    pub fn broadcaster(&self) -> &Broadcaster {
        &self.broadcaster
    }

    /// Generates a quiz through the gateway, stores it and entitles `player_id` to it.
    ///
    /// The quiz id is returned only after both the insert and the grant are done.
    pub async fn generate_quiz(
        &self,
        player_id: &str,
        request: GenerationRequest,
    ) -> Result<GenerateQuizResponse, AppError> {
        let timeout = self.settings.generation_timeout;
        let questions = tokio::time::timeout(timeout, self.generator.generate(&request))
            .await
            .map_err(|_| GenerationError::Timeout(timeout))??;

        self.create_quiz(player_id, request.topic, questions).await
    }

    /// Stores already generated questions for `player_id`.
    pub async fn create_quiz(
        &self,
        player_id: &str,
        topic: String,
        questions: Vec<QuestionRecord>,
    ) -> Result<GenerateQuizResponse, AppError> {
        if questions.is_empty() {
            return Err(GenerationError::BadResponse("no questions returned".to_string()).into());
        }
        for (index, question) in questions.iter().enumerate() {
            question.validate().map_err(|reason| {
                GenerationError::BadResponse(format!("question {index}: {reason}"))
            })?;
        }

        let public: Vec<PublicQuestion> = questions.iter().map(PublicQuestion::from).collect();
        let quiz_id = self.store.create(topic.clone(), questions).await;
        self.sessions.grant(player_id, &quiz_id).await;

        tracing::info!(%quiz_id, player_id, topic = %topic, questions = public.len(), "Quiz created");

        Ok(GenerateQuizResponse {
            quiz_id,
            topic,
            questions: public,
        })
    }

    /// Grades a submission, records it, notifies the room and retires the quiz.
    pub async fn submit_quiz(
        &self,
        player_id: &str,
        submission: Submission,
    ) -> Result<GradeReport, AppError> {
        let quiz = self
            .store
            .get(&submission.quiz_id)
            .await
            .ok_or_else(|| AppError::NotFound("Quiz not found or expired".to_string()))?;

        if !self.sessions.check(player_id, &quiz.id).await {
            tracing::warn!(quiz_id = %quiz.id, player_id, "Submission against a quiz not owned by caller");
            return Err(AppError::Forbidden(
                "Quiz does not belong to this player".to_string(),
            ));
        }

        let report = grader::grade(&quiz, &submission.answers);

        // Taking the quiz out of the store is the commit point; a concurrent
        // duplicate submission loses here and records nothing.
        if self.store.take(&quiz.id).await.is_none() {
            return Err(AppError::NotFound("Quiz already submitted".to_string()));
        }
        self.sessions.revoke(player_id, &quiz.id).await;
        self.leaderboard
            .record(
                player_id,
                &submission.username,
                report.score,
                report.total_questions,
                &quiz.topic,
            )
            .await;

        tracing::info!(
            quiz_id = %quiz.id,
            player_id,
            score = report.score,
            total = report.total_questions,
            "Quiz graded"
        );

        let room = submission
            .room_id
            .as_deref()
            .unwrap_or(&self.settings.default_room);
        self.broadcast_leaderboard(room).await;

        Ok(report)
    }

    pub async fn top_k(&self) -> Vec<PlayerResult> {
        self.leaderboard.top_k(self.settings.leaderboard_size).await
    }

    async fn projection(&self) -> ServerMessage {
        ServerMessage::LeaderboardUpdate {
            leaderboard: self.top_k().await,
        }
    }

    /// Recomputes the projection and pushes it to every member of `room_id`.
    pub async fn broadcast_leaderboard(&self, room_id: &str) -> usize {
        let message = self.projection().await;
        self.broadcaster.broadcast(room_id, &message).await
    }

    /// Registers a realtime connection and sends it the current board straight away.
    pub async fn connect(&self, player_id: &str) -> (ConnectionId, mpsc::Receiver<ServerMessage>) {
        let connection_id = ConnectionId::new_v4();
        let (sender, receiver) = mpsc::channel(self.settings.subscriber_buffer);
        self.broadcaster.connect(connection_id, player_id, sender).await;

        let message = self.projection().await;
        self.broadcaster.send_to(connection_id, message).await;
        (connection_id, receiver)
    }

    /// Puts the connection in `room_id` and pushes the board to the room.
    pub async fn join_room(&self, connection_id: ConnectionId, room_id: &str) -> bool {
        if !self.broadcaster.join_room(connection_id, room_id).await {
            return false;
        }
        self.broadcaster
            .send_to(
                connection_id,
                ServerMessage::Joined {
                    room_id: room_id.to_string(),
                },
            )
            .await;
        self.broadcast_leaderboard(room_id).await;
        true
    }

    pub async fn leave_room(&self, connection_id: ConnectionId) {
        self.broadcaster.leave_room(connection_id).await;
    }

    /// Leaderboard entries outlive the connection; only room membership goes away.
    pub async fn disconnect(&self, connection_id: ConnectionId) {
        self.broadcaster.disconnect(connection_id).await;
    }

    /// Manual score change for simulation. Broadcasts to `room_id` afterwards.
    pub async fn adjust_score(
        &self,
        player_id: &str,
        username: &str,
        delta: i64,
        room_id: &str,
    ) -> PlayerResult {
        let entry = self.leaderboard.adjust(player_id, username, delta).await;
        tracing::info!(player_id, delta, score = entry.score, "Score adjusted manually");
        self.broadcast_leaderboard(room_id).await;
        entry
    }

    /// Drops quizzes older than `max_age` together with their entitlements.
    pub async fn sweep_expired(&self, max_age: Duration) -> usize {
        let expired = self.store.sweep_older_than(max_age).await;
        self.sessions.revoke_quizzes(&expired).await;
        if !expired.is_empty() {
            tracing::info!(count = expired.len(), "Expired quizzes swept");
        }
        expired.len()
    }
}
