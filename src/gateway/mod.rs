// src/gateway/mod.rs

//! Quiz Generation Gateway.
//!
//! Everything that touches raw LLM text lives here. Callers only ever see
//! validated [`QuestionRecord`]s or a [`GenerationError`].

pub mod groq;
pub mod parse;
pub mod prompt;

use std::time::Duration;

use async_trait::async_trait;

use crate::models::quiz::{Difficulty, QuestionRecord};

pub use groq::GroqGenerator;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub topic: String,
    pub count: usize,
    pub difficulty: Difficulty,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerationError {
    #[error("quiz generation service unreachable: {0}")]
    Unreachable(String),
    #[error("quiz generation service returned an invalid response: {0}")]
    BadResponse(String),
    #[error("quiz generation timed out after {}s", .0.as_secs())]
    Timeout(Duration),
}

/// Turns a topic/difficulty/count request into normalized questions.
#[async_trait]
pub trait QuizGenerator: Send + Sync {
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<Vec<QuestionRecord>, GenerationError>;
}
