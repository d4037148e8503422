// src/models/quiz.rs

use std::{collections::BTreeMap, sync::Arc};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Opaque quiz identifier handed to the client.
pub type QuizId = String;

/// Full answer-bearing representation of one generated quiz.
///
/// The question list is shared behind an `Arc` so the store can hand out
/// cheap clones; nothing ever mutates it after creation.
#[derive(Debug, Clone)]
pub struct QuizRecord {
    pub id: QuizId,
    pub topic: String,
    pub questions: Arc<Vec<QuestionRecord>>,
    pub created_at: DateTime<Utc>,
}

impl QuizRecord {
    pub fn total_questions(&self) -> usize {
        self.questions.len()
    }
}

/// A single multiple-choice question, including its answer key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionRecord {
    pub text: String,

    /// Option letter ("A", "B", ...) to option text.
    pub options: BTreeMap<String, String>,

    /// Always one of the keys of `options`.
    pub correct_letter: String,
}

impl QuestionRecord {
    /// Checks the record invariants: non-empty text, non-empty options keyed by
    /// single uppercase letters, and a correct letter that names one of them.
    pub fn validate(&self) -> Result<(), String> {
        if self.text.trim().is_empty() {
            return Err("question text is empty".to_string());
        }
        if self.options.is_empty() {
            return Err(format!("question '{}' has no options", self.text));
        }
        for (letter, text) in &self.options {
            if !is_option_letter(letter) {
                return Err(format!("invalid option key '{letter}'"));
            }
            if text.trim().is_empty() {
                return Err(format!("option {letter} is empty"));
            }
        }
        if !self.options.contains_key(&self.correct_letter) {
            return Err(format!(
                "correct letter '{}' is not among the options",
                self.correct_letter
            ));
        }
        Ok(())
    }
}

fn is_option_letter(key: &str) -> bool {
    let mut chars = key.chars();
    matches!((chars.next(), chars.next()), (Some(c), None) if c.is_ascii_uppercase())
}

/// DTO for sending a question to the client (excludes the answer).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicQuestion {
    pub question_text: String,
    pub options: BTreeMap<String, String>,
}

impl From<&QuestionRecord> for PublicQuestion {
    fn from(question: &QuestionRecord) -> Self {
        Self {
            question_text: question.text.clone(),
            options: question.options.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

/// DTO for requesting a freshly generated quiz.
#[derive(Debug, Deserialize, Validate)]
pub struct GenerateQuizRequest {
    #[serde(default = "default_topic")]
    #[validate(length(min = 1, max = 200))]
    pub topic: String,

    #[serde(default = "default_count")]
    #[validate(range(min = 1, max = 20))]
    pub count: u32,

    #[serde(default)]
    pub difficulty: Difficulty,
}

pub fn default_topic() -> String {
    "General Knowledge".to_string()
}

fn default_count() -> u32 {
    5
}

/// DTO returned after a quiz has been generated and stored.
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerateQuizResponse {
    pub quiz_id: QuizId,
    pub topic: String,
    pub questions: Vec<PublicQuestion>,
}
