// src/models/submission.rs

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

use crate::models::quiz::QuizId;

/// One answer as it arrives over the wire.
///
/// Items are kept as raw JSON so a single malformed entry (missing field, index
/// sent as a string, non-string letter) is skipped instead of failing the batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubmittedAnswer(pub Value);

impl SubmittedAnswer {
    pub fn into_entry(self) -> Option<AnswerEntry> {
        let question_index = self.0.get("question_index")?.as_i64()?;
        let selected_letter = self.0.get("selected_option_letter")?.as_str()?;
        Some(AnswerEntry::new(question_index, selected_letter))
    }
}

/// A well-formed answer, ready for grading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerEntry {
    pub question_index: i64,
    pub selected_letter: String,
}

impl AnswerEntry {
    pub fn new(question_index: i64, selected_letter: impl Into<String>) -> Self {
        Self {
            question_index,
            selected_letter: selected_letter.into(),
        }
    }
}

/// DTO for submitting a quiz attempt.
#[derive(Debug, Deserialize, Validate)]
pub struct SubmitQuizRequest {
    /// The id received from the generate endpoint.
    #[validate(length(min = 1, max = 64))]
    pub quiz_id: QuizId,

    /// Blank names fall back to "Anonymous".
    #[validate(length(max = 50))]
    pub username: Option<String>,

    #[serde(default)]
    #[validate(length(max = 200))]
    pub user_answers: Vec<SubmittedAnswer>,

    /// Room whose subscribers get the refreshed leaderboard.
    #[validate(length(min = 1, max = 64))]
    pub room_id: Option<String>,
}

/// Per-answer grading result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AnswerOutcome {
    Graded {
        question_index: usize,
        question_text: String,
        options: BTreeMap<String, String>,
        user_selected_letter: String,
        correct_letter: String,
        is_correct: bool,
    },
    /// The index did not name a question of the quiz; excluded from the score.
    OutOfBounds {
        question_index: i64,
        user_selected_letter: String,
    },
}

impl AnswerOutcome {
    pub fn is_correct(&self) -> bool {
        matches!(self, AnswerOutcome::Graded { is_correct: true, .. })
    }
}

/// Score and per-question results for one submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradeReport {
    pub score: u32,
    pub total_questions: u32,
    pub results: Vec<AnswerOutcome>,
}
