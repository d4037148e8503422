// src/engine/quiz_store.rs

use std::{collections::HashMap, sync::Arc, time::Duration};

use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::quiz::{QuestionRecord, QuizId, QuizRecord};

/// Keyed table of answer-bearing quiz records. The single source of truth for grading.
#[derive(Default)]
pub struct QuizStore {
    quizzes: RwLock<HashMap<QuizId, QuizRecord>>,
}

impl QuizStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a new quiz under a fresh UUIDv4 (122 random bits) and returns its id.
    pub async fn create(&self, topic: String, questions: Vec<QuestionRecord>) -> QuizId {
        let id = Uuid::new_v4().to_string();
        let record = QuizRecord {
            id: id.clone(),
            topic,
            questions: Arc::new(questions),
            created_at: Utc::now(),
        };
        self.quizzes.write().await.insert(id.clone(), record);
        id
    }

    pub async fn get(&self, quiz_id: &str) -> Option<QuizRecord> {
        self.quizzes.read().await.get(quiz_id).cloned()
    }

    /// Removes and returns the quiz. Exactly one caller can take a given quiz.
    pub async fn take(&self, quiz_id: &str) -> Option<QuizRecord> {
        self.quizzes.write().await.remove(quiz_id)
    }

    /// Idempotent; deleting an absent quiz is a no-op.
    pub async fn delete(&self, quiz_id: &str) {
        self.quizzes.write().await.remove(quiz_id);
    }

    /// Drops every quiz created more than `max_age` ago and returns their ids.
    pub async fn sweep_older_than(&self, max_age: Duration) -> Vec<QuizId> {
        // An age reaching past the representable range expires nothing.
        let Some(cutoff) = chrono::Duration::from_std(max_age)
            .ok()
            .and_then(|max_age| Utc::now().checked_sub_signed(max_age))
        else {
            return Vec::new();
        };

        let mut quizzes = self.quizzes.write().await;
        let expired: Vec<QuizId> = quizzes
            .values()
            .filter(|quiz| quiz.created_at < cutoff)
            .map(|quiz| quiz.id.clone())
            .collect();
        for id in &expired {
            quizzes.remove(id);
        }
        expired
    }

    pub async fn len(&self) -> usize {
        self.quizzes.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.quizzes.read().await.is_empty()
    }
}
