// src/engine/session_index.rs

use std::collections::{HashMap, HashSet};

use tokio::sync::RwLock;

use crate::models::{leaderboard::PlayerId, quiz::QuizId};

/// Server-held allow-list of quiz ids each identity may submit against.
///
/// Quiz ids travel to the client, answers do not; this index is what stops
/// one player from submitting against a quiz generated for someone else.
#[derive(Default)]
pub struct SessionIndex {
    entitlements: RwLock<HashMap<PlayerId, HashSet<QuizId>>>,
}

impl SessionIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn grant(&self, player_id: &str, quiz_id: &str) {
        self.entitlements
            .write()
            .await
            .entry(player_id.to_string())
            .or_default()
            .insert(quiz_id.to_string());
    }

    pub async fn check(&self, player_id: &str, quiz_id: &str) -> bool {
        self.entitlements
            .read()
            .await
            .get(player_id)
            .is_some_and(|quizzes| quizzes.contains(quiz_id))
    }

    /// Idempotent removal. Empty sets are dropped so the table only holds live players.
    pub async fn revoke(&self, player_id: &str, quiz_id: &str) {
        let mut entitlements = self.entitlements.write().await;
        if let Some(quizzes) = entitlements.get_mut(player_id) {
            quizzes.remove(quiz_id);
            if quizzes.is_empty() {
                entitlements.remove(player_id);
            }
        }
    }

    /// Revokes the given quizzes from every identity (used on expiry).
    pub async fn revoke_quizzes(&self, quiz_ids: &[QuizId]) {
        if quiz_ids.is_empty() {
            return;
        }
        let mut entitlements = self.entitlements.write().await;
        entitlements.retain(|_, quizzes| {
            for id in quiz_ids {
                quizzes.remove(id);
            }
            !quizzes.is_empty()
        });
    }

    pub async fn outstanding(&self, player_id: &str) -> usize {
        self.entitlements
            .read()
            .await
            .get(player_id)
            .map_or(0, HashSet::len)
    }
}
