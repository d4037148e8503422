// src/engine/leaderboard.rs

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::models::leaderboard::{PlayerId, PlayerResult};

/// Topic recorded for entries created by a manual score adjustment.
const ADJUSTMENT_TOPIC: &str = "Simulation";

/// One entry per player holding their most recent result.
///
/// Recording overwrites: this tracks the latest attempt, not the best or a
/// running total. Two concurrent submissions for one player race and the
/// later write wins.
#[derive(Default)]
pub struct Leaderboard {
    entries: RwLock<HashMap<PlayerId, PlayerResult>>,
}

impl Leaderboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn record(
        &self,
        player_id: &str,
        username: &str,
        score: u32,
        total_questions: u32,
        topic: &str,
    ) {
        self.record_at(player_id, username, score, total_questions, topic, Utc::now())
            .await;
    }

    pub async fn record_at(
        &self,
        player_id: &str,
        username: &str,
        score: u32,
        total_questions: u32,
        topic: &str,
        submitted_at: DateTime<Utc>,
    ) {
        let result = PlayerResult {
            player_id: player_id.to_string(),
            username: username.to_string(),
            score,
            total_questions: total_questions.max(score),
            topic: topic.to_string(),
            submitted_at,
        };
        self.entries
            .write()
            .await
            .insert(player_id.to_string(), result);
    }

    /// Applies a manual delta to the player's score, flooring at zero and raising
    /// `total_questions` so it never falls below the score.
    pub async fn adjust(&self, player_id: &str, username: &str, delta: i64) -> PlayerResult {
        let mut entries = self.entries.write().await;
        let entry = entries
            .entry(player_id.to_string())
            .or_insert_with(|| PlayerResult {
                player_id: player_id.to_string(),
                username: username.to_string(),
                score: 0,
                total_questions: 0,
                topic: ADJUSTMENT_TOPIC.to_string(),
                submitted_at: Utc::now(),
            });

        let score = i64::from(entry.score)
            .saturating_add(delta)
            .clamp(0, i64::from(u32::MAX)) as u32;
        entry.score = score;
        entry.total_questions = entry.total_questions.max(score);
        entry.username = username.to_string();
        entry.submitted_at = Utc::now();
        entry.clone()
    }

    /// Top `k` entries: score descending, then earliest submission, then player id.
    pub async fn top_k(&self, k: usize) -> Vec<PlayerResult> {
        let entries = self.entries.read().await;
        let mut ranked: Vec<PlayerResult> = entries.values().cloned().collect();
        drop(entries);

        ranked.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then_with(|| a.submitted_at.cmp(&b.submitted_at))
                .then_with(|| a.player_id.cmp(&b.player_id))
        });
        ranked.truncate(k);
        ranked
    }

    pub async fn get(&self, player_id: &str) -> Option<PlayerResult> {
        self.entries.read().await.get(player_id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
