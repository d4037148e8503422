// src/models/leaderboard.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stable player identity key (a UUID string minted by the identity resolver).
pub type PlayerId = String;

/// A player's most recent result. Exactly one per player; newer submissions overwrite it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerResult {
    #[serde(rename = "id")]
    pub player_id: PlayerId,
    pub username: String,
    pub score: u32,
    pub total_questions: u32,
    /// Topic of the most recently submitted quiz.
    pub topic: String,
    pub submitted_at: DateTime<Utc>,
}
