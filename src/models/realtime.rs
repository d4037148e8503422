// src/models/realtime.rs

use serde::{Deserialize, Serialize};

use crate::models::leaderboard::PlayerResult;

/// Messages pushed from the server to a websocket subscriber.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    LeaderboardUpdate { leaderboard: Vec<PlayerResult> },
    Joined { room_id: String },
    Pong,
    Error { message: String },
}

/// Messages a websocket client may send.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    JoinRoom {
        room_id: String,
        #[serde(default)]
        username: Option<String>,
    },
    LeaveRoom,
    /// Debug/simulation affordance; only honoured when enabled in config.
    AdjustScore {
        delta: i64,
        #[serde(default)]
        username: Option<String>,
    },
    Ping,
}
