// src/models/mod.rs

pub mod leaderboard;
pub mod quiz;
pub mod realtime;
pub mod submission;
