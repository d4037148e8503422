// src/config.rs

use std::{env, str::FromStr, time::Duration};

use dotenvy::dotenv;
use url::Url;

pub const DEFAULT_LLM_API_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
pub const DEFAULT_ROOM: &str = "quiz123";
pub const SESSION_COOKIE: &str = "quiz_session";
pub const PLAYER_TOKEN_HEADER: &str = "x-player-token";

/// Option letters run from 'A' to 'Z'.
pub const MAX_OPTIONS_PER_QUESTION: usize = 26;

const FALLBACK_SESSION_SECRET: &str = "fallback_dev_key";

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,

    /// HMAC secret for player session tokens.
    pub session_secret: String,
    pub session_ttl_secs: u64,

    pub llm_api_key: Option<String>,
    pub llm_api_url: String,
    pub llm_model: String,
    pub llm_temperature: f32,
    pub llm_max_tokens: u32,
    pub generation_timeout_secs: u64,
    pub options_per_question: usize,

    pub leaderboard_size: usize,
    pub default_room: String,
    /// Per-subscriber outbound buffer; messages beyond it are dropped.
    pub subscriber_buffer: usize,

    /// When set, quizzes older than this are swept periodically.
    pub quiz_ttl_secs: Option<u64>,
    pub allow_score_adjustments: bool,
    pub cors_origins: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:5000".to_string(),
            session_secret: FALLBACK_SESSION_SECRET.to_string(),
            session_ttl_secs: 7 * 24 * 60 * 60,
            llm_api_key: None,
            llm_api_url: DEFAULT_LLM_API_URL.to_string(),
            llm_model: "llama3-70b-8192".to_string(),
            llm_temperature: 0.7,
            llm_max_tokens: 2000,
            generation_timeout_secs: 30,
            options_per_question: 4,
            leaderboard_size: 10,
            default_room: DEFAULT_ROOM.to_string(),
            subscriber_buffer: 32,
            quiz_ttl_secs: None,
            allow_score_adjustments: false,
            cors_origins: vec![
                "http://localhost:5173".to_string(),
                "http://localhost:3000".to_string(),
            ],
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let defaults = Self::default();

        let session_secret = match env::var("SESSION_SECRET") {
            Ok(secret) if !secret.is_empty() => secret,
            _ => {
                tracing::warn!("SESSION_SECRET not set, using fallback key (not safe for production)");
                defaults.session_secret
            }
        };

        let llm_api_key = env::var("GROQ_API_KEY").ok().filter(|key| !key.is_empty());
        if llm_api_key.is_none() {
            tracing::warn!("GROQ_API_KEY not set, quiz generation will fail");
        }

        let llm_api_url = match env::var("LLM_API_URL") {
            Ok(raw) if Url::parse(&raw).is_ok() => raw,
            Ok(raw) => {
                tracing::warn!("LLM_API_URL '{}' is not a valid URL, using default", raw);
                defaults.llm_api_url
            }
            Err(_) => defaults.llm_api_url,
        };

        let options_per_question = parse_var("OPTIONS_PER_QUESTION", defaults.options_per_question)
            .clamp(1, MAX_OPTIONS_PER_QUESTION);

        let cors_origins = env::var("CORS_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|origin| !origin.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or(defaults.cors_origins);

        Self {
            bind_addr: env::var("BIND_ADDR").unwrap_or(defaults.bind_addr),
            session_secret,
            session_ttl_secs: parse_var("SESSION_TTL_SECS", defaults.session_ttl_secs),
            llm_api_key,
            llm_api_url,
            llm_model: env::var("LLM_MODEL").unwrap_or(defaults.llm_model),
            llm_temperature: parse_var("LLM_TEMPERATURE", defaults.llm_temperature),
            llm_max_tokens: parse_var("LLM_MAX_TOKENS", defaults.llm_max_tokens),
            generation_timeout_secs: parse_var(
                "GENERATION_TIMEOUT_SECS",
                defaults.generation_timeout_secs,
            ),
            options_per_question,
            leaderboard_size: parse_var("LEADERBOARD_SIZE", defaults.leaderboard_size),
            default_room: env::var("DEFAULT_ROOM").unwrap_or(defaults.default_room),
            subscriber_buffer: parse_var("SUBSCRIBER_BUFFER", defaults.subscriber_buffer).max(1),
            quiz_ttl_secs: env::var("QUIZ_TTL_SECS")
                .ok()
                .and_then(|raw| raw.parse().ok()),
            allow_score_adjustments: parse_var(
                "ALLOW_SCORE_ADJUSTMENTS",
                defaults.allow_score_adjustments,
            ),
            cors_origins,
        }
    }

    pub fn generation_timeout(&self) -> Duration {
        Duration::from_secs(self.generation_timeout_secs)
    }

    pub fn quiz_ttl(&self) -> Option<Duration> {
        self.quiz_ttl_secs.map(Duration::from_secs)
    }
}

/// Reads and parses an env var, falling back to `default` when unset or malformed.
fn parse_var<T: FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("{} has an invalid value '{}', using default", key, raw);
            default
        }),
        Err(_) => default,
    }
}
