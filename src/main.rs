// src/main.rs

use std::sync::Arc;

use dotenvy::dotenv;
use quiz_backend::config::Config;
use quiz_backend::engine::QuizEngine;
use quiz_backend::gateway::GroqGenerator;
use quiz_backend::routes;
use quiz_backend::state::AppState;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenv().ok();

    let file_appender = tracing_appender::rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    // Initialize Tracing (Logging)
    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    // Load configuration from environment
    let config = Config::from_env();

    let generator =
        GroqGenerator::from_config(&config).expect("Failed to build generation client");

    // Create AppState
    let state = AppState::new(config.clone(), Arc::new(generator));

    if let Some(ttl) = config.quiz_ttl() {
        tracing::info!("Sweeping quizzes older than {}s", ttl.as_secs());
        spawn_sweeper(state.engine.clone(), ttl);
    }

    // Create the Axum application router
    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("Failed to bind listening address");
    tracing::info!("Listening on {}", config.bind_addr);

    // Start the server
    axum::serve(listener, app).await.expect("Server error");
}

/// Periodically drops expired quizzes and their entitlements.
/// Runs every `ttl / 2`, between once a second and once a day.
fn spawn_sweeper(engine: Arc<QuizEngine>, ttl: std::time::Duration) {
    let period = (ttl / 2).clamp(
        std::time::Duration::from_secs(1),
        std::time::Duration::from_secs(24 * 60 * 60),
    );
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            engine.sweep_expired(ttl).await;
        }
    });
}
