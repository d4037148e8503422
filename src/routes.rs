// src/routes.rs

use axum::{
    Router,
    http::{HeaderName, HeaderValue, Method, header},
    middleware,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    config::PLAYER_TOKEN_HEADER,
    handlers::{quiz, realtime},
    state::AppState,
    utils::identity::identity_middleware,
};

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .expose_headers([HeaderName::from_static(PLAYER_TOKEN_HEADER)])
        .allow_credentials(true)
}

/// Assembles the main application router.
///
/// * Merges the quiz routes and the realtime endpoint.
/// * Also serves the quiz routes at the flat paths older clients call
///   (`/generate-quiz`, `/submit-quiz`, `/leaderboard`).
/// * Resolves (or mints) the caller's identity on every request.
/// * Applies global middleware (Trace, CORS).
pub fn create_router(state: AppState) -> Router {
    let quiz_routes = Router::new()
        .route("/generate", post(quiz::generate_quiz))
        .route("/submit", post(quiz::submit_quiz))
        .route("/leaderboard", get(quiz::get_leaderboard));

    let legacy_routes = Router::new()
        .route("/generate-quiz", post(quiz::generate_quiz))
        .route("/submit-quiz", post(quiz::submit_quiz))
        .route("/leaderboard", get(quiz::get_leaderboard));

    Router::new()
        .nest("/api/quiz", quiz_routes)
        .merge(legacy_routes)
        .route("/ws", get(realtime::ws_handler))
        // Global Middleware (applied from outside in)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            identity_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}
