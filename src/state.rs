use std::sync::Arc;

use crate::{
    config::Config,
    engine::{EngineSettings, QuizEngine},
    gateway::QuizGenerator,
};
use axum::extract::FromRef;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<QuizEngine>,
    pub config: Config,
}

impl AppState {
    pub fn new(config: Config, generator: Arc<dyn QuizGenerator>) -> Self {
        let engine = QuizEngine::new(generator, EngineSettings::from(&config));
        Self {
            engine: Arc::new(engine),
            config,
        }
    }
}

impl FromRef<AppState> for Arc<QuizEngine> {
    fn from_ref(state: &AppState) -> Self {
        state.engine.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
