// src/handlers/realtime.rs

use std::sync::Arc;

use axum::{
    Extension,
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures::{SinkExt, StreamExt};

use crate::{
    config::Config,
    engine::{QuizEngine, broadcaster::ConnectionId},
    models::realtime::{ClientMessage, ServerMessage},
    state::AppState,
    utils::{html::sanitize_display, identity::PlayerIdentity},
};

const MAX_ROOM_ID_LEN: usize = 64;

/// Upgrades to a websocket carrying leaderboard updates.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Extension(identity): Extension<PlayerIdentity>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state, identity))
}

async fn handle_socket(socket: WebSocket, state: AppState, identity: PlayerIdentity) {
    let (mut sender, mut receiver) = socket.split();
    let (connection_id, mut outbound) = state.engine.connect(&identity.player_id).await;

    // Forward queued server messages to the socket.
    let mut send_task = tokio::spawn(async move {
        while let Some(message) = outbound.recv().await {
            let text = match serde_json::to_string(&message) {
                Ok(text) => text,
                Err(e) => {
                    tracing::error!("Failed to encode server message: {}", e);
                    continue;
                }
            };
            if sender.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    let mut session = SocketSession::new(
        state.engine.clone(),
        &state.config,
        connection_id,
        identity.player_id,
    );
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(message)) = receiver.next().await {
            match message {
                Message::Text(text) => session.handle_text(text.as_str()).await,
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    state.engine.disconnect(connection_id).await;
}

/// Per-connection handling of client messages.
pub struct SocketSession {
    engine: Arc<QuizEngine>,
    connection_id: ConnectionId,
    player_id: String,
    username: Option<String>,
    room_id: Option<String>,
    default_room: String,
    allow_score_adjustments: bool,
}

impl SocketSession {
    pub fn new(
        engine: Arc<QuizEngine>,
        config: &Config,
        connection_id: ConnectionId,
        player_id: String,
    ) -> Self {
        Self {
            engine,
            connection_id,
            player_id,
            username: None,
            room_id: None,
            default_room: config.default_room.clone(),
            allow_score_adjustments: config.allow_score_adjustments,
        }
    }

    async fn reply(&self, message: ServerMessage) {
        self.engine
            .broadcaster()
            .send_to(self.connection_id, message)
            .await;
    }

    async fn reply_error(&self, message: impl Into<String>) {
        self.reply(ServerMessage::Error {
            message: message.into(),
        })
        .await;
    }

    pub async fn handle_text(&mut self, text: &str) {
        match serde_json::from_str::<ClientMessage>(text) {
            Ok(message) => self.handle(message).await,
            Err(e) => self.reply_error(format!("Bad message: {e}")).await,
        }
    }

    pub async fn handle(&mut self, message: ClientMessage) {
        match message {
            ClientMessage::JoinRoom { room_id, username } => {
                let room_id = room_id.trim().to_string();
                if room_id.is_empty() || room_id.len() > MAX_ROOM_ID_LEN {
                    self.reply_error("Invalid room id").await;
                    return;
                }
                if let Some(name) = username.as_deref().map(sanitize_display) {
                    if !name.is_empty() {
                        self.username = Some(name);
                    }
                }
                tracing::info!(
                    connection_id = %self.connection_id,
                    player_id = %self.player_id,
                    room_id = %room_id,
                    "Client joined room"
                );
                self.engine.join_room(self.connection_id, &room_id).await;
                self.room_id = Some(room_id);
            }
            ClientMessage::LeaveRoom => {
                self.engine.leave_room(self.connection_id).await;
                self.room_id = None;
            }
            ClientMessage::AdjustScore { delta, username } => {
                if !self.allow_score_adjustments {
                    self.reply_error("Score adjustments are disabled").await;
                    return;
                }
                let username = username
                    .as_deref()
                    .map(sanitize_display)
                    .filter(|name| !name.is_empty())
                    .or_else(|| self.username.clone())
                    .unwrap_or_else(|| "Anonymous".to_string());
                let room_id = self.room_id.as_deref().unwrap_or(&self.default_room);
                self.engine
                    .adjust_score(&self.player_id, &username, delta, room_id)
                    .await;
            }
            ClientMessage::Ping => self.reply(ServerMessage::Pong).await,
        }
    }
}
