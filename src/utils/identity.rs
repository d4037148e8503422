// src/utils/identity.rs

use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, HeaderValue, Request, header},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    config::{Config, PLAYER_TOKEN_HEADER, SESSION_COOKIE},
    error::AppError,
    models::leaderboard::PlayerId,
};

/// Session token claims.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Claims {
    /// Subject - the player id.
    pub sub: String,
    /// Issued-at as Unix timestamp.
    pub iat: usize,
    /// Expiration time as Unix timestamp.
    pub exp: usize,
}

/// The caller's resolved identity, injected into request extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerIdentity {
    pub player_id: PlayerId,
}

fn now_secs() -> Result<usize, AppError> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as usize)
        .map_err(|e| AppError::InternalServerError(e.to_string()))
}

/// Signs a session token binding `player_id`.
pub fn sign_token(player_id: &str, secret: &str, ttl_seconds: u64) -> Result<String, AppError> {
    let issued_at = now_secs()?;
    let claims = Claims {
        sub: player_id.to_owned(),
        iat: issued_at,
        exp: issued_at.saturating_add(usize::try_from(ttl_seconds).unwrap_or(usize::MAX)),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::InternalServerError(e.to_string()))
}

/// Verifies and decodes a session token.
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, AppError> {
    let token_data = decode(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AppError::AuthError("Invalid session token".to_string()))?;

    Ok(token_data.claims)
}

/// Finds a session token: `Authorization: Bearer` first, then the session cookie.
fn extract_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string());
    if bearer.is_some() {
        return bearer;
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, token)| token.to_string())
}

/// Outcome of resolving a request's identity.
#[derive(Debug, Clone)]
pub struct Resolved {
    pub identity: PlayerIdentity,
    /// Present when a new identity was minted and must be bound to the client.
    pub minted_token: Option<String>,
}

/// Returns the identity bound to the request, minting a fresh one when there is
/// no valid token. Never fails.
pub fn resolve(headers: &HeaderMap, config: &Config) -> Resolved {
    if let Some(claims) = extract_token(headers)
        .and_then(|token| verify_token(&token, &config.session_secret).ok())
    {
        return Resolved {
            identity: PlayerIdentity {
                player_id: claims.sub,
            },
            minted_token: None,
        };
    }

    let player_id = Uuid::new_v4().to_string();
    let minted_token = match sign_token(&player_id, &config.session_secret, config.session_ttl_secs) {
        Ok(token) => Some(token),
        Err(e) => {
            tracing::error!("Failed to sign session token: {}", e);
            None
        }
    };
    tracing::info!(%player_id, "New player detected");

    Resolved {
        identity: PlayerIdentity { player_id },
        minted_token,
    }
}

/// Axum Middleware: Identity.
///
/// Resolves the caller's identity and injects `PlayerIdentity` into the request
/// extensions. When a new identity is minted the response binds it through a
/// `Set-Cookie` header and an `x-player-token` header. Requests are never rejected.
pub async fn identity_middleware(
    State(config): State<Config>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let resolved = resolve(req.headers(), &config);
    req.extensions_mut().insert(resolved.identity);

    let mut response = next.run(req).await;

    if let Some(token) = resolved.minted_token {
        let cookie = format!(
            "{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
            config.session_ttl_secs
        );
        let headers = response.headers_mut();
        if let Ok(value) = HeaderValue::from_str(&cookie) {
            headers.append(header::SET_COOKIE, value);
        }
        if let Ok(value) = HeaderValue::from_str(&token) {
            headers.insert(PLAYER_TOKEN_HEADER, value);
        }
    }

    response
}
