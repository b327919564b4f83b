//! Shared application state.

use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use chrono::Utc;
use uuid::Uuid;

use lingo_core::ConnectionRegistry;
use lingo_db::Database;
use lingo_fabric::Broker;

use crate::auth::{bearer_token, TokenSigner};
use crate::error::ApiError;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub broker: Broker,
    pub registry: ConnectionRegistry,
    pub tokens: TokenSigner,
}

impl AppState {
    /// Resolve the authenticated user from the request headers. REST
    /// endpoints require a valid bearer token.
    pub fn authenticate(&self, headers: &HeaderMap) -> Result<Uuid, ApiError> {
        authenticate(&self.tokens, headers)
    }

    /// Best-effort identity for the realtime handshake: the transport
    /// connects either way, an invalid credential just means no binding.
    pub fn identify(&self, headers: &HeaderMap) -> Option<Uuid> {
        identify(&self.tokens, headers)
    }
}

fn authenticate(tokens: &TokenSigner, headers: &HeaderMap) -> Result<Uuid, ApiError> {
    let header = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("missing bearer token".to_string()))?;
    let token = bearer_token(header)
        .ok_or_else(|| ApiError::Unauthorized("missing bearer token".to_string()))?;
    Ok(tokens.verify(token, Utc::now())?)
}

fn identify(tokens: &TokenSigner, headers: &HeaderMap) -> Option<Uuid> {
    let header = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = bearer_token(header)?;
    match tokens.verify(token, Utc::now()) {
        Ok(user_id) => Some(user_id),
        Err(e) => {
            tracing::warn!(error = %e, "Realtime credential rejected, proceeding unauthenticated");
            None
        }
    }
}
