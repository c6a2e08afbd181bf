//! Polka payment webhooks.
//!
//! Polka calls `POST /api/polka/webhooks` with `Authorization: ApiKey <key>`.
//! Only `user.upgraded` changes anything; every other event is acknowledged
//! and ignored so Polka stops retrying it.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode},
};
use chirpy::{AuthError, auth::UserId};
use serde::Deserialize;

use super::{AppState, error::ApiResult};
use crate::logging::log_security_event;

/// Event that upgrades a user to Chirpy Red
pub const USER_UPGRADED: &str = "user.upgraded";

#[derive(Debug, Deserialize)]
pub struct WebhookPayload {
    pub event: String,
    #[serde(default)]
    pub data: WebhookData,
}

#[derive(Debug, Default, Deserialize)]
pub struct WebhookData {
    #[serde(default)]
    pub user_id: Option<UserId>,
}

/// Handle a Polka event.
///
/// The API key is checked before the body is looked at.
///
/// # Errors
///
/// - `401 Unauthorized`: Missing or wrong API key
/// - `400 Bad Request`: Body is not a Polka event
/// - `404 Not Found`: `user.upgraded` for an unknown or missing user
pub async fn polka(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<WebhookPayload>, JsonRejection>,
) -> ApiResult<StatusCode> {
    if let Err(e) = state.auth_manager.authorize_webhook(&headers) {
        log_security_event("rejected_webhook", None, &e.client_message());
        return Err(e.into());
    }

    let Json(payload) = payload?;
    if payload.event != USER_UPGRADED {
        tracing::debug!(event = %payload.event, "Ignoring Polka event");
        return Ok(StatusCode::NO_CONTENT);
    }

    let Some(user_id) = payload.data.user_id else {
        return Err(AuthError::UserNotFound.into());
    };
    if !state.users.upgrade_to_red(user_id).await? {
        return Err(AuthError::UserNotFound.into());
    }

    tracing::info!(%user_id, "User upgraded to Chirpy Red");
    Ok(StatusCode::NO_CONTENT)
}
