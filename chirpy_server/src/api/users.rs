//! User account handlers.

use axum::{
    Json,
    extract::{Extension, State, rejection::JsonRejection},
    http::StatusCode,
};
use chirpy::auth::{RegisterRequest, User};

use super::{AppState, error::ApiResult, middleware::AuthenticatedUser};

/// Create a user account.
///
/// # Request Body
///
/// ```json
/// { "email": "walt@breakingbad.com", "password": "0423404234" }
/// ```
///
/// # Response
///
/// On success, returns `201 Created` with the user's public fields.
///
/// # Errors
///
/// - `400 Bad Request`: Malformed email or password shorter than 8 characters
/// - `409 Conflict`: Email already registered
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<User>)> {
    let Json(request) = payload?;
    let user = state.auth_manager.register(request).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Public fields of the calling user. Requires a valid access token.
pub async fn me(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(user_id)): Extension<AuthenticatedUser>,
) -> ApiResult<Json<User>> {
    let user = state.auth_manager.find_user(user_id).await?;
    Ok(Json(user))
}
