//! HTTP API for the Chirpy identity service.
//!
//! # Modules
//!
//! - [`auth`]: Session lifecycle (login, refresh, revoke)
//! - [`users`]: Registration and the caller's own profile
//! - [`webhooks`]: Polka payment events
//! - [`middleware`]: Access token guard for protected endpoints
//! - [`error`]: JSON error responses
//!
//! # Endpoints Overview
//!
//! ## Public
//! - `POST /api/users` - Register new user
//! - `POST /api/login` - Login with email and password
//! - `POST /api/refresh` - New access token from `Authorization: Bearer <refresh token>`
//! - `POST /api/revoke` - Revoke `Authorization: Bearer <refresh token>`
//!
//! ## Protected (`Authorization: Bearer <access token>`)
//! - `GET /api/users/me` - Caller's public fields
//!
//! ## Webhooks (`Authorization: ApiKey <key>`)
//! - `POST /api/polka/webhooks` - Payment events
//!
//! ## Health Check
//! - `GET /api/healthz` - Server health status
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use chirpy_server::api::{create_router, AppState};
//! use chirpy::{AuthConfig, AuthManager};
//! use chirpy::db::{InMemoryRefreshTokenRepository, InMemoryUserRepository};
//! use std::sync::Arc;
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!
//! let users = Arc::new(InMemoryUserRepository::new());
//! let auth_manager = AuthManager::new(
//!     users.clone(),
//!     Arc::new(InMemoryRefreshTokenRepository::new()),
//!     AuthConfig::new("jwt_secret_at_least_32_characters!!", "polka_key"),
//! );
//!
//! let state = AppState {
//!     auth_manager: Arc::new(auth_manager),
//!     users,
//!     database: None,
//! };
//!
//! let app = create_router(state);
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:8080").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # CORS
//!
//! CORS is configured permissively for development. In production, configure
//! appropriate origins, methods, and headers.

pub mod auth;
pub mod error;
pub mod middleware;
pub mod users;
pub mod webhooks;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chirpy::{AuthManager, Database, db::UserRepository};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Application state shared across all HTTP handlers.
///
/// Cloned for each request (cheap due to Arc wrappers).
#[derive(Clone)]
pub struct AppState {
    /// Session layer
    pub auth_manager: Arc<AuthManager>,
    /// User store, for webhook-driven updates
    pub users: Arc<dyn UserRepository>,
    /// Database pool, if the stores are backed by one
    pub database: Option<Database>,
}

/// Create the complete API router with all endpoints and middleware.
///
/// ```text
/// GET  /api/healthz         - Health check (public)
/// POST /api/users           - Register user (public)
/// POST /api/login           - Login (public)
/// POST /api/refresh         - Refresh access token (refresh token)
/// POST /api/revoke          - Revoke refresh token (refresh token)
/// GET  /api/users/me        - Caller's profile (access token)
/// POST /api/polka/webhooks  - Payment events (API key)
/// ```
pub fn create_router(state: AppState) -> Router {
    // Public routes (no authentication middleware)
    let public_routes = Router::new()
        .route("/api/healthz", get(health_check))
        .route("/api/users", post(users::register))
        .route("/api/login", post(auth::login))
        // Refresh, revoke and webhooks check their own credentials
        .route("/api/refresh", post(auth::refresh))
        .route("/api/revoke", post(auth::revoke))
        .route("/api/polka/webhooks", post(webhooks::polka));

    // Protected routes (require authentication middleware)
    let protected_routes = Router::new()
        .route("/api/users/me", get(users::me))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth_middleware,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint for monitoring and load balancers.
///
/// Returns `200 OK` when the database answers (or none is configured), and
/// `503 Service Unavailable` otherwise.
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let Some(database) = &state.database else {
        return (StatusCode::OK, "OK");
    };

    match database.health_check().await {
        Ok(()) => (StatusCode::OK, "OK"),
        Err(e) => {
            tracing::error!(error = %e, "Database health check failed");
            (StatusCode::SERVICE_UNAVAILABLE, "Service Unavailable")
        }
    }
}
