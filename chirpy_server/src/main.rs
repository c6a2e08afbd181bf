//! Chirpy identity server.
//!
//! Serves login, refresh, revoke, registration and the Polka webhook over
//! HTTP, with users and refresh tokens stored in PostgreSQL.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Error};
use chirpy::{
    AuthManager, Database,
    db::{PgRefreshTokenRepository, PgUserRepository},
};
use chirpy_server::{api, config::ServerConfig, logging};
use pico_args::Arguments;
use tracing::info;

const HELP: &str = "\
Run the Chirpy identity server

USAGE:
  chirpy_server [OPTIONS]

OPTIONS:
  --bind       IP:PORT     Server socket bind address  [default: env SERVER_BIND or 127.0.0.1:8080]
  --db-url     URL         Database connection string  [default: env DATABASE_URL]

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  SERVER_BIND              Server bind address (e.g., 0.0.0.0:8080)
  DATABASE_URL             PostgreSQL connection string
  JWT_SECRET               Access token signing secret (required, >= 32 chars)
  POLKA_KEY                Polka webhook API key (required)
  ACCESS_TOKEN_TTL_SECS    Default access token lifetime [default: 3600]
  ACCESS_TOKEN_MAX_TTL_SECS  Largest lifetime a client may request [default: 3600]
  REFRESH_TOKEN_TTL_DAYS   Refresh token lifetime [default: 60]
  SESSION_POLICY           per_login | reuse_active [default: per_login]
  (See .env file for all configuration options)
";

struct Args {
    bind: Option<SocketAddr>,
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let args = Args {
        bind: pargs
            .opt_value_from_str("--bind")
            .context("Invalid --bind address")?,
        database_url: pargs
            .opt_value_from_str("--db-url")
            .context("Invalid --db-url")?,
    };

    logging::init();

    let config = ServerConfig::from_env(args.bind, args.database_url)?;
    config.validate()?;
    let auth_config = config.to_auth_config()?;
    info!(
        bind = %config.bind,
        session_policy = ?config.tokens.session_policy,
        "Starting Chirpy server"
    );

    // Initialize database
    let db = Database::new(&config.database)
        .await
        .context("Failed to connect to database")?;
    db.migrate().await.context("Failed to run migrations")?;
    info!("Database connected successfully");

    let users = Arc::new(PgUserRepository::new(db.pool().clone()));
    let refresh_tokens = Arc::new(PgRefreshTokenRepository::new(db.pool().clone()));
    let auth_manager = Arc::new(AuthManager::new(users.clone(), refresh_tokens, auth_config));

    let api_state = api::AppState {
        auth_manager,
        users,
        database: Some(db.clone()),
    };

    let app = api::create_router(api_state);

    // Start HTTP server
    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind))?;

    info!(
        "Server is running at http://{}. Press Ctrl+C to stop.",
        config.bind
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shutting down server...");
    db.close().await;

    Ok(())
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
}
