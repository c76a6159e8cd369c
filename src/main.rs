//! Plane Spotter
//!
//! Shows the aircraft currently flying near the viewer, lets viewers collect
//! badges for unusual ones, and gives admins a console to manage users.

mod api;
mod auth;
mod badges;
mod config;
mod db;
mod errors;
mod flights;
mod models;
mod pages;

use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use auth::{ADMIN_REALM, SURVEY_REALM};
use badges::BadgeCatalog;
use config::{Config, LogFormat};
use db::Repository;
use errors::AppError;
use flights::{FlightFetcher, Fr24Client};
use models::EnrollRequest;
use pages::{AdminConsole, PageHandler};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub fetcher: FlightFetcher,
    pub catalog: Arc<BadgeCatalog>,
    pub config: Arc<Config>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let registry = tracing_subscriber::registry().with(env_filter);
    match config.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }

    tracing::info!("Starting Plane Spotter");
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!("Static directory: {:?}", config.static_dir);
    tracing::info!("Bind address: {}", config.bind_addr);
    if config.local_mode {
        tracing::info!("Local mode: raw record upload and download enabled");
    }

    // Initialize database
    let pool = db::init_database(&config.db_path).await?;
    let repo = Arc::new(Repository::new(pool));

    seed_admin(&repo, &config).await?;

    let client = Fr24Client::new(config.flight_api.clone())?;
    let fetcher = FlightFetcher::new(Arc::new(client));
    let catalog = Arc::new(BadgeCatalog::from_dir(&config.badge_dir));

    let state = AppState {
        repo,
        fetcher,
        catalog,
        config: Arc::new(config.clone()),
    };

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Enroll the configured admin credential unless the username is taken.
async fn seed_admin(repo: &Repository, config: &Config) -> Result<(), AppError> {
    let Some(seed) = &config.admin_seed else {
        tracing::warn!("No admin credential configured (SPOTTER_ADMIN_USER)");
        return Ok(());
    };

    let request = EnrollRequest {
        realm: ADMIN_REALM.to_string(),
        username: seed.username.clone(),
        password: seed.password.clone(),
    };
    match auth::enroll_credential(repo, &request, config.bcrypt_cost).await {
        Ok(_) => Ok(()),
        Err(AppError::Conflict(_)) => {
            tracing::debug!(username = %seed.username, "admin credential already present");
            Ok(())
        }
        Err(e) => Err(e),
    }
}

/// Create the application router with all mounts.
pub fn create_router(state: AppState) -> Router {
    let viewer = PageHandler::viewer(SURVEY_REALM);
    let admin = PageHandler::admin(ADMIN_REALM, AdminConsole::new(state.config.bcrypt_cost));
    let viewer_mount = viewer.mount();
    let admin_mount = admin.mount();

    let static_files = ServeDir::new(&state.config.static_dir);

    Router::new()
        .route("/", get(greeting))
        .route("/health", get(health_check))
        .nest_service("/static", static_files)
        .nest(&viewer_mount, pages::page_router(state.clone(), viewer))
        .nest(&admin_mount, pages::page_router(state, admin))
        .layer(TraceLayer::new_for_http())
}

async fn greeting() -> &'static str {
    "Hello, world!"
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests;
