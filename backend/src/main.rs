//! Milhas Backend
//!
//! REST backend for a family's loyalty-program accounts, with field-level
//! change tracking and a global audit log. Backed by SQLite or by memory.

mod api;
mod clock;
mod config;
mod db;
mod errors;
mod models;
mod seed;
mod stats;
mod tracking;

use std::sync::Arc;

use axum::{
    routing::{delete, get, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::{Config, LogFormat, StorageKind};
use db::{
    ChangeLogRepository, CompanyRepository, MemberRepository, MemoryStore, PostItRepository,
    SqliteStore, Store,
};
use stats::DashboardService;
use tracking::ChangeTracker;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub tracker: Arc<ChangeTracker>,
    pub dashboard: Arc<DashboardService>,
    pub companies: Arc<dyn CompanyRepository>,
    pub members: Arc<dyn MemberRepository>,
    pub log: Arc<dyn ChangeLogRepository>,
    pub postits: Arc<dyn PostItRepository>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Wire every service to the same store.
    pub fn new<S: Store>(store: Arc<S>, config: Config) -> Self {
        Self {
            tracker: Arc::new(ChangeTracker::from_store(store.clone())),
            dashboard: Arc::new(DashboardService::from_store(store.clone())),
            companies: store.clone(),
            members: store.clone(),
            log: store.clone(),
            postits: store,
            config: Arc::new(config),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let (text_layer, json_layer) = match config.log_format {
        LogFormat::Text => (Some(tracing_subscriber::fmt::layer()), None),
        LogFormat::Json => (None, Some(tracing_subscriber::fmt::layer().json())),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(text_layer)
        .with(json_layer)
        .init();

    tracing::info!("Starting Milhas Backend");
    tracing::info!("Storage: {:?}", config.storage);
    tracing::info!("Bind address: {}", config.bind_addr);

    let state = match config.storage {
        StorageKind::Sqlite => {
            tracing::info!("Database path: {:?}", config.db_path);
            let pool = db::init_database(&config.db_path).await?;
            prepare(Arc::new(SqliteStore::new(pool)), config.clone()).await?
        }
        StorageKind::Memory => {
            tracing::warn!("In-memory storage selected. Data is lost on shutdown!");
            prepare(Arc::new(MemoryStore::new()), config.clone()).await?
        }
    };

    // Build router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Seed default data into the store and build the shared state.
async fn prepare<S: Store>(store: Arc<S>, config: Config) -> Result<AppState, errors::AppError> {
    let companies = seed::ensure_default_companies(store.as_ref()).await?;
    let members = seed::ensure_members(store.as_ref(), store.as_ref(), &config.seed_members).await?;
    tracing::info!(companies, members, "Seed data ensured");

    Ok(AppState::new(store, config))
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        // Members
        .route("/members", get(api::list_members))
        .route("/members", post(api::create_member))
        .route("/members/{id}", get(api::get_member))
        .route("/members/{id}", delete(api::delete_member))
        .route("/members/{id}/log", get(api::member_log))
        .route("/members/{id}/companies", post(api::add_program))
        // Programs
        .route("/members/{id}/programs/{company_id}", put(api::update_program))
        .route(
            "/members/{id}/programs/{company_id}",
            delete(api::delete_program),
        )
        .route(
            "/members/{id}/programs/{company_id}/fields",
            put(api::update_custom_fields),
        )
        .route(
            "/members/{id}/programs/{company_id}/fields/{field}",
            delete(api::delete_custom_field),
        )
        // Companies
        .route("/companies", get(api::list_companies))
        .route("/companies/{id}", get(api::get_company))
        .route("/companies/{id}", put(api::update_company))
        // Audit and dashboard
        .route("/global-log", get(api::global_log))
        .route("/dashboard/stats", get(api::dashboard_stats))
        // Post-its
        .route("/postits", get(api::list_postits))
        .route("/postits", post(api::create_postit))
        .route("/postits/{id}", put(api::update_postit))
        .route("/postits/{id}", delete(api::delete_postit))
        .route("/health", get(health_check));

    Router::new()
        .nest("/api", api_routes)
        .route("/health", get(health_check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": clock::now(),
    }))
}
