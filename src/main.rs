//! Community Site Backend
//!
//! Serves news, calendar and roster content from either a local key-value
//! file or a SQLite document store, selected at startup.

mod api;
mod archive;
mod auth;
mod clock;
mod config;
mod content;
mod db;
mod errors;
mod models;
mod seed;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use clock::{Clock, SystemClock};
use config::Config;
use db::{
    import_legacy_events, init_database, FileStorage, KeyValueStore, Repositories,
    SqliteDocumentStore, StorageBackend, StorageMode,
};
use seed::{FileFixtureSource, FixtureSource, HttpFixtureSource};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub repos: Repositories,
    pub clock: Arc<dyn Clock>,
    pub config: Arc<Config>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Community Site Backend");
    tracing::info!("Storage mode: {}", config.storage_mode);
    tracing::info!("Bind address: {}", config.bind_addr);

    if config.api_psk.is_none() {
        tracing::warn!("No API PSK configured (SITE_API_PSK). Admin routes are open!");
    }

    let backend = open_backend(&config).await?;
    let repos = Repositories::select(&backend);

    let source: Box<dyn FixtureSource> = match &config.fixtures_url {
        Some(url) => Box::new(HttpFixtureSource::new(url.clone())),
        None => Box::new(FileFixtureSource::new(config.fixtures_dir.clone())),
    };
    if let Err(e) = seed::seed_site(&repos, source.as_ref(), &config.seed_roles).await {
        tracing::error!("Seeding failed, continuing with stored content: {}", e);
    }

    let state = AppState {
        repos,
        clock: Arc::new(SystemClock),
        config: Arc::new(config.clone()),
    };

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Open the store for the configured mode.
async fn open_backend(config: &Config) -> Result<StorageBackend, Box<dyn std::error::Error>> {
    match config.storage_mode {
        StorageMode::Local => {
            tracing::info!("Local store path: {:?}", config.local_store_path);
            let storage: Arc<dyn KeyValueStore> = Arc::new(FileStorage::open(&config.local_store_path)?);

            let imported = import_legacy_events(storage.clone()).await?;
            if imported > 0 {
                tracing::info!(imported, "Imported legacy event list");
            }

            Ok(StorageBackend::Local(storage))
        }
        StorageMode::Remote => {
            tracing::info!("Database path: {:?}", config.db_path);
            let pool = init_database(&config.db_path).await?;
            Ok(StorageBackend::Remote(Arc::new(SqliteDocumentStore::new(pool))))
        }
    }
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let psk = state.config.api_psk.clone();

    let public_routes = Router::new()
        .route("/news", get(api::get_news))
        .route("/articles", get(api::list_articles))
        .route("/articles/{id}", get(api::get_article))
        .route("/events", get(api::get_calendar))
        .route("/events/upcoming", get(api::get_upcoming_events))
        .route("/contacts", get(api::list_contacts))
        .route("/contacts/{role}", get(api::get_contact));

    let admin_routes = Router::new()
        // Articles
        .route("/articles", post(api::create_article).delete(api::clear_articles))
        .route(
            "/articles/{id}",
            put(api::update_article).delete(api::delete_article),
        )
        // Events
        .route("/events/{date}", post(api::create_event))
        .route(
            "/events/{date}/{index}",
            put(api::update_event).delete(api::delete_event),
        )
        // Contacts
        .route(
            "/contacts/{role}",
            put(api::put_contact).delete(api::delete_contact),
        )
        .route_layer(middleware::from_fn(move |req, next| {
            auth::psk_auth_layer(psk.clone(), req, next)
        }));

    // Health check (no auth required)
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", public_routes.merge(admin_routes))
        .merge(health_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}
