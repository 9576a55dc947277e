use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::{services::ServeFile, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod db;
mod dispatcher;
mod error;
mod handlers;
mod models;
mod service;
mod store;
mod token;

use config::{AppConfig, StorageBackend, TokenStyle};
use dispatcher::KeyDispatcher;
use service::ShortenerService;
use store::{MemoryStore, RecordStore};
use token::{AlphanumericTokenGenerator, HexTokenGenerator, TokenGenerator};

// ── Shared application state ───────────────────────────────────────────────

pub struct AppState {
    pub config: AppConfig,
    pub service: ShortenerService,
}

// ── Entry point ────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env (ignore error if file is absent — env vars may already be set)
    dotenvy::dotenv().ok();

    // Initialise structured logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gograin=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;
    tracing::info!("Starting gograin on {}:{}", config.host, config.port);
    match &config.public_base_url {
        Some(base) => tracing::info!("Base URL: {}", base),
        None => tracing::info!("Base URL: taken from each request's Host header"),
    }

    let store = open_store(&config).await?;

    let generator: Arc<dyn TokenGenerator> = match config.token_style {
        TokenStyle::Hex => Arc::new(HexTokenGenerator),
        TokenStyle::Alphanumeric => Arc::new(AlphanumericTokenGenerator::new(config.token_length)),
    };

    let service = ShortenerService::new(
        KeyDispatcher::new(store),
        generator,
        config.collision_retries,
    );

    let bind_addr = format!("{}:{}", config.host, config.port);
    let state = Arc::new(AppState { config, service });

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app(state)).await?;

    Ok(())
}

async fn open_store(config: &AppConfig) -> anyhow::Result<Arc<dyn RecordStore>> {
    match config.storage {
        StorageBackend::Sqlite => {
            let pool = db::connect(&config.database_url, 10).await?;
            let store = db::SqliteStore::new(pool);
            tracing::info!(
                "SQLite store ready at {} with {} record(s)",
                config.database_url,
                store.count().await?
            );
            Ok(Arc::new(store))
        }
        StorageBackend::Memory => {
            tracing::warn!("Using the in-memory store; records will not survive a restart");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

// ── Router ─────────────────────────────────────────────────────────────────

fn app(state: Arc<AppState>) -> Router {
    let landing = ServeFile::new(state.config.static_dir.join("index.html"));

    Router::new()
        // Static landing page
        .route_service("/", landing)
        .route("/health", get(|| async { axum::http::StatusCode::OK }))
        .route("/shorten", get(handlers::shorten::shorten))
        .route("/go/:token", get(handlers::redirect::redirect))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
