pub mod auth;
pub mod config;
pub mod database;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod quota;
pub mod records;
pub mod services;
pub mod storage;
pub mod utils;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::{
    config::Config,
    database::Database,
    handlers::AppState,
    quota::{postgres::PgQuotaLedger, QuotaLedger},
    records::{postgres::PgImageRecords, ImageRecords},
    services::{
        gallery::Gallery,
        upload::{UploadLimits, UploadPipeline},
    },
    storage::{local::LocalStorage, PublicUrls, StorageBackend},
};

/// Builds the router with the production collaborators (Postgres ledger and
/// records, local disk storage) wired in.
pub fn create_app(db: Database, config: Config) -> anyhow::Result<Router> {
    let storage: Arc<dyn StorageBackend> = Arc::new(LocalStorage::new(&config.upload_dir)?);
    let ledger: Arc<dyn QuotaLedger> =
        Arc::new(PgQuotaLedger::new(db.pool().clone(), config.plan_limits()));
    let records: Arc<dyn ImageRecords> = Arc::new(PgImageRecords::new(db.pool().clone()));
    let urls = PublicUrls::new(&config.public_base_url, "uploads");

    let pipeline = Arc::new(UploadPipeline::new(
        storage.clone(),
        ledger.clone(),
        records.clone(),
        urls,
        UploadLimits {
            max_file_bytes: config.max_file_size,
            max_batch_files: config.max_batch_files,
            allowed_mime_types: config.allowed_mime_types.clone(),
        },
    ));
    let gallery = Arc::new(Gallery::new(storage, ledger, records));

    let cors = match &config.frontend_url {
        Some(origin) => {
            let origin = origin
                .parse::<HeaderValue>()
                .map_err(|e| anyhow::anyhow!("Invalid FRONTEND_URL: {}", e))?;
            CorsLayer::new()
                .allow_origin(origin)
                .allow_methods(Any)
                .allow_headers(Any)
        }
        None => CorsLayer::permissive(),
    };

    // Leave headroom over a full batch of maximum-size files.
    let body_limit = config.max_file_size * config.max_batch_files + 1024 * 1024;
    let upload_dir = config.upload_dir.clone();

    let state = AppState {
        db,
        config: Arc::new(config),
        pipeline,
        gallery,
    };

    let app = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/api/auth/register", post(handlers::auth::register))
        .route("/api/auth/login", post(handlers::auth::login))
        .route("/api/auth/me", get(handlers::auth::me))
        .route("/api/upload", post(handlers::upload::upload_images))
        .route("/api/images", get(handlers::images::list_images))
        .route("/api/images/:id", delete(handlers::images::delete_image))
        .nest_service("/uploads", ServeDir::new(upload_dir))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    Ok(app)
}
