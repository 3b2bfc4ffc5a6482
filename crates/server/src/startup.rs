use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};
use tally_storage::SqliteStore;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::ServerConfig;
use crate::routes;
use crate::upload::UploadConfig;

#[derive(Clone)]
pub struct AppState {
    pub store: SqliteStore,
    pub upload: UploadConfig,
}

impl AppState {
    /// Opens the database and prepares the upload directory.
    pub async fn build(config: &ServerConfig) -> anyhow::Result<Self> {
        if let Some(parent) = config.database_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        tokio::fs::create_dir_all(&config.upload_dir).await?;

        let pool = tally_storage::create_db(&config.database_path).await?;
        tracing::info!(
            database = %config.database_path.display(),
            uploads = %config.upload_dir.display(),
            "Storage ready"
        );

        Ok(Self {
            store: SqliteStore::new(pool),
            upload: UploadConfig::new(config.upload_dir.clone()),
        })
    }
}

pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/health", get(routes::health))
        .route(
            "/transactions",
            get(routes::list_transactions).post(routes::create_transaction),
        )
        .route("/transactions/{id}", delete(routes::delete_transaction))
        .route(
            "/transactions/import",
            post(routes::import_transactions).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route("/categories", get(routes::list_categories))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
