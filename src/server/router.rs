use std::sync::Arc;
use std::time::Instant;

use axum::extract::{DefaultBodyLimit, Request};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use axum::Router;

use super::account;
use super::admin::admin_router;
use super::user::user_router;
use crate::blob::BlobStorage;
use crate::catalog::{Catalog, MAX_ASSET_SIZE};
use crate::config::ServerConfig;
use crate::search::SearchIndex;
use crate::session::SessionStore;
use crate::store::CatalogStore;

pub struct AppState {
    pub store: Arc<dyn CatalogStore>,
    pub sessions: SessionStore,
    pub catalog: Catalog,
}

impl AppState {
    pub fn new(store: Arc<dyn CatalogStore>, config: &ServerConfig) -> Self {
        let index = Arc::new(SearchIndex::new());
        let blobs = Arc::new(BlobStorage::new(&config.data_dir));

        Self {
            catalog: Catalog::new(store.clone(), index, blobs),
            sessions: SessionStore::with_ttl(config.session_ttl),
            store,
        }
    }
}

async fn health() -> &'static str {
    "OK"
}

async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let response = next.run(request).await;

    let latency = start.elapsed();
    let status = response.status();

    tracing::info!(
        "{} {} {} {}ms",
        method,
        uri.path(),
        status.as_u16(),
        latency.as_millis()
    );

    response
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(account::version))
        .route("/health", get(health))
        .route("/login", post(account::login))
        .route("/register", post(account::register))
        .nest("/user", user_router())
        .nest("/admin", admin_router())
        .layer(DefaultBodyLimit::max(MAX_ASSET_SIZE as usize + 1024 * 1024))
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}
