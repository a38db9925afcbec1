use std::sync::Arc;
use std::time::Instant;

use axum::extract::{DefaultBodyLimit, Request};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::{Router, routing::get};

use super::admin::admin_router;
use super::dashboard::dashboard_router;
use super::public::public_router;
use super::response::ApiError;
use super::session::session_router;
use super::user::user_router;
use crate::auth::Passwords;
use crate::config::ServerConfig;
use crate::error::Result as StoreResult;
use crate::store::Store;
use crate::uploads::{ImageStorage, MAX_IMAGE_BYTES};

/// Room for the other multipart fields next to a maximum-size image.
const MULTIPART_SLACK_BYTES: usize = 1024 * 1024;

pub struct AppState {
    pub store: Arc<dyn Store>,
    pub images: ImageStorage,
    pub passwords: Passwords,
    pub config: ServerConfig,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, config: ServerConfig) -> Self {
        Self {
            store,
            images: ImageStorage::new(&config.uploads_dir()),
            passwords: Passwords::new(),
            config,
        }
    }
}

/// Runs CPU-heavy work (password hashing) off the async workers.
pub async fn blocking<T, F>(state: &Arc<AppState>, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&AppState) -> StoreResult<T> + Send + 'static,
    T: Send + 'static,
{
    let state = Arc::clone(state);
    tokio::task::spawn_blocking(move || f(&state))
        .await
        .map_err(|e| {
            tracing::error!("spawn_blocking join error: {e}");
            ApiError::internal("Internal server error")
        })?
        .map_err(ApiError::from)
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
        .route("/health", get(health))
        .merge(dashboard_router())
        .merge(session_router())
        .merge(admin_router())
        .merge(user_router())
        .merge(public_router())
        .layer(DefaultBodyLimit::max(MAX_IMAGE_BYTES + MULTIPART_SLACK_BYTES))
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}
