//! Read-only HTTP access to logged sessions, meant to be reached over the
//! Pi's Wi-Fi access point.
//!
//! Mounts:
//! - `GET /health`
//! - `GET /api/sessions`
//! - `GET /api/sessions/{id}`
//! - `GET /api/sessions/{id}/files/{name}`
//! - `GET /api/sessions/{id}/archive`

pub mod archive;
pub mod error;
pub mod handlers;

pub use error::ServeError;

use axum::routing::get;
use axum::Router;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct AppState {
    pub root: Arc<PathBuf>,
}

impl AppState {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Arc::new(root.into()),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/api/sessions", get(handlers::list_sessions))
        .route("/api/sessions/{id}", get(handlers::session_detail))
        .route("/api/sessions/{id}/files/{name}", get(handlers::download_file))
        .route("/api/sessions/{id}/archive", get(handlers::download_archive))
        .with_state(state)
}

pub async fn serve<F>(bind: SocketAddr, root: PathBuf, shutdown: F) -> std::io::Result<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind(bind).await?;
    tracing::info!(
        "📡 Serving {} on http://{}",
        root.display(),
        listener.local_addr()?
    );

    axum::serve(listener, router(AppState::new(root)))
        .with_graceful_shutdown(shutdown)
        .await
}
