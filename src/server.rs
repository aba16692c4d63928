//! HTTP front end
//!
//! Routes:
//! - `GET /` redirects to `/simple/`
//! - `GET /health` returns "ok"
//! - `GET /simple/` proxies the origin's root index
//! - `GET /simple/{package}/` serves the rewritten package index
//! - `GET /simple/{package}/{filename}` serves artifacts and `.metadata` files

use crate::error::{MirrorError, MirrorResult};
use crate::mirror::{Mirror, Served};
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

/// Build the router for a mirror
pub fn router(mirror: Arc<Mirror>) -> Router {
    Router::new()
        .route("/", get(|| async { Redirect::to("/simple/") }))
        .route("/health", get(health_check))
        .route("/simple/", get(root_index))
        .route("/simple/:package", get(package_redirect))
        .route("/simple/:package/", get(package_index))
        .route("/simple/:package/*filename", get(artifact))
        .with_state(mirror)
}

/// Serve until Ctrl-C
pub async fn serve(listener: TcpListener, mirror: Arc<Mirror>) -> MirrorResult<()> {
    axum::serve(listener, router(mirror))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| MirrorError::io("serving HTTP", e))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}

/// GET /health
async fn health_check() -> impl IntoResponse {
    "ok"
}

/// GET /simple/
async fn root_index(State(mirror): State<Arc<Mirror>>) -> Result<Served, MirrorError> {
    info!("GET /simple/");
    blocking(mirror, |m| m.root_index()).await
}

/// GET /simple/{package} without the trailing slash
async fn package_redirect(Path(package): Path<String>) -> Redirect {
    Redirect::permanent(&format!("/simple/{}/", package))
}

/// GET /simple/{package}/
async fn package_index(
    Path(package): Path<String>,
    State(mirror): State<Arc<Mirror>>,
) -> Result<Served, MirrorError> {
    info!("GET /simple/{}/", package);
    blocking(mirror, move |m| m.package_index(&package)).await
}

/// GET /simple/{package}/{filename}
async fn artifact(
    Path((package, filename)): Path<(String, String)>,
    State(mirror): State<Arc<Mirror>>,
) -> Result<Served, MirrorError> {
    info!("GET /simple/{}/{}", package, filename);
    blocking(mirror, move |m| m.artifact(&package, &filename)).await
}

/// Run blocking mirror work on tokio's blocking pool
async fn blocking<T, F>(mirror: Arc<Mirror>, work: F) -> MirrorResult<T>
where
    T: Send + 'static,
    F: FnOnce(&Mirror) -> MirrorResult<T> + Send + 'static,
{
    tokio::task::spawn_blocking(move || work(&mirror))
        .await
        .map_err(|e| MirrorError::Internal(format!("request worker failed: {}", e)))?
}

impl IntoResponse for Served {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::BAD_GATEWAY);
        (status, [(header::CONTENT_TYPE, self.content_type)], self.body).into_response()
    }
}

impl MirrorError {
    /// HTTP status this error is answered with
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::ResolverMiss { .. } | Self::MetadataMiss { .. } => StatusCode::NOT_FOUND,
            Self::InvalidName(_) => StatusCode::BAD_REQUEST,
            Self::OriginUnavailable { .. } | Self::OriginStatus { .. } => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for MirrorError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match &self {
            Self::ResolverMiss { .. } => self.to_string(),
            Self::MetadataMiss { .. } => "Not Found".to_string(),
            _ => status
                .canonical_reason()
                .unwrap_or("Error")
                .to_string(),
        };

        if status.is_server_error() {
            error!("{}", self);
        } else {
            warn!("{}", self);
        }

        (status, [(header::CONTENT_TYPE, "text/plain")], body).into_response()
    }
}
