//! HTTP routes
//!
//! Every `GET` (and, through axum, `HEAD`) path is answered from the
//! static files of the data directory. Other methods get `405`.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::{header, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::fs::FileSystem;

use super::{has_arg, StaticFiles};

/// Build the router serving `files`
///
/// `max_connections` caps requests in flight and `request_timeout_ms`
/// bounds each one.
pub fn build_router<F>(files: StaticFiles<F>, config: &Config) -> Router
where
    F: FileSystem + Send + Sync + 'static,
{
    Router::new()
        .route("/", get(serve_file::<F>))
        .route("/*path", get(serve_file::<F>))
        .with_state(Arc::new(files))
        .layer(TimeoutLayer::new(Duration::from_millis(config.request_timeout_ms)))
        .layer(ConcurrencyLimitLayer::new(config.max_connections))
        .layer(TraceLayer::new_for_http())
}

async fn serve_file<F>(State(files): State<Arc<StaticFiles<F>>>, uri: Uri) -> Response
where
    F: FileSystem + Send + Sync + 'static,
{
    let path = uri.path().to_string();
    let download = has_arg(uri.query(), "download");
    tracing::debug!(path = %path, download, "file read");

    // FileSystem is blocking I/O
    let lookup = {
        let path = path.clone();
        tokio::task::spawn_blocking(move || files.lookup(&path, download)).await
    };

    match lookup {
        Ok(Ok(Some(file))) => {
            ([(header::CONTENT_TYPE, file.content_type)], file.body).into_response()
        }
        Ok(Ok(None)) => (StatusCode::NOT_FOUND, "Not Found").into_response(),
        Ok(Err(e)) => {
            tracing::warn!(path = %path, error = %e, "failed to read static file");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
        Err(e) => {
            tracing::error!(path = %path, error = %e, "file read task failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
        }
    }
}
