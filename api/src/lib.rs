//! Relay server: keeps the most recent uploaded JPEG in memory and hands it
//! to whoever asks, alongside the static files of the browser client.

pub mod assets;

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::extract::rejection::BytesRejection;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{header, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use bytes::Bytes;
use frame_relay_common::frame::{validate_frame_len, FrameError, FRAME_ENDPOINT, JPEG_CONTENT_TYPE};
use serde::Serialize;
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;
use tracing::{debug, trace, warn};

pub use assets::{AssetError, AssetTable};

const NO_STORE: (header::HeaderName, &str) = (header::CACHE_CONTROL, "no-store");

// ---------------------------------------------------------------------------
// App state
// ---------------------------------------------------------------------------

pub struct AppState {
    latest: RwLock<Option<Bytes>>,
    frames_received: AtomicU64,
    assets: AssetTable,
    max_frame_bytes: usize,
}

impl AppState {
    pub fn new(assets: AssetTable, max_frame_bytes: usize) -> Self {
        Self {
            latest: RwLock::new(None),
            frames_received: AtomicU64::new(0),
            assets,
            max_frame_bytes,
        }
    }

    pub async fn latest_frame(&self) -> Option<Bytes> {
        self.latest.read().await.clone()
    }

    pub fn frames_received(&self) -> u64 {
        self.frames_received.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Serialize)]
struct FrameAccepted {
    ok: bool,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Build the relay router. Request bodies above `max_request_bytes` are
/// refused before they reach a handler.
pub fn build_app(state: Arc<AppState>, max_request_bytes: usize) -> Router {
    Router::new()
        .route(
            FRAME_ENDPOINT,
            get(get_frame)
                .head(method_not_allowed)
                .post(post_frame)
                .fallback(method_not_allowed),
        )
        .fallback(serve_asset)
        .layer(DefaultBodyLimit::max(max_request_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve `app` on an already-bound listener until `shutdown` resolves.
pub async fn serve<S>(listener: TcpListener, app: Router, shutdown: S) -> std::io::Result<()>
where
    S: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/frame: replace the stored frame with the request body
async fn post_frame(
    State(state): State<Arc<AppState>>,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let body = match body {
        Ok(b) => b,
        Err(rejection) => {
            warn!(error = %rejection, "failed to read frame upload");
            return plain_error(rejection.status());
        }
    };

    if let Err(e) = validate_frame_len(body.len(), state.max_frame_bytes) {
        warn!(error = %e, "rejected frame upload");
        let status = match e {
            FrameError::Empty => StatusCode::BAD_REQUEST,
            FrameError::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        };
        return plain_error(status);
    }

    let bytes = body.len();
    *state.latest.write().await = Some(body);
    let total = state.frames_received.fetch_add(1, Ordering::Relaxed) + 1;
    trace!(bytes, "frame stored");
    if total % 100 == 0 {
        debug!(total, "frames received");
    }

    (StatusCode::OK, [NO_STORE], Json(FrameAccepted { ok: true })).into_response()
}

/// GET /api/frame: the latest frame, or 204 before the first upload
async fn get_frame(State(state): State<Arc<AppState>>) -> Response {
    match state.latest_frame().await {
        Some(frame) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, JPEG_CONTENT_TYPE), NO_STORE],
            frame,
        )
            .into_response(),
        None => (StatusCode::NO_CONTENT, [NO_STORE]).into_response(),
    }
}

async fn method_not_allowed() -> Response {
    plain_error(StatusCode::METHOD_NOT_ALLOWED)
}

/// Everything that is not the frame endpoint: one of the preloaded client
/// files, or 404.
async fn serve_asset(State(state): State<Arc<AppState>>, method: Method, uri: Uri) -> Response {
    if method == Method::GET || method == Method::HEAD {
        if let Some(asset) = state.assets.get(uri.path()) {
            return (
                StatusCode::OK,
                [(header::CONTENT_TYPE, asset.content_type), NO_STORE],
                asset.body.clone(),
            )
                .into_response();
        }
    }
    plain_error(StatusCode::NOT_FOUND)
}

/// Plain-text body holding the status' reason phrase, e.g. "Not Found".
fn plain_error(status: StatusCode) -> Response {
    let reason = status.canonical_reason().unwrap_or("Error");
    (
        status,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8"), NO_STORE],
        reason,
    )
        .into_response()
}
