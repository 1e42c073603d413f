//! Live-reload endpoint: SSE notifications plus the browser client.

use crate::error::{CliError, Result};
use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    response::{
        sse::{Event, KeepAlive},
        IntoResponse, Response, Sse,
    },
    routing::get,
    Router,
};
use kiln_pipeline::ReloadBroadcaster;
use rust_embed::RustEmbed;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_stream::{wrappers::ReceiverStream, Stream, StreamExt};
use tower_http::cors::{Any, CorsLayer};

const KEEP_ALIVE: Duration = Duration::from_secs(15);

#[derive(RustEmbed)]
#[folder = "assets/reload"]
struct ReloadAssets;

/// Serves `/livereload` (SSE) and `/livereload.js`.
pub struct ReloadServer {
    port: u16,
    broadcaster: Arc<ReloadBroadcaster>,
}

impl ReloadServer {
    pub fn new(port: u16, broadcaster: Arc<ReloadBroadcaster>) -> Self {
        Self { port, broadcaster }
    }

    /// Bind and serve until the task is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::Server`] if the port cannot be bound.
    pub async fn start(self) -> Result<()> {
        let addr = super::local_addr(self.port);
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| CliError::Server(format!("Failed to bind reload endpoint to {}: {}", addr, e)))?;

        tracing::info!(%addr, "live reload endpoint listening");

        axum::serve(listener, router(self.broadcaster))
            .await
            .map_err(|e| CliError::Server(format!("Reload endpoint stopped: {}", e)))
    }
}

/// Router for the reload endpoint.
pub fn router(broadcaster: Arc<ReloadBroadcaster>) -> Router {
    Router::new()
        .route("/livereload", get(handle_sse))
        .route("/livereload.js", get(handle_client_script))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(broadcaster)
}

/// One SSE stream per browser tab. The client is pruned from the
/// broadcaster once the stream is dropped and a send fails.
async fn handle_sse(
    State(broadcaster): State<Arc<ReloadBroadcaster>>,
) -> Sse<impl Stream<Item = std::result::Result<Event, Infallible>>> {
    let (id, rx) = broadcaster.register_client();
    tracing::debug!(client = id, clients = broadcaster.client_count(), "browser connected");

    let stream = ReceiverStream::new(rx).map(|data| Ok(Event::default().data(data)));

    Sse::new(stream).keep_alive(KeepAlive::new().interval(KEEP_ALIVE).text("ping"))
}

async fn handle_client_script() -> Response {
    match ReloadAssets::get("livereload.js") {
        Some(asset) => (
            [
                (header::CONTENT_TYPE, "application/javascript"),
                (header::CACHE_CONTROL, "no-cache"),
            ],
            Body::from(asset.data.into_owned()),
        )
            .into_response(),
        None => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Missing embedded live reload client",
        )
            .into_response(),
    }
}
