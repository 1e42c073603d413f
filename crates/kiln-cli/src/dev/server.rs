//! Static development server for the output root.
//!
//! HTML pages are read from disk and get the reload client injected. Every
//! other file goes through [`ServeDir`]. Images are cached for a day and
//! everything else is sent with `no-cache`.

use crate::error::{CliError, Result};
use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::Response,
    Router,
};
use chrono::{TimeDelta, Utc};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "svg", "webp", "ico", "avif"];
const IMAGE_MAX_AGE_SECS: i64 = 86_400;

struct ServerState {
    root: PathBuf,
    files: ServeDir,
    reload_script: String,
}

/// Development server for the output root.
pub struct DevServer {
    root: PathBuf,
    port: u16,
    reload_port: u16,
}

impl DevServer {
    /// Serve `root` on `port`; HTML pages load the client from `reload_port`.
    pub fn new(root: impl Into<PathBuf>, port: u16, reload_port: u16) -> Self {
        Self {
            root: root.into(),
            port,
            reload_port,
        }
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
            .map_err(|e| CliError::Server(format!("Failed to bind to {}: {}", addr, e)))?;

        crate::ui::success(&format!(
            "Serving {} at http://{}",
            self.root.display(),
            addr
        ));

        axum::serve(listener, router(self.root, self.reload_port))
            .await
            .map_err(|e| CliError::Server(format!("Server error: {}", e)))
    }
}

/// Router serving `root`, with the reload client pointed at `reload_port`.
pub fn router(root: impl Into<PathBuf>, reload_port: u16) -> Router {
    let root = root.into();
    let state = Arc::new(ServerState {
        files: ServeDir::new(&root),
        root,
        reload_script: format!(
            r#"<script src="{}"></script>"#,
            super::reload_script_url(reload_port)
        ),
    });

    Router::new().fallback(handle_request).with_state(state)
}

async fn handle_request(State(state): State<Arc<ServerState>>, request: Request) -> Response {
    let path = request.uri().path().to_owned();

    let Some(file) = resolve(&state.root, &path) else {
        tracing::debug!(path, "rejected request outside the output root");
        return not_found(&path);
    };

    if is_html(&file) {
        return serve_html(&file, &path, &state.reload_script).await;
    }

    let image = is_image_request(&file, request.headers());
    let response = match state.files.clone().try_call(request).await {
        Ok(response) if response.status() != StatusCode::NOT_FOUND => response,
        Ok(_) => return not_found(&path),
        Err(e) => {
            crate::ui::warning(&format!("Failed to read {}: {}", file.display(), e));
            return not_found(&path);
        }
    };

    let mut response = response.map(Body::new);
    set_cache_policy(response.headers_mut(), image);
    response
}

async fn serve_html(file: &Path, path: &str, reload_script: &str) -> Response {
    let content = match tokio::fs::read(file).await {
        Ok(content) => content,
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                crate::ui::warning(&format!("Failed to read {}: {}", file.display(), e));
            }
            return not_found(path);
        }
    };

    let mut response = Response::new(Body::from(inject_reload_script(&content, reload_script)));
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/html; charset=utf-8"),
    );
    set_cache_policy(response.headers_mut(), false);
    response
}

fn set_cache_policy(headers: &mut HeaderMap, image: bool) {
    if !image {
        headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
        return;
    }

    let expires = (Utc::now() + TimeDelta::seconds(IMAGE_MAX_AGE_SECS))
        .format("%a, %d %b %Y %H:%M:%S GMT")
        .to_string();
    if let Ok(value) = HeaderValue::from_str(&format!("public, max-age={}", IMAGE_MAX_AGE_SECS)) {
        headers.insert(header::CACHE_CONTROL, value);
    }
    if let Ok(value) = HeaderValue::from_str(&expires) {
        headers.insert(header::EXPIRES, value);
    }
}

/// Map a request path to a file under `root`.
///
/// Directories resolve to their `index.html`. Paths with `..`, absolute
/// components or symlinks leaving `root` resolve to `None`.
fn resolve(root: &Path, request_path: &str) -> Option<PathBuf> {
    let relative = Path::new(request_path.trim_start_matches('/'));
    if !relative
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
    {
        return None;
    }

    let mut file = root.join(relative);
    if request_path.ends_with('/') || file.is_dir() {
        file.push("index.html");
    }

    if let (Ok(real_root), Ok(real_file)) = (root.canonicalize(), file.canonicalize()) {
        if !real_file.starts_with(&real_root) {
            return None;
        }
    }

    Some(file)
}

/// Images are cached for a day. An `Accept` header asking for images counts,
/// unless the request is a page navigation that also accepts `text/html`.
fn is_image_request(file: &Path, headers: &HeaderMap) -> bool {
    let by_extension = file
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false);

    let by_accept = headers
        .get(header::ACCEPT)
        .and_then(|value: &HeaderValue| value.to_str().ok())
        .map(|accept| accept.contains("image") && !accept.contains("text/html"))
        .unwrap_or(false);

    by_extension || by_accept
}

/// Insert `script_tag` before the last `</body>`, or append it.
fn inject_reload_script(content: &[u8], script_tag: &str) -> Vec<u8> {
    let html = String::from_utf8_lossy(content);

    match html.rfind("</body>") {
        Some(pos) => {
            let mut result = String::with_capacity(html.len() + script_tag.len() + 4);
            result.push_str(&html[..pos]);
            result.push_str(script_tag);
            result.push('\n');
            result.push_str(&html[pos..]);
            result.into_bytes()
        }
        None => format!("{}\n{}", html, script_tag).into_bytes(),
    }
}

fn is_html(file: &Path) -> bool {
    file.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("html") || ext.eq_ignore_ascii_case("htm"))
        .unwrap_or(false)
}

fn not_found(path: &str) -> Response {
    let mut response = Response::new(Body::from(format!("File not found: {}", path)));
    *response.status_mut() = StatusCode::NOT_FOUND;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response
}
