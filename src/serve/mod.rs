// src/serve/mod.rs

//! Development HTTP server for the destination tree.
//!
//! - Static files come from the destination directory; `/` and directory
//!   paths resolve to `index.html`.
//! - Paths with `..` segments are rejected with 400.
//! - With live reload on, HTML responses carry a small client that listens
//!   on [`LIVERELOAD_PATH`](reload::LIVERELOAD_PATH) for reload pushes.

pub mod mime;
pub mod reload;

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::http::{header, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use percent_encoding::percent_decode_str;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use crate::config::ServerSection;
use crate::errors::Result;

pub use reload::{ReloadHub, LIVERELOAD_PATH};

/// Shared state of the request handlers.
#[derive(Debug)]
pub struct ServeState {
    root: PathBuf,
    livereload: bool,
    hub: ReloadHub,
}

impl ServeState {
    pub fn new(root: impl Into<PathBuf>, livereload: bool, hub: ReloadHub) -> Self {
        Self {
            root: root.into(),
            livereload,
            hub,
        }
    }
}

/// Build the router: static files plus, when enabled, the reload socket.
pub fn router(state: Arc<ServeState>) -> Router {
    let mut app = Router::new();
    if state.livereload {
        app = app.route(LIVERELOAD_PATH, get(livereload_socket));
    }
    app.fallback(static_file)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind the configured address.
pub async fn bind(cfg: &ServerSection) -> Result<TcpListener> {
    let addr = format!("{}:{}", cfg.host, cfg.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding dev server to {addr}"))?;
    Ok(listener)
}

/// Serve `state` on `listener` until the process ends.
pub async fn serve(listener: TcpListener, state: Arc<ServeState>) -> Result<()> {
    let addr = listener.local_addr()?;
    info!(root = ?state.root, "dev server listening on http://{addr}");
    axum::serve(listener, router(state))
        .await
        .context("dev server stopped")?;
    Ok(())
}

#[derive(Debug, PartialEq, Eq)]
enum Resolve {
    File(PathBuf),
    BadRequest,
}

/// Map a request path onto the destination tree. Escapes that do not decode
/// to UTF-8 are a bad request.
async fn resolve(root: &Path, uri_path: &str) -> Resolve {
    let Ok(decoded) = percent_decode_str(uri_path).decode_utf8() else {
        return Resolve::BadRequest;
    };

    let mut path = root.to_path_buf();
    for segment in decoded.split('/') {
        match segment {
            "" | "." => {}
            ".." => return Resolve::BadRequest,
            s if s.contains('\\') => return Resolve::BadRequest,
            s => path.push(s),
        }
    }

    let is_dir = tokio::fs::metadata(&path)
        .await
        .is_ok_and(|meta| meta.is_dir());
    if decoded.ends_with('/') || is_dir {
        path.push("index.html");
    }
    Resolve::File(path)
}

async fn static_file(State(state): State<Arc<ServeState>>, uri: Uri) -> Response {
    let path = match resolve(&state.root, uri.path()).await {
        Resolve::File(path) => path,
        Resolve::BadRequest => return (StatusCode::BAD_REQUEST, "bad path").into_response(),
    };

    let body = match tokio::fs::read(&path).await {
        Ok(body) => body,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return (StatusCode::NOT_FOUND, "not found").into_response();
        }
        Err(err) => {
            debug!(?path, error = %err, "failed to read file");
            return (StatusCode::INTERNAL_SERVER_ERROR, "read error").into_response();
        }
    };

    let content_type = mime::from_path(&path);
    if state.livereload && mime::is_html(&path) {
        let html = reload::inject_client(&String::from_utf8_lossy(&body));
        return ([(header::CONTENT_TYPE, content_type)], html).into_response();
    }
    ([(header::CONTENT_TYPE, content_type)], body).into_response()
}

async fn livereload_socket(
    ws: WebSocketUpgrade,
    State(state): State<Arc<ServeState>>,
) -> impl IntoResponse {
    let signals = state.hub.subscribe();
    ws.on_upgrade(move |socket| push_reloads(socket, signals))
}

async fn push_reloads(mut socket: WebSocket, mut signals: broadcast::Receiver<()>) {
    debug!("live reload client connected");
    loop {
        tokio::select! {
            signal = signals.recv() => match signal {
                Ok(()) | Err(broadcast::error::RecvError::Lagged(_)) => {
                    let msg = Message::Text(reload::RELOAD_MESSAGE.to_string());
                    if socket.send(msg).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }
    debug!("live reload client disconnected");
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    #[tokio::test]
    async fn parent_segments_are_rejected() {
        let root = Path::new("/srv/dist");
        assert_eq!(resolve(root, "/../secret").await, Resolve::BadRequest);
        assert_eq!(resolve(root, "/css/%2e%2e/x").await, Resolve::BadRequest);
        assert_eq!(resolve(root, "/css/..%5csecret").await, Resolve::BadRequest);
        assert_eq!(
            resolve(root, "/css/main.min.css").await,
            Resolve::File(PathBuf::from("/srv/dist/css/main.min.css"))
        );
        assert_eq!(
            resolve(root, "/blog/").await,
            Resolve::File(PathBuf::from("/srv/dist/blog/index.html"))
        );
    }

    #[tokio::test]
    async fn percent_escapes_are_decoded() {
        let root = Path::new("/srv/dist");
        assert_eq!(
            resolve(root, "/a%20b.png").await,
            Resolve::File(PathBuf::from("/srv/dist/a b.png"))
        );
        assert_eq!(
            resolve(root, "/100%").await,
            Resolve::File(PathBuf::from("/srv/dist/100%"))
        );
        assert_eq!(resolve(root, "/%ff%fe.html").await, Resolve::BadRequest);
    }

    #[tokio::test]
    async fn directories_without_trailing_slash_serve_their_index() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(tmp.path().join("blog")).unwrap();

        assert_eq!(
            resolve(tmp.path(), "/blog").await,
            Resolve::File(tmp.path().join("blog").join("index.html"))
        );
        assert_eq!(
            resolve(tmp.path(), "/blog.html").await,
            Resolve::File(tmp.path().join("blog.html"))
        );
    }

    async fn get(addr: std::net::SocketAddr, path: &str) -> String {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        let request = format!("GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n");
        stream.write_all(request.as_bytes()).await.unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        response
    }

    #[tokio::test]
    async fn serves_index_with_reload_client() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("index.html"), "<body>hi</body>").unwrap();
        std::fs::create_dir_all(tmp.path().join("css")).unwrap();
        std::fs::write(tmp.path().join("css/a.min.css"), "a{}").unwrap();

        let state = Arc::new(ServeState::new(tmp.path(), true, ReloadHub::new()));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(serve(listener, state));

        let index = get(addr, "/").await;
        assert!(index.starts_with("HTTP/1.1 200"), "got {index}");
        assert!(index.contains("text/html"));
        assert!(index.contains("/__livereload"));

        let css = get(addr, "/css/a.min.css").await;
        assert!(css.contains("text/css"));
        assert!(css.ends_with("a{}"));

        assert!(get(addr, "/missing.html").await.starts_with("HTTP/1.1 404"));
        assert!(get(addr, "/../etc/passwd").await.starts_with("HTTP/1.1 400"));
        assert!(get(addr, "/%c3%28.html").await.starts_with("HTTP/1.1 400"));
    }
}
