// Preview server - serves rendered emails by index
//
// GET /       first email
// GET /{n}    n-th email (404 when out of range)
// GET /api/health

use anyhow::{Context, Result};
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::Serialize;
use std::future::Future;
use std::net::SocketAddr;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::JoinHandle;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Where the preview server listens and whether to open browser tabs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewConfig {
    pub host: String,
    pub port: u16,
    pub open_browser: bool,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            open_browser: true,
        }
    }
}

impl PreviewConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Read-only snapshot shared by every request
#[derive(Clone)]
struct AppState {
    emails: Arc<[String]>,
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: T,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

#[derive(Serialize)]
struct HealthResponse {
    emails: usize,
}

// ============================================================================
// Handlers
// ============================================================================

fn email_response(state: &AppState, index: usize) -> Response {
    match state.emails.get(index) {
        Some(html) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
            html.clone(),
        )
            .into_response(),
        None => (StatusCode::NOT_FOUND, "Email not found").into_response(),
    }
}

/// GET / - first email
async fn serve_first(State(state): State<AppState>) -> Response {
    email_response(&state, 0)
}

/// GET /:index - email by position
async fn serve_email(State(state): State<AppState>, Path(index): Path<String>) -> Response {
    match index.parse::<usize>() {
        Ok(i) => email_response(&state, i),
        Err(_) => (StatusCode::NOT_FOUND, "Email not found").into_response(),
    }
}

/// GET /api/health
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(ApiResponse::ok(HealthResponse {
        emails: state.emails.len(),
    }))
}

// ============================================================================
// Server
// ============================================================================

pub struct PreviewServer {
    emails: Arc<[String]>,
}

impl PreviewServer {
    /// Takes ownership of the rendered emails; they are never modified afterwards
    pub fn new(emails: Vec<String>) -> Self {
        Self {
            emails: emails.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.emails.len()
    }

    pub fn is_empty(&self) -> bool {
        self.emails.is_empty()
    }

    pub fn router(&self) -> Router {
        let state = AppState {
            emails: Arc::clone(&self.emails),
        };

        Router::new()
            .route("/", get(serve_first))
            .route("/api/health", get(health_check))
            .route("/:index", get(serve_email))
            .with_state(state)
            .layer(TraceLayer::new_for_http())
    }

    /// Bind the listener so tabs can be opened before serving starts
    pub async fn bind(&self, addr: &str) -> Result<BoundServer> {
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind to address {}", addr))?;
        let local_addr = listener.local_addr()?;

        tracing::info!(%local_addr, emails = self.len(), "preview server bound");

        Ok(BoundServer {
            listener,
            router: self.router(),
            local_addr,
        })
    }
}

pub struct BoundServer {
    listener: TcpListener,
    router: Router,
    local_addr: SocketAddr,
}

impl BoundServer {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.local_addr)
    }

    /// Serve until `shutdown` completes, then drain open connections
    pub async fn serve_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await
            .context("Preview server failed")
    }
}

/// Resolves on Ctrl+C
pub async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down preview server");
}

// ============================================================================
// Browser tabs
// ============================================================================

fn browser_command(url: &str) -> Command {
    if cfg!(target_os = "macos") {
        let mut cmd = Command::new("open");
        cmd.arg(url);
        cmd
    } else if cfg!(target_os = "windows") {
        let mut cmd = Command::new("cmd");
        cmd.args(["/C", "start", "", url]);
        cmd
    } else {
        let mut cmd = Command::new("xdg-open");
        cmd.arg(url);
        cmd
    }
}

/// Wait on a launcher process in the background so it doesn't linger as a zombie
fn reap(mut child: Child) -> JoinHandle<Option<ExitStatus>> {
    std::thread::spawn(move || child.wait().ok())
}

/// Open `{base_url}/{i}` for every email. Launch failures are logged, not fatal.
pub fn open_tabs(base_url: &str, count: usize) -> usize {
    let mut opened = 0;
    for i in 0..count {
        let url = format!("{}/{}", base_url.trim_end_matches('/'), i);
        let result = browser_command(&url)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();

        match result {
            Ok(child) => {
                reap(child);
                opened += 1;
            }
            Err(e) => tracing::warn!(%url, "Failed to open browser tab: {}", e),
        }
    }
    opened
}

// ============================================================================
// TESTS
// ============================================================================
