//! The HTTP service: upload a PDF, get page images back.
//!
//! ```text
//! GET  /                                   upload form
//! POST /convert                            multipart: pdf, format, dpi, password?, response?
//! GET  /download/{session_id}/{page_index} one page (0-based index)
//! GET  /download-all/{session_id}          ZIP of every page
//! ```
//!
//! Handlers receive an [`AppState`] through axum's `State` extractor; it owns
//! the [`SessionStore`] and the [`ServerConfig`]. Nothing is global.

pub mod error;
pub mod routes;
pub mod session;

pub use error::ApiError;
pub use session::{SessionId, SessionPolicy, SessionStore};

use crate::config::{ImageFormat, DEFAULT_DPI, MAX_DPI};
use crate::error::Pdf2ImgError;
use axum::extract::DefaultBodyLimit;
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Default upload cap: 16 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

/// Settings for the HTTP service.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Listen address. Default: `127.0.0.1:5000`.
    pub bind: SocketAddr,
    /// Largest accepted request body. Default: 16 MiB.
    pub max_upload_bytes: usize,
    /// DPI used when the form omits `dpi`. Default: 200.
    pub default_dpi: u32,
    /// Highest DPI a request may ask for. Default: 600.
    pub max_dpi: u32,
    /// Format used when the form omits `format`. Default: PNG.
    pub default_format: ImageFormat,
    /// Session TTL and capacity.
    pub sessions: SessionPolicy,
    /// How often expired sessions are swept. Default: 60 s.
    pub sweep_interval: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 5000)),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            default_dpi: DEFAULT_DPI,
            max_dpi: 600,
            default_format: ImageFormat::Png,
            sessions: SessionPolicy::default(),
            sweep_interval: Duration::from_secs(60),
        }
    }
}

impl ServerConfig {
    /// Check the settings are coherent before starting the server.
    pub fn validate(&self) -> Result<(), Pdf2ImgError> {
        if self.max_dpi == 0 || self.max_dpi > MAX_DPI {
            return Err(Pdf2ImgError::InvalidConfig(format!(
                "max DPI must be 1–{MAX_DPI}, got {}",
                self.max_dpi
            )));
        }
        if self.default_dpi == 0 || self.default_dpi > self.max_dpi {
            return Err(Pdf2ImgError::InvalidConfig(format!(
                "default DPI {} is outside 1–{}",
                self.default_dpi, self.max_dpi
            )));
        }
        if !self.default_format.is_web_previewable() {
            return Err(Pdf2ImgError::InvalidConfig(format!(
                "default format must be PNG or JPEG, got {}",
                self.default_format
            )));
        }
        if self.max_upload_bytes == 0 {
            return Err(Pdf2ImgError::InvalidConfig(
                "max upload size must be > 0".into(),
            ));
        }
        if self.sweep_interval.is_zero() {
            return Err(Pdf2ImgError::InvalidConfig(
                "sweep interval must be > 0".into(),
            ));
        }
        Ok(())
    }
}

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub sessions: SessionStore,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            sessions: SessionStore::new(config.sessions),
            config: Arc::new(config),
        }
    }
}

/// Build the axum app for `state`.
pub fn build_app(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes;
    routes::mount(Router::new())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the service until Ctrl-C.
pub async fn serve(config: ServerConfig) -> std::io::Result<()> {
    config
        .validate()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()))?;

    let state = AppState::new(config);
    let sweeper = spawn_session_sweeper(state.sessions.clone(), state.config.sweep_interval);
    let app = build_app(state.clone());

    let listener = tokio::net::TcpListener::bind(state.config.bind).await?;
    info!("Listening on http://{}", listener.local_addr()?);

    let result = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    sweeper.abort();
    info!("Server stopped");
    result
}

/// Periodically drop expired sessions so memory is reclaimed even when no
/// new conversions arrive.
pub fn spawn_session_sweeper(store: SessionStore, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        // the first tick completes immediately
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let removed = store.purge_expired();
            if removed > 0 {
                info!("Expired {} sessions ({} live)", removed, store.len());
            }
        }
    })
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}
