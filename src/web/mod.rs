//! Web front end: upload a batch of images, get back one ZIP of stickers.
//!
//! Routes: `GET /` (form), `POST /upload`, `GET /download/:session_id/:filename`
//! and `GET /health`. Uploaded files are processed sequentially inside the
//! request on a blocking worker thread; there is no queue.
pub mod routes;
pub mod session;
pub mod templates;
pub mod upload;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, post};
use tracing::{debug, info, warn};

use crate::api::build_pipeline;
use crate::config::AppConfig;
use crate::core::processing::pipeline::Pipeline;
use crate::error::Result;
use session::SessionStore;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub pipeline: Arc<Pipeline>,
    pub sessions: Arc<SessionStore>,
}

impl AppState {
    pub fn new(config: AppConfig, pipeline: Pipeline) -> Result<Self> {
        let sessions = SessionStore::new(&config.upload_dir, &config.processed_dir)?;
        Ok(Self {
            config: Arc::new(config),
            pipeline: Arc::new(pipeline),
            sessions: Arc::new(sessions),
        })
    }
}

pub fn router(state: AppState) -> Router {
    let body_limit = state.config.max_request_bytes;
    Router::new()
        .route("/", get(routes::index))
        .route("/health", get(routes::health))
        .route("/upload", post(routes::upload))
        .route("/download/:session_id/:filename", get(routes::download))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(middleware::from_fn(routes::access_log))
        .with_state(state)
}

/// Periodically remove sessions older than the configured retention.
pub fn spawn_session_reaper(state: &AppState) -> tokio::task::JoinHandle<()> {
    let sessions = state.sessions.clone();
    let retention = state.config.retention;
    let period = (retention / 4).clamp(Duration::from_secs(1), Duration::from_secs(60));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            let sessions = sessions.clone();
            let res = tokio::task::spawn_blocking(move || sessions.purge_expired(retention)).await;
            match res {
                Ok(Ok(_)) => {}
                Ok(Err(e)) => warn!(error = %e, "Session cleanup failed"),
                Err(e) => warn!(error = %e, "Session cleanup task failed"),
            }
        }
    })
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Could not listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}

/// Build everything from `config` and serve until Ctrl+C.
pub async fn serve(config: AppConfig) -> Result<()> {
    match serde_json::to_string(&config) {
        Ok(json) => debug!("Effective configuration: {}", json),
        Err(e) => warn!(error = %e, "Could not render configuration"),
    }
    let pipeline = build_pipeline(
        config.remover,
        config.model_path.as_deref(),
        config.processing_params(),
    )?;
    let addr = config.bind_addr()?;
    info!("Upload folder: {:?}", config.upload_dir);
    info!("Processed folder: {:?}", config.processed_dir);

    let state = AppState::new(config, pipeline)?;
    let reaper = spawn_session_reaper(&state);
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    reaper.abort();
    Ok(())
}
