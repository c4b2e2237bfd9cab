//! Server startup: bind, record `server.start`, serve until Ctrl-C.

use std::future::Future;
use std::path::PathBuf;

use serde_json::json;
use tokio::net::TcpListener;

use crate::api::{self, AppState};
use crate::error::{Error, Result};
use crate::events::{EventDraft, SERVER_START};

/// Where to listen and what to serve besides the API
#[derive(Debug, Clone)]
pub struct ServerOptions {
    pub host: String,
    pub port: u16,
    pub web_dir: Option<PathBuf>,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3999,
            web_dir: None,
        }
    }
}

/// Serve until Ctrl-C.
pub async fn run(state: AppState, options: ServerOptions) -> Result<()> {
    run_until(state, options, shutdown_signal()).await
}

/// Serve until `shutdown` resolves.
pub async fn run_until<F>(state: AppState, options: ServerOptions, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let init_state = state.clone();
    tokio::task::spawn_blocking(move || init_state.tasks.ensure_document())
        .await
        .map_err(|err| Error::OperationFailed(format!("startup task failed: {err}")))??;

    let addr = format!("{}:{}", options.host, options.port);
    let listener = TcpListener::bind(&addr).await?;
    let local_addr = listener.local_addr()?;

    let web_dir = options.web_dir.filter(|dir| dir.is_dir());
    match &web_dir {
        Some(dir) => tracing::info!(dir = %dir.display(), "serving static files"),
        None => tracing::debug!("no web directory, serving API only"),
    }
    let app = api::router(state.clone(), web_dir.as_deref());

    tracing::info!("[command-center] listening on http://{local_addr}");

    record_start(&state, &options.host, local_addr.port()).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    tracing::info!("shutting down");
    Ok(())
}

/// Append `server.start` with `{ host, port }`. A failed append is logged,
/// not fatal.
async fn record_start(state: &AppState, host: &str, port: u16) -> Result<()> {
    let events = state.events.clone();
    let detail = json!({ "host": host, "port": port });
    let started = tokio::task::spawn_blocking(move || {
        events.append(EventDraft::new(SERVER_START).with_detail(detail))
    })
    .await
    .map_err(|err| Error::OperationFailed(format!("startup task failed: {err}")))?;
    if let Err(err) = started {
        tracing::warn!(error = %err, "could not record server start");
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "failed to listen for ctrl+c");
        std::future::pending::<()>().await;
    }
}
