pub mod api;
pub mod attachments;
pub mod claim;
pub mod config;
pub mod core_state;
pub mod db;
pub mod models;

use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use core_state::{CoreError, CoreState};

/// Start the HTTP service and serve until the process is stopped.
pub async fn run() -> Result<(), CoreError> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let core = Arc::new(CoreState::from_config()?);
    let app = api::api_router(core);

    let addr = config::bind_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| CoreError::Startup(format!("bind {addr}: {e}")))?;
    tracing::info!(%addr, "API listening");

    axum::serve(listener, app)
        .await
        .map_err(|e| CoreError::Startup(format!("server stopped: {e}")))
}
