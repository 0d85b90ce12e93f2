//! taskclock - A state-managed HTTP server for per-task time tracking
//!
//! This is the main entry point for the taskclock server.

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{info, warn};

use taskclock::{
    api::create_router,
    auth::{AccessPolicy, AllowAll, TokenPolicy},
    config::Config,
    state::AppState,
    store::SnapshotStore,
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "taskclock={},tower_http=info",
            config.log_level()
        ))
        .init();

    info!("Starting taskclock server v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Configuration: host={}, port={}, snapshot={}",
        config.host,
        config.port,
        config.snapshot.display()
    );

    let policy: Arc<dyn AccessPolicy> = if config.tokens.is_empty() {
        warn!("No API tokens configured, accepting every caller");
        Arc::new(AllowAll)
    } else {
        Arc::new(TokenPolicy::new(config.tokens.clone()))
    };

    // Load whatever the previous process checkpointed
    let store = SnapshotStore::new(config.snapshot.clone());
    let state = Arc::new(AppState::with_store(store, policy)?);

    // Create HTTP router with all endpoints
    let app = create_router(state);

    // Bind to the specified address
    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  POST /tasks                  - Create a task");
    info!("  GET  /tasks                  - List tasks with timer checkpoints");
    info!("  PUT  /tasks/:id/starttime    - Start a task's timer");
    info!("  PUT  /tasks/:id/pausetime    - Pause a running timer");
    info!("  PUT  /tasks/:id/resumetime   - Resume a paused timer");
    info!("  PUT  /tasks/:id/stoptime     - Stop the timer and complete the task");
    info!("  GET  /tasks/:id/sessions     - Session ledger report");
    info!("  GET  /health                 - Health check");

    // Setup graceful shutdown
    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    info!("Server shutdown complete");
    Ok(())
}
