/// Server setup and initialization
///
/// Wires the node to its Postgres driver and mounts the HTTP routes.

use crate::{
    api::{create_node_routes, AppState},
    config::Config,
    node::AssigneeNode,
    transport::TokioPostgresConnector,
};
use anyhow::Result;
use axum::{routing::get, Router};
use std::sync::Arc;
use tokio::net::TcpListener;

/// Build the router around an already constructed node
///
/// Tests pass a node backed by an in-memory driver.
pub fn create_router(node: Arc<AssigneeNode>) -> Router {
    Router::new()
        // Health check endpoint
        .route("/healthz", get(health_check))
        // Node invocation routes
        .merge(create_node_routes().with_state(AppState { node }))
}

/// Create the main Axum application backed by tokio-postgres
pub fn create_app() -> Router {
    tracing::info!("🐘 Initializing node with tokio-postgres driver");
    let node = Arc::new(AssigneeNode::new(Arc::new(TokioPostgresConnector)));

    tracing::info!("📡 Creating HTTP router with node endpoints");
    create_router(node)
}

/// Start the HTTP server with the given configuration
pub async fn start_server(config: Config) -> Result<()> {
    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_thread_ids(true)
        .with_level(true)
        .init();

    tracing::info!("Starting conversation assignment node server...");

    let app = create_app();

    let bind_addr = config.server.bind_addr();
    let listener = TcpListener::bind(&bind_addr).await?;

    tracing::info!("Server listening on http://{}", bind_addr);

    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}

/// Health check endpoint handler
async fn health_check() -> &'static str {
    "ok"
}
