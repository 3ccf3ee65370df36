/// Conversation assignment node server
///
/// Exposes the node's host hooks over HTTP:
/// - Node description at /node/description
/// - Credential test, option loaders and execution at /node/*
/// - Health check at /healthz

use convo_assign_node::{config::Config, server::start_server};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration (defaults to 0.0.0.0:3005)
    let config = Config::default();

    start_server(config).await?;

    Ok(())
}
