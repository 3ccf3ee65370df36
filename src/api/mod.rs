/// HTTP API Layer
///
/// Lets a host runtime drive the node out of process:
/// - node and credential descriptions
/// - credential testing
/// - dynamic option loading
/// - execution

// Node invocation endpoints
pub mod node;

pub use node::{create_node_routes, AppState};
