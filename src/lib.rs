/// Conversation assignment node for a workflow-automation host
///
/// Lets a workflow assign Postgres-backed conversations to SuperAdmin users,
/// test its database credentials, and populate the assignee dropdown.

// Host adapter configuration
pub mod config;

// Error types surfaced to the host
pub mod error;

// `testApi` credential type and decrypted credential values
pub mod credentials;

// Postgres connection configuration, driver seam, value conversion
pub mod transport;

// Node description and handlers
pub mod node;

// HTTP API layer - lets a host invoke the node out of process
pub mod api;

// Server setup and initialization
pub mod server;

// Re-export commonly used types for external consumers
pub use credentials::{CredentialSet, CredentialsDecrypted};
pub use error::NodeError;
pub use node::{AssigneeNode, NodeExecutionData};
pub use server::{create_router, start_server};
