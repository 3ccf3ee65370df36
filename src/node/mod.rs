/// Conversation assignment node
///
/// Declarative description, host-facing types, and the handlers the host
/// runtime invokes (credential test, option loaders, execute).

// Node metadata served to the host UI
pub mod description;

// Items, option shapes, credential test results, host traits
pub mod types;

// Credential test, getApp, agentsSearch, execute
pub mod handlers;

pub use description::{node_description, NodeDescription};
pub use handlers::{classify_connection_error, AssigneeNode};
pub use types::{
    CredentialTestResult, CredentialTestStatus, ExecuteFunctions, ListSearchItem, ListSearchResult,
    LoadOptionsFunctions, NodeExecutionData, NodePropertyOption, NodeRef, Record,
};
