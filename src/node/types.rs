/// Shapes exchanged with the host runtime
///
/// Items flow in and out as `{json: object}`; the host traits are the only
/// way handlers reach credentials, input data and parameters.

use crate::{credentials::CredentialSet, error::NodeError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One decoded database row, keyed by column name
pub type Record = Map<String, Value>;

/// A single item flowing between workflow nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeExecutionData {
    pub json: Value,
}

impl NodeExecutionData {
    pub fn new(json: Value) -> Self {
        Self { json }
    }
}

/// Wrap each record as an output item
pub fn return_json_array(records: Vec<Record>) -> Vec<NodeExecutionData> {
    records
        .into_iter()
        .map(|record| NodeExecutionData::new(Value::Object(record)))
        .collect()
}

/// Selectable option for an `options` dropdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodePropertyOption {
    pub name: String,
    pub value: String,
}

/// Entry of a searchable list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListSearchItem {
    pub name: String,
    pub value: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListSearchResult {
    pub results: Vec<ListSearchItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination_token: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CredentialTestStatus {
    #[serde(rename = "OK")]
    Ok,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialTestResult {
    pub status: CredentialTestStatus,
    pub message: String,
}

impl CredentialTestResult {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            status: CredentialTestStatus::Ok,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: CredentialTestStatus::Error,
            message: message.into(),
        }
    }
}

/// Identity of the node instance inside the running workflow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRef {
    pub name: String,
}

/// Host services available while populating dynamic options
#[async_trait]
pub trait LoadOptionsFunctions: Send + Sync {
    /// Resolve a decrypted credential set by credential type name
    async fn get_credentials(&self, name: &str) -> Result<CredentialSet, NodeError>;

    fn node(&self) -> &NodeRef;
}

/// Host services available during workflow execution
pub trait ExecuteFunctions: LoadOptionsFunctions {
    fn input_data(&self) -> &[NodeExecutionData];

    /// Value of a node parameter, `None` when unset
    fn node_parameter(&self, name: &str) -> Option<Value>;
}
