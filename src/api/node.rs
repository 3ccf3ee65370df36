/// Node invocation REST endpoints
///
/// Maps host runtime calls onto the node handlers. Each request carries the
/// decrypted credentials, input items and parameters the host would
/// otherwise supply in-process.

use crate::{
    credentials::{credential_type, CredentialSet, CredentialsDecrypted, CREDENTIAL_NAME},
    error::NodeError,
    node::{
        AssigneeNode, CredentialTestResult, ExecuteFunctions, ListSearchResult, LoadOptionsFunctions,
        NodeExecutionData, NodePropertyOption, NodeRef,
    },
};
use async_trait::async_trait;
use axum::{
    extract::State,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::sync::Arc;

/// Application state shared by the node routes
#[derive(Clone)]
pub struct AppState {
    pub node: Arc<AssigneeNode>,
}

/// Body of `/node/load-options/getApp`
#[derive(Debug, Deserialize)]
pub struct LoadOptionsRequest {
    #[serde(default)]
    pub credentials: Option<Value>,
}

/// Body of `/node/list-search/agentsSearch`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListSearchRequest {
    #[serde(default)]
    pub credentials: Option<Value>,
    #[serde(default)]
    pub filter: Option<String>,
    #[serde(default)]
    pub pagination_token: Option<String>,
}

/// Body of `/node/execute`
#[derive(Debug, Deserialize)]
pub struct ExecuteRequest {
    #[serde(default)]
    pub credentials: Option<Value>,
    #[serde(default)]
    pub items: Vec<NodeExecutionData>,
    #[serde(default)]
    pub parameters: Map<String, Value>,
    #[serde(default)]
    pub node: Option<NodeRef>,
}

/// Host context assembled from a single request
pub struct RequestContext {
    node: NodeRef,
    credentials: Option<Value>,
    items: Vec<NodeExecutionData>,
    parameters: Map<String, Value>,
}

impl RequestContext {
    fn for_load_options(credentials: Option<Value>) -> Self {
        Self {
            node: default_node_ref(),
            credentials,
            items: Vec::new(),
            parameters: Map::new(),
        }
    }
}

fn default_node_ref() -> NodeRef {
    NodeRef {
        name: crate::node::node_description().defaults.name.to_string(),
    }
}

#[async_trait]
impl LoadOptionsFunctions for RequestContext {
    async fn get_credentials(&self, name: &str) -> Result<CredentialSet, NodeError> {
        if name != CREDENTIAL_NAME {
            return Err(NodeError::Credentials(format!(
                "Node does not have credentials of type \"{}\"",
                name
            )));
        }
        let credentials = self.credentials.clone().ok_or_else(|| {
            NodeError::Credentials(format!("Node does not have any credentials set for \"{}\"", name))
        })?;
        serde_json::from_value(credentials)
            .map_err(|e| NodeError::Credentials(format!("Invalid credentials: {}", e)))
    }

    fn node(&self) -> &NodeRef {
        &self.node
    }
}

impl ExecuteFunctions for RequestContext {
    fn input_data(&self) -> &[NodeExecutionData] {
        &self.items
    }

    fn node_parameter(&self, name: &str) -> Option<Value> {
        self.parameters.get(name).cloned()
    }
}

/// Create node invocation routes
pub fn create_node_routes() -> Router<AppState> {
    Router::new()
        .route("/node/description", get(describe_node))
        .route("/node/credential-test", post(test_credentials))
        .route("/node/load-options/getApp", post(load_app_options))
        .route("/node/list-search/agentsSearch", post(search_agents))
        .route("/node/execute", post(execute_node))
}

/// GET /node/description
/// Returns: { "node": {...}, "credentials": [{...}] }
async fn describe_node(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "node": state.node.description(),
        "credentials": [credential_type()],
    }))
}

/// POST /node/credential-test
/// Body: { "data": { "host": "...", "port": 5432, ... } }
async fn test_credentials(
    State(state): State<AppState>,
    Json(credential): Json<CredentialsDecrypted>,
) -> Json<CredentialTestResult> {
    Json(state.node.test_api_connection_test(&credential).await)
}

/// POST /node/load-options/getApp
/// Body: { "credentials": {...} }
async fn load_app_options(
    State(state): State<AppState>,
    Json(request): Json<LoadOptionsRequest>,
) -> Result<Json<Vec<NodePropertyOption>>, NodeError> {
    let ctx = RequestContext::for_load_options(request.credentials);
    let options = state.node.get_app(&ctx).await?;
    Ok(Json(options))
}

/// POST /node/list-search/agentsSearch
/// Body: { "credentials": {...}, "filter": "...", "paginationToken": "..." }
async fn search_agents(
    State(state): State<AppState>,
    Json(request): Json<ListSearchRequest>,
) -> Result<Json<ListSearchResult>, NodeError> {
    let ctx = RequestContext::for_load_options(request.credentials);
    let found = state
        .node
        .agents_search(&ctx, request.filter.as_deref(), request.pagination_token.as_deref())
        .await?;
    Ok(Json(found))
}

/// POST /node/execute
/// Body: { "credentials": {...}, "items": [{"json": {...}}], "parameters": {"resource": "7"} }
/// Returns: [[{"json": {...}}]]
async fn execute_node(
    State(state): State<AppState>,
    Json(request): Json<ExecuteRequest>,
) -> Result<Json<Vec<Vec<NodeExecutionData>>>, NodeError> {
    tracing::info!("📥 Execute request with {} item(s)", request.items.len());

    let ctx = RequestContext {
        node: request.node.unwrap_or_else(default_node_ref),
        credentials: request.credentials,
        items: request.items,
        parameters: request.parameters,
    };
    let output = state.node.execute(&ctx).await?;
    Ok(Json(output))
}
