/// Node handlers invoked by the host runtime
///
/// Four entry points, each opening its own session and closing it before
/// returning:
/// - credential test: can the stored credentials connect?
/// - `getApp`: SuperAdmin users as dropdown options (string values)
/// - `agentsSearch`: SuperAdmin users as a searchable list (integer values)
/// - execute: assign the first item's conversation to the selected user

use crate::{
    credentials::{CredentialsDecrypted, CREDENTIAL_NAME},
    error::NodeError,
    node::{
        description::{node_description, NodeDescription, RESOURCE_PARAMETER},
        types::{
            return_json_array, CredentialTestResult, ExecuteFunctions, ListSearchItem,
            ListSearchResult, LoadOptionsFunctions, NodeExecutionData, NodePropertyOption, Record,
        },
    },
    transport::{configure_postgres, ConfigureOptions, Connector, PgSession, TokioPostgresConnector},
};
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

const SUPER_ADMIN_ROLE: &str = "SuperAdmin";
const SELECT_APP_USERS: &str = "SELECT id , name FROM public.users WHERE type = $1";
const SELECT_AGENTS: &str = "SELECT * FROM public.users WHERE type = $1";
const SELECT_CONVERSATION: &str = "SELECT * FROM public.conversations WHERE id = $1";
const UPDATE_ASSIGNEE: &str = "UPDATE public.conversations SET assignee_id = $1 WHERE id = $2";

/// Message for a batch with no items
pub const EMPTY_INPUT_MESSAGE: &str = "something wrong";

/// Map a connection failure onto the message shown in the credential editor
///
/// First match wins. Each class also matches the wording the OS reports
/// through the Rust driver.
pub fn classify_connection_error(message: &str) -> String {
    const CLASSES: [(&[&str], &str); 3] = [
        (&["ECONNREFUSED", "Connection refused", "connection refused"], "Connection refused"),
        (
            &["ENOTFOUND", "failed to lookup address", "Name or service not known", "nodename nor servname"],
            "Host not found, please check your host name",
        ),
        (&["ETIMEDOUT", "timed out"], "Connection timed out"),
    ];

    CLASSES
        .iter()
        .find(|(needles, _)| needles.iter().any(|needle| message.contains(needle)))
        .map(|(_, classified)| classified.to_string())
        .unwrap_or_else(|| message.to_string())
}

/// The conversation assignment node
#[derive(Clone)]
pub struct AssigneeNode {
    driver: Arc<dyn Connector>,
}

impl std::fmt::Debug for AssigneeNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssigneeNode").finish_non_exhaustive()
    }
}

impl Default for AssigneeNode {
    fn default() -> Self {
        Self::new(Arc::new(TokioPostgresConnector))
    }
}

impl AssigneeNode {
    /// Create a node that opens sessions through the given driver
    pub fn new(driver: Arc<dyn Connector>) -> Self {
        Self { driver }
    }

    pub fn description(&self) -> NodeDescription {
        node_description()
    }

    /// Credential test (`testApiConnectionTest`)
    ///
    /// Never fails: connection problems are reported in the result.
    pub async fn test_api_connection_test(&self, credential: &CredentialsDecrypted) -> CredentialTestResult {
        tracing::info!("🔐 Testing credentials against {}:{}", credential.data.host, credential.data.port);

        let db = match configure_postgres(&self.driver, &credential.data, &ConfigureOptions::default()) {
            Ok(db) => db,
            Err(e) => {
                tracing::warn!("❌ Credential test rejected configuration: {}", e);
                return CredentialTestResult::error(e.to_string());
            }
        };

        match db.connect().await {
            Ok(session) => {
                session.close().await;
                tracing::info!("✅ Credential test succeeded");
                CredentialTestResult::ok("Connection successful!")
            }
            Err(e) => {
                let message = classify_connection_error(&e.to_string());
                tracing::warn!("❌ Credential test failed: {} ({})", message, e);
                CredentialTestResult::error(message)
            }
        }
    }

    /// Load-options method `getApp`: SuperAdmin users with string ids
    pub async fn get_app(&self, ctx: &dyn LoadOptionsFunctions) -> Result<Vec<NodePropertyOption>, NodeError> {
        tracing::debug!("📋 Loading assignee options");

        let users = self.load_super_admins(ctx, SELECT_APP_USERS).await?;

        Ok(users
            .iter()
            .map(|user| NodePropertyOption {
                name: display_string(user.get("name")),
                value: display_string(user.get("id")),
            })
            .collect())
    }

    /// List-search method `agentsSearch`: SuperAdmin users with integer ids
    ///
    /// The search filter and pagination token are accepted but not applied.
    pub async fn agents_search(
        &self,
        ctx: &dyn LoadOptionsFunctions,
        filter: Option<&str>,
        pagination_token: Option<&str>,
    ) -> Result<ListSearchResult, NodeError> {
        tracing::debug!("🔍 Searching agents (filter: {:?}, page: {:?})", filter, pagination_token);

        let users = self.load_super_admins(ctx, SELECT_AGENTS).await?;

        let results = users
            .iter()
            .map(|user| {
                Ok(ListSearchItem {
                    name: display_string(user.get("name")),
                    value: integer_id(user.get("id"))?,
                })
            })
            .collect::<Result<Vec<_>, NodeError>>()?;

        Ok(ListSearchResult {
            results,
            pagination_token: None,
        })
    }

    async fn load_super_admins(&self, ctx: &dyn LoadOptionsFunctions, sql: &str) -> Result<Vec<Record>, NodeError> {
        let credentials = ctx.get_credentials(CREDENTIAL_NAME).await?;
        let db = configure_postgres(&self.driver, &credentials, &ConfigureOptions::default())?;

        let mut session = db.connect().await?;
        let users = session.query(sql, &[json!(SUPER_ADMIN_ROLE)]).await;
        session.close().await;

        let users = users?;
        tracing::debug!("✅ Loaded {} SuperAdmin users", users.len());
        Ok(users)
    }

    /// Main action: assign the referenced conversation to the selected user
    ///
    /// Only the first input item is read. The returned rows are the
    /// conversation as it was before the update.
    pub async fn execute(&self, ctx: &dyn ExecuteFunctions) -> Result<Vec<Vec<NodeExecutionData>>, NodeError> {
        let execution_id = Uuid::new_v4();
        let node = ctx.node().name.clone();
        tracing::info!("🚀 Executing node '{}' (execution {})", node, execution_id);

        let credentials = ctx.get_credentials(CREDENTIAL_NAME).await?;
        let items = ctx.input_data();
        let assignee_id = ctx
            .node_parameter(RESOURCE_PARAMETER)
            .unwrap_or_else(|| Value::String(String::new()));

        let first = items
            .first()
            .ok_or_else(|| NodeError::operation(&node, EMPTY_INPUT_MESSAGE))?;
        if items.len() > 1 {
            tracing::debug!("⏭️ Ignoring {} trailing input items", items.len() - 1);
        }

        let query = first
            .json
            .get("query")
            .and_then(Value::as_object)
            .ok_or_else(|| NodeError::operation(&node, "Input item has no 'query' object"))?;
        let conversation_id = query.get("conversation_id").cloned().unwrap_or(Value::Null);

        tracing::debug!("🎯 conversation_id = {}, assignee_id = {}", conversation_id, assignee_id);

        let db = configure_postgres(&self.driver, &credentials, &ConfigureOptions::default())
            .map_err(|e| NodeError::operation(&node, e.to_string()))?;
        let mut session = db
            .connect()
            .await
            .map_err(|e| NodeError::operation(&node, e.to_string()))?;

        let outcome = assign_conversation(session.as_mut(), &conversation_id, &assignee_id).await;
        session.close().await;

        let conversation = outcome.map_err(|e| {
            tracing::error!("❌ Execution {} failed: {}", execution_id, e);
            NodeError::operation(&node, e.to_string())
        })?;

        tracing::info!("✅ Execution {} assigned conversation {} to {}", execution_id, conversation_id, assignee_id);
        Ok(vec![return_json_array(conversation)])
    }
}

/// Read the conversation, then point it at the new assignee
///
/// Not wrapped in a transaction; the returned rows predate the update.
async fn assign_conversation(
    session: &mut dyn PgSession,
    conversation_id: &Value,
    assignee_id: &Value,
) -> Result<Vec<Record>, NodeError> {
    let conversation = session
        .query(SELECT_CONVERSATION, std::slice::from_ref(conversation_id))
        .await?;

    if conversation.is_empty() {
        return Err(NodeError::Database(format!(
            "No conversation found with conversation_id = {}",
            conversation_id
        )));
    }

    let updated = session
        .execute(UPDATE_ASSIGNEE, &[assignee_id.clone(), conversation_id.clone()])
        .await?;
    tracing::debug!("📝 Updated {} conversation row(s)", updated);

    Ok(conversation)
}

fn display_string(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => "undefined".to_string(),
    }
}

fn integer_id(value: Option<&Value>) -> Result<i64, NodeError> {
    value
        .and_then(|v| match v {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.parse().ok(),
            _ => None,
        })
        .ok_or_else(|| NodeError::Database(format!("User row has a non-integer id: {:?}", value)))
}
