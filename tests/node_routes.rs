use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use convo_assign_node::{
    node::Record,
    transport::{ConnectionTarget, Connector, PgSession, TypeOptions},
    AssigneeNode, NodeError,
};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

/// In-memory `conversations`/`users` tables
#[derive(Default)]
struct Tables {
    users: Vec<Record>,
    conversations: Mutex<Vec<Record>>,
    refuse_connections: bool,
}

struct MemoryConnector(Arc<Tables>);

#[async_trait]
impl Connector for MemoryConnector {
    async fn connect(&self, target: &ConnectionTarget, _types: TypeOptions) -> Result<Box<dyn PgSession>, NodeError> {
        if self.0.refuse_connections {
            return Err(NodeError::Connect(format!(
                "error connecting to server: Connection refused (os error 111) [{}:{}]",
                target.host, target.port
            )));
        }
        Ok(Box::new(MemorySession(Arc::clone(&self.0))))
    }
}

struct MemorySession(Arc<Tables>);

#[async_trait]
impl PgSession for MemorySession {
    async fn query(&mut self, sql: &str, params: &[Value]) -> Result<Vec<Record>, NodeError> {
        if sql.contains("public.users") {
            return Ok(self.0.users.iter().filter(|u| u.get("type") == Some(&params[0])).cloned().collect());
        }
        Ok(self
            .0
            .conversations
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.get("id") == Some(&params[0]))
            .cloned()
            .collect())
    }

    async fn execute(&mut self, _sql: &str, params: &[Value]) -> Result<u64, NodeError> {
        let mut updated = 0;
        for row in self.0.conversations.lock().unwrap().iter_mut() {
            if row.get("id") == Some(&params[1]) {
                row.insert("assignee_id".into(), params[0].clone());
                updated += 1;
            }
        }
        Ok(updated)
    }

    async fn close(self: Box<Self>) {}
}

fn record(value: Value) -> Record {
    value.as_object().cloned().expect("object literal")
}

fn app_with(tables: Tables) -> (Router, Arc<Tables>) {
    let tables = Arc::new(tables);
    let node = AssigneeNode::new(Arc::new(MemoryConnector(Arc::clone(&tables))));
    (convo_assign_node::create_router(Arc::new(node)), tables)
}

async fn send(app: Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty))
        .expect("failed to build request");

    let resp = app.oneshot(request).await.expect("request failed");
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.expect("failed to read body");
    let value = serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
    (status, value)
}

fn credentials() -> Value {
    json!({ "host": "db.internal", "database": "app", "user": "n8n", "password": "pw", "port": 5432 })
}

#[tokio::test]
async fn healthz_returns_ok() {
    let (app, _) = app_with(Tables::default());
    let (status, body) = send(app, "GET", "/healthz", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!("ok"));
}

#[tokio::test]
async fn description_lists_node_and_credential() {
    let (app, _) = app_with(Tables::default());
    let (status, body) = send(app, "GET", "/node/description", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["node"]["name"], "Test");
    assert_eq!(body["node"]["methods"]["listSearch"], json!(["agentsSearch"]));
    assert_eq!(body["node"]["defaults"]["name"], "Xin chao");
    assert_eq!(body["credentials"][0]["name"], "testApi");
}

#[tokio::test]
async fn credential_test_reports_success() {
    let (app, _) = app_with(Tables::default());
    let (status, body) = send(app, "POST", "/node/credential-test", Some(json!({ "data": credentials() }))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "OK", "message": "Connection successful!" }));
}

#[tokio::test]
async fn credential_test_classifies_refused_connection() {
    let (app, _) = app_with(Tables {
        refuse_connections: true,
        ..Default::default()
    });
    let (status, body) = send(app, "POST", "/node/credential-test", Some(json!({ "data": credentials() }))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "Error", "message": "Connection refused" }));
}

#[tokio::test]
async fn load_options_and_list_search_share_rows_with_different_value_types() {
    let tables = Tables {
        users: vec![
            record(json!({ "id": 10, "name": "Dana", "type": "SuperAdmin" })),
            record(json!({ "id": 11, "name": "Eve", "type": "Agent" })),
        ],
        ..Default::default()
    };
    let (app, _) = app_with(tables);

    let (status, options) = send(
        app.clone(),
        "POST",
        "/node/load-options/getApp",
        Some(json!({ "credentials": credentials() })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(options, json!([{ "name": "Dana", "value": "10" }]));

    let (status, found) = send(
        app,
        "POST",
        "/node/list-search/agentsSearch",
        Some(json!({ "credentials": credentials(), "filter": "E" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(found, json!({ "results": [{ "name": "Dana", "value": 10 }] }));
}

#[tokio::test]
async fn load_options_without_credentials_is_a_bad_request() {
    let (app, _) = app_with(Tables::default());
    let (status, body) = send(app, "POST", "/node/load-options/getApp", Some(json!({}))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "CredentialsError");
}

#[tokio::test]
async fn execute_assigns_conversation_and_returns_previous_row() {
    let (app, tables) = app_with(Tables {
        conversations: Mutex::new(vec![record(json!({ "id": 42, "assignee_id": 3 }))]),
        ..Default::default()
    });

    let (status, body) = send(
        app,
        "POST",
        "/node/execute",
        Some(json!({
            "credentials": credentials(),
            "items": [{ "json": { "query": { "conversation_id": 42 } } }],
            "parameters": { "resource": 7 }
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([[{ "json": { "id": 42, "assignee_id": 3 } }]]));
    assert_eq!(tables.conversations.lock().unwrap()[0]["assignee_id"], json!(7));
}

#[tokio::test]
async fn execute_with_no_items_fails_with_operation_error() {
    let (app, tables) = app_with(Tables {
        conversations: Mutex::new(vec![record(json!({ "id": 42, "assignee_id": 3 }))]),
        ..Default::default()
    });

    let (status, body) = send(
        app,
        "POST",
        "/node/execute",
        Some(json!({ "credentials": credentials(), "items": [], "parameters": { "resource": 7 } })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "NodeOperationError");
    assert_eq!(body["message"], "something wrong");
    assert_eq!(body["node"], "Xin chao");
    assert_eq!(tables.conversations.lock().unwrap()[0]["assignee_id"], json!(3));
}

#[tokio::test]
async fn execute_unknown_conversation_is_not_found() {
    let (app, _) = app_with(Tables::default());

    let (status, body) = send(
        app,
        "POST",
        "/node/execute",
        Some(json!({
            "credentials": credentials(),
            "items": [{ "json": { "query": { "conversation_id": 5 } } }],
            "parameters": { "resource": "7" }
        })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "No conversation found with conversation_id = 5");
}
