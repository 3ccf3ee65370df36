/// Credential definition for the `testApi` credential type
///
/// Declares the five Postgres connection fields and their UI hints, and the
/// decrypted value the host hands to the node at invocation time.

use crate::node::description::{NodeProperty, PropertyKind, PropertyTypeOptions};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;

/// Credential type name the node requests from the host
pub const CREDENTIAL_NAME: &str = "testApi";

/// Decrypted Postgres connection parameters
///
/// Missing fields fall back to the defaults declared in the credential schema.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialSet {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_database")]
    pub database: String,
    #[serde(default = "default_user")]
    pub user: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "default_port")]
    pub port: i64,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_database() -> String {
    "postgres".to_string()
}

fn default_user() -> String {
    "postgres".to_string()
}

fn default_port() -> i64 {
    5432
}

impl Default for CredentialSet {
    fn default() -> Self {
        Self {
            host: default_host(),
            database: default_database(),
            user: default_user(),
            password: String::new(),
            port: default_port(),
        }
    }
}

// Password never reaches the logs
impl fmt::Debug for CredentialSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialSet")
            .field("host", &self.host)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("port", &self.port)
            .finish()
    }
}

/// Credential payload passed to a credential test
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CredentialsDecrypted {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "type", default)]
    pub credential_type: Option<String>,
    #[serde(default)]
    pub data: CredentialSet,
}

/// Static schema of the credential type shown in the credential editor
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialType {
    pub name: &'static str,
    pub display_name: &'static str,
    pub properties: Vec<NodeProperty>,
}

/// Build the `testApi` credential type description
pub fn credential_type() -> CredentialType {
    CredentialType {
        name: CREDENTIAL_NAME,
        display_name: "TestApi API",
        properties: vec![
            NodeProperty::new("Host", "host", PropertyKind::String, json!("localhost")),
            NodeProperty::new("Database", "database", PropertyKind::String, json!("postgres")),
            NodeProperty::new("User", "user", PropertyKind::String, json!("postgres")),
            NodeProperty {
                type_options: Some(PropertyTypeOptions {
                    password: Some(true),
                    ..Default::default()
                }),
                ..NodeProperty::new("Password", "password", PropertyKind::String, json!(""))
            },
            NodeProperty::new("Port", "port", PropertyKind::Number, json!(5432)),
        ],
    }
}
