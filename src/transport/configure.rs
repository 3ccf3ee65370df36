/// Connection configurator
///
/// Turns a credential set plus behavioral options into a `Database` handle:
/// the connection target, the per-connection type decoding rules, and the
/// driver that will open the session. Nothing here is process-wide; two
/// handles with different options never affect each other.

use crate::{
    credentials::CredentialSet,
    error::NodeError,
    transport::session::{Connector, PgSession},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio_postgres::config::Config as PgConfig;

/// Options accepted by `configure_postgres`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigureOptions {
    /// Accepted for compatibility. Timestamps render as ISO-8601 for every version
    #[serde(default)]
    pub node_version: Option<f64>,
    /// `"numbers"` decodes INT8/NUMERIC as JSON numbers; anything else keeps strings
    #[serde(default)]
    pub large_numbers_output: Option<String>,
}

/// Column decoding rules carried by a single connection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TypeOptions {
    /// INT8 and NUMERIC rendered as numbers instead of strings
    pub large_numbers_as_numbers: bool,
}

impl From<&ConfigureOptions> for TypeOptions {
    fn from(options: &ConfigureOptions) -> Self {
        Self {
            large_numbers_as_numbers: options.large_numbers_output.as_deref() == Some("numbers"),
        }
    }
}

/// The five connection parameters, validated
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionTarget {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    password: String,
}

impl ConnectionTarget {
    pub fn from_credentials(credentials: &CredentialSet) -> Result<Self, NodeError> {
        let port = u16::try_from(credentials.port)
            .map_err(|_| NodeError::Credentials(format!("Invalid port: {}", credentials.port)))?;

        Ok(Self {
            host: credentials.host.clone(),
            port,
            database: credentials.database.clone(),
            user: credentials.user.clone(),
            password: credentials.password.clone(),
        })
    }

    /// Driver-level connection config
    pub fn pg_config(&self) -> PgConfig {
        let mut config = PgConfig::new();
        config
            .host(&self.host)
            .port(self.port)
            .dbname(&self.database)
            .user(&self.user)
            .password(&self.password);
        config
    }
}

impl std::fmt::Debug for ConnectionTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}:{}/{}", self.user, self.host, self.port, self.database)
    }
}

/// A configured, not yet connected database handle
#[derive(Clone)]
pub struct Database {
    target: ConnectionTarget,
    types: TypeOptions,
    driver: Arc<dyn Connector>,
}

impl Database {
    pub fn target(&self) -> &ConnectionTarget {
        &self.target
    }

    pub fn type_options(&self) -> TypeOptions {
        self.types
    }

    /// Open a fresh session; the caller owns it and must close it
    pub async fn connect(&self) -> Result<Box<dyn PgSession>, NodeError> {
        tracing::debug!("🔌 Connecting to {:?}", self.target);
        self.driver.connect(&self.target, self.types).await
    }
}

/// Build a database handle from credentials and options
pub fn configure_postgres(
    driver: &Arc<dyn Connector>,
    credentials: &CredentialSet,
    options: &ConfigureOptions,
) -> Result<Database, NodeError> {
    let target = ConnectionTarget::from_credentials(credentials)?;
    let types = TypeOptions::from(options);

    tracing::debug!("⚙️ Configured Postgres handle {:?} with {:?}", target, types);

    Ok(Database {
        target,
        types,
        driver: Arc::clone(driver),
    })
}
