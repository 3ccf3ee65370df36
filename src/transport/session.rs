/// Driver seam and the tokio-postgres implementation
///
/// A `Connector` opens one `PgSession` per call. Sessions are never pooled:
/// the handler that opens one closes it before returning.

use crate::{
    error::NodeError,
    node::types::Record,
    transport::{
        configure::{ConnectionTarget, TypeOptions},
        values::{row_to_record, JsonParam},
    },
};
use async_trait::async_trait;
use serde_json::Value;
use tokio::task::JoinHandle;
use tokio_postgres::{types::ToSql, Client, NoTls, Statement};

/// Opens database sessions
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(
        &self,
        target: &ConnectionTarget,
        types: TypeOptions,
    ) -> Result<Box<dyn PgSession>, NodeError>;
}

/// An open database session
#[async_trait]
pub trait PgSession: Send {
    /// Run a statement and decode every returned row
    async fn query(&mut self, sql: &str, params: &[Value]) -> Result<Vec<Record>, NodeError>;

    /// Run a statement and return the affected row count
    async fn execute(&mut self, sql: &str, params: &[Value]) -> Result<u64, NodeError>;

    /// Release the session
    async fn close(self: Box<Self>);
}

/// Connector backed by a plain (non-TLS) tokio-postgres connection
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioPostgresConnector;

#[async_trait]
impl Connector for TokioPostgresConnector {
    async fn connect(
        &self,
        target: &ConnectionTarget,
        types: TypeOptions,
    ) -> Result<Box<dyn PgSession>, NodeError> {
        let (client, connection) = target
            .pg_config()
            .connect(NoTls)
            .await
            .map_err(|e| NodeError::Connect(error_message(&e)))?;

        // The connection future drives the socket until the client is dropped
        let driver = tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::warn!("⚠️ Postgres connection closed with error: {}", e);
            }
        });

        tracing::debug!("✅ Connected to {:?}", target);

        Ok(Box::new(TokioPostgresSession {
            client,
            driver,
            types,
        }))
    }
}

struct TokioPostgresSession {
    client: Client,
    driver: JoinHandle<()>,
    types: TypeOptions,
}

impl TokioPostgresSession {
    async fn prepare(&self, sql: &str, params: &[Value]) -> Result<Statement, NodeError> {
        tracing::debug!("📝 SQL: {} 🔗 params: {:?}", sql, params);

        self.client
            .prepare(sql)
            .await
            .map_err(|e| NodeError::Database(error_message(&e)))
    }
}

#[async_trait]
impl PgSession for TokioPostgresSession {
    async fn query(&mut self, sql: &str, params: &[Value]) -> Result<Vec<Record>, NodeError> {
        let statement = self.prepare(sql, params).await?;

        let bound: Vec<JsonParam<'_>> = params.iter().map(JsonParam).collect();
        let refs: Vec<&(dyn ToSql + Sync)> =
            bound.iter().map(|p| p as &(dyn ToSql + Sync)).collect();

        let rows = self
            .client
            .query(&statement, &refs)
            .await
            .map_err(|e| NodeError::Database(error_message(&e)))?;
        rows.iter()
            .map(|row| row_to_record(row, self.types))
            .collect()
    }

    async fn execute(&mut self, sql: &str, params: &[Value]) -> Result<u64, NodeError> {
        let statement = self.prepare(sql, params).await?;

        let bound: Vec<JsonParam<'_>> = params.iter().map(JsonParam).collect();
        let refs: Vec<&(dyn ToSql + Sync)> =
            bound.iter().map(|p| p as &(dyn ToSql + Sync)).collect();

        self.client
            .execute(&statement, &refs)
            .await
            .map_err(|e| NodeError::Database(error_message(&e)))
    }

    async fn close(self: Box<Self>) {
        let Self { client, driver, .. } = *self;
        drop(client);
        if let Err(e) = driver.await {
            tracing::warn!("⚠️ Postgres connection task failed: {}", e);
        }
        tracing::debug!("🔒 Postgres session closed");
    }
}

/// User-facing text of a driver error
///
/// Server errors report the server's message; everything else reports the
/// full error chain so OS-level causes (refused, DNS, timeout) stay visible.
pub fn error_message(error: &tokio_postgres::Error) -> String {
    if let Some(db) = error.as_db_error() {
        return db.message().to_string();
    }

    let mut message = error.to_string();
    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}
