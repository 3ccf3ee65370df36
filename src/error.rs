/// Error types surfaced by the node handlers
///
/// Every failure reaching the host runtime carries a human-readable message.
/// The HTTP host adapter maps each variant onto a status code.

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NodeError {
    /// User-facing operation failure raised by the node itself
    #[error("{message}")]
    Operation { node: String, message: String },

    /// Query failure reported by the database (message passed through as-is)
    #[error("{0}")]
    Database(String),

    /// Failure to establish a session
    #[error("{0}")]
    Connect(String),

    /// Credential lookup or decoding failure
    #[error("{0}")]
    Credentials(String),
}

impl NodeError {
    /// Build an operation error attributed to the given node
    pub fn operation(node: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Operation {
            node: node.into(),
            message: message.into(),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::Operation { .. } => "NodeOperationError",
            Self::Database(_) => "DatabaseError",
            Self::Connect(_) => "ConnectionError",
            Self::Credentials(_) => "CredentialsError",
        }
    }
}

impl IntoResponse for NodeError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            Self::Operation { .. } | Self::Credentials(_) => StatusCode::BAD_REQUEST,
            Self::Database(_) | Self::Connect(_) => StatusCode::BAD_GATEWAY,
        };

        let mut body = json!({
            "error": self.kind(),
            "message": self.to_string(),
        });
        if let Self::Operation { node, .. } = &self {
            body["node"] = json!(node);
        }

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operation_error_displays_only_the_message() {
        let err = NodeError::operation("Test Node", "something wrong");
        assert_eq!(err.to_string(), "something wrong");
    }

    #[test]
    fn status_codes_follow_error_class() {
        let op = NodeError::operation("n", "bad").into_response();
        assert_eq!(op.status(), StatusCode::BAD_REQUEST);

        let db = NodeError::Database("relation does not exist".into()).into_response();
        assert_eq!(db.status(), StatusCode::BAD_GATEWAY);
    }
}
