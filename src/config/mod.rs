/// Configuration for the node host adapter
///
/// Only the HTTP surface is configurable; the node itself reads nothing from
/// the environment.

use serde::{Deserialize, Serialize};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server bind address (e.g., "0.0.0.0")
    pub host: String,
    /// Server port number
    pub port: u16,
}

impl Default for Config {
    /// Default configuration with ENV_VAR support for container deployment
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: std::env::var("CONVO_NODE_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: std::env::var("CONVO_NODE_PORT")
                    .ok()
                    .and_then(|port| port.parse().ok())
                    .unwrap_or(3005),
            },
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
