//! HTTP server configuration types.

use serde::Deserialize;

/// Header carrying the user id verified by the upstream auth layer.
pub const DEFAULT_USER_HEADER: &str = "x-authenticated-user";

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to.
    pub host: String,
    /// Port for the HTTP API.
    pub port: u16,
    /// Request header holding the authenticated user id.
    pub user_header: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            user_header: DEFAULT_USER_HEADER.to_string(),
        }
    }
}

impl ServerConfig {
    /// `host:port` for binding.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
