//! API server implementation.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

use loupe_store::StoreRegistry;

use crate::error::{ApiError, Result};
use crate::routes::{create_router, AppState};

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen host.
    #[serde(default = "default_host")]
    pub host: String,

    /// Listen port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Data root; index stores live under `<path>/.loupe/`.
    #[serde(default = "default_path")]
    pub path: PathBuf,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    9200
}

fn default_path() -> PathBuf {
    PathBuf::from(".")
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            path: default_path(),
        }
    }
}

/// Loupe API server.
pub struct Server {
    config: ServerConfig,
}

impl Server {
    /// Create a new server instance.
    pub fn new(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Bind and serve until the process is stopped.
    pub async fn serve(self) -> Result<()> {
        let registry = StoreRegistry::new(self.config.path.clone());
        let router = create_router(AppState::new(registry));

        let addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| ApiError::Internal(format!("failed to bind {addr}: {e}")))?;

        tracing::info!(
            "serving index emulation on http://{addr} (data root {})",
            self.config.path.display()
        );
        axum::serve(listener, router)
            .await
            .map_err(|e| ApiError::Internal(format!("server error: {e}")))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 9200);
        assert_eq!(config.path, PathBuf::from("."));
    }

    #[test]
    fn test_config_from_toml_with_defaults() {
        let config: ServerConfig = toml::from_str("port = 3331").unwrap();
        assert_eq!(config.port, 3331);
        assert_eq!(config.host, "127.0.0.1");
    }
}
