//! Loupe CLI
//!
//! Launches the local search-index emulator: an HTTP server speaking the
//! hosted service's `/1/indexes/...` REST surface over on-disk stores.

#![forbid(unsafe_code)]

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use loupe_api::{Server, ServerConfig};

/// Local search-index service emulator
#[derive(Parser, Debug)]
#[command(name = "loupe")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen host
    #[arg(long, env = "LOUPE_HOST")]
    host: Option<String>,

    /// Listen port
    #[arg(short, long, env = "LOUPE_PORT")]
    port: Option<u16>,

    /// Data root; index stores live under <path>/.loupe/
    #[arg(long, env = "LOUPE_PATH")]
    path: Option<PathBuf>,
}

impl Args {
    /// Load the base config and apply command-line overrides.
    fn into_config(self) -> Result<ServerConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read config {}", path.display()))?;
                toml::from_str(&raw)
                    .with_context(|| format!("failed to parse config {}", path.display()))?
            }
            None => ServerConfig::default(),
        };

        if let Some(host) = self.host {
            config.host = host;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(path) = self.path {
            config.path = path;
        }

        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Args::parse().into_config()?;
    Server::new(config).serve().await?;

    Ok(())
}
