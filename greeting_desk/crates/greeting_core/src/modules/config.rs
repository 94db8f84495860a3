//! Per-network RPC endpoints and contract ids.
//!
//! Read from `network_config.toml`:
//!
//! ```toml
//! [testnet]
//! rpc_url = "https://rpc.testnet.near.org"
//! contract_id = "hello.sleet.testnet"
//!
//! [mainnet]
//! rpc_url = "https://rpc.mainnet.near.org"
//! contract_id = "hello.sleet.near"
//! http_timeout_secs = 30
//! ```

use crate::modules::error::CoreError;
use greeting_protocol::Network;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const CONFIG_ENV: &str = "GREETING_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "network_config.toml";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

impl From<ConfigError> for CoreError {
    fn from(err: ConfigError) -> Self {
        CoreError::Config(err.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub rpc_url: String,
    pub contract_id: String,
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
}

fn default_http_timeout_secs() -> u64 {
    DEFAULT_HTTP_TIMEOUT_SECS
}

impl NetworkConfig {
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs.clamp(1, 300))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GreetingConfig {
    pub testnet: NetworkConfig,
    pub mainnet: NetworkConfig,
}

impl Default for GreetingConfig {
    fn default() -> Self {
        Self {
            testnet: NetworkConfig {
                rpc_url: "https://rpc.testnet.near.org".to_string(),
                contract_id: "hello.sleet.testnet".to_string(),
                http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            },
            mainnet: NetworkConfig {
                rpc_url: "https://rpc.mainnet.near.org".to_string(),
                contract_id: "hello.sleet.near".to_string(),
                http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            },
        }
    }
}

impl GreetingConfig {
    pub fn network(&self, network: Network) -> &NetworkConfig {
        match network {
            Network::Testnet => &self.testnet,
            Network::Mainnet => &self.mainnet,
        }
    }

    fn network_mut(&mut self, network: Network) -> &mut NetworkConfig {
        match network {
            Network::Testnet => &mut self.testnet,
            Network::Mainnet => &mut self.mainnet,
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: GreetingConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Resolution order: explicit path, `GREETING_CONFIG`, `./network_config.toml`,
    /// built-in defaults. `GREETING_RPC_TESTNET` / `GREETING_RPC_MAINNET` override
    /// the resulting rpc urls.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let from_env = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        let path = explicit.map(Path::to_path_buf).or(from_env).or_else(|| {
            let local = PathBuf::from(DEFAULT_CONFIG_FILE);
            local.is_file().then_some(local)
        });

        let mut config = match path {
            Some(path) => {
                tracing::info!(path = %path.display(), "loading network config");
                Self::load(&path)?
            }
            None => {
                tracing::info!("no network config found, using built-in endpoints");
                Self::default()
            }
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        for network in Network::ALL {
            let key = format!("GREETING_RPC_{}", network.as_str().to_ascii_uppercase());
            if let Some(url) = lookup(&key).map(|s| s.trim().to_string()) {
                if !url.is_empty() {
                    tracing::debug!(%network, rpc_url = %url, "rpc url overridden from env");
                    self.network_mut(network).rpc_url = url;
                }
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for network in Network::ALL {
            let cfg = self.network(network);
            let url = url::Url::parse(&cfg.rpc_url).map_err(|e| {
                ConfigError::Invalid(format!("{network}.rpc_url {:?}: {e}", cfg.rpc_url))
            })?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(ConfigError::Invalid(format!(
                    "{network}.rpc_url must be http(s), got {}",
                    url.scheme()
                )));
            }
            if cfg.contract_id.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "{network}.contract_id is empty"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_public_rpc() {
        let config = GreetingConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.network(Network::Mainnet).contract_id, "hello.sleet.near");
        assert_eq!(config.testnet.http_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn parses_toml_with_default_timeout() {
        let config = GreetingConfig::from_toml_str(
            r#"
            [testnet]
            rpc_url = "http://127.0.0.1:3030"
            contract_id = "hello.test.near"

            [mainnet]
            rpc_url = "https://rpc.mainnet.near.org"
            contract_id = "hello.sleet.near"
            http_timeout_secs = 5
            "#,
        )
        .unwrap();
        assert_eq!(config.testnet.rpc_url, "http://127.0.0.1:3030");
        assert_eq!(config.testnet.http_timeout_secs, 30);
        assert_eq!(config.mainnet.http_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn rejects_bad_urls_and_empty_contracts() {
        let mut config = GreetingConfig::default();
        config.mainnet.rpc_url = "not a url".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = GreetingConfig::default();
        config.testnet.rpc_url = "ftp://rpc.testnet.near.org".to_string();
        assert!(config.validate().is_err());

        let mut config = GreetingConfig::default();
        config.testnet.contract_id = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_table_is_a_parse_error() {
        let err = GreetingConfig::from_toml_str("[testnet]\nrpc_url = \"http://x\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn env_overrides_replace_rpc_url() {
        let mut config = GreetingConfig::default();
        config.apply_overrides(|key| {
            (key == "GREETING_RPC_MAINNET").then(|| "http://localhost:3030".to_string())
        });
        assert_eq!(config.mainnet.rpc_url, "http://localhost:3030");
        assert_eq!(config.testnet.rpc_url, "https://rpc.testnet.near.org");
    }
}
