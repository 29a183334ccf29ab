//! Runtime configuration: RPC endpoint overrides and session defaults.
//!
//! Read from `<config dir>/multichain-wallet/config.json` when the file
//! exists, then patched from `MULTICHAIN_WALLET_*` environment variables.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::chain::ChainId;
use crate::error::WalletError;

pub const ENV_SOLANA_RPC: &str = "MULTICHAIN_WALLET_SOLANA_RPC";
pub const ENV_ETHEREUM_RPC: &str = "MULTICHAIN_WALLET_ETHEREUM_RPC";
pub const ENV_CHAIN: &str = "MULTICHAIN_WALLET_CHAIN";

const DEFAULT_MAX_NOTICES: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalletConfig {
    /// Endpoint overrides keyed by chain; unlisted chains keep their built-in
    /// endpoint.
    pub rpc_endpoints: BTreeMap<ChainId, String>,
    /// Chain selected when a session starts.
    pub default_chain: ChainId,
    /// Per-request timeout for balance queries. Absent means the HTTP
    /// client's own default.
    pub request_timeout_secs: Option<u64>,
    /// How many user-visible notices a session keeps.
    pub max_notices: usize,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            rpc_endpoints: BTreeMap::new(),
            default_chain: ChainId::Solana,
            request_timeout_secs: None,
            max_notices: DEFAULT_MAX_NOTICES,
        }
    }
}

impl WalletConfig {
    /// Get default config file path
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("multichain-wallet").join("config.json"))
    }

    /// Load from the default path (if any) and apply environment overrides.
    pub fn load() -> Result<Self, WalletError> {
        let mut config = match Self::default_path() {
            Some(path) if path.exists() => Self::from_file(&path)?,
            _ => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, WalletError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| WalletError::Config(format!("cannot read {}: {e}", path.display())))?;
        let config = serde_json::from_str(&content)
            .map_err(|e| WalletError::Config(format!("cannot parse {}: {e}", path.display())))?;
        debug!(path = %path.display(), "loaded wallet config");
        Ok(config)
    }

    /// Patch the config from a variable lookup (normally the process env).
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), WalletError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_SOLANA_RPC) {
            self.rpc_endpoints.insert(ChainId::Solana, url);
        }
        if let Some(url) = lookup(ENV_ETHEREUM_RPC) {
            self.rpc_endpoints.insert(ChainId::Ethereum, url);
        }
        if let Some(chain) = lookup(ENV_CHAIN) {
            self.default_chain = chain
                .parse()
                .map_err(|e| WalletError::Config(format!("{ENV_CHAIN}: {e}")))?;
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}
