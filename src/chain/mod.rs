//! Supported chains and the per-chain strategies behind them.
//!
//! A [`ChainRegistry`] holds one immutable [`ChainDescriptor`] per chain
//! together with the [`ChainStrategy`] that knows how to derive, validate and
//! price addresses on it. Adding a chain means adding one strategy and one
//! registration; nothing else branches on the chain id.

pub mod ethereum;
pub mod solana;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::WalletConfig;
use crate::error::{BalanceFetchError, DerivationError};

pub use ethereum::EthereumStrategy;
pub use solana::SolanaStrategy;

/// Number of fractional digits shown for every native balance.
pub const DISPLAY_DECIMALS: u32 = 4;

/// Identifier of a supported chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainId {
    Solana,
    Ethereum,
}

impl ChainId {
    pub const ALL: [ChainId; 2] = [ChainId::Solana, ChainId::Ethereum];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChainId::Solana => "solana",
            ChainId::Ethereum => "ethereum",
        }
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChainId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "solana" | "sol" => Ok(ChainId::Solana),
            "ethereum" | "eth" => Ok(ChainId::Ethereum),
            other => Err(format!("unknown chain '{other}'")),
        }
    }
}

/// Static configuration of one chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainDescriptor {
    pub id: ChainId,
    pub display_name: String,
    pub rpc_endpoint: String,
    pub native_symbol: String,
    pub token_reference: Option<String>,
}

impl ChainDescriptor {
    pub fn solana_devnet() -> Self {
        Self {
            id: ChainId::Solana,
            display_name: "SOLANA".to_string(),
            rpc_endpoint: "https://api.devnet.solana.com".to_string(),
            native_symbol: "SOL".to_string(),
            token_reference: Some("4zMMC9MSDR3xyvRestbtz5Wyd4G7SUnSpxB3S6B3D64S".to_string()),
        }
    }

    pub fn ethereum_goerli() -> Self {
        Self {
            id: ChainId::Ethereum,
            display_name: "ETHEREUM".to_string(),
            rpc_endpoint: "https://rpc.ankr.com/eth_goerli".to_string(),
            native_symbol: "ETH".to_string(),
            token_reference: None,
        }
    }
}

/// Everything that differs between chains.
///
/// Implementations must be pure: the same seed and index always produce the
/// same address, and nothing here touches the network.
pub trait ChainStrategy: Send + Sync {
    fn id(&self) -> ChainId;

    /// Human-readable HD path for `index`.
    fn derivation_path(&self, index: u32) -> String;

    /// Derive the chain-native address for `index` from a 64-byte seed.
    fn derive_address(&self, seed: &[u8], index: u32) -> Result<String, DerivationError>;

    /// Returns the canonical form of `text` if it is a valid address on this
    /// chain.
    fn validate_address(&self, text: &str) -> Option<String>;

    /// JSON-RPC method and params asking for the native balance of `address`.
    fn balance_request(&self, address: &str) -> (&'static str, Value);

    /// Extract the base-unit amount from a JSON-RPC `result`.
    fn parse_balance(&self, result: &Value) -> Result<u128, BalanceFetchError>;

    /// Render base units as a display string with [`DISPLAY_DECIMALS`] digits.
    fn format_balance(&self, base_units: u128) -> String;
}

/// How the digits past [`DISPLAY_DECIMALS`] are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Rounding {
    HalfUp,
    Truncate,
}

pub(crate) fn format_fixed(base_units: u128, decimals: u32, rounding: Rounding) -> String {
    let scale = 10u128.pow(decimals.saturating_sub(DISPLAY_DECIMALS));
    let mut ticks = base_units / scale;
    if rounding == Rounding::HalfUp && base_units % scale >= scale / 2 && scale > 1 {
        ticks += 1;
    }
    format!("{}.{:04}", ticks / 10_000, ticks % 10_000)
}

/// A registered chain: its descriptor plus its strategy.
#[derive(Clone)]
pub struct ChainEntry {
    pub descriptor: ChainDescriptor,
    pub strategy: Arc<dyn ChainStrategy>,
}

impl fmt::Debug for ChainEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainEntry")
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}

/// Lookup table of supported chains, built once at start-up.
#[derive(Debug, Clone, Default)]
pub struct ChainRegistry {
    entries: BTreeMap<ChainId, ChainEntry>,
}

impl ChainRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Built-in chains with their default endpoints.
    pub fn builtin() -> Self {
        Self::empty()
            .register(ChainDescriptor::solana_devnet(), Arc::new(SolanaStrategy))
            .register(ChainDescriptor::ethereum_goerli(), Arc::new(EthereumStrategy))
    }

    /// Built-in chains with endpoint overrides from `config` applied.
    pub fn from_config(config: &WalletConfig) -> Self {
        let mut registry = Self::builtin();
        for (id, endpoint) in &config.rpc_endpoints {
            if let Some(entry) = registry.entries.get_mut(id) {
                entry.descriptor.rpc_endpoint = endpoint.clone();
            }
        }
        registry
    }

    #[must_use]
    pub fn register(mut self, descriptor: ChainDescriptor, strategy: Arc<dyn ChainStrategy>) -> Self {
        self.entries.insert(
            descriptor.id,
            ChainEntry {
                descriptor,
                strategy,
            },
        );
        self
    }

    pub fn get(&self, id: ChainId) -> Option<&ChainEntry> {
        self.entries.get(&id)
    }

    pub fn descriptor(&self, id: ChainId) -> Option<&ChainDescriptor> {
        self.get(id).map(|entry| &entry.descriptor)
    }

    pub fn strategy(&self, id: ChainId) -> Option<Arc<dyn ChainStrategy>> {
        self.get(id).map(|entry| Arc::clone(&entry.strategy))
    }

    pub fn contains(&self, id: ChainId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn chains(&self) -> impl Iterator<Item = &ChainDescriptor> {
        self.entries.values().map(|entry| &entry.descriptor)
    }
}
