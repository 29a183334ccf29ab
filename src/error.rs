use thiserror::Error;

use crate::chain::ChainId;

/// Failures reported back to whoever issued a session command.
///
/// None of these reset the session: the caller shows inline feedback and the
/// previous state stays in place.
#[derive(Debug, Error)]
pub enum WalletError {
    #[error("invalid mnemonic phrase")]
    InvalidMnemonic,

    #[error("invalid {chain} address: {address}")]
    InvalidAddress { chain: ChainId, address: String },

    #[error(transparent)]
    Derivation(#[from] DerivationError),

    #[error("cannot add accounts to a watch-only wallet")]
    WatchOnlyAccountLimit,

    #[error("no wallet is active")]
    NoActiveWallet,

    #[error("{0} requires explicit confirmation")]
    ConfirmationRequired(&'static str),

    #[error("chain {0} is not registered")]
    UnsupportedChain(ChainId),

    #[error("configuration error: {0}")]
    Config(String),
}

/// HD derivation failure for a single account.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DerivationError {
    #[error("seed must be {expected} bytes, got {actual}")]
    SeedLength { expected: usize, actual: usize },

    #[error("account index {0} is out of range")]
    IndexOutOfRange(u32),

    #[error("derivation path {path} rejected: {reason}")]
    Path { path: String, reason: String },
}

/// Why a balance query failed. Absorbed by the fetcher, never returned to a
/// session caller.
#[derive(Debug, Error)]
pub enum BalanceFetchError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("endpoint answered HTTP {0}")]
    Status(u16),

    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("malformed rpc response: {0}")]
    Malformed(String),

    #[error("chain {0} is not registered")]
    UnknownChain(ChainId),
}

pub type Result<T> = std::result::Result<T, WalletError>;
