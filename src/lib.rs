//! Non-custodial wallet core for Solana and Ethereum.
//!
//! Derives accounts from a BIP39 phrase (or tracks a single watched address),
//! keeps them in an in-memory [`WalletSession`], and refreshes native
//! balances over each chain's JSON-RPC endpoint. Rendering is left to the
//! caller, which reads [`SessionSnapshot`]s and sends [`WalletCommand`]s.

pub mod app;
pub mod chain;
pub mod config;
pub mod error;
pub mod wallet;

pub use app::{SessionMode, SessionSnapshot, WalletCommand, WalletSession};
pub use chain::{ChainDescriptor, ChainId, ChainRegistry, ChainStrategy};
pub use config::WalletConfig;
pub use error::{BalanceFetchError, DerivationError, Result, WalletError};
