pub mod account;
pub mod keypair;
pub mod mnemonic;
pub mod rpc;

pub use account::{AccountRecord, LoadingState, FALLBACK_BALANCE};
pub use keypair::{AccountDeriver, DerivedAccount};
pub use mnemonic::{generate_mnemonic, normalize, validate_mnemonic, MnemonicPhrase, Seed};
pub use rpc::{BalanceFetcher, JsonRpcClient};
