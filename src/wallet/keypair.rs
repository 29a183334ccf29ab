use std::sync::Arc;

use tracing::debug;

use crate::chain::{ChainId, ChainStrategy};
use crate::error::DerivationError;
use crate::wallet::mnemonic::Seed;

/// Public side of an account derived from a seed. The private key is never
/// kept past the derivation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedAccount {
    pub chain: ChainId,
    pub index: u32,
    pub public_key: String,
    pub derivation_path: String,
}

/// Derives accounts for one chain by delegating to its strategy.
#[derive(Clone)]
pub struct AccountDeriver {
    strategy: Arc<dyn ChainStrategy>,
}

impl AccountDeriver {
    pub fn new(strategy: Arc<dyn ChainStrategy>) -> Self {
        Self { strategy }
    }

    pub fn chain(&self) -> ChainId {
        self.strategy.id()
    }

    pub fn derive(&self, seed: &Seed, index: u32) -> Result<DerivedAccount, DerivationError> {
        self.derive_raw(seed.as_bytes(), index)
    }

    /// Same as [`derive`](Self::derive) for seeds that are not yet wrapped.
    pub fn derive_raw(&self, seed: &[u8], index: u32) -> Result<DerivedAccount, DerivationError> {
        let public_key = self.strategy.derive_address(seed, index)?;
        let derivation_path = self.strategy.derivation_path(index);
        debug!(chain = %self.chain(), index, path = %derivation_path, "derived account");

        Ok(DerivedAccount {
            chain: self.chain(),
            index,
            public_key,
            derivation_path,
        })
    }

    /// Derive indices `0..count`
    pub fn derive_many(&self, seed: &Seed, count: u32) -> Result<Vec<DerivedAccount>, DerivationError> {
        (0..count).map(|index| self.derive(seed, index)).collect()
    }
}

impl std::fmt::Debug for AccountDeriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountDeriver")
            .field("chain", &self.chain())
            .finish()
    }
}
