//! Solana: SLIP-0010 ed25519 derivation along `m/44'/501'/{index}'/0'`,
//! base58 addresses, balances in lamports.

use ed25519_dalek::SigningKey;
use serde_json::{json, Value};
use zeroize::Zeroizing;

use super::{format_fixed, ChainId, ChainStrategy, Rounding};
use crate::error::{BalanceFetchError, DerivationError};

const HARDENED: u32 = 0x8000_0000;
const SEED_LEN: usize = 64;
const COIN_TYPE: u32 = 501;
const LAMPORTS_DECIMALS: u32 = 9;

#[derive(Debug, Clone, Copy, Default)]
pub struct SolanaStrategy;

impl ChainStrategy for SolanaStrategy {
    fn id(&self) -> ChainId {
        ChainId::Solana
    }

    fn derivation_path(&self, index: u32) -> String {
        format!("m/44'/{COIN_TYPE}'/{index}'/0'")
    }

    fn derive_address(&self, seed: &[u8], index: u32) -> Result<String, DerivationError> {
        if seed.len() != SEED_LEN {
            return Err(DerivationError::SeedLength {
                expected: SEED_LEN,
                actual: seed.len(),
            });
        }
        if index >= HARDENED {
            return Err(DerivationError::IndexOutOfRange(index));
        }

        // SLIP-0010 ed25519 only defines hardened children.
        let indices = [44, COIN_TYPE, index, 0].map(|segment| segment | HARDENED);
        let secret = Zeroizing::new(slip10_ed25519::derive_ed25519_private_key(seed, &indices));
        let signing_key = SigningKey::from_bytes(&secret);

        Ok(bs58::encode(signing_key.verifying_key().to_bytes()).into_string())
    }

    fn validate_address(&self, text: &str) -> Option<String> {
        let bytes = bs58::decode(text.trim()).into_vec().ok()?;
        if bytes.len() != 32 {
            return None;
        }
        Some(bs58::encode(bytes).into_string())
    }

    fn balance_request(&self, address: &str) -> (&'static str, Value) {
        ("getBalance", json!([address]))
    }

    fn parse_balance(&self, result: &Value) -> Result<u128, BalanceFetchError> {
        result
            .get("value")
            .and_then(Value::as_u64)
            .map(u128::from)
            .ok_or_else(|| BalanceFetchError::Malformed(format!("expected {{value: u64}}, got {result}")))
    }

    fn format_balance(&self, base_units: u128) -> String {
        format_fixed(base_units, LAMPORTS_DECIMALS, Rounding::HalfUp)
    }
}
