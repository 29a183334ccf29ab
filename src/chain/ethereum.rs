//! Ethereum: BIP-32 secp256k1 derivation along `m/44'/60'/0'/0/{index}`,
//! EIP-55 checksummed addresses, balances in wei.

use std::str::FromStr;

use bitcoin::bip32::{DerivationPath, Xpriv};
use bitcoin::secp256k1::Secp256k1;
use bitcoin::NetworkKind;
use serde_json::{json, Value};
use tiny_keccak::{Hasher, Keccak};

use super::{format_fixed, ChainId, ChainStrategy, Rounding};
use crate::error::{BalanceFetchError, DerivationError};

const SEED_LEN: usize = 64;
const WEI_DECIMALS: u32 = 18;
const HARDENED: u32 = 0x8000_0000;

#[derive(Debug, Clone, Copy, Default)]
pub struct EthereumStrategy;

impl ChainStrategy for EthereumStrategy {
    fn id(&self) -> ChainId {
        ChainId::Ethereum
    }

    fn derivation_path(&self, index: u32) -> String {
        format!("m/44'/60'/0'/0/{index}")
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

        let path_text = self.derivation_path(index);
        let rejected = |reason: String| DerivationError::Path {
            path: path_text.clone(),
            reason,
        };

        let path = DerivationPath::from_str(&path_text).map_err(|e| rejected(e.to_string()))?;
        let secp = Secp256k1::new();
        let master = Xpriv::new_master(NetworkKind::Main, seed).map_err(|e| rejected(e.to_string()))?;
        let child = master
            .derive_priv(&secp, &path)
            .map_err(|e| rejected(e.to_string()))?;

        let uncompressed = child.private_key.public_key(&secp).serialize_uncompressed();
        let hash = keccak256(&uncompressed[1..]);

        Ok(to_checksum_address(&hash[12..]))
    }

    fn validate_address(&self, text: &str) -> Option<String> {
        let trimmed = text.trim();
        // The 0x prefix is optional on input; output always carries it.
        let hex_part = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);
        if hex_part.len() != 40 || !hex_part.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }

        let bytes = hex::decode(hex_part.to_ascii_lowercase()).ok()?;
        let checksummed = to_checksum_address(&bytes);

        let lower = hex_part.to_ascii_lowercase();
        let upper = hex_part.to_ascii_uppercase();
        if hex_part == lower || hex_part == upper || checksummed[2..] == *hex_part {
            Some(checksummed)
        } else {
            None
        }
    }

    fn balance_request(&self, address: &str) -> (&'static str, Value) {
        ("eth_getBalance", json!([address, "latest"]))
    }

    fn parse_balance(&self, result: &Value) -> Result<u128, BalanceFetchError> {
        let quantity = result
            .as_str()
            .ok_or_else(|| BalanceFetchError::Malformed(format!("expected hex quantity, got {result}")))?;
        let digits = quantity
            .strip_prefix("0x")
            .ok_or_else(|| BalanceFetchError::Malformed(format!("missing 0x prefix: {quantity}")))?;
        if digits.is_empty() {
            return Ok(0);
        }
        u128::from_str_radix(digits, 16)
            .map_err(|e| BalanceFetchError::Malformed(format!("bad quantity {quantity}: {e}")))
    }

    fn format_balance(&self, base_units: u128) -> String {
        format_fixed(base_units, WEI_DECIMALS, Rounding::Truncate)
    }
}

fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    hasher.update(data);
    let mut out = [0u8; 32];
    hasher.finalize(&mut out);
    out
}

/// EIP-55 mixed-case encoding of a 20-byte address.
fn to_checksum_address(address: &[u8]) -> String {
    let lower = hex::encode(address);
    let hash = keccak256(lower.as_bytes());

    let mut result = String::with_capacity(42);
    result.push_str("0x");
    for (i, ch) in lower.chars().enumerate() {
        let byte = hash[i / 2];
        let nibble = if i % 2 == 0 { byte >> 4 } else { byte & 0x0f };
        if ch.is_ascii_alphabetic() && nibble >= 8 {
            result.push(ch.to_ascii_uppercase());
        } else {
            result.push(ch);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wallet::mnemonic::MnemonicPhrase;

    const TEST_PHRASE: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    fn test_seed() -> Vec<u8> {
        MnemonicPhrase::from_phrase(TEST_PHRASE).unwrap().to_seed().as_bytes().to_vec()
    }

    #[test]
    fn test_known_addresses() {
        let seed = test_seed();
        assert_eq!(
            EthereumStrategy.derive_address(&seed, 0).unwrap(),
            "0x9858EfFD232B4033E47d90003D41EC34EcaEda94"
        );
        assert_eq!(
            EthereumStrategy.derive_address(&seed, 1).unwrap(),
            "0x6Fac4D18c912343BF86fa7049364Dd4E424Ab9C0"
        );
    }

    #[test]
    fn test_rejects_short_seed() {
        assert!(matches!(
            EthereumStrategy.derive_address(&[7u8; 16], 0),
            Err(DerivationError::SeedLength { actual: 16, .. })
        ));
    }

    #[test]
    fn test_validate_address() {
        let checksummed = "0x9858EfFD232B4033E47d90003D41EC34EcaEda94";
        assert_eq!(
            EthereumStrategy.validate_address(checksummed),
            Some(checksummed.to_string())
        );
        assert_eq!(
            EthereumStrategy.validate_address(&checksummed.to_ascii_lowercase()),
            Some(checksummed.to_string())
        );
        // One letter flipped breaks the checksum.
        assert_eq!(
            EthereumStrategy.validate_address("0x9858efFD232B4033E47d90003D41EC34EcaEda94"),
            None
        );
        assert_eq!(EthereumStrategy.validate_address("0xInvalidAddress"), None);
        assert_eq!(EthereumStrategy.validate_address("0x9858effd"), None);
    }

    #[test]
    fn test_validate_address_without_prefix() {
        let checksummed = "0x9858EfFD232B4033E47d90003D41EC34EcaEda94";
        assert_eq!(
            EthereumStrategy.validate_address("9858effd232b4033e47d90003d41ec34ecaeda94"),
            Some(checksummed.to_string())
        );
        assert_eq!(
            EthereumStrategy.validate_address(" 9858EfFD232B4033E47d90003D41EC34EcaEda94 "),
            Some(checksummed.to_string())
        );
        assert_eq!(
            EthereumStrategy.validate_address("9858efFD232B4033E47d90003D41EC34EcaEda94"),
            None
        );
        assert_eq!(EthereumStrategy.validate_address("0x0x9858effd232b4033e47d90003d41ec34ecaeda"), None);
    }

    #[test]
    fn test_balance_parsing_and_truncation() {
        let wei = EthereumStrategy.parse_balance(&json!("0x1bc16d674ec80000")).unwrap();
        assert_eq!(wei, 2_000_000_000_000_000_000);
        assert_eq!(EthereumStrategy.format_balance(wei), "2.0000");
        assert_eq!(EthereumStrategy.parse_balance(&json!("0x0")).unwrap(), 0);
        assert_eq!(
            EthereumStrategy.format_balance(999_999_999_999_999_999),
            "0.9999"
        );
        assert!(EthereumStrategy.parse_balance(&json!(12)).is_err());
        assert!(EthereumStrategy.parse_balance(&json!("0xzz")).is_err());
    }
}
