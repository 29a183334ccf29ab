use bip39::{Language, Mnemonic};
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::WalletError;

/// Bytes of entropy behind a freshly generated phrase (12 words).
pub const ENTROPY_BYTES: usize = 16;

/// A validated BIP39 mnemonic phrase
#[derive(Clone, PartialEq)]
pub struct MnemonicPhrase {
    mnemonic: Mnemonic,
}

impl MnemonicPhrase {
    /// Parse user input. The text is normalized first, so surrounding
    /// whitespace and capitals are accepted.
    pub fn from_phrase(phrase: &str) -> Result<Self, WalletError> {
        let mnemonic = Mnemonic::parse_in_normalized(Language::English, &normalize(phrase))
            .map_err(|_| WalletError::InvalidMnemonic)?;

        Ok(Self { mnemonic })
    }

    /// Get the mnemonic phrase as a string
    pub fn phrase(&self) -> String {
        self.mnemonic.to_string()
    }

    /// Get the word list as a vector
    pub fn words(&self) -> Vec<String> {
        self.mnemonic.words().map(str::to_string).collect()
    }

    pub fn word_count(&self) -> usize {
        self.mnemonic.word_count()
    }

    /// BIP39 seed with an empty passphrase.
    pub fn to_seed(&self) -> Seed {
        Seed(self.mnemonic.to_seed(""))
    }
}

impl std::fmt::Debug for MnemonicPhrase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MnemonicPhrase")
            .field("words", &self.word_count())
            .finish_non_exhaustive()
    }
}

/// 64-byte BIP39 seed, wiped on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Seed([u8; 64]);

impl Seed {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Debug for Seed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Seed(..)")
    }
}

/// Generate a new 12-word phrase from 16 bytes of OS entropy.
pub fn generate_mnemonic() -> Result<MnemonicPhrase, WalletError> {
    let mut entropy = [0u8; ENTROPY_BYTES];
    OsRng.fill_bytes(&mut entropy);

    let mnemonic = Mnemonic::from_entropy_in(Language::English, &entropy);
    entropy.zeroize();

    // 16 bytes is always a valid entropy length
    let mnemonic = mnemonic.map_err(|_| WalletError::InvalidMnemonic)?;
    Ok(MnemonicPhrase { mnemonic })
}

/// Trim, lowercase and collapse inner whitespace. Idempotent.
pub fn normalize(text: &str) -> String {
    text.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Validate a mnemonic phrase (word count, wordlist and checksum).
pub fn validate_mnemonic(phrase: &str) -> bool {
    Mnemonic::parse_in_normalized(Language::English, &normalize(phrase)).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_PHRASE: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    #[test]
    fn test_generate_mnemonic() {
        let mnemonic = generate_mnemonic().unwrap();
        assert_eq!(mnemonic.words().len(), 12);
        assert!(validate_mnemonic(&normalize(&mnemonic.phrase())));
    }

    #[test]
    fn test_generated_phrases_differ() {
        let a = generate_mnemonic().unwrap();
        let b = generate_mnemonic().unwrap();
        assert_ne!(a.phrase(), b.phrase());
    }

    #[test]
    fn test_validate_mnemonic() {
        assert!(validate_mnemonic(TEST_PHRASE));
        assert!(validate_mnemonic(&format!("  {}\n", TEST_PHRASE.to_uppercase())));
        assert!(!validate_mnemonic("not a real phrase"));
        assert!(!validate_mnemonic(""));
        // Valid words, wrong checksum.
        assert!(!validate_mnemonic(
            "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon"
        ));
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let messy = "  Abandon   ABOUT\tzoo ";
        let once = normalize(messy);
        assert_eq!(once, "abandon about zoo");
        assert_eq!(normalize(&once), once);
    }

    #[test]
    fn test_known_seed() {
        let mnemonic = MnemonicPhrase::from_phrase(TEST_PHRASE).unwrap();
        assert_eq!(
            hex::encode(mnemonic.to_seed().as_bytes()),
            "5eb00bbddcf069084889a8ab9155568165f5c453ccb85e70811aaed6f6da5fc1\
             9a5ac40b389cd370d086206dec8aa6c43daea6690f20ad3d8d48b2d2ce9e38e4"
        );
        assert_eq!(mnemonic.to_seed().as_bytes(), mnemonic.to_seed().as_bytes());
    }

    #[test]
    fn test_debug_hides_words() {
        let mnemonic = MnemonicPhrase::from_phrase(TEST_PHRASE).unwrap();
        let printed = format!("{mnemonic:?}");
        assert!(!printed.contains("abandon"));
        assert!(printed.contains("12"));
        assert!(!format!("{:?}", mnemonic.to_seed()).contains("5eb0"));
    }

    #[test]
    fn test_invalid_phrase_is_rejected() {
        assert!(matches!(
            MnemonicPhrase::from_phrase("not a real phrase"),
            Err(WalletError::InvalidMnemonic)
        ));
    }
}
