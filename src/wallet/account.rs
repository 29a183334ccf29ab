use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::chain::ChainId;
use crate::wallet::keypair::DerivedAccount;

/// Balance shown before the first fetch completes or after a fetch fails.
pub const FALLBACK_BALANCE: &str = "0.0000";

/// Placeholder rendered while a fetch is outstanding.
pub const LOADING_PLACEHOLDER: &str = "...";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoadingState {
    Loading,
    Ready,
}

/// One row of the wallet: a derived or watched address and its balance.
///
/// Only `balance` and `loading_state` change after creation, and only through
/// the owning session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountRecord {
    pub id: Uuid,
    pub index: u32,
    pub public_key: String,
    pub label: String,
    pub balance: String,
    pub loading_state: LoadingState,
    pub is_watched: bool,
    pub chain: ChainId,
    pub derivation_path: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(skip)]
    pub(crate) fetch_ticket: u64,
}

impl AccountRecord {
    /// Record for an account derived from the session mnemonic
    pub fn derived(account: DerivedAccount) -> Self {
        Self {
            id: Uuid::new_v4(),
            index: account.index,
            label: format!("Account {}", account.index + 1),
            public_key: account.public_key,
            balance: FALLBACK_BALANCE.to_string(),
            loading_state: LoadingState::Loading,
            is_watched: false,
            chain: account.chain,
            derivation_path: Some(account.derivation_path),
            created_at: Utc::now(),
            fetch_ticket: 0,
        }
    }

    /// Create a watch-only record (no private key)
    pub fn watched(chain: ChainId, public_key: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            index: 0,
            public_key,
            label: "Watched Wallet".to_string(),
            balance: FALLBACK_BALANCE.to_string(),
            loading_state: LoadingState::Loading,
            is_watched: true,
            chain,
            derivation_path: None,
            created_at: Utc::now(),
            fetch_ticket: 0,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.loading_state == LoadingState::Loading
    }

    /// Mark the record LOADING and hand out the ticket the next result must
    /// carry. Earlier tickets stop being accepted.
    pub(crate) fn begin_fetch(&mut self) -> u64 {
        self.fetch_ticket += 1;
        self.loading_state = LoadingState::Loading;
        self.fetch_ticket
    }

    /// Apply a fetch result if it answers the latest request.
    pub(crate) fn complete_fetch(&mut self, ticket: u64, balance: String) -> bool {
        if ticket != self.fetch_ticket {
            return false;
        }
        self.balance = balance;
        self.loading_state = LoadingState::Ready;
        true
    }

    /// Balance as the dashboard shows it
    pub fn display_balance(&self) -> &str {
        match self.loading_state {
            LoadingState::Loading => LOADING_PLACEHOLDER,
            LoadingState::Ready => &self.balance,
        }
    }

    /// Get shortened address for display (first 4 and last 4 chars)
    pub fn short_address(&self) -> String {
        let chars: Vec<char> = self.public_key.chars().collect();
        if chars.len() > 8 {
            let head: String = chars[..4].iter().collect();
            let tail: String = chars[chars.len() - 4..].iter().collect();
            format!("{head}...{tail}")
        } else {
            self.public_key.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn derived(index: u32) -> AccountRecord {
        AccountRecord::derived(DerivedAccount {
            chain: ChainId::Solana,
            index,
            public_key: "HAgk14JpMQLgt6rVgv7cBQFJWFto5Dqxi472uT3DKpqk".to_string(),
            derivation_path: format!("m/44'/501'/{index}'/0'"),
        })
    }

    #[test]
    fn test_derived_record_defaults() {
        let record = derived(2);
        assert_eq!(record.label, "Account 3");
        assert_eq!(record.balance, FALLBACK_BALANCE);
        assert!(record.is_loading());
        assert!(!record.is_watched);
        assert_eq!(record.display_balance(), LOADING_PLACEHOLDER);
    }

    #[test]
    fn test_watched_record() {
        let record = AccountRecord::watched(ChainId::Ethereum, "0xabc".to_string());
        assert_eq!(record.index, 0);
        assert_eq!(record.label, "Watched Wallet");
        assert!(record.is_watched);
        assert!(record.derivation_path.is_none());
    }

    #[test]
    fn test_stale_ticket_is_ignored() {
        let mut record = derived(0);
        let first = record.begin_fetch();
        let second = record.begin_fetch();

        assert!(!record.complete_fetch(first, "9.0000".to_string()));
        assert!(record.is_loading());

        assert!(record.complete_fetch(second, "1.2500".to_string()));
        assert_eq!(record.display_balance(), "1.2500");
        assert_eq!(record.loading_state, LoadingState::Ready);
    }

    #[test]
    fn test_short_address() {
        assert_eq!(derived(0).short_address(), "HAgk...Kpqk");
        let short = AccountRecord::watched(ChainId::Solana, "abc".to_string());
        assert_eq!(short.short_address(), "abc");
    }
}
