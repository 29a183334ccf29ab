use uuid::Uuid;

use crate::chain::ChainId;

/// Intents forwarded by the presentation layer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WalletCommand {
    Generate,
    Import(String),
    Watch(String),
    AddAccount,
    Refresh,
    /// `confirmed` carries the user's answer to the destructive-action prompt.
    Logout { confirmed: bool },
    SwitchChain(ChainId),
}

/// A finished balance fetch on its way back to the session.
///
/// The three identity fields must all still match when the update is
/// applied; anything else belongs to a superseded session or an older
/// refresh cycle and is dropped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BalanceUpdate {
    pub session_id: Uuid,
    pub record_id: Uuid,
    pub ticket: u64,
    pub balance: String,
}
