use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::chain::{ChainDescriptor, ChainId};
use crate::wallet::{AccountRecord, MnemonicPhrase};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionMode {
    /// No mnemonic and no watch target.
    Empty,
    /// Mnemonic set, at least one derived account.
    Active,
    /// Single watched address, no key material.
    Watch,
}

#[derive(Clone, Debug, Serialize)]
pub struct Notification {
    pub id: Uuid,
    pub message: String,
    pub kind: NotificationKind,
    pub timestamp: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum NotificationKind {
    Success,
    Error,
    Warning,
    Info,
}

/// Mutable state of one wallet session. Owned by
/// [`WalletSession`](super::WalletSession); never shared.
#[derive(Debug)]
pub struct SessionState {
    /// Changes every time the account list is replaced wholesale; fetch
    /// results carrying an older id are dropped.
    pub(crate) session_id: Uuid,
    pub(crate) mnemonic: Option<MnemonicPhrase>,
    pub(crate) active_chain: ChainId,
    pub(crate) is_watch_only: bool,
    pub(crate) accounts: Vec<AccountRecord>,
    pub(crate) notifications: VecDeque<Notification>,
    max_notifications: usize,
}

impl SessionState {
    pub fn new(active_chain: ChainId, max_notifications: usize) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            mnemonic: None,
            active_chain,
            is_watch_only: false,
            accounts: Vec::new(),
            notifications: VecDeque::new(),
            max_notifications,
        }
    }

    pub fn mode(&self) -> SessionMode {
        if self.is_watch_only {
            SessionMode::Watch
        } else if self.mnemonic.is_some() {
            SessionMode::Active
        } else {
            SessionMode::Empty
        }
    }

    /// Drop key material and accounts, keeping the chain and notices.
    pub(crate) fn reset(&mut self) {
        self.session_id = Uuid::new_v4();
        self.mnemonic = None;
        self.is_watch_only = false;
        self.accounts.clear();
    }

    /// Start over with a mnemonic (ACTIVE, no accounts yet).
    pub(crate) fn replace_with_mnemonic(&mut self, mnemonic: MnemonicPhrase) {
        self.reset();
        self.mnemonic = Some(mnemonic);
    }

    /// Start over watching a single address.
    pub(crate) fn replace_with_watched(&mut self, record: AccountRecord) {
        self.reset();
        self.is_watch_only = true;
        self.accounts.push(record);
    }

    pub(crate) fn record_mut(&mut self, id: Uuid) -> Option<&mut AccountRecord> {
        self.accounts.iter_mut().find(|record| record.id == id)
    }

    pub fn add_notification(&mut self, message: String, kind: NotificationKind) {
        let notification = Notification {
            id: Uuid::new_v4(),
            message,
            kind,
            timestamp: Utc::now(),
        };
        self.notifications.push_back(notification);

        while self.notifications.len() > self.max_notifications {
            self.notifications.pop_front();
        }
    }

    pub(crate) fn snapshot(&self, chain: ChainDescriptor) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.session_id,
            mode: self.mode(),
            chain,
            seed_words: self.mnemonic.as_ref().map(MnemonicPhrase::words),
            is_watch_only: self.is_watch_only,
            accounts: self.accounts.clone(),
            notifications: self.notifications.iter().cloned().collect(),
        }
    }
}

/// Read-only copy of the session handed to the presentation layer after
/// every mutation.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub session_id: Uuid,
    pub mode: SessionMode,
    pub chain: ChainDescriptor,
    /// Backup words in order; `None` in EMPTY and WATCH.
    #[serde(skip)]
    pub seed_words: Option<Vec<String>>,
    pub is_watch_only: bool,
    pub accounts: Vec<AccountRecord>,
    pub notifications: Vec<Notification>,
}

impl SessionSnapshot {
    pub fn is_loading(&self) -> bool {
        self.accounts.iter().any(AccountRecord::is_loading)
    }

    pub fn latest_notification(&self) -> Option<&Notification> {
        self.notifications.last()
    }
}
