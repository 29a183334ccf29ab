use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::events::{BalanceUpdate, WalletCommand};
use super::state::{NotificationKind, SessionMode, SessionSnapshot, SessionState};
use crate::chain::{ChainDescriptor, ChainId, ChainRegistry};
use crate::config::WalletConfig;
use crate::error::{DerivationError, Result, WalletError};
use crate::wallet::mnemonic::generate_mnemonic;
use crate::wallet::{
    AccountDeriver, AccountRecord, BalanceFetcher, DerivedAccount, MnemonicPhrase, Seed, FALLBACK_BALANCE,
};

/// Everything a spawned fetch needs, captured before it leaves the session.
struct FetchJob {
    record_id: Uuid,
    ticket: u64,
    chain: ChainId,
    public_key: String,
}

/// Controller that owns the session state.
///
/// Every mutation goes through a method here and returns the resulting
/// [`SessionSnapshot`], which is also published to subscribers. Balance
/// fetches run as Tokio tasks and report back over a channel; results are
/// applied only by [`apply_pending`](Self::apply_pending) or
/// [`settle`](Self::settle), so the account list is never touched from a task.
///
/// Rejected actions return the error and also queue a notice. Outside a Tokio
/// runtime no fetch is started and new records settle at the fallback balance.
pub struct WalletSession {
    registry: Arc<ChainRegistry>,
    fetcher: Arc<BalanceFetcher>,
    chain: ChainDescriptor,
    state: SessionState,
    updates_tx: mpsc::UnboundedSender<BalanceUpdate>,
    updates_rx: mpsc::UnboundedReceiver<BalanceUpdate>,
    snapshots: watch::Sender<SessionSnapshot>,
}

impl WalletSession {
    /// Session over the built-in chains with `config` applied.
    pub fn new(config: &WalletConfig) -> Result<Self> {
        Self::with_registry(Arc::new(ChainRegistry::from_config(config)), config)
    }

    pub fn with_registry(registry: Arc<ChainRegistry>, config: &WalletConfig) -> Result<Self> {
        let active = config.default_chain;
        let chain = registry
            .descriptor(active)
            .cloned()
            .ok_or(WalletError::UnsupportedChain(active))?;
        let fetcher = Arc::new(BalanceFetcher::new(Arc::clone(&registry), config.request_timeout())?);
        let state = SessionState::new(active, config.max_notices);

        let (updates_tx, updates_rx) = mpsc::unbounded_channel();
        let (snapshots, _) = watch::channel(state.snapshot(chain.clone()));

        Ok(Self {
            registry,
            fetcher,
            chain,
            state,
            updates_tx,
            updates_rx,
            snapshots,
        })
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.subscribe()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.state.snapshot(self.chain.clone())
    }

    pub fn mode(&self) -> SessionMode {
        self.state.mode()
    }

    pub fn active_chain(&self) -> &ChainDescriptor {
        &self.chain
    }

    pub fn accounts(&self) -> &[AccountRecord] {
        &self.state.accounts
    }

    pub fn registry(&self) -> &ChainRegistry {
        &self.registry
    }

    /// Route a presentation-layer command to its operation.
    pub fn dispatch(&mut self, command: WalletCommand) -> Result<SessionSnapshot> {
        match command {
            WalletCommand::Generate => self.create_new(),
            WalletCommand::Import(text) => self.import(&text),
            WalletCommand::Watch(text) => self.watch(&text),
            WalletCommand::AddAccount => self.add_account(),
            WalletCommand::Refresh => Ok(self.refresh_all()),
            WalletCommand::Logout { confirmed } => self.logout(confirmed),
            WalletCommand::SwitchChain(id) => self.switch_chain(id),
        }
    }

    /// Generate a fresh phrase and derive account 0.
    ///
    /// The phrase is only ever held in memory: the caller must show
    /// `seed_words` from the returned snapshot so the user can back it up.
    pub fn create_new(&mut self) -> Result<SessionSnapshot> {
        let mnemonic = generate_mnemonic().map_err(|e| self.reject(e, NotificationKind::Error))?;
        self.start_with_mnemonic(mnemonic, "New wallet created")
    }

    /// Validate `text` and, if it is a valid phrase, derive account 0 under
    /// the active chain. On failure the phrase and accounts are untouched.
    pub fn import(&mut self, text: &str) -> Result<SessionSnapshot> {
        let mnemonic = MnemonicPhrase::from_phrase(text).map_err(|e| self.reject(e, NotificationKind::Error))?;
        self.start_with_mnemonic(mnemonic, "Wallet imported")
    }

    /// Track a single address without key material.
    pub fn watch(&mut self, text: &str) -> Result<SessionSnapshot> {
        let chain = self.state.active_chain;
        let Some(strategy) = self.registry.strategy(chain) else {
            return Err(self.reject(WalletError::UnsupportedChain(chain), NotificationKind::Error));
        };
        let Some(address) = strategy.validate_address(text) else {
            let error = WalletError::InvalidAddress {
                chain,
                address: text.trim().to_string(),
            };
            return Err(self.reject(error, NotificationKind::Error));
        };

        let record = AccountRecord::watched(chain, address);
        let record_id = record.id;
        let message = format!("Watching {}", record.short_address());
        self.state.replace_with_watched(record);
        self.state.add_notification(message, NotificationKind::Success);
        info!(%chain, session = %self.state.session_id, "watching address");

        if let Some(job) = self.begin_fetch(record_id) {
            self.spawn_fetch(job);
        }
        Ok(self.publish())
    }

    /// Derive the next sequential account. Rejected in WATCH and EMPTY.
    pub fn add_account(&mut self) -> Result<SessionSnapshot> {
        match self.state.mode() {
            SessionMode::Watch => {
                self.state.add_notification(
                    "You cannot add wallets in Watch-Only mode.".to_string(),
                    NotificationKind::Warning,
                );
                self.publish();
                return Err(WalletError::WatchOnlyAccountLimit);
            }
            SessionMode::Empty => {
                return Err(self.reject(WalletError::NoActiveWallet, NotificationKind::Warning));
            }
            SessionMode::Active => {}
        }

        let Some(seed) = self.state.mnemonic.as_ref().map(MnemonicPhrase::to_seed) else {
            return Err(self.reject(WalletError::NoActiveWallet, NotificationKind::Warning));
        };
        // Derive before pushing so a failure adds no partial record.
        let derived = u32::try_from(self.state.accounts.len())
            .map_err(|_| WalletError::from(DerivationError::IndexOutOfRange(u32::MAX)))
            .and_then(|index| self.derive_at(&seed, index))
            .map_err(|e| self.reject(e, NotificationKind::Error))?;
        let index = derived.index;

        let record = AccountRecord::derived(derived);
        let record_id = record.id;
        self.state.accounts.push(record);
        info!(chain = %self.chain.id, index, "added account");

        if let Some(job) = self.begin_fetch(record_id) {
            self.spawn_fetch(job);
        }
        Ok(self.publish())
    }

    /// Mark every account LOADING, then start one independent fetch each.
    pub fn refresh_all(&mut self) -> SessionSnapshot {
        let jobs: Vec<FetchJob> = self
            .state
            .accounts
            .iter_mut()
            .map(|record| FetchJob {
                record_id: record.id,
                ticket: record.begin_fetch(),
                chain: record.chain,
                public_key: record.public_key.clone(),
            })
            .collect();

        debug!(count = jobs.len(), "refreshing balances");
        for job in jobs {
            self.spawn_fetch(job);
        }
        self.publish()
    }

    /// Discard key material and accounts. Needs the user's confirmation.
    pub fn logout(&mut self, confirmed: bool) -> Result<SessionSnapshot> {
        if !confirmed {
            return Err(self.reject(WalletError::ConfirmationRequired("logout"), NotificationKind::Info));
        }
        self.state.reset();
        info!(session = %self.state.session_id, "logged out");
        Ok(self.publish())
    }

    /// Change the active chain. Existing accounts are dropped and nothing is
    /// re-derived; the user has to generate, import or watch again.
    pub fn switch_chain(&mut self, id: ChainId) -> Result<SessionSnapshot> {
        let Some(descriptor) = self.registry.descriptor(id).cloned() else {
            return Err(self.reject(WalletError::UnsupportedChain(id), NotificationKind::Error));
        };
        if id == self.chain.id {
            return Ok(self.snapshot());
        }

        self.state.reset();
        self.state.active_chain = id;
        self.chain = descriptor;
        info!(chain = %id, "switched chain");
        Ok(self.publish())
    }

    /// Apply every balance update that has already arrived.
    pub fn apply_pending(&mut self) -> SessionSnapshot {
        let mut changed = false;
        while let Ok(update) = self.updates_rx.try_recv() {
            changed |= self.apply_update(update);
        }
        if changed {
            self.publish()
        } else {
            self.snapshot()
        }
    }

    /// Wait until no account is LOADING, publishing after each applied
    /// update. A fetch that never returns keeps this waiting.
    pub async fn settle(&mut self) -> SessionSnapshot {
        self.apply_pending();
        while self.state.accounts.iter().any(AccountRecord::is_loading) {
            match self.updates_rx.recv().await {
                Some(update) => {
                    if self.apply_update(update) {
                        self.publish();
                    }
                }
                None => break,
            }
        }
        self.snapshot()
    }

    /// Returns whether the update still targeted a live record.
    pub(crate) fn apply_update(&mut self, update: BalanceUpdate) -> bool {
        if update.session_id != self.state.session_id {
            debug!(record = %update.record_id, "discarding balance for superseded session");
            return false;
        }
        let Some(record) = self.state.record_mut(update.record_id) else {
            debug!(record = %update.record_id, "discarding balance for unknown record");
            return false;
        };
        if !record.complete_fetch(update.ticket, update.balance) {
            debug!(record = %update.record_id, ticket = update.ticket, "discarding stale balance");
            return false;
        }
        true
    }

    fn start_with_mnemonic(&mut self, mnemonic: MnemonicPhrase, message: &str) -> Result<SessionSnapshot> {
        // Derive before touching state so a failure leaves the session as it was.
        let derived = self
            .derive_at(&mnemonic.to_seed(), 0)
            .map_err(|e| self.reject(e, NotificationKind::Error))?;

        self.state.replace_with_mnemonic(mnemonic);
        let record = AccountRecord::derived(derived);
        let record_id = record.id;
        self.state.accounts.push(record);
        self.state.add_notification(message.to_string(), NotificationKind::Success);
        info!(chain = %self.chain.id, session = %self.state.session_id, "wallet started");

        if let Some(job) = self.begin_fetch(record_id) {
            self.spawn_fetch(job);
        }
        Ok(self.publish())
    }

    fn derive_at(&self, seed: &Seed, index: u32) -> Result<DerivedAccount> {
        let chain = self.state.active_chain;
        let deriver = self
            .registry
            .strategy(chain)
            .map(AccountDeriver::new)
            .ok_or(WalletError::UnsupportedChain(chain))?;
        Ok(deriver.derive(seed, index)?)
    }

    /// Queue a notice for a rejected action and hand the error back.
    fn reject(&mut self, error: WalletError, kind: NotificationKind) -> WalletError {
        debug!(error = %error, "action rejected");
        self.state.add_notification(error.to_string(), kind);
        self.publish();
        error
    }

    fn begin_fetch(&mut self, record_id: Uuid) -> Option<FetchJob> {
        let record = self.state.record_mut(record_id)?;
        Some(FetchJob {
            record_id,
            ticket: record.begin_fetch(),
            chain: record.chain,
            public_key: record.public_key.clone(),
        })
    }

    fn spawn_fetch(&mut self, job: FetchJob) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!(record = %job.record_id, "no async runtime, balance not fetched");
            if let Some(record) = self.state.record_mut(job.record_id) {
                record.complete_fetch(job.ticket, FALLBACK_BALANCE.to_string());
            }
            return;
        };
        let fetcher = Arc::clone(&self.fetcher);
        let updates = self.updates_tx.clone();
        let session_id = self.state.session_id;

        runtime.spawn(async move {
            let balance = fetcher.fetch(job.chain, &job.public_key).await;
            // The session may be gone; nothing to deliver to then.
            let _ = updates.send(BalanceUpdate {
                session_id,
                record_id: job.record_id,
                ticket: job.ticket,
                balance,
            });
        });
    }

    fn publish(&self) -> SessionSnapshot {
        let snapshot = self.snapshot();
        self.snapshots.send_replace(snapshot.clone());
        snapshot
    }
}

impl std::fmt::Debug for WalletSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletSession")
            .field("chain", &self.chain.id)
            .field("mode", &self.state.mode())
            .field("accounts", &self.state.accounts.len())
            .finish_non_exhaustive()
    }
}
