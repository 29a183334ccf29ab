mod events;
mod session;
mod state;

pub use events::{BalanceUpdate, WalletCommand};
pub use session::WalletSession;
pub use state::{Notification, NotificationKind, SessionMode, SessionSnapshot, SessionState};
