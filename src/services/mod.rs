pub mod cascade;
pub mod ledger;
pub mod notifier;
pub mod payments;
pub mod settlement;

pub use cascade::{CascadeManager, ChildDeletion};
pub use ledger::{ItemLedger, LedgerView};
pub use notifier::NotificationFanout;
pub use payments::{PaymentRequest, PaymentService};
pub use settlement::{SettleOutcome, SettlementEngine, WebhookOutcome};
