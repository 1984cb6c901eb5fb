pub mod notification;
pub mod registry;
pub mod transaction;

pub use notification::Notification;
pub use registry::{
    derive_slug, Account, AnonymousMessage, ContributorEntry, Event, OwnerSummary, PartyDetails,
    WishListItem,
};
pub use transaction::{
    ReceivedTransaction, SettlementTarget, TransactionKind, TransactionStatus, WithdrawTransaction,
};
