//! Storage ports. Services depend on these traits; `adapters` implement them.

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::{
    Account, Event, Notification, OwnerSummary, ReceivedTransaction, SettlementTarget,
    TransactionStatus, WishListItem, WithdrawTransaction,
};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("corrupt row: {0}")]
    Corrupt(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Ledger mutation applied inside the settling store transaction.
#[derive(Debug, Clone)]
pub enum LedgerEffect {
    /// Contributor entry appended; carries the item as read back after the update.
    Contribution(WishListItem),
    /// Tips incremented; carries the event after the update.
    Tip(Event),
    /// The target no longer exists. Record is settled with no credit.
    TargetMissing(SettlementTarget),
    /// Neither branch could be resolved from the record or the provider metadata.
    Unresolved,
}

#[derive(Debug, Clone)]
pub enum SettleWrite {
    /// This caller won the `pending -> success` transition and applied the effect.
    Settled {
        transaction: ReceivedTransaction,
        effect: LedgerEffect,
    },
    /// The record was no longer `pending`; nothing was written.
    NotPending(TransactionStatus),
    NotFound,
}

#[async_trait]
pub trait TransactionRepository: Send + Sync {
    async fn insert_received(&self, tx: &ReceivedTransaction) -> RepositoryResult<ReceivedTransaction>;

    async fn find_received(&self, reference: &str) -> RepositoryResult<Option<ReceivedTransaction>>;

    /// Conditional `pending -> failed`. Returns whether this call changed the row.
    async fn mark_failed(&self, reference: &str, raw: &serde_json::Value) -> RepositoryResult<bool>;

    /// Conditional `pending -> success` plus the ledger effect, in one store
    /// transaction. `fallback_target` is used when the record carries none.
    async fn settle(
        &self,
        reference: &str,
        raw: &serde_json::Value,
        fallback_target: Option<SettlementTarget>,
    ) -> RepositoryResult<SettleWrite>;

    async fn list_received(&self, owner_id: Uuid, limit: i64, offset: i64) -> RepositoryResult<Vec<ReceivedTransaction>>;

    async fn list_withdrawals(&self, owner_id: Uuid, limit: i64, offset: i64) -> RepositoryResult<Vec<WithdrawTransaction>>;
}

/// Children an event owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChildKind {
    WishListItem,
    PartyDetails,
    AnonymousMessage,
}

/// Parent fields that may reference a child document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backref {
    EventWishList,
    EventMessages,
    EventPartyDetails,
}

impl Backref {
    pub fn for_child(kind: ChildKind) -> Self {
        match kind {
            ChildKind::WishListItem => Backref::EventWishList,
            ChildKind::AnonymousMessage => Backref::EventMessages,
            ChildKind::PartyDetails => Backref::EventPartyDetails,
        }
    }

    pub fn field(&self) -> &'static str {
        match self {
            Backref::EventWishList => "wish_list",
            Backref::EventMessages => "messages",
            Backref::EventPartyDetails => "party_details",
        }
    }

    /// Array fields are pulled from; scalar fields are unset.
    pub fn is_array(&self) -> bool {
        !matches!(self, Backref::EventPartyDetails)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CascadeReport {
    pub items_deleted: u64,
    pub party_details_deleted: u64,
    pub messages_deleted: u64,
}

#[async_trait]
pub trait RegistryRepository: Send + Sync {
    async fn get_event(&self, id: Uuid) -> RepositoryResult<Option<Event>>;

    /// Item with its contributor entries in append order.
    async fn get_item(&self, id: Uuid) -> RepositoryResult<Option<WishListItem>>;

    async fn get_account(&self, id: Uuid) -> RepositoryResult<Option<Account>>;

    /// Deletes the owner's event and every child it references, all or nothing.
    async fn delete_event_cascade(&self, event_id: Uuid, owner_id: Uuid) -> RepositoryResult<CascadeReport>;

    /// Deletes one child the owner controls. Returns whether a row was removed.
    async fn delete_child(&self, kind: ChildKind, child_id: Uuid, owner_id: Uuid) -> RepositoryResult<bool>;

    /// Removes `child_id` from every parent field described by `backref`
    /// among the owner's events. Returns the number of parents touched.
    async fn unlink(&self, backref: Backref, child_id: Uuid, owner_id: Uuid) -> RepositoryResult<u64>;

    async fn owner_summary(&self, owner_id: Uuid) -> RepositoryResult<OwnerSummary>;
}

#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn insert(&self, notification: &Notification) -> RepositoryResult<()>;

    /// Newest first, optionally restricted to one event.
    async fn list_for_owner(&self, owner_id: Uuid, event_id: Option<Uuid>) -> RepositoryResult<Vec<Notification>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backrefs_match_child_kinds() {
        assert_eq!(Backref::for_child(ChildKind::WishListItem).field(), "wish_list");
        assert!(Backref::for_child(ChildKind::AnonymousMessage).is_array());
        assert!(!Backref::for_child(ChildKind::PartyDetails).is_array());
    }
}
