//! In-process implementation of every storage port.
//!
//! One mutex guards the whole state, so each port call is atomic the way a
//! single Postgres transaction is. Used by the test suites and for running the
//! service without a database. Faults can be injected to exercise rollback paths.

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

use crate::domain::{
    Account, AnonymousMessage, ContributorEntry, Event, Notification, OwnerSummary, PartyDetails,
    ReceivedTransaction, SettlementTarget, TransactionStatus, WishListItem, WithdrawTransaction,
};
use crate::ports::{
    Backref, CascadeReport, ChildKind, LedgerEffect, NotificationRepository, RegistryRepository,
    RepositoryError, RepositoryResult, SettleWrite, TransactionRepository,
};

#[derive(Default)]
struct MemoryState {
    accounts: HashMap<Uuid, Account>,
    events: HashMap<Uuid, Event>,
    items: HashMap<Uuid, WishListItem>,
    parties: HashMap<Uuid, PartyDetails>,
    messages: HashMap<Uuid, AnonymousMessage>,
    received: HashMap<String, ReceivedTransaction>,
    withdrawals: Vec<WithdrawTransaction>,
    notifications: Vec<Notification>,
    failing_deletes: HashSet<ChildKind>,
    failing_ledger: bool,
}

#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> RepositoryResult<MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|_| RepositoryError::Unavailable("memory store lock poisoned".to_string()))
    }

    /// Makes every later deletion of `kind` fail.
    pub fn inject_delete_failure(&self, kind: ChildKind) {
        if let Ok(mut state) = self.lock() {
            state.failing_deletes.insert(kind);
        }
    }

    /// Makes every later ledger write fail.
    pub fn inject_ledger_failure(&self, failing: bool) {
        if let Ok(mut state) = self.lock() {
            state.failing_ledger = failing;
        }
    }

    pub fn insert_account(&self, account: Account) -> RepositoryResult<()> {
        self.lock()?.accounts.insert(account.id, account);
        Ok(())
    }

    pub fn insert_event(&self, event: Event) -> RepositoryResult<()> {
        self.lock()?.events.insert(event.id, event);
        Ok(())
    }

    /// Stores the item and links it into its event's wish list.
    pub fn insert_item(&self, item: WishListItem) -> RepositoryResult<()> {
        let mut state = self.lock()?;
        let event = state
            .events
            .get_mut(&item.event_id)
            .ok_or_else(|| RepositoryError::NotFound(format!("event {}", item.event_id)))?;
        event.wish_list.push(item.id);
        state.items.insert(item.id, item);
        Ok(())
    }

    pub fn insert_party_details(&self, event_id: Uuid, party: PartyDetails) -> RepositoryResult<()> {
        let mut state = self.lock()?;
        let event = state
            .events
            .get_mut(&event_id)
            .ok_or_else(|| RepositoryError::NotFound(format!("event {}", event_id)))?;
        event.party_details = Some(party.id);
        state.parties.insert(party.id, party);
        Ok(())
    }

    pub fn insert_message(&self, message: AnonymousMessage) -> RepositoryResult<()> {
        let mut state = self.lock()?;
        let event = state
            .events
            .get_mut(&message.event_id)
            .ok_or_else(|| RepositoryError::NotFound(format!("event {}", message.event_id)))?;
        event.messages.push(message.id);
        state.messages.insert(message.id, message);
        Ok(())
    }

    pub fn insert_withdrawal(&self, withdrawal: WithdrawTransaction) -> RepositoryResult<()> {
        self.lock()?.withdrawals.push(withdrawal);
        Ok(())
    }

    /// Counts of stored (items, party details, messages).
    pub fn child_counts(&self) -> RepositoryResult<(usize, usize, usize)> {
        let state = self.lock()?;
        Ok((state.items.len(), state.parties.len(), state.messages.len()))
    }
}

fn newest_first<T>(rows: impl DoubleEndedIterator<Item = T>, created: impl Fn(&T) -> chrono::DateTime<Utc>) -> Vec<T> {
    // Reverse insertion order first so equal timestamps keep newest-inserted first.
    let mut out: Vec<T> = rows.rev().collect();
    out.sort_by(|a, b| created(b).cmp(&created(a)));
    out
}

fn page<T>(rows: Vec<T>, limit: i64, offset: i64) -> Vec<T> {
    rows.into_iter()
        .skip(offset.max(0) as usize)
        .take(limit.max(0) as usize)
        .collect()
}

#[async_trait]
impl TransactionRepository for InMemoryStore {
    async fn insert_received(&self, tx: &ReceivedTransaction) -> RepositoryResult<ReceivedTransaction> {
        let mut state = self.lock()?;
        if state.received.contains_key(&tx.reference) {
            return Err(RepositoryError::Unavailable(format!(
                "duplicate reference {}",
                tx.reference
            )));
        }
        state.received.insert(tx.reference.clone(), tx.clone());
        Ok(tx.clone())
    }

    async fn find_received(&self, reference: &str) -> RepositoryResult<Option<ReceivedTransaction>> {
        Ok(self.lock()?.received.get(reference).cloned())
    }

    async fn mark_failed(&self, reference: &str, raw: &serde_json::Value) -> RepositoryResult<bool> {
        let mut state = self.lock()?;
        match state.received.get_mut(reference) {
            Some(tx) if tx.status.can_transition_to(TransactionStatus::Failed) => {
                tx.status = TransactionStatus::Failed;
                tx.metadata = Some(raw.clone());
                tx.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn settle(
        &self,
        reference: &str,
        raw: &serde_json::Value,
        fallback_target: Option<SettlementTarget>,
    ) -> RepositoryResult<SettleWrite> {
        let mut guard = self.lock()?;
        let state = &mut *guard;

        let Some(tx) = state.received.get(reference) else {
            return Ok(SettleWrite::NotFound);
        };
        if !tx.status.can_transition_to(TransactionStatus::Success) {
            return Ok(SettleWrite::NotPending(tx.status));
        }
        if state.failing_ledger {
            return Err(RepositoryError::Unavailable("ledger write failed".to_string()));
        }

        let target = tx.target.or(fallback_target);
        let payer_name = tx.payer_name.clone();
        let amount = tx.amount.clone();

        let effect = match target {
            Some(target @ SettlementTarget::ItemContribution { item_id }) => match state.items.get_mut(&item_id) {
                Some(item) => {
                    item.record_contribution(ContributorEntry {
                        name: payer_name,
                        amount,
                        date: Utc::now(),
                    });
                    LedgerEffect::Contribution(item.clone())
                }
                None => LedgerEffect::TargetMissing(target),
            },
            Some(target @ SettlementTarget::EventTip { event_id }) => match state.events.get_mut(&event_id) {
                Some(event) => {
                    event.tips = &event.tips + &amount;
                    event.updated_at = Utc::now();
                    LedgerEffect::Tip(event.clone())
                }
                None => LedgerEffect::TargetMissing(target),
            },
            None => LedgerEffect::Unresolved,
        };

        let tx = state
            .received
            .get_mut(reference)
            .ok_or_else(|| RepositoryError::NotFound(reference.to_string()))?;
        tx.status = TransactionStatus::Success;
        tx.metadata = Some(raw.clone());
        tx.updated_at = Utc::now();

        Ok(SettleWrite::Settled {
            transaction: tx.clone(),
            effect,
        })
    }

    async fn list_received(&self, owner_id: Uuid, limit: i64, offset: i64) -> RepositoryResult<Vec<ReceivedTransaction>> {
        let state = self.lock()?;
        let mut owned: Vec<ReceivedTransaction> = state
            .received
            .values()
            .filter(|tx| tx.owner_id == owner_id)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(page(owned, limit, offset))
    }

    async fn list_withdrawals(&self, owner_id: Uuid, limit: i64, offset: i64) -> RepositoryResult<Vec<WithdrawTransaction>> {
        let state = self.lock()?;
        let owned = newest_first(
            state.withdrawals.iter().filter(|w| w.owner_id == owner_id).cloned(),
            |w| w.created_at,
        );
        Ok(page(owned, limit, offset))
    }
}

#[async_trait]
impl RegistryRepository for InMemoryStore {
    async fn get_event(&self, id: Uuid) -> RepositoryResult<Option<Event>> {
        Ok(self.lock()?.events.get(&id).cloned())
    }

    async fn get_item(&self, id: Uuid) -> RepositoryResult<Option<WishListItem>> {
        Ok(self.lock()?.items.get(&id).cloned())
    }

    async fn get_account(&self, id: Uuid) -> RepositoryResult<Option<Account>> {
        Ok(self.lock()?.accounts.get(&id).cloned())
    }

    async fn delete_event_cascade(&self, event_id: Uuid, owner_id: Uuid) -> RepositoryResult<CascadeReport> {
        let mut state = self.lock()?;

        let event = match state.events.get(&event_id) {
            Some(event) if event.owner_id == owner_id => event.clone(),
            _ => return Err(RepositoryError::NotFound(format!("event {}", event_id))),
        };

        let item_ids: Vec<Uuid> = state
            .items
            .values()
            .filter(|item| item.event_id == event_id || event.wish_list.contains(&item.id))
            .map(|item| item.id)
            .collect();
        let message_ids: Vec<Uuid> = state
            .messages
            .values()
            .filter(|m| m.event_id == event_id || event.messages.contains(&m.id))
            .map(|m| m.id)
            .collect();
        let party_id = event.party_details.filter(|id| state.parties.contains_key(id));

        // Every deletion is checked before any is applied.
        let planned = [
            (ChildKind::WishListItem, !item_ids.is_empty()),
            (ChildKind::PartyDetails, party_id.is_some()),
            (ChildKind::AnonymousMessage, !message_ids.is_empty()),
        ];
        if let Some((kind, _)) = planned
            .iter()
            .find(|(kind, present)| *present && state.failing_deletes.contains(kind))
        {
            return Err(RepositoryError::Unavailable(format!("delete of {:?} failed", kind)));
        }

        for id in &item_ids {
            state.items.remove(id);
        }
        if let Some(id) = party_id {
            state.parties.remove(&id);
        }
        for id in &message_ids {
            state.messages.remove(id);
        }
        state.events.remove(&event_id);

        Ok(CascadeReport {
            items_deleted: item_ids.len() as u64,
            party_details_deleted: party_id.map_or(0, |_| 1),
            messages_deleted: message_ids.len() as u64,
        })
    }

    async fn delete_child(&self, kind: ChildKind, child_id: Uuid, owner_id: Uuid) -> RepositoryResult<bool> {
        let mut state = self.lock()?;
        if state.failing_deletes.contains(&kind) {
            return Err(RepositoryError::Unavailable(format!("delete of {:?} failed", kind)));
        }

        let owned = match kind {
            ChildKind::WishListItem => state.items.get(&child_id).map(|i| i.owner_id == owner_id),
            ChildKind::PartyDetails => state.parties.get(&child_id).map(|p| p.owner_id == owner_id),
            ChildKind::AnonymousMessage => state.messages.get(&child_id).map(|m| {
                state
                    .events
                    .get(&m.event_id)
                    .map_or(false, |e| e.owner_id == owner_id)
            }),
        };
        if owned != Some(true) {
            return Ok(false);
        }

        match kind {
            ChildKind::WishListItem => {
                state.items.remove(&child_id);
            }
            ChildKind::PartyDetails => {
                state.parties.remove(&child_id);
            }
            ChildKind::AnonymousMessage => {
                state.messages.remove(&child_id);
            }
        }
        Ok(true)
    }

    async fn unlink(&self, backref: Backref, child_id: Uuid, owner_id: Uuid) -> RepositoryResult<u64> {
        let mut state = self.lock()?;
        let mut touched = 0;
        for event in state.events.values_mut().filter(|e| e.owner_id == owner_id) {
            let changed = match backref {
                Backref::EventWishList => remove_id(&mut event.wish_list, child_id),
                Backref::EventMessages => remove_id(&mut event.messages, child_id),
                Backref::EventPartyDetails => {
                    if event.party_details == Some(child_id) {
                        event.party_details = None;
                        true
                    } else {
                        false
                    }
                }
            };
            if changed {
                event.updated_at = Utc::now();
                touched += 1;
            }
        }
        Ok(touched)
    }

    async fn owner_summary(&self, owner_id: Uuid) -> RepositoryResult<OwnerSummary> {
        let state = self.lock()?;
        let events: Vec<&Event> = state.events.values().filter(|e| e.owner_id == owner_id).collect();
        Ok(OwnerSummary {
            total_events: events.len() as i64,
            total_gifts: events.iter().map(|e| e.wish_list.len() as i64).sum(),
            total_tips: events
                .iter()
                .fold(BigDecimal::from(0), |acc, e| acc + &e.tips),
            total_contributions: state
                .items
                .values()
                .filter(|i| i.owner_id == owner_id)
                .fold(BigDecimal::from(0), |acc, i| acc + &i.total_contributions),
        })
    }
}

fn remove_id(ids: &mut Vec<Uuid>, id: Uuid) -> bool {
    let before = ids.len();
    ids.retain(|existing| *existing != id);
    ids.len() != before
}

#[async_trait]
impl NotificationRepository for InMemoryStore {
    async fn insert(&self, notification: &Notification) -> RepositoryResult<()> {
        self.lock()?.notifications.push(notification.clone());
        Ok(())
    }

    async fn list_for_owner(&self, owner_id: Uuid, event_id: Option<Uuid>) -> RepositoryResult<Vec<Notification>> {
        let state = self.lock()?;
        Ok(newest_first(
            state
                .notifications
                .iter()
                .filter(|n| n.owner_id == owner_id && event_id.map_or(true, |id| n.event_id == id))
                .cloned(),
            |n| n.created_at,
        ))
    }
}
