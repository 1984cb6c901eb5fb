//! Row types for SQLx. Converted to `domain` types at the adapter boundary.

use chrono::{DateTime, Utc};
use sqlx::types::BigDecimal;
use sqlx::FromRow;
use uuid::Uuid;

use crate::domain::{
    Account, AnonymousMessage, ContributorEntry, Event, Notification, ReceivedTransaction,
    SettlementTarget, TransactionStatus, WishListItem, WithdrawTransaction,
};
use crate::ports::{RepositoryError, RepositoryResult};

fn parse_status(raw: &str) -> RepositoryResult<TransactionStatus> {
    raw.parse().map_err(RepositoryError::Corrupt)
}

#[derive(Debug, FromRow)]
pub struct ReceivedTransactionRow {
    pub id: Uuid,
    pub reference: String,
    pub user_id: Uuid,
    pub amount: BigDecimal,
    pub title: String,
    pub payer_name: String,
    pub payer_email: String,
    pub kind: String,
    pub target_kind: Option<String>,
    pub target_id: Option<Uuid>,
    pub status: String,
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ReceivedTransactionRow {
    pub fn into_domain(self) -> RepositoryResult<ReceivedTransaction> {
        Ok(ReceivedTransaction {
            id: self.id,
            reference: self.reference,
            owner_id: self.user_id,
            amount: self.amount,
            title: self.title,
            payer_name: self.payer_name,
            payer_email: self.payer_email,
            kind: self.kind.parse().map_err(RepositoryError::Corrupt)?,
            target: SettlementTarget::from_columns(self.target_kind.as_deref(), self.target_id),
            status: parse_status(&self.status)?,
            metadata: self.metadata,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
pub struct WithdrawTransactionRow {
    pub id: Uuid,
    pub reference: String,
    pub user_id: Uuid,
    pub amount: BigDecimal,
    pub amount_withdrawn: BigDecimal,
    pub title: String,
    pub status: String,
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WithdrawTransactionRow {
    pub fn into_domain(self) -> RepositoryResult<WithdrawTransaction> {
        Ok(WithdrawTransaction {
            id: self.id,
            reference: self.reference,
            owner_id: self.user_id,
            amount: self.amount,
            amount_withdrawn: self.amount_withdrawn,
            title: self.title,
            status: parse_status(&self.status)?,
            metadata: self.metadata,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
pub struct EventRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub celebrant_name: String,
    pub title: String,
    pub slug: String,
    pub date: DateTime<Utc>,
    pub tips: BigDecimal,
    pub wish_list: Vec<Uuid>,
    pub party_details: Option<Uuid>,
    pub messages: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EventRow {
    pub fn into_domain(self) -> Event {
        Event {
            id: self.id,
            owner_id: self.user_id,
            celebrant_name: self.celebrant_name,
            title: self.title,
            slug: self.slug,
            date: self.date,
            tips: self.tips,
            wish_list: self.wish_list,
            party_details: self.party_details,
            messages: self.messages,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
pub struct WishListItemRow {
    pub id: Uuid,
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub product_title: String,
    pub estimate: BigDecimal,
    pub qty: i32,
    pub total: BigDecimal,
    pub total_contributions: BigDecimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WishListItemRow {
    pub fn into_domain(self, contributors: Vec<ContributorEntry>) -> WishListItem {
        WishListItem {
            id: self.id,
            event_id: self.event_id,
            owner_id: self.user_id,
            product_title: self.product_title,
            estimate: self.estimate,
            qty: self.qty,
            total: self.total,
            total_contributions: self.total_contributions,
            contributors,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
pub struct ContributorRow {
    pub name: String,
    pub amount: BigDecimal,
    pub contributed_at: DateTime<Utc>,
}

impl From<ContributorRow> for ContributorEntry {
    fn from(row: ContributorRow) -> Self {
        ContributorEntry {
            name: row.name,
            amount: row.amount,
            date: row.contributed_at,
        }
    }
}

#[derive(Debug, FromRow)]
pub struct AnonymousMessageRow {
    pub id: Uuid,
    pub event_id: Uuid,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl From<AnonymousMessageRow> for AnonymousMessage {
    fn from(row: AnonymousMessageRow) -> Self {
        AnonymousMessage {
            id: row.id,
            event_id: row.event_id,
            message: row.message,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
pub struct AccountRow {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

impl From<AccountRow> for Account {
    fn from(row: AccountRow) -> Self {
        Account {
            id: row.id,
            email: row.email,
            first_name: row.first_name,
            last_name: row.last_name,
        }
    }
}

#[derive(Debug, FromRow)]
pub struct NotificationRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub event_id: Uuid,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl From<NotificationRow> for Notification {
    fn from(row: NotificationRow) -> Self {
        Notification {
            id: row.id,
            owner_id: row.user_id,
            event_id: row.event_id,
            message: row.message,
            created_at: row.created_at,
        }
    }
}
