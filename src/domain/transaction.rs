//! Transaction domain entities.
//! Framework-agnostic representation of payment attempts and payouts.

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Lifecycle of a payment attempt. `Success` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Success,
    Failed,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Success => "success",
            TransactionStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, TransactionStatus::Pending)
    }

    /// Only `pending -> success` and `pending -> failed` are legal.
    pub fn can_transition_to(&self, next: TransactionStatus) -> bool {
        matches!(
            (self, next),
            (TransactionStatus::Pending, TransactionStatus::Success)
                | (TransactionStatus::Pending, TransactionStatus::Failed)
        )
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TransactionStatus::Pending),
            "success" => Ok(TransactionStatus::Success),
            "failed" => Ok(TransactionStatus::Failed),
            other => Err(format!("unknown transaction status '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionKind {
    Tip,
    Contribution,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Tip => "Tip",
            TransactionKind::Contribution => "Contribution",
        }
    }
}

impl FromStr for TransactionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Tip" => Ok(TransactionKind::Tip),
            "Contribution" => Ok(TransactionKind::Contribution),
            other => Err(format!("unknown transaction kind '{}'", other)),
        }
    }
}

/// What a successful payment credits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SettlementTarget {
    ItemContribution { item_id: Uuid },
    EventTip { event_id: Uuid },
}

impl SettlementTarget {
    pub fn kind(&self) -> TransactionKind {
        match self {
            SettlementTarget::ItemContribution { .. } => TransactionKind::Contribution,
            SettlementTarget::EventTip { .. } => TransactionKind::Tip,
        }
    }

    /// Column encoding: `("item" | "event", id)`.
    pub fn to_columns(&self) -> (&'static str, Uuid) {
        match self {
            SettlementTarget::ItemContribution { item_id } => ("item", *item_id),
            SettlementTarget::EventTip { event_id } => ("event", *event_id),
        }
    }

    pub fn from_columns(kind: Option<&str>, id: Option<Uuid>) -> Option<Self> {
        match (kind, id) {
            (Some("item"), Some(item_id)) => Some(SettlementTarget::ItemContribution { item_id }),
            (Some("event"), Some(event_id)) => Some(SettlementTarget::EventTip { event_id }),
            _ => None,
        }
    }

    /// Recovers the target from provider metadata (`itemId` / `eventId`).
    /// Both or neither present is ambiguous and yields `None`.
    pub fn from_provider_metadata(metadata: &serde_json::Value) -> Option<Self> {
        let parse = |key: &str| {
            metadata
                .get(key)
                .and_then(|v| v.as_str())
                .and_then(|s| Uuid::parse_str(s).ok())
        };

        match (parse("itemId"), parse("eventId")) {
            (Some(item_id), None) => Some(SettlementTarget::ItemContribution { item_id }),
            (None, Some(event_id)) => Some(SettlementTarget::EventTip { event_id }),
            _ => None,
        }
    }
}

/// An incoming tip or contribution, keyed by the gateway reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceivedTransaction {
    pub id: Uuid,
    pub reference: String,
    pub owner_id: Uuid,
    pub amount: BigDecimal,
    pub title: String,
    pub payer_name: String,
    pub payer_email: String,
    pub kind: TransactionKind,
    pub target: Option<SettlementTarget>,
    pub status: TransactionStatus,
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ReceivedTransaction {
    pub fn new(
        reference: String,
        owner_id: Uuid,
        amount: BigDecimal,
        title: String,
        payer_name: String,
        payer_email: String,
        target: SettlementTarget,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            reference,
            owner_id,
            amount,
            title,
            payer_name,
            payer_email,
            kind: target.kind(),
            target: Some(target),
            status: TransactionStatus::Pending,
            metadata: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A payout to the registry owner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WithdrawTransaction {
    pub id: Uuid,
    pub reference: String,
    pub owner_id: Uuid,
    pub amount: BigDecimal,
    pub amount_withdrawn: BigDecimal,
    pub title: String,
    pub status: TransactionStatus,
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
