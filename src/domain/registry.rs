//! Registry aggregate: events and the children they own.

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Builds the public slug of an event. Call it whenever `celebrant_name` or
/// `title` change.
pub fn derive_slug(event_id: Uuid, celebrant_name: &str, title: &str) -> String {
    format!("{} {} {}", event_id, celebrant_name, title)
        .split(' ')
        .collect::<Vec<_>>()
        .join("-")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub owner_id: Uuid,
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

impl Event {
    pub fn new(owner_id: Uuid, celebrant_name: String, title: String, date: DateTime<Utc>) -> Self {
        let id = Uuid::new_v4();
        let now = Utc::now();
        Self {
            id,
            owner_id,
            slug: derive_slug(id, &celebrant_name, &title),
            celebrant_name,
            title,
            date,
            tips: BigDecimal::from(0),
            wish_list: Vec::new(),
            party_details: None,
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn rename(&mut self, celebrant_name: String, title: String) {
        self.slug = derive_slug(self.id, &celebrant_name, &title);
        self.celebrant_name = celebrant_name;
        self.title = title;
        self.updated_at = Utc::now();
    }
}

/// One immutable credit toward a wish-list item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContributorEntry {
    pub name: String,
    pub amount: BigDecimal,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WishListItem {
    pub id: Uuid,
    pub event_id: Uuid,
    pub owner_id: Uuid,
    pub product_title: String,
    pub estimate: BigDecimal,
    pub qty: i32,
    pub total: BigDecimal,
    pub total_contributions: BigDecimal,
    pub contributors: Vec<ContributorEntry>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WishListItem {
    pub fn new(event_id: Uuid, owner_id: Uuid, product_title: String, estimate: BigDecimal, qty: i32) -> Self {
        let now = Utc::now();
        let total = &estimate * BigDecimal::from(qty);
        Self {
            id: Uuid::new_v4(),
            event_id,
            owner_id,
            product_title,
            estimate,
            qty,
            total,
            total_contributions: BigDecimal::from(0),
            contributors: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Percentage of `total` covered so far, two decimals. Zero target reads as 0%.
    pub fn funding_percentage(&self) -> BigDecimal {
        let zero = BigDecimal::from(0);
        if self.total <= zero {
            return zero;
        }
        (&self.total_contributions * BigDecimal::from(100) / &self.total).round(2)
    }

    pub fn is_fully_funded(&self) -> bool {
        self.total_contributions >= self.total
    }

    /// Appends an entry and bumps the running total together.
    pub fn record_contribution(&mut self, entry: ContributorEntry) {
        self.total_contributions = &self.total_contributions + &entry.amount;
        self.contributors.push(entry);
        self.updated_at = Utc::now();
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartyDetails {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub address: String,
    pub information: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnonymousMessage {
    pub id: Uuid,
    pub event_id: Uuid,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// Account data the service needs: where to send notification email.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

/// Owner dashboard totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OwnerSummary {
    pub total_events: i64,
    pub total_gifts: i64,
    pub total_tips: BigDecimal,
    pub total_contributions: BigDecimal,
}
