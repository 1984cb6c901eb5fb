use bigdecimal::BigDecimal;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::{ContributorEntry, OwnerSummary, ReceivedTransaction, WithdrawTransaction};
use crate::error::AppError;
use crate::ports::{RegistryRepository, TransactionRepository};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemLedger {
    pub item_id: Uuid,
    pub event_id: Uuid,
    pub product_title: String,
    pub total: BigDecimal,
    pub total_contributions: BigDecimal,
    pub funding_percentage: BigDecimal,
    pub fully_funded: bool,
    pub contributors: Vec<ContributorEntry>,
}

/// Read side of the contribution ledger and the owner's transaction history.
pub struct LedgerView {
    transactions: Arc<dyn TransactionRepository>,
    registry: Arc<dyn RegistryRepository>,
}

impl LedgerView {
    pub fn new(transactions: Arc<dyn TransactionRepository>, registry: Arc<dyn RegistryRepository>) -> Self {
        Self { transactions, registry }
    }

    /// Items owned by someone else read as not found.
    pub async fn item_ledger(&self, item_id: Uuid, owner_id: Uuid) -> Result<ItemLedger, AppError> {
        let item = self
            .registry
            .get_item(item_id)
            .await?
            .filter(|item| item.owner_id == owner_id)
            .ok_or_else(|| AppError::NotFound(format!("wish list item {}", item_id)))?;

        Ok(ItemLedger {
            item_id: item.id,
            event_id: item.event_id,
            funding_percentage: item.funding_percentage(),
            fully_funded: item.is_fully_funded(),
            product_title: item.product_title,
            total: item.total,
            total_contributions: item.total_contributions,
            contributors: item.contributors,
        })
    }

    pub async fn received(&self, owner_id: Uuid, limit: i64, offset: i64) -> Result<Vec<ReceivedTransaction>, AppError> {
        Ok(self.transactions.list_received(owner_id, limit, offset).await?)
    }

    pub async fn withdrawals(&self, owner_id: Uuid, limit: i64, offset: i64) -> Result<Vec<WithdrawTransaction>, AppError> {
        Ok(self.transactions.list_withdrawals(owner_id, limit, offset).await?)
    }

    pub async fn dashboard(&self, owner_id: Uuid) -> Result<OwnerSummary, AppError> {
        Ok(self.registry.owner_summary(owner_id).await?)
    }
}
