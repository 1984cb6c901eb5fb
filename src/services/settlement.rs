use serde::Deserialize;
use std::sync::Arc;

use crate::domain::{ReceivedTransaction, SettlementTarget, TransactionStatus};
use crate::error::AppError;
use crate::gateway::{GatewayStatus, PaymentGateway, VerifiedPayment};
use crate::ports::{LedgerEffect, SettleWrite, TransactionRepository};
use crate::services::notifier::NotificationFanout;

pub const CHARGE_SUCCESS: &str = "charge.success";

/// Result of one settlement attempt. Every variant is a normal outcome.
#[derive(Debug, Clone)]
pub enum SettleOutcome {
    NotFound,
    /// The record had already left `pending`; nothing was written.
    AlreadySettled(TransactionStatus),
    /// The provider reported a terminal failure and the record is now `failed`.
    Failed,
    /// The provider has not finished the charge yet.
    StillPending,
    Settled {
        transaction: ReceivedTransaction,
        effect: LedgerEffect,
        notifications: usize,
    },
}

impl SettleOutcome {
    /// Record status after the attempt, when the record exists.
    pub fn status(&self) -> Option<TransactionStatus> {
        match self {
            SettleOutcome::NotFound => None,
            SettleOutcome::AlreadySettled(status) => Some(*status),
            SettleOutcome::Failed => Some(TransactionStatus::Failed),
            SettleOutcome::StillPending => Some(TransactionStatus::Pending),
            SettleOutcome::Settled { .. } => Some(TransactionStatus::Success),
        }
    }
}

#[derive(Debug)]
pub enum WebhookOutcome {
    Ignored(String),
    Processed(SettleOutcome),
}

#[derive(Debug, Deserialize)]
struct WebhookBody {
    event: String,
    #[serde(default)]
    data: serde_json::Value,
}

/// Applies payment completions to the ledger exactly once.
///
/// Both triggers (webhook push and client poll) end in [`SettlementEngine::settle`].
/// The store's conditional `pending -> success` update is the only
/// serialisation point, so concurrent or replayed signals for the same
/// reference produce at most one ledger effect.
pub struct SettlementEngine {
    transactions: Arc<dyn TransactionRepository>,
    gateway: Arc<dyn PaymentGateway>,
    notifier: NotificationFanout,
}

impl SettlementEngine {
    pub fn new(
        transactions: Arc<dyn TransactionRepository>,
        gateway: Arc<dyn PaymentGateway>,
        notifier: NotificationFanout,
    ) -> Self {
        Self {
            transactions,
            gateway,
            notifier,
        }
    }

    pub async fn settle(&self, reference: &str, outcome: VerifiedPayment) -> Result<SettleOutcome, AppError> {
        let Some(existing) = self.transactions.find_received(reference).await? else {
            tracing::info!(reference, "settlement for unknown reference ignored");
            return Ok(SettleOutcome::NotFound);
        };

        if existing.status == TransactionStatus::Success {
            return Ok(SettleOutcome::AlreadySettled(existing.status));
        }

        match outcome.status {
            GatewayStatus::Pending => {
                return Ok(match existing.status {
                    TransactionStatus::Pending => SettleOutcome::StillPending,
                    status => SettleOutcome::AlreadySettled(status),
                });
            }
            GatewayStatus::Failed => {
                if self.transactions.mark_failed(reference, &outcome.raw).await? {
                    tracing::info!(reference, "transaction marked failed");
                    return Ok(SettleOutcome::Failed);
                }
                return Ok(match self.current_status(reference).await? {
                    Some(TransactionStatus::Failed) => SettleOutcome::Failed,
                    Some(status) => SettleOutcome::AlreadySettled(status),
                    None => SettleOutcome::NotFound,
                });
            }
            GatewayStatus::Success => {}
        }

        let fallback = SettlementTarget::from_provider_metadata(&outcome.metadata);
        let write = self.transactions.settle(reference, &outcome.raw, fallback).await?;

        let (transaction, effect) = match write {
            SettleWrite::NotFound => return Ok(SettleOutcome::NotFound),
            SettleWrite::NotPending(status) => {
                tracing::debug!(reference, status = %status, "lost settlement race or replay");
                return Ok(SettleOutcome::AlreadySettled(status));
            }
            SettleWrite::Settled { transaction, effect } => (transaction, effect),
        };

        match &effect {
            LedgerEffect::Contribution(item) => tracing::info!(
                reference,
                item_id = %item.id,
                amount = %transaction.amount,
                total_contributions = %item.total_contributions,
                "contribution credited"
            ),
            LedgerEffect::Tip(event) => tracing::info!(
                reference,
                event_id = %event.id,
                amount = %transaction.amount,
                "tip credited"
            ),
            LedgerEffect::TargetMissing(target) => tracing::warn!(
                reference,
                ?target,
                "settled payment whose target no longer exists, nothing credited"
            ),
            LedgerEffect::Unresolved => tracing::error!(
                reference,
                metadata = %outcome.metadata,
                "settled payment with no resolvable target, nothing credited"
            ),
        }

        let notifications = self.notifier.on_settled(&transaction, &effect).await;

        Ok(SettleOutcome::Settled {
            transaction,
            effect,
            notifications,
        })
    }

    /// Client-triggered settlement. A record already `success` or `failed`
    /// is answered locally without calling the provider.
    pub async fn poll(&self, reference: &str) -> Result<SettleOutcome, AppError> {
        match self.current_status(reference).await? {
            None => return Ok(SettleOutcome::NotFound),
            Some(TransactionStatus::Pending) => {}
            Some(status) => return Ok(SettleOutcome::AlreadySettled(status)),
        }

        let verified = self.gateway.verify(reference).await?;
        self.settle(reference, verified).await
    }

    /// Provider push. The signature is checked over the raw bytes before
    /// the body is parsed or any record is read.
    pub async fn on_webhook(&self, raw_body: &[u8], signature: Option<&str>) -> Result<WebhookOutcome, AppError> {
        let signature = signature.ok_or(AppError::Signature)?;
        if !self.gateway.check_signature(raw_body, signature) {
            tracing::warn!("webhook signature mismatch");
            return Err(AppError::Signature);
        }

        let body: WebhookBody = serde_json::from_slice(raw_body)
            .map_err(|e| AppError::BadRequest(format!("malformed webhook body: {}", e)))?;

        if body.event != CHARGE_SUCCESS {
            tracing::debug!(event = %body.event, "webhook event ignored");
            return Ok(WebhookOutcome::Ignored(body.event));
        }

        let reference = body
            .data
            .get("reference")
            .and_then(|r| r.as_str())
            .ok_or_else(|| AppError::BadRequest("webhook data has no reference".to_string()))?
            .to_string();
        let metadata = match body.data.get("metadata") {
            Some(value) if value.is_object() => value.clone(),
            _ => serde_json::Value::Null,
        };

        let outcome = self
            .settle(
                &reference,
                VerifiedPayment {
                    status: GatewayStatus::Success,
                    metadata,
                    raw: body.data,
                },
            )
            .await?;

        Ok(WebhookOutcome::Processed(outcome))
    }

    async fn current_status(&self, reference: &str) -> Result<Option<TransactionStatus>, AppError> {
        Ok(self
            .transactions
            .find_received(reference)
            .await?
            .map(|tx| tx.status))
    }
}
