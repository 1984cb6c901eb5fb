use bigdecimal::BigDecimal;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::{ReceivedTransaction, SettlementTarget};
use crate::error::AppError;
use crate::gateway::{InitializeRequest, InitializedPayment, PaymentGateway};
use crate::ports::{RegistryRepository, TransactionRepository};
use crate::validation;

#[derive(Debug, Clone)]
pub struct PaymentRequest {
    pub email: Option<String>,
    pub amount: BigDecimal,
    pub name: String,
    pub item_id: Option<String>,
    pub event_id: Option<String>,
}

/// Owner and title snapshot taken from the payment target at initialization.
struct ResolvedTarget {
    owner_id: Uuid,
    title: String,
}

/// Starts payments: validates the request, asks the gateway for a checkout,
/// and records the attempt as `pending` under the returned reference.
pub struct PaymentService {
    transactions: Arc<dyn TransactionRepository>,
    registry: Arc<dyn RegistryRepository>,
    gateway: Arc<dyn PaymentGateway>,
    default_payer_email: String,
    min_amount: BigDecimal,
}

impl PaymentService {
    pub fn new(
        transactions: Arc<dyn TransactionRepository>,
        registry: Arc<dyn RegistryRepository>,
        gateway: Arc<dyn PaymentGateway>,
        default_payer_email: String,
        min_amount: BigDecimal,
    ) -> Self {
        Self {
            transactions,
            registry,
            gateway,
            default_payer_email,
            min_amount,
        }
    }

    pub async fn initialize(&self, request: PaymentRequest) -> Result<InitializedPayment, AppError> {
        let name = validation::validate_payer_name(&request.name)?;
        validation::validate_amount(&request.amount, &self.min_amount)?;
        let amount = request.amount.with_scale(2);
        let email = match request.email.as_deref().map(str::trim) {
            Some(email) if !email.is_empty() => email.to_string(),
            _ => self.default_payer_email.clone(),
        };
        validation::validate_email(&email)?;
        let target = validation::parse_target(request.item_id.as_deref(), request.event_id.as_deref())?;

        let resolved = self.resolve(&target).await?;

        let mut metadata = json!({
            "email": email,
            "name": name,
            "title": resolved.title,
            "amount": amount.to_string(),
        });
        match target {
            SettlementTarget::ItemContribution { item_id } => metadata["itemId"] = json!(item_id),
            SettlementTarget::EventTip { event_id } => metadata["eventId"] = json!(event_id),
        }

        let payment = self
            .gateway
            .initialize(&InitializeRequest {
                email: email.clone(),
                amount: amount.clone(),
                metadata,
            })
            .await?;

        validation::validate_reference(&payment.reference)
            .map_err(|e| AppError::Internal(format!("gateway returned bad reference: {}", e)))?;

        let record = ReceivedTransaction::new(
            payment.reference.clone(),
            resolved.owner_id,
            amount,
            resolved.title,
            name,
            email,
            target,
        );
        if let Err(e) = self.transactions.insert_received(&record).await {
            tracing::error!(reference = %payment.reference, error = %e, "failed to record initialized payment");
            return Err(e.into());
        }

        tracing::info!(
            reference = %payment.reference,
            kind = record.kind.as_str(),
            amount = %record.amount,
            "payment initialized"
        );
        Ok(payment)
    }

    async fn resolve(&self, target: &SettlementTarget) -> Result<ResolvedTarget, AppError> {
        match *target {
            SettlementTarget::ItemContribution { item_id } => {
                let item = self
                    .registry
                    .get_item(item_id)
                    .await?
                    .ok_or_else(|| AppError::NotFound(format!("wish list item {}", item_id)))?;
                Ok(ResolvedTarget {
                    owner_id: item.owner_id,
                    title: item.product_title,
                })
            }
            SettlementTarget::EventTip { event_id } => {
                let event = self
                    .registry
                    .get_event(event_id)
                    .await?
                    .ok_or_else(|| AppError::NotFound(format!("event {}", event_id)))?;
                Ok(ResolvedTarget {
                    owner_id: event.owner_id,
                    title: event.title,
                })
            }
        }
    }
}

