pub mod client;
pub mod signature;

pub use client::PaystackClient;

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),
    #[error("Gateway unavailable: {0}")]
    Unavailable(String),
    #[error("Gateway rejected request: {0}")]
    InvalidRequest(String),
    #[error("Reference not found: {0}")]
    NotFound(String),
    #[error("Invalid response from gateway: {0}")]
    InvalidResponse(String),
    #[error("Circuit breaker open: {0}")]
    CircuitBreakerOpen(String),
}

impl GatewayError {
    /// Failures that say something about the provider's health and count
    /// toward opening the circuit.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            GatewayError::RequestError(_) | GatewayError::Unavailable(_) | GatewayError::InvalidResponse(_)
        )
    }
}

/// Provider-side outcome of a charge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GatewayStatus {
    Success,
    Failed,
    Pending,
}

impl GatewayStatus {
    pub fn from_provider(status: &str) -> Self {
        match status {
            "success" => GatewayStatus::Success,
            "failed" | "reversed" => GatewayStatus::Failed,
            // "abandoned" is what an initialized charge reports until the
            // customer pays, so it stays open like "ongoing".
            _ => GatewayStatus::Pending,
        }
    }
}

#[derive(Debug, Clone)]
pub struct InitializeRequest {
    pub email: String,
    pub amount: BigDecimal,
    pub metadata: serde_json::Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct InitializedPayment {
    pub reference: String,
    pub authorization_url: String,
    pub access_code: String,
}

/// Authoritative charge state fetched from the provider.
#[derive(Debug, Clone)]
pub struct VerifiedPayment {
    pub status: GatewayStatus,
    pub metadata: serde_json::Value,
    pub raw: serde_json::Value,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn initialize(&self, request: &InitializeRequest) -> Result<InitializedPayment, GatewayError>;

    async fn verify(&self, reference: &str) -> Result<VerifiedPayment, GatewayError>;

    fn check_signature(&self, raw_body: &[u8], signature: &str) -> bool;
}
