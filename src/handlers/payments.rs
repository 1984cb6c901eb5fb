use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::{IntoParams, ToSchema};

use crate::domain::TransactionStatus;
use crate::error::AppError;
use crate::middleware::AuthenticatedOwner;
use crate::services::{PaymentRequest, SettleOutcome};
use crate::validation;
use crate::AppState;

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Deserialize, IntoParams)]
pub struct Pagination {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl Pagination {
    pub fn bounds(&self) -> (i64, i64) {
        let limit = self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        let offset = self.offset.unwrap_or(0).max(0);
        (limit, offset)
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PayRequest {
    pub email: Option<String>,
    #[schema(value_type = f64)]
    pub amount: BigDecimal,
    pub name: String,
    pub item_id: Option<String>,
    pub event_id: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct VerifyResponse {
    pub message: String,
    #[schema(value_type = String)]
    pub status: TransactionStatus,
}

#[utoipa::path(
    post,
    path = "/pay",
    request_body = PayRequest,
    responses(
        (status = 200, description = "Checkout created"),
        (status = 400, description = "Invalid payment request"),
        (status = 404, description = "Payment target not found"),
        (status = 503, description = "Payment gateway unavailable")
    ),
    tag = "Payments"
)]
pub async fn initialize_payment(
    State(state): State<AppState>,
    Json(payload): Json<PayRequest>,
) -> Result<impl IntoResponse, AppError> {
    let payment = state
        .payments
        .initialize(PaymentRequest {
            email: payload.email,
            amount: payload.amount,
            name: payload.name,
            item_id: payload.item_id,
            event_id: payload.event_id,
        })
        .await?;

    Ok(Json(json!({
        "status": true,
        "message": "Authorization URL created",
        "data": payment,
    })))
}

#[utoipa::path(
    get,
    path = "/pay/verify/{reference}",
    params(("reference" = String, Path, description = "Gateway transaction reference")),
    responses(
        (status = 200, description = "Payment settled", body = VerifyResponse),
        (status = 400, description = "Payment not successful", body = VerifyResponse),
        (status = 404, description = "Transaction not found"),
        (status = 503, description = "Payment gateway unavailable")
    ),
    tag = "Payments"
)]
pub async fn verify_payment(
    State(state): State<AppState>,
    Path(reference): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    validation::validate_reference(&reference)?;

    let outcome = state.settlement.poll(&reference).await?;
    let (code, message) = match &outcome {
        SettleOutcome::NotFound => {
            return Err(AppError::NotFound("Transaction not found".to_string()));
        }
        SettleOutcome::AlreadySettled(TransactionStatus::Success) => (StatusCode::OK, "Already processed"),
        SettleOutcome::Settled { .. } => (StatusCode::OK, "Transaction verified and processed"),
        SettleOutcome::AlreadySettled(_) | SettleOutcome::Failed | SettleOutcome::StillPending => {
            (StatusCode::BAD_REQUEST, "Payment not successful yet")
        }
    };

    let status = outcome.status().unwrap_or(TransactionStatus::Pending);
    Ok((
        code,
        Json(json!({
            "data": VerifyResponse {
                message: message.to_string(),
                status,
            }
        })),
    ))
}

#[utoipa::path(
    get,
    path = "/transaction/received",
    params(Pagination),
    responses(
        (status = 200, description = "Received transactions, newest first"),
        (status = 401, description = "Not authenticated")
    ),
    tag = "Payments"
)]
pub async fn list_received(
    State(state): State<AppState>,
    AuthenticatedOwner(owner_id): AuthenticatedOwner,
    Query(pagination): Query<Pagination>,
) -> Result<impl IntoResponse, AppError> {
    let (limit, offset) = pagination.bounds();
    let transactions = state.ledger.received(owner_id, limit, offset).await?;
    Ok(Json(json!({ "data": transactions })))
}

#[utoipa::path(
    get,
    path = "/transaction/withdraw",
    params(Pagination),
    responses(
        (status = 200, description = "Withdraw transactions, newest first"),
        (status = 401, description = "Not authenticated")
    ),
    tag = "Payments"
)]
pub async fn list_withdrawals(
    State(state): State<AppState>,
    AuthenticatedOwner(owner_id): AuthenticatedOwner,
    Query(pagination): Query<Pagination>,
) -> Result<impl IntoResponse, AppError> {
    let (limit, offset) = pagination.bounds();
    let withdrawals = state.ledger.withdrawals(owner_id, limit, offset).await?;
    Ok(Json(json!({ "data": withdrawals })))
}
