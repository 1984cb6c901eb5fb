use axum::{body::Bytes, extract::State, http::HeaderMap, response::IntoResponse, Json};
use serde_json::json;

use crate::error::AppError;
use crate::gateway::signature::SIGNATURE_HEADER;
use crate::services::{SettleOutcome, WebhookOutcome};
use crate::AppState;

/// Provider push. Takes the raw body so the signature is computed over the
/// exact bytes that were sent.
#[utoipa::path(
    post,
    path = "/paystack/webhook",
    request_body(content = String, description = "Raw provider event", content_type = "application/json"),
    params(("x-paystack-signature" = String, Header, description = "Hex HMAC-SHA512 of the raw body")),
    responses(
        (status = 200, description = "Event accepted"),
        (status = 401, description = "Signature mismatch"),
        (status = 500, description = "Settlement failed, provider should retry")
    ),
    tag = "Payments"
)]
pub async fn paystack_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let signature = headers.get(SIGNATURE_HEADER).and_then(|h| h.to_str().ok());

    let outcome = state.settlement.on_webhook(&body, signature).await?;

    let response = match outcome {
        WebhookOutcome::Ignored(event) => json!({ "message": "ignored", "event": event }),
        WebhookOutcome::Processed(SettleOutcome::NotFound) => json!({ "message": "unknown reference" }),
        WebhookOutcome::Processed(outcome) => json!({
            "message": "processed",
            "status": outcome.status(),
        }),
    };

    Ok(Json(response))
}
