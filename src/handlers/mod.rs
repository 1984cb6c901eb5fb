pub mod events;
pub mod notifications;
pub mod payments;
pub mod webhook;

use crate::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use utoipa::{OpenApi, ToSchema};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DbPoolStats {
    pub active_connections: u32,
    pub idle_connections: u32,
    pub max_connections: u32,
    pub usage_percent: f32,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
    pub db: String,
    pub db_pool: Option<DbPoolStats>,
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthStatus),
        (status = 503, description = "Service is unhealthy", body = HealthStatus)
    ),
    tag = "Health"
)]
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let (db_status, db_pool) = match &state.db {
        Some(pool) => {
            let db_status = match sqlx::query("SELECT 1").execute(pool).await {
                Ok(_) => "connected",
                Err(_) => "disconnected",
            };

            let active_connections = pool.size();
            let max_connections = pool.options().get_max_connections();
            let stats = DbPoolStats {
                active_connections,
                idle_connections: pool.num_idle() as u32,
                max_connections,
                usage_percent: (active_connections as f32 / max_connections.max(1) as f32) * 100.0,
            };
            (db_status, Some(stats))
        }
        None => ("in-memory", None),
    };

    let healthy = db_status != "disconnected";
    let health_response = HealthStatus {
        status: if healthy { "healthy" } else { "unhealthy" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        db: db_status.to_string(),
        db_pool,
    };

    let status_code = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(health_response))
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        payments::initialize_payment,
        payments::verify_payment,
        payments::list_received,
        payments::list_withdrawals,
        webhook::paystack_webhook,
        notifications::list_notifications,
        events::delete_event,
        events::delete_message,
        events::delete_wishlist_item,
        events::delete_party_details,
        events::item_contributions,
        events::dashboard,
    ),
    components(schemas(
        HealthStatus,
        DbPoolStats,
        payments::PayRequest,
        payments::VerifyResponse,
    )),
    tags(
        (name = "Health"),
        (name = "Payments"),
        (name = "Registry"),
    )
)]
pub struct ApiDoc;

pub async fn openapi_json() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}
