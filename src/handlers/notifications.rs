use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::error::AppError;
use crate::middleware::AuthenticatedOwner;
use crate::AppState;

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct NotificationFilter {
    pub event_id: Option<Uuid>,
}

#[utoipa::path(
    get,
    path = "/notifications",
    params(NotificationFilter),
    responses(
        (status = 200, description = "Owner's notifications, newest first"),
        (status = 401, description = "Not authenticated")
    ),
    tag = "Registry"
)]
pub async fn list_notifications(
    State(state): State<AppState>,
    AuthenticatedOwner(owner_id): AuthenticatedOwner,
    Query(filter): Query<NotificationFilter>,
) -> Result<impl IntoResponse, AppError> {
    let notifications = state
        .repositories
        .notifications
        .list_for_owner(owner_id, filter.event_id)
        .await?;

    Ok(Json(json!({ "data": notifications })))
}
