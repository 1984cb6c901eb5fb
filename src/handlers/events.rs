use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use serde_json::json;
use uuid::Uuid;

use crate::error::AppError;
use crate::middleware::AuthenticatedOwner;
use crate::ports::ChildKind;
use crate::AppState;

#[utoipa::path(
    delete,
    path = "/events/{id}",
    params(("id" = Uuid, Path, description = "Event id")),
    responses(
        (status = 200, description = "Event and its children deleted"),
        (status = 404, description = "Event not found"),
        (status = 500, description = "Cascade aborted, nothing deleted")
    ),
    tag = "Registry"
)]
pub async fn delete_event(
    State(state): State<AppState>,
    AuthenticatedOwner(owner_id): AuthenticatedOwner,
    Path(event_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let report = state.cascade.delete_event(event_id, owner_id).await?;
    Ok(Json(json!({ "message": "Event Deleted", "data": report })))
}

async fn delete_child(
    state: AppState,
    kind: ChildKind,
    child_id: Uuid,
    owner_id: Uuid,
    message: &'static str,
) -> Result<Json<serde_json::Value>, AppError> {
    let deletion = state.cascade.delete_child(kind, child_id, owner_id).await?;
    Ok(Json(json!({ "message": message, "data": deletion })))
}

#[utoipa::path(
    delete,
    path = "/events/message/{id}",
    params(("id" = Uuid, Path, description = "Anonymous message id")),
    responses(
        (status = 200, description = "Message deleted and unlinked"),
        (status = 404, description = "Nothing to delete")
    ),
    tag = "Registry"
)]
pub async fn delete_message(
    State(state): State<AppState>,
    AuthenticatedOwner(owner_id): AuthenticatedOwner,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    delete_child(state, ChildKind::AnonymousMessage, id, owner_id, "Message Deleted").await
}

#[utoipa::path(
    delete,
    path = "/events/wishlist/{id}",
    params(("id" = Uuid, Path, description = "Wish-list item id")),
    responses(
        (status = 200, description = "Item deleted and unlinked"),
        (status = 404, description = "Nothing to delete")
    ),
    tag = "Registry"
)]
pub async fn delete_wishlist_item(
    State(state): State<AppState>,
    AuthenticatedOwner(owner_id): AuthenticatedOwner,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    delete_child(state, ChildKind::WishListItem, id, owner_id, "Wish List Item Deleted").await
}

#[utoipa::path(
    delete,
    path = "/events/party/{id}",
    params(("id" = Uuid, Path, description = "Party details id")),
    responses(
        (status = 200, description = "Party details deleted and unlinked"),
        (status = 404, description = "Nothing to delete")
    ),
    tag = "Registry"
)]
pub async fn delete_party_details(
    State(state): State<AppState>,
    AuthenticatedOwner(owner_id): AuthenticatedOwner,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    delete_child(state, ChildKind::PartyDetails, id, owner_id, "Party Details Deleted").await
}

#[utoipa::path(
    get,
    path = "/wishlist/{id}/contributions",
    params(("id" = Uuid, Path, description = "Wish-list item id")),
    responses(
        (status = 200, description = "Contributor log and funding percentage"),
        (status = 404, description = "Item not found")
    ),
    tag = "Registry"
)]
pub async fn item_contributions(
    State(state): State<AppState>,
    AuthenticatedOwner(owner_id): AuthenticatedOwner,
    Path(item_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let ledger = state.ledger.item_ledger(item_id, owner_id).await?;
    Ok(Json(json!({ "data": ledger })))
}

#[utoipa::path(
    get,
    path = "/dashboard",
    responses(
        (status = 200, description = "Owner totals"),
        (status = 401, description = "Not authenticated")
    ),
    tag = "Registry"
)]
pub async fn dashboard(
    State(state): State<AppState>,
    AuthenticatedOwner(owner_id): AuthenticatedOwner,
) -> Result<impl IntoResponse, AppError> {
    let summary = state.ledger.dashboard(owner_id).await?;
    Ok(Json(json!({ "data": summary })))
}
