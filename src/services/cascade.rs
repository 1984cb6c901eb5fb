use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::AppError;
use crate::ports::{Backref, CascadeReport, ChildKind, RegistryRepository, RepositoryError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildDeletion {
    pub deleted: bool,
    pub parents_unlinked: u64,
}

/// Keeps event aggregates free of dangling references.
pub struct CascadeManager {
    registry: Arc<dyn RegistryRepository>,
}

impl CascadeManager {
    pub fn new(registry: Arc<dyn RegistryRepository>) -> Self {
        Self { registry }
    }

    /// Deletes the event and everything it owns, or nothing at all.
    pub async fn delete_event(&self, event_id: Uuid, owner_id: Uuid) -> Result<CascadeReport, AppError> {
        match self.registry.delete_event_cascade(event_id, owner_id).await {
            Ok(report) => {
                tracing::info!(
                    %event_id,
                    items = report.items_deleted,
                    party_details = report.party_details_deleted,
                    messages = report.messages_deleted,
                    "event deleted"
                );
                Ok(report)
            }
            Err(RepositoryError::NotFound(what)) => Err(AppError::NotFound(what)),
            Err(e) => {
                tracing::error!(%event_id, error = %e, "event cascade aborted");
                Err(AppError::CascadeFailure(e.to_string()))
            }
        }
    }

    /// Deletes one child and pulls its id from the owner's events.
    ///
    /// The unlink step runs even when the child is already gone, so calling
    /// this again repairs a run that stopped between the two steps. Returns
    /// `NotFound` only when neither step changed anything.
    pub async fn delete_child(&self, kind: ChildKind, child_id: Uuid, owner_id: Uuid) -> Result<ChildDeletion, AppError> {
        let deleted = self.registry.delete_child(kind, child_id, owner_id).await?;
        let parents_unlinked = match self
            .registry
            .unlink(Backref::for_child(kind), child_id, owner_id)
            .await
        {
            Ok(n) => n,
            Err(e) if deleted => {
                tracing::warn!(?kind, %child_id, error = %e, "child deleted but back-reference left behind");
                0
            }
            Err(e) => return Err(e.into()),
        };

        if !deleted && parents_unlinked == 0 {
            return Err(AppError::NotFound(format!("{:?} {}", kind, child_id)));
        }

        Ok(ChildDeletion {
            deleted,
            parents_unlinked,
        })
    }
}
