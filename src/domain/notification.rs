use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// In-app notification. Created once, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub event_id: Uuid,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(owner_id: Uuid, event_id: Uuid, message: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id,
            event_id,
            message,
            created_at: Utc::now(),
        }
    }
}
