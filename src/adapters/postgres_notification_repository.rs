use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::models::NotificationRow;
use crate::domain::Notification;
use crate::ports::{NotificationRepository, RepositoryResult};

#[derive(Clone)]
pub struct PostgresNotificationRepository {
    pool: PgPool,
}

impl PostgresNotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationRepository for PostgresNotificationRepository {
    async fn insert(&self, notification: &Notification) -> RepositoryResult<()> {
        sqlx::query(
            "INSERT INTO notifications (id, user_id, event_id, message, created_at) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(notification.id)
        .bind(notification.owner_id)
        .bind(notification.event_id)
        .bind(&notification.message)
        .bind(notification.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_for_owner(&self, owner_id: Uuid, event_id: Option<Uuid>) -> RepositoryResult<Vec<Notification>> {
        let rows = sqlx::query_as::<_, NotificationRow>(
            r#"
            SELECT * FROM notifications
            WHERE user_id = $1 AND ($2::UUID IS NULL OR event_id = $2)
            ORDER BY created_at DESC
            "#,
        )
        .bind(owner_id)
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Notification::from).collect())
    }
}
