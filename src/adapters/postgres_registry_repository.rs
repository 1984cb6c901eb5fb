//! Postgres implementation of RegistryRepository.

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::adapters::fetch_contributors;
use crate::db::models::{AccountRow, EventRow, WishListItemRow};
use crate::domain::{Account, Event, OwnerSummary, WishListItem};
use crate::ports::{
    Backref, CascadeReport, ChildKind, RegistryRepository, RepositoryError, RepositoryResult,
};

#[derive(Clone)]
pub struct PostgresRegistryRepository {
    pool: PgPool,
}

impl PostgresRegistryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RegistryRepository for PostgresRegistryRepository {
    async fn get_event(&self, id: Uuid) -> RepositoryResult<Option<Event>> {
        let row = sqlx::query_as::<_, EventRow>("SELECT * FROM events WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(EventRow::into_domain))
    }

    async fn get_item(&self, id: Uuid) -> RepositoryResult<Option<WishListItem>> {
        let mut conn = self.pool.acquire().await?;

        let row = sqlx::query_as::<_, WishListItemRow>("SELECT * FROM wish_list_items WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

        match row {
            Some(row) => {
                let contributors = fetch_contributors(&mut conn, id).await?;
                Ok(Some(row.into_domain(contributors)))
            }
            None => Ok(None),
        }
    }

    async fn get_account(&self, id: Uuid) -> RepositoryResult<Option<Account>> {
        let row = sqlx::query_as::<_, AccountRow>(
            "SELECT id, email, first_name, last_name FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Account::from))
    }

    async fn delete_event_cascade(&self, event_id: Uuid, owner_id: Uuid) -> RepositoryResult<CascadeReport> {
        let mut tx = self.pool.begin().await?;

        let event = sqlx::query_as::<_, EventRow>(
            "SELECT * FROM events WHERE id = $1 AND user_id = $2 FOR UPDATE",
        )
        .bind(event_id)
        .bind(owner_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| RepositoryError::NotFound(format!("event {}", event_id)))?;

        // Children are matched by the parent's id lists and by their own
        // event_id, so neither direction can be left dangling.
        let items_deleted = sqlx::query(
            "DELETE FROM wish_list_items WHERE id = ANY($1) OR event_id = $2",
        )
        .bind(&event.wish_list)
        .bind(event_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let party_details_deleted = match event.party_details {
            Some(party_id) => sqlx::query("DELETE FROM party_details WHERE id = $1")
                .bind(party_id)
                .execute(&mut *tx)
                .await?
                .rows_affected(),
            None => 0,
        };

        let messages_deleted = sqlx::query(
            "DELETE FROM anonymous_messages WHERE id = ANY($1) OR event_id = $2",
        )
        .bind(&event.messages)
        .bind(event_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(event_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(CascadeReport {
            items_deleted,
            party_details_deleted,
            messages_deleted,
        })
    }

    async fn delete_child(&self, kind: ChildKind, child_id: Uuid, owner_id: Uuid) -> RepositoryResult<bool> {
        let sql = match kind {
            ChildKind::WishListItem => "DELETE FROM wish_list_items WHERE id = $1 AND user_id = $2",
            ChildKind::PartyDetails => "DELETE FROM party_details WHERE id = $1 AND user_id = $2",
            ChildKind::AnonymousMessage => {
                r#"
                DELETE FROM anonymous_messages m
                USING events e
                WHERE m.id = $1 AND m.event_id = e.id AND e.user_id = $2
                "#
            }
        };

        let result = sqlx::query(sql)
            .bind(child_id)
            .bind(owner_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn unlink(&self, backref: Backref, child_id: Uuid, owner_id: Uuid) -> RepositoryResult<u64> {
        let field = backref.field();
        let sql = if backref.is_array() {
            format!(
                "UPDATE events SET {field} = array_remove({field}, $1), updated_at = NOW() WHERE user_id = $2 AND $1 = ANY({field})"
            )
        } else {
            format!("UPDATE events SET {field} = NULL, updated_at = NOW() WHERE user_id = $2 AND {field} = $1")
        };

        let result = sqlx::query(&sql)
            .bind(child_id)
            .bind(owner_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn owner_summary(&self, owner_id: Uuid) -> RepositoryResult<OwnerSummary> {
        let (total_events, total_gifts, total_tips): (i64, i64, BigDecimal) = sqlx::query_as(
            r#"
            SELECT COUNT(*),
                   COALESCE(SUM(cardinality(wish_list)), 0)::BIGINT,
                   COALESCE(SUM(tips), 0)
            FROM events
            WHERE user_id = $1
            "#,
        )
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await?;

        let total_contributions: BigDecimal = sqlx::query_scalar(
            "SELECT COALESCE(SUM(total_contributions), 0) FROM wish_list_items WHERE user_id = $1",
        )
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(OwnerSummary {
            total_events,
            total_gifts,
            total_tips,
            total_contributions,
        })
    }
}
