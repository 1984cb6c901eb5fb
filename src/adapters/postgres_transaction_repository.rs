//! Postgres implementation of TransactionRepository.

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::adapters::fetch_contributors;
use crate::db::models::{EventRow, ReceivedTransactionRow, WishListItemRow, WithdrawTransactionRow};
use crate::domain::{Event, ReceivedTransaction, SettlementTarget, WishListItem, WithdrawTransaction};
use crate::ports::{
    LedgerEffect, RepositoryError, RepositoryResult, SettleWrite, TransactionRepository,
};

/// Postgres-backed transaction repository.
#[derive(Clone)]
pub struct PostgresTransactionRepository {
    pool: PgPool,
}

impl PostgresTransactionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TransactionRepository for PostgresTransactionRepository {
    async fn insert_received(&self, tx: &ReceivedTransaction) -> RepositoryResult<ReceivedTransaction> {
        let (target_kind, target_id) = match tx.target.map(|t| t.to_columns()) {
            Some((kind, id)) => (Some(kind), Some(id)),
            None => (None, None),
        };

        let row = sqlx::query_as::<_, ReceivedTransactionRow>(
            r#"
            INSERT INTO received_transactions (
                id, reference, user_id, amount, title, payer_name, payer_email,
                kind, target_kind, target_id, status, metadata, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING *
            "#,
        )
        .bind(tx.id)
        .bind(&tx.reference)
        .bind(tx.owner_id)
        .bind(&tx.amount)
        .bind(&tx.title)
        .bind(&tx.payer_name)
        .bind(&tx.payer_email)
        .bind(tx.kind.as_str())
        .bind(target_kind)
        .bind(target_id)
        .bind(tx.status.as_str())
        .bind(&tx.metadata)
        .bind(tx.created_at)
        .bind(tx.updated_at)
        .fetch_one(&self.pool)
        .await?;

        row.into_domain()
    }

    async fn find_received(&self, reference: &str) -> RepositoryResult<Option<ReceivedTransaction>> {
        let row = sqlx::query_as::<_, ReceivedTransactionRow>(
            "SELECT * FROM received_transactions WHERE reference = $1",
        )
        .bind(reference)
        .fetch_optional(&self.pool)
        .await?;

        row.map(ReceivedTransactionRow::into_domain).transpose()
    }

    async fn mark_failed(&self, reference: &str, raw: &serde_json::Value) -> RepositoryResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE received_transactions
            SET status = 'failed', metadata = $2, updated_at = NOW()
            WHERE reference = $1 AND status = 'pending'
            "#,
        )
        .bind(reference)
        .bind(raw)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn settle(
        &self,
        reference: &str,
        raw: &serde_json::Value,
        fallback_target: Option<SettlementTarget>,
    ) -> RepositoryResult<SettleWrite> {
        let mut tx = self.pool.begin().await?;

        // The conditional update is the only gate: a concurrent settler blocks
        // on the row lock and then matches zero rows.
        let settled = sqlx::query_as::<_, ReceivedTransactionRow>(
            r#"
            UPDATE received_transactions
            SET status = 'success', metadata = $2, updated_at = NOW()
            WHERE reference = $1 AND status = 'pending'
            RETURNING *
            "#,
        )
        .bind(reference)
        .bind(raw)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = settled else {
            tx.rollback().await?;
            let current: Option<String> =
                sqlx::query_scalar("SELECT status FROM received_transactions WHERE reference = $1")
                    .bind(reference)
                    .fetch_optional(&self.pool)
                    .await?;

            return match current {
                None => Ok(SettleWrite::NotFound),
                Some(status) => Ok(SettleWrite::NotPending(
                    status.parse().map_err(RepositoryError::Corrupt)?,
                )),
            };
        };

        let transaction = row.into_domain()?;
        let effect = match transaction.target.or(fallback_target) {
            Some(target @ SettlementTarget::ItemContribution { item_id }) => {
                match credit_item(&mut tx, item_id, &transaction.payer_name, &transaction.amount).await? {
                    Some(item) => LedgerEffect::Contribution(item),
                    None => LedgerEffect::TargetMissing(target),
                }
            }
            Some(target @ SettlementTarget::EventTip { event_id }) => {
                match credit_event(&mut tx, event_id, &transaction.amount).await? {
                    Some(event) => LedgerEffect::Tip(event),
                    None => LedgerEffect::TargetMissing(target),
                }
            }
            None => LedgerEffect::Unresolved,
        };

        tx.commit().await?;

        Ok(SettleWrite::Settled { transaction, effect })
    }

    async fn list_received(&self, owner_id: Uuid, limit: i64, offset: i64) -> RepositoryResult<Vec<ReceivedTransaction>> {
        let rows = sqlx::query_as::<_, ReceivedTransactionRow>(
            r#"
            SELECT * FROM received_transactions
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(owner_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ReceivedTransactionRow::into_domain).collect()
    }

    async fn list_withdrawals(&self, owner_id: Uuid, limit: i64, offset: i64) -> RepositoryResult<Vec<WithdrawTransaction>> {
        let rows = sqlx::query_as::<_, WithdrawTransactionRow>(
            r#"
            SELECT * FROM withdraw_transactions
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(owner_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(WithdrawTransactionRow::into_domain).collect()
    }
}

/// Appends the contributor entry and bumps the running total. `None` if the item is gone.
async fn credit_item(
    conn: &mut PgConnection,
    item_id: Uuid,
    name: &str,
    amount: &BigDecimal,
) -> RepositoryResult<Option<WishListItem>> {
    let row = sqlx::query_as::<_, WishListItemRow>(
        r#"
        UPDATE wish_list_items
        SET total_contributions = total_contributions + $2, updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(item_id)
    .bind(amount)
    .fetch_optional(&mut *conn)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    sqlx::query("INSERT INTO wish_list_contributors (item_id, name, amount) VALUES ($1, $2, $3)")
        .bind(item_id)
        .bind(name)
        .bind(amount)
        .execute(&mut *conn)
        .await?;

    let contributors = fetch_contributors(&mut *conn, item_id).await?;
    Ok(Some(row.into_domain(contributors)))
}

async fn credit_event(
    conn: &mut PgConnection,
    event_id: Uuid,
    amount: &BigDecimal,
) -> RepositoryResult<Option<Event>> {
    let row = sqlx::query_as::<_, EventRow>(
        "UPDATE events SET tips = tips + $2, updated_at = NOW() WHERE id = $1 RETURNING *",
    )
    .bind(event_id)
    .bind(amount)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(row.map(EventRow::into_domain))
}
