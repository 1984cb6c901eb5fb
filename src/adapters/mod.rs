pub mod memory;
pub mod postgres_notification_repository;
pub mod postgres_registry_repository;
pub mod postgres_transaction_repository;

pub use memory::InMemoryStore;
pub use postgres_notification_repository::PostgresNotificationRepository;
pub use postgres_registry_repository::PostgresRegistryRepository;
pub use postgres_transaction_repository::PostgresTransactionRepository;

use sqlx::PgConnection;
use uuid::Uuid;

use crate::db::models::ContributorRow;
use crate::domain::ContributorEntry;
use crate::ports::RepositoryResult;

/// Contributor entries of one item in append order.
pub(crate) async fn fetch_contributors(conn: &mut PgConnection, item_id: Uuid) -> RepositoryResult<Vec<ContributorEntry>> {
    let rows = sqlx::query_as::<_, ContributorRow>(
        "SELECT name, amount, contributed_at FROM wish_list_contributors WHERE item_id = $1 ORDER BY seq ASC",
    )
    .bind(item_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows.into_iter().map(ContributorEntry::from).collect())
}
