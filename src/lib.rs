pub mod adapters;
pub mod cli;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod gateway;
pub mod handlers;
pub mod mailer;
pub mod middleware;
pub mod ports;
pub mod services;
pub mod startup;
pub mod validation;

use axum::{
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::adapters::{
    InMemoryStore, PostgresNotificationRepository, PostgresRegistryRepository,
    PostgresTransactionRepository,
};
use crate::config::Config;
use crate::gateway::PaymentGateway;
use crate::mailer::Mailer;
use crate::ports::{NotificationRepository, RegistryRepository, TransactionRepository};
use crate::services::{
    CascadeManager, LedgerView, NotificationFanout, PaymentService, SettlementEngine,
};

/// Storage handles shared by every service.
#[derive(Clone)]
pub struct Repositories {
    pub transactions: Arc<dyn TransactionRepository>,
    pub registry: Arc<dyn RegistryRepository>,
    pub notifications: Arc<dyn NotificationRepository>,
}

impl Repositories {
    pub fn postgres(pool: sqlx::PgPool) -> Self {
        Self {
            transactions: Arc::new(PostgresTransactionRepository::new(pool.clone())),
            registry: Arc::new(PostgresRegistryRepository::new(pool.clone())),
            notifications: Arc::new(PostgresNotificationRepository::new(pool)),
        }
    }

    pub fn in_memory(store: InMemoryStore) -> Self {
        Self {
            transactions: Arc::new(store.clone()),
            registry: Arc::new(store.clone()),
            notifications: Arc::new(store),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    /// Present when backed by Postgres; used by the health check.
    pub db: Option<sqlx::PgPool>,
    pub repositories: Repositories,
    pub settlement: Arc<SettlementEngine>,
    pub payments: Arc<PaymentService>,
    pub cascade: Arc<CascadeManager>,
    pub ledger: Arc<LedgerView>,
}

impl AppState {
    pub fn new(
        config: &Config,
        db: Option<sqlx::PgPool>,
        repositories: Repositories,
        gateway: Arc<dyn PaymentGateway>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        let notifier = NotificationFanout::new(
            repositories.notifications.clone(),
            repositories.registry.clone(),
            mailer,
            config.currency_symbol.clone(),
        );
        let settlement = SettlementEngine::new(repositories.transactions.clone(), gateway.clone(), notifier);
        let payments = PaymentService::new(
            repositories.transactions.clone(),
            repositories.registry.clone(),
            gateway,
            config.default_payer_email.clone(),
            config.min_payment_amount.clone(),
        );

        AppState {
            db,
            settlement: Arc::new(settlement),
            payments: Arc::new(payments),
            cascade: Arc::new(CascadeManager::new(repositories.registry.clone())),
            ledger: Arc::new(LedgerView::new(
                repositories.transactions.clone(),
                repositories.registry.clone(),
            )),
            repositories,
        }
    }
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api-docs/openapi.json", get(handlers::openapi_json))
        .route("/pay", post(handlers::payments::initialize_payment))
        .route("/pay/verify/:reference", get(handlers::payments::verify_payment))
        .route("/paystack/webhook", post(handlers::webhook::paystack_webhook))
        .route("/transaction/received", get(handlers::payments::list_received))
        .route("/transaction/withdraw", get(handlers::payments::list_withdrawals))
        .route("/notifications", get(handlers::notifications::list_notifications))
        .route("/events/:id", delete(handlers::events::delete_event))
        .route("/events/message/:id", delete(handlers::events::delete_message))
        .route("/events/wishlist/:id", delete(handlers::events::delete_wishlist_item))
        .route("/events/party/:id", delete(handlers::events::delete_party_details))
        .route("/wishlist/:id/contributions", get(handlers::events::item_contributions))
        .route("/dashboard", get(handlers::events::dashboard))
        .layer(axum::middleware::from_fn(middleware::request_logger_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
