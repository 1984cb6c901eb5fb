#![allow(dead_code)]

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::Utc;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use eventark_core::adapters::InMemoryStore;
use eventark_core::config::Config;
use eventark_core::domain::{Account, Event, ReceivedTransaction, SettlementTarget, WishListItem};
use eventark_core::gateway::{
    signature, GatewayError, GatewayStatus, InitializeRequest, InitializedPayment, PaymentGateway,
    VerifiedPayment,
};
use eventark_core::mailer::{MailError, Mailer, OutboundEmail};
use eventark_core::ports::TransactionRepository;
use eventark_core::{AppState, Repositories};

pub const SECRET: &str = "sk_test_webhook_secret";

/// Gateway double: verify answers with a configurable status and counts calls.
pub struct StubGateway {
    status: Mutex<GatewayStatus>,
    metadata: Mutex<Value>,
    verify_calls: AtomicUsize,
    initialize_calls: AtomicUsize,
}

impl StubGateway {
    pub fn new(status: GatewayStatus) -> Self {
        Self {
            status: Mutex::new(status),
            metadata: Mutex::new(Value::Null),
            verify_calls: AtomicUsize::new(0),
            initialize_calls: AtomicUsize::new(0),
        }
    }

    pub fn set_status(&self, status: GatewayStatus) {
        *self.status.lock().unwrap() = status;
    }

    pub fn set_metadata(&self, metadata: Value) {
        *self.metadata.lock().unwrap() = metadata;
    }

    pub fn verify_calls(&self) -> usize {
        self.verify_calls.load(Ordering::SeqCst)
    }

    pub fn initialize_calls(&self) -> usize {
        self.initialize_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentGateway for StubGateway {
    async fn initialize(&self, _request: &InitializeRequest) -> Result<InitializedPayment, GatewayError> {
        self.initialize_calls.fetch_add(1, Ordering::SeqCst);
        let reference = format!("ref-{}", Uuid::new_v4().simple());
        Ok(InitializedPayment {
            authorization_url: format!("https://checkout.example.com/{}", reference),
            access_code: "access".to_string(),
            reference,
        })
    }

    async fn verify(&self, reference: &str) -> Result<VerifiedPayment, GatewayError> {
        self.verify_calls.fetch_add(1, Ordering::SeqCst);
        let status = *self.status.lock().unwrap();
        let metadata = self.metadata.lock().unwrap().clone();
        Ok(VerifiedPayment {
            status,
            raw: json!({
                "reference": reference,
                "status": format!("{:?}", status).to_lowercase(),
                "metadata": metadata.clone(),
            }),
            metadata,
        })
    }

    fn check_signature(&self, raw_body: &[u8], signature_header: &str) -> bool {
        signature::verify(SECRET, raw_body, signature_header)
    }
}

/// Mailer double that records every message, or fails every send.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<OutboundEmail>>,
    failing: bool,
}

impl RecordingMailer {
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            failing: true,
        }
    }

    pub fn sent(&self) -> Vec<OutboundEmail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: &OutboundEmail) -> Result<(), MailError> {
        if self.failing {
            return Err(MailError::Rejected("mail transport down".to_string()));
        }
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}

pub struct Fixture {
    pub store: InMemoryStore,
    pub gateway: Arc<StubGateway>,
    pub mailer: Arc<RecordingMailer>,
    pub state: AppState,
    pub owner: Account,
    pub event: Event,
    pub item: WishListItem,
}

impl Fixture {
    /// One owner with one event and one wish-list item with a 1000 target.
    pub fn new() -> Self {
        Self::with_mailer(RecordingMailer::default())
    }

    pub fn with_mailer(mailer: RecordingMailer) -> Self {
        let store = InMemoryStore::new();
        let owner = Account {
            id: Uuid::new_v4(),
            email: "owner@example.com".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Obi".to_string(),
        };
        store.insert_account(owner.clone()).unwrap();

        let event = Event::new(owner.id, "Ada".to_string(), "Ada's 30th".to_string(), Utc::now());
        store.insert_event(event.clone()).unwrap();

        let item = WishListItem::new(event.id, owner.id, "Stand Mixer".to_string(), BigDecimal::from(500), 2);
        store.insert_item(item.clone()).unwrap();

        let gateway = Arc::new(StubGateway::new(GatewayStatus::Success));
        let mailer = Arc::new(mailer);
        let config = Config::for_tests("http://127.0.0.1:9", SECRET);
        let state = AppState::new(
            &config,
            None,
            Repositories::in_memory(store.clone()),
            gateway.clone(),
            mailer.clone(),
        );

        Self {
            store,
            gateway,
            mailer,
            state,
            owner,
            event,
            item,
        }
    }

    pub async fn pending_contribution(&self, reference: &str, amount: i64) -> ReceivedTransaction {
        self.pending(reference, amount, SettlementTarget::ItemContribution { item_id: self.item.id })
            .await
    }

    pub async fn pending_tip(&self, reference: &str, amount: i64) -> ReceivedTransaction {
        self.pending(reference, amount, SettlementTarget::EventTip { event_id: self.event.id })
            .await
    }

    async fn pending(&self, reference: &str, amount: i64, target: SettlementTarget) -> ReceivedTransaction {
        let title = match target {
            SettlementTarget::ItemContribution { .. } => self.item.product_title.clone(),
            SettlementTarget::EventTip { .. } => self.event.title.clone(),
        };
        let tx = ReceivedTransaction::new(
            reference.to_string(),
            self.owner.id,
            BigDecimal::from(amount),
            title,
            "Grace".to_string(),
            "grace@example.com".to_string(),
            target,
        );
        self.store.insert_received(&tx).await.unwrap()
    }
}

pub fn success(metadata: Value) -> VerifiedPayment {
    VerifiedPayment {
        status: GatewayStatus::Success,
        raw: json!({ "status": "success", "metadata": metadata.clone() }),
        metadata,
    }
}

pub fn failed() -> VerifiedPayment {
    VerifiedPayment {
        status: GatewayStatus::Failed,
        metadata: Value::Null,
        raw: json!({ "status": "failed" }),
    }
}

pub fn charge_success_body(reference: &str) -> Vec<u8> {
    serde_json::to_vec(&json!({
        "event": "charge.success",
        "data": {
            "reference": reference,
            "status": "success",
            "metadata": { "name": "Grace" }
        }
    }))
    .unwrap()
}
