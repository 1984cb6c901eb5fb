use async_trait::async_trait;
use bigdecimal::{BigDecimal, ToPrimitive};
use failsafe::futures::CircuitBreaker as FuturesCircuitBreaker;
use failsafe::{backoff, failure_policy, Config, Error as FailsafeError, StateMachine};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use super::{
    signature, GatewayError, GatewayStatus, InitializeRequest, InitializedPayment, PaymentGateway,
    VerifiedPayment,
};

/// Paystack response envelope.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    message: String,
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct InitializeData {
    reference: String,
    authorization_url: String,
    access_code: String,
}

type Breaker = StateMachine<failure_policy::ConsecutiveFailures<backoff::EqualJittered>, ()>;

/// HTTP client for the Paystack transaction API
#[derive(Clone)]
pub struct PaystackClient {
    client: Client,
    base_url: String,
    secret_key: String,
    circuit_breaker: Breaker,
}

/// Converts major units to the integer minor units the provider expects.
pub fn to_minor_units(amount: &BigDecimal) -> Option<i64> {
    (amount * BigDecimal::from(100)).round(0).to_i64()
}

impl PaystackClient {
    /// Creates a client with the default breaker (3 consecutive failures, 60-120s backoff)
    pub fn new(base_url: String, secret_key: String) -> Self {
        Self::with_circuit_breaker(base_url, secret_key, 3, 60)
    }

    pub fn with_circuit_breaker(
        base_url: String,
        secret_key: String,
        failure_threshold: u32,
        reset_timeout_secs: u64,
    ) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();

        let backoff = backoff::equal_jittered(
            Duration::from_secs(reset_timeout_secs),
            Duration::from_secs(reset_timeout_secs * 2),
        );
        let policy = failure_policy::consecutive_failures(failure_threshold, backoff);
        let circuit_breaker = Config::new().failure_policy(policy).build();

        PaystackClient {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            secret_key,
            circuit_breaker,
        }
    }

    /// Returns the current state of the circuit breaker
    pub fn circuit_state(&self) -> String {
        if self.circuit_breaker.is_call_permitted() {
            "closed".to_string()
        } else {
            "open".to_string()
        }
    }

    async fn guarded<T, F>(&self, call: F) -> Result<T, GatewayError>
    where
        T: Send,
        F: std::future::Future<Output = Result<T, GatewayError>> + Send,
    {
        match self
            .circuit_breaker
            .call_with(|e: &GatewayError| e.is_transient(), call)
            .await
        {
            Ok(value) => Ok(value),
            Err(FailsafeError::Rejected) => Err(GatewayError::CircuitBreakerOpen(
                "payment gateway circuit breaker is open".to_string(),
            )),
            Err(FailsafeError::Inner(e)) => Err(e),
        }
    }
}

#[async_trait]
impl PaymentGateway for PaystackClient {
    async fn initialize(&self, request: &InitializeRequest) -> Result<InitializedPayment, GatewayError> {
        let minor = to_minor_units(&request.amount)
            .filter(|m| *m > 0)
            .ok_or_else(|| GatewayError::InvalidRequest(format!("invalid amount {}", request.amount)))?;

        let url = format!("{}/transaction/initialize", self.base_url);
        let body = json!({
            "email": request.email,
            "amount": minor,
            "metadata": request.metadata,
        });
        let client = self.client.clone();
        let secret = self.secret_key.clone();

        self.guarded(async move {
            let response = client.post(&url).bearer_auth(&secret).json(&body).send().await?;
            let status = response.status();

            if status.is_server_error() {
                return Err(GatewayError::Unavailable(format!("initialize returned {}", status)));
            }
            if status.is_client_error() {
                let message = response
                    .json::<Envelope<serde_json::Value>>()
                    .await
                    .map(|e| e.message)
                    .unwrap_or_else(|_| status.to_string());
                return Err(GatewayError::InvalidRequest(message));
            }

            let envelope = response.json::<Envelope<InitializeData>>().await?;
            let data = envelope
                .data
                .ok_or_else(|| GatewayError::InvalidResponse("initialize response has no data".to_string()))?;

            Ok(InitializedPayment {
                reference: data.reference,
                authorization_url: data.authorization_url,
                access_code: data.access_code,
            })
        })
        .await
    }

    async fn verify(&self, reference: &str) -> Result<VerifiedPayment, GatewayError> {
        let url = format!("{}/transaction/verify/{}", self.base_url, reference);
        let client = self.client.clone();
        let secret = self.secret_key.clone();
        let reference = reference.to_string();

        self.guarded(async move {
            let response = client.get(&url).bearer_auth(&secret).send().await?;
            let status = response.status();

            if status == StatusCode::NOT_FOUND || status == StatusCode::BAD_REQUEST {
                return Err(GatewayError::NotFound(reference));
            }
            if !status.is_success() {
                return Err(GatewayError::Unavailable(format!("verify returned {}", status)));
            }

            let envelope = response.json::<Envelope<serde_json::Value>>().await?;
            let raw = envelope
                .data
                .ok_or_else(|| GatewayError::InvalidResponse("verify response has no data".to_string()))?;
            let provider_status = raw
                .get("status")
                .and_then(|s| s.as_str())
                .ok_or_else(|| GatewayError::InvalidResponse("verify response has no status".to_string()))?;

            // Metadata comes back as "" when none was attached at initialization.
            let metadata = match raw.get("metadata") {
                Some(value) if value.is_object() => value.clone(),
                _ => serde_json::Value::Null,
            };

            Ok(VerifiedPayment {
                status: GatewayStatus::from_provider(provider_status),
                metadata,
                raw: raw.clone(),
            })
        })
        .await
    }

    fn check_signature(&self, raw_body: &[u8], signature_header: &str) -> bool {
        signature::verify(&self.secret_key, raw_body, signature_header)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    const SECRET: &str = "sk_test_xxx";

    fn initialize_request() -> InitializeRequest {
        InitializeRequest {
            email: "guest@example.com".to_string(),
            amount: BigDecimal::from_str("1500.50").unwrap(),
            metadata: json!({ "name": "Guest", "eventId": "e-1" }),
        }
    }

    #[test]
    fn test_client_creation() {
        let client = PaystackClient::new("https://api.paystack.co/".to_string(), SECRET.to_string());
        assert_eq!(client.base_url, "https://api.paystack.co");
        assert_eq!(client.circuit_state(), "closed");
    }

    #[test]
    fn test_minor_units() {
        assert_eq!(to_minor_units(&BigDecimal::from(100)), Some(10_000));
        assert_eq!(to_minor_units(&BigDecimal::from_str("1500.50").unwrap()), Some(150_050));
    }

    #[test]
    fn test_check_signature_uses_secret_key() {
        let client = PaystackClient::new("https://api.paystack.co".to_string(), SECRET.to_string());
        let body = br#"{"event":"charge.success"}"#;
        assert!(client.check_signature(body, &signature::sign(SECRET, body).unwrap()));
        assert!(!client.check_signature(body, &signature::sign("other", body).unwrap()));
    }

    #[tokio::test]
    async fn test_initialize_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/transaction/initialize")
            .match_header("authorization", "Bearer sk_test_xxx")
            .match_body(mockito::Matcher::PartialJson(json!({ "amount": 150050 })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"status":true,"message":"Authorization URL created","data":{
                    "authorization_url":"https://checkout.paystack.com/abc",
                    "access_code":"abc","reference":"ref-123"}}"#,
            )
            .create_async()
            .await;

        let client = PaystackClient::new(server.url(), SECRET.to_string());
        let payment = client.initialize(&initialize_request()).await.unwrap();

        mock.assert_async().await;
        assert_eq!(payment.reference, "ref-123");
        assert_eq!(payment.access_code, "abc");
    }

    #[tokio::test]
    async fn test_initialize_rejected() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/transaction/initialize")
            .with_status(400)
            .with_body(r#"{"status":false,"message":"Invalid Email Address Passed"}"#)
            .create_async()
            .await;

        let client = PaystackClient::new(server.url(), SECRET.to_string());
        let result = client.initialize(&initialize_request()).await;

        match result {
            Err(GatewayError::InvalidRequest(message)) => assert_eq!(message, "Invalid Email Address Passed"),
            other => panic!("expected InvalidRequest, got {:?}", other.map(|p| p.reference)),
        }
    }

    #[tokio::test]
    async fn test_verify_success() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/transaction/verify/ref-123")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"status":true,"message":"Verification successful","data":{
                    "status":"success","reference":"ref-123","amount":150050,
                    "metadata":{"name":"Guest","itemId":"i-1"}}}"#,
            )
            .create_async()
            .await;

        let client = PaystackClient::new(server.url(), SECRET.to_string());
        let verified = client.verify("ref-123").await.unwrap();

        assert_eq!(verified.status, GatewayStatus::Success);
        assert_eq!(verified.metadata["itemId"], "i-1");
        assert_eq!(verified.raw["amount"], 150050);
    }

    #[tokio::test]
    async fn test_verify_empty_metadata_is_null() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/transaction/verify/ref-9")
            .with_status(200)
            .with_body(r#"{"status":true,"message":"ok","data":{"status":"abandoned","metadata":""}}"#)
            .create_async()
            .await;

        let client = PaystackClient::new(server.url(), SECRET.to_string());
        let verified = client.verify("ref-9").await.unwrap();

        assert_eq!(verified.status, GatewayStatus::Pending);
        assert!(verified.metadata.is_null());
    }

    #[tokio::test]
    async fn test_verify_unknown_reference() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/transaction/verify/missing")
            .with_status(400)
            .with_body(r#"{"status":false,"message":"Transaction reference not found"}"#)
            .create_async()
            .await;

        let client = PaystackClient::new(server.url(), SECRET.to_string());
        let result = client.verify("missing").await;

        assert!(matches!(result, Err(GatewayError::NotFound(r)) if r == "missing"));
        assert_eq!(client.circuit_state(), "closed");
    }

    #[tokio::test]
    async fn test_circuit_breaker_opens_after_failures() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", mockito::Matcher::Regex(r"^/transaction/verify/.*".into()))
            .with_status(503)
            .expect_at_least(3)
            .create_async()
            .await;

        let client = PaystackClient::with_circuit_breaker(server.url(), SECRET.to_string(), 3, 60);

        for _ in 0..3 {
            let result = client.verify("ref-x").await;
            assert!(matches!(result, Err(GatewayError::Unavailable(_))));
        }

        let result = client.verify("ref-x").await;
        assert!(matches!(result, Err(GatewayError::CircuitBreakerOpen(_))));
        assert_eq!(client.circuit_state(), "open");
    }
}
