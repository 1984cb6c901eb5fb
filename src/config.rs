use anyhow::Context;
use bigdecimal::BigDecimal;
use dotenvy::dotenv;
use serde::Deserialize;
use std::env;
use std::str::FromStr;

pub const DEFAULT_PAYSTACK_BASE_URL: &str = "https://api.paystack.co";
pub const DEFAULT_PAYER_EMAIL: &str = "customer@eventark.com";

/// Outbound email transport settings. All three keys must be present.
#[derive(Debug, Deserialize, Clone)]
pub struct MailConfig {
    pub api_url: String,
    pub api_key: String,
    pub from: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server_port: u16,
    pub database_url: String,
    pub database_max_connections: u32,
    pub paystack_base_url: String,
    pub paystack_secret_key: String,
    pub default_payer_email: String,
    pub min_payment_amount: BigDecimal,
    pub currency_symbol: String,
    pub mail: Option<MailConfig>,
    pub gateway_failure_threshold: u32,
    pub gateway_reset_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv().ok(); // Load .env file if present

        let min_payment_amount = env_or("MIN_PAYMENT_AMOUNT", "100");
        let min_payment_amount = BigDecimal::from_str(&min_payment_amount)
            .with_context(|| format!("MIN_PAYMENT_AMOUNT is not a number: {}", min_payment_amount))?;

        Ok(Config {
            server_port: env_or("SERVER_PORT", "3000").parse().context("SERVER_PORT")?,
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            database_max_connections: env_or("DATABASE_MAX_CONNECTIONS", "5")
                .parse()
                .context("DATABASE_MAX_CONNECTIONS")?,
            paystack_base_url: env_or("PAYSTACK_BASE_URL", DEFAULT_PAYSTACK_BASE_URL),
            paystack_secret_key: env::var("PAYSTACK_SECRET_KEY").context("PAYSTACK_SECRET_KEY must be set")?,
            default_payer_email: env_or("DEFAULT_PAYER_EMAIL", DEFAULT_PAYER_EMAIL),
            min_payment_amount,
            currency_symbol: env_or("CURRENCY_SYMBOL", "₦"),
            mail: mail_from_env(),
            gateway_failure_threshold: env_or("GATEWAY_FAILURE_THRESHOLD", "3")
                .parse()
                .context("GATEWAY_FAILURE_THRESHOLD")?,
            gateway_reset_timeout_secs: env_or("GATEWAY_RESET_TIMEOUT_SECS", "60")
                .parse()
                .context("GATEWAY_RESET_TIMEOUT_SECS")?,
        })
    }

    /// Settings for running without a real environment (tests, local runs).
    pub fn for_tests(paystack_base_url: &str, secret_key: &str) -> Self {
        Config {
            server_port: 3000,
            database_url: String::new(),
            database_max_connections: 1,
            paystack_base_url: paystack_base_url.to_string(),
            paystack_secret_key: secret_key.to_string(),
            default_payer_email: DEFAULT_PAYER_EMAIL.to_string(),
            min_payment_amount: BigDecimal::from(100),
            currency_symbol: "₦".to_string(),
            mail: None,
            gateway_failure_threshold: 3,
            gateway_reset_timeout_secs: 60,
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn mail_from_env() -> Option<MailConfig> {
    match (env::var("MAIL_API_URL"), env::var("MAIL_API_KEY"), env::var("MAIL_FROM")) {
        (Ok(api_url), Ok(api_key), Ok(from)) => Some(MailConfig { api_url, api_key, from }),
        _ => None,
    }
}
