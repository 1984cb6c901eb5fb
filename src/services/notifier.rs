use bigdecimal::BigDecimal;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::{Notification, ReceivedTransaction};
use crate::mailer::{Mailer, OutboundEmail};
use crate::ports::{LedgerEffect, NotificationRepository, RegistryRepository};

/// Formats money as `1,234,567.80`.
pub fn format_amount(amount: &BigDecimal) -> String {
    let fixed = amount.round(2).with_scale(2).to_string();
    let (sign, digits) = match fixed.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", fixed.as_str()),
    };
    let (whole, fraction) = digits.split_once('.').unwrap_or((digits, "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!("{}{}.{}", sign, grouped, fraction)
}

/// Writes in-app notifications and emails the registry owner after a
/// settlement. Failures are logged and never returned.
pub struct NotificationFanout {
    notifications: Arc<dyn NotificationRepository>,
    registry: Arc<dyn RegistryRepository>,
    mailer: Arc<dyn Mailer>,
    currency_symbol: String,
}

struct Notice {
    message: String,
    subject: String,
    email_text: String,
}

impl NotificationFanout {
    pub fn new(
        notifications: Arc<dyn NotificationRepository>,
        registry: Arc<dyn RegistryRepository>,
        mailer: Arc<dyn Mailer>,
        currency_symbol: String,
    ) -> Self {
        Self {
            notifications,
            registry,
            mailer,
            currency_symbol,
        }
    }

    /// Returns how many notification records were stored.
    pub async fn on_settled(&self, transaction: &ReceivedTransaction, effect: &LedgerEffect) -> usize {
        let amount = format_amount(&transaction.amount);
        let symbol = &self.currency_symbol;
        let name = &transaction.payer_name;
        let title = &transaction.title;

        let (owner_id, event_id, notices) = match effect {
            LedgerEffect::Contribution(item) => {
                let mut notices = vec![Notice {
                    message: format!("{} has just contributed {} for {}", name, amount, title),
                    subject: format!("{} - New Contribution", title),
                    email_text: format!("{} has just contributed {}{} for {}", name, symbol, amount, title),
                }];
                if item.is_fully_funded() {
                    let milestone = format!("Contributions for ‘{}’ is 100% Complete.", item.product_title);
                    notices.push(Notice {
                        message: milestone.clone(),
                        subject: format!("{} - 100% Complete", title),
                        email_text: milestone,
                    });
                }
                (item.owner_id, item.event_id, notices)
            }
            LedgerEffect::Tip(event) => {
                let message = format!("{} has just tipped you {}{} for {}", name, symbol, amount, title);
                let notice = Notice {
                    message: message.clone(),
                    subject: format!("{} - New Tip", title),
                    email_text: message,
                };
                (event.owner_id, event.id, vec![notice])
            }
            LedgerEffect::TargetMissing(_) | LedgerEffect::Unresolved => return 0,
        };

        let recipient = self.owner_email(owner_id).await;
        let mut stored = 0;
        for notice in notices {
            if self.store(owner_id, event_id, notice.message).await {
                stored += 1;
            }
            if let Some(to) = &recipient {
                self.email(to, notice.subject, notice.email_text).await;
            }
        }
        stored
    }

    async fn owner_email(&self, owner_id: Uuid) -> Option<String> {
        match self.registry.get_account(owner_id).await {
            Ok(Some(account)) => Some(account.email),
            Ok(None) => {
                tracing::warn!(%owner_id, "owner account not found, skipping email");
                None
            }
            Err(e) => {
                tracing::warn!(%owner_id, error = %e, "owner lookup failed, skipping email");
                None
            }
        }
    }

    async fn store(&self, owner_id: Uuid, event_id: Uuid, message: String) -> bool {
        let notification = Notification::new(owner_id, event_id, message);
        match self.notifications.insert(&notification).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(%owner_id, %event_id, error = %e, "failed to store notification");
                false
            }
        }
    }

    async fn email(&self, to: &str, subject: String, text: String) {
        let email = OutboundEmail {
            to: to.to_string(),
            subject,
            text,
        };
        if let Err(e) = self.mailer.send(&email).await {
            tracing::warn!(to, subject = %email.subject, error = %e, "failed to send email");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn formats_with_thousands_separators() {
        assert_eq!(format_amount(&BigDecimal::from(100)), "100.00");
        assert_eq!(format_amount(&BigDecimal::from(1000)), "1,000.00");
        assert_eq!(format_amount(&BigDecimal::from_str("1234567.8").unwrap()), "1,234,567.80");
        assert_eq!(format_amount(&BigDecimal::from_str("999.999").unwrap()), "1,000.00");
        assert_eq!(format_amount(&BigDecimal::from_str("-2500.5").unwrap()), "-2,500.50");
        assert_eq!(format_amount(&BigDecimal::from(0)), "0.00");
    }
}
