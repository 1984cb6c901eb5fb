use bigdecimal::BigDecimal;
use std::fmt;
use uuid::Uuid;

use crate::domain::SettlementTarget;

pub const NAME_MIN_LEN: usize = 3;
pub const NAME_MAX_LEN: usize = 120;
pub const EMAIL_MAX_LEN: usize = 254;
pub const REFERENCE_MAX_LEN: usize = 100;
/// Largest whole amount that still fits a `NUMERIC(14,2)` column.
pub const AMOUNT_MAX_WHOLE: i64 = 999_999_999_999;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

pub type ValidationResult = Result<(), ValidationError>;

pub fn sanitize_string(value: &str) -> String {
    value
        .chars()
        .filter(|ch| !ch.is_control())
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn validate_required(field: &'static str, value: &str) -> ValidationResult {
    if value.trim().is_empty() {
        return Err(ValidationError::new(field, "must not be empty"));
    }

    Ok(())
}

pub fn validate_len(field: &'static str, value: &str, min_len: usize, max_len: usize) -> ValidationResult {
    let len = value.chars().count();
    if len < min_len {
        return Err(ValidationError::new(
            field,
            format!("must be at least {} characters", min_len),
        ));
    }
    if len > max_len {
        return Err(ValidationError::new(
            field,
            format!("must be at most {} characters", max_len),
        ));
    }

    Ok(())
}

/// Payer display name, returned sanitised.
pub fn validate_payer_name(name: &str) -> Result<String, ValidationError> {
    let name = sanitize_string(name);
    validate_required("name", &name)?;
    validate_len("name", &name, NAME_MIN_LEN, NAME_MAX_LEN)?;
    Ok(name)
}

/// Loose shape check: one `@` with a dotted domain after it.
pub fn validate_email(email: &str) -> ValidationResult {
    validate_required("email", email)?;
    validate_len("email", email, 3, EMAIL_MAX_LEN)?;

    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };
    if !valid {
        return Err(ValidationError::new("email", "must be a valid email address"));
    }

    Ok(())
}

/// Amount in major units: at least `minimum`, at most two decimals, and
/// small enough for the money columns.
pub fn validate_amount(amount: &BigDecimal, minimum: &BigDecimal) -> ValidationResult {
    if amount < minimum {
        return Err(ValidationError::new(
            "amount",
            format!("must be at least {}", minimum),
        ));
    }
    if amount.with_scale(2) != *amount {
        return Err(ValidationError::new("amount", "must have at most two decimal places"));
    }
    if *amount > BigDecimal::from(AMOUNT_MAX_WHOLE) {
        return Err(ValidationError::new(
            "amount",
            format!("must not exceed {}", AMOUNT_MAX_WHOLE),
        ));
    }

    Ok(())
}

pub fn validate_reference(reference: &str) -> ValidationResult {
    validate_required("reference", reference)?;
    if reference.len() > REFERENCE_MAX_LEN
        || !reference
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' || ch == '.')
    {
        return Err(ValidationError::new("reference", "is malformed"));
    }

    Ok(())
}

/// Exactly one of `item_id` / `event_id` must be given and parse as a UUID.
pub fn parse_target(item_id: Option<&str>, event_id: Option<&str>) -> Result<SettlementTarget, ValidationError> {
    let item_id = item_id.map(str::trim).filter(|s| !s.is_empty());
    let event_id = event_id.map(str::trim).filter(|s| !s.is_empty());

    match (item_id, event_id) {
        (Some(id), None) => Uuid::parse_str(id)
            .map(|item_id| SettlementTarget::ItemContribution { item_id })
            .map_err(|_| ValidationError::new("itemId", "must be a valid id")),
        (None, Some(id)) => Uuid::parse_str(id)
            .map(|event_id| SettlementTarget::EventTip { event_id })
            .map_err(|_| ValidationError::new("eventId", "must be a valid id")),
        (Some(_), Some(_)) => Err(ValidationError::new(
            "itemId",
            "only one of itemId or eventId may be given",
        )),
        (None, None) => Err(ValidationError::new("itemId", "one of itemId or eventId is required")),
    }
}
