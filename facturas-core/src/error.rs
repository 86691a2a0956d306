use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// A single failed validation rule: field path plus a human-readable reason.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// The complete set of violations found in one validation pass.
///
/// Validation never stops at the first failure; callers get every broken
/// field at once so the input can be corrected in a single round.
#[derive(Debug, Clone, Serialize, PartialEq, Eq, Default)]
pub struct Violations(pub Vec<FieldViolation>);

impl Violations {
    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.push(FieldViolation::new(field, message));
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn contains_field(&self, field: &str) -> bool {
        self.0.iter().any(|v| v.field == field)
    }
}

impl fmt::Display for Violations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for v in &self.0 {
            if !first {
                write!(f, "; ")?;
            }
            write!(f, "{}", v)?;
            first = false;
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(Violations),

    #[error("Currency mismatch on {context}: expected {expected}, got {actual}")]
    CurrencyMismatch {
        context: String,
        expected: String,
        actual: String,
    },

    #[error("Invoice {invoice_id} is already settled")]
    AlreadySettled { invoice_id: String },

    #[error("Invalid payment amount: {amount}")]
    InvalidAmount { amount: Decimal },

    #[error("Conflicting concurrent write on document {document_id} after {attempts} attempts")]
    ConcurrencyConflict { document_id: String, attempts: u32 },

    #[error("Quote {quote_id} has already been converted to an invoice")]
    QuoteAlreadyConverted { quote_id: String },

    #[error("Query unavailable: {0}")]
    QueryUnavailable(String),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Store error: {0}")]
    StoreError(anyhow::Error),

    #[error("Configuration error: {0}")]
    ConfigError(anyhow::Error),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigError(anyhow::Error::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn violations_display_joins_all_fields() {
        let mut violations = Violations::default();
        violations.push("clientName", "must not be empty");
        violations.push("items", "at least one item is required");

        let rendered = violations.to_string();
        assert!(rendered.contains("clientName: must not be empty"));
        assert!(rendered.contains("items: at least one item is required"));
        assert!(violations.contains_field("items"));
        assert!(!violations.contains_field("total"));
    }
}
