//! Error types for the purchase ledger.

use thiserror::Error;

/// Main error type for ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Checksum mismatch: expected {expected}, got {got}")]
    ChecksumMismatch { expected: u32, got: u32 },

    #[error("Invalid store format: {0}")]
    InvalidFormat(String),

    #[error("Store is locked by another process")]
    Locked,

    #[error("Store not initialized")]
    NotInitialized,

    #[error("Export error: {0}")]
    Export(String),
}

impl From<serde_json::Error> for LedgerError {
    fn from(e: serde_json::Error) -> Self {
        LedgerError::Serialization(e.to_string())
    }
}

impl From<rmp_serde::encode::Error> for LedgerError {
    fn from(e: rmp_serde::encode::Error) -> Self {
        LedgerError::Serialization(e.to_string())
    }
}

impl From<rmp_serde::decode::Error> for LedgerError {
    fn from(e: rmp_serde::decode::Error) -> Self {
        LedgerError::Deserialization(e.to_string())
    }
}

impl From<rust_xlsxwriter::XlsxError> for LedgerError {
    fn from(e: rust_xlsxwriter::XlsxError) -> Self {
        LedgerError::Export(e.to_string())
    }
}

/// A single user-input problem.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ValidationIssue {
    #[error("{0} is required")]
    EmptyField(&'static str),

    #[error("item {slot}: description is required")]
    EmptyDescription { slot: usize },

    #[error("item {slot}: quantity must be greater than 0 (got {quantity})")]
    NonPositiveQuantity { slot: usize, quantity: f64 },

    #[error("not a number: {input:?}")]
    InvalidQuantity { input: String },

    #[error("not a date: {input:?}")]
    InvalidDate { input: String },

    #[error("order has no items")]
    EmptyOrder,
}

/// Aggregate validation failure.
///
/// Every problem found in one pass is collected so the caller can surface
/// them together; nothing is mutated when this is returned.
#[derive(Clone, Debug, PartialEq, Error)]
#[error("Validation failed{}", list_issues(.issues))]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationError {
    pub fn new(issues: Vec<ValidationIssue>) -> Self {
        Self { issues }
    }

    pub fn single(issue: ValidationIssue) -> Self {
        Self {
            issues: vec![issue],
        }
    }

    /// `Ok(())` when no issues were collected.
    pub fn check(issues: Vec<ValidationIssue>) -> std::result::Result<(), Self> {
        if issues.is_empty() {
            Ok(())
        } else {
            Err(Self::new(issues))
        }
    }
}

/// ": a; b" for a non-empty issue list, nothing otherwise.
fn list_issues(issues: &[ValidationIssue]) -> String {
    if issues.is_empty() {
        return String::new();
    }
    let parts: Vec<String> = issues.iter().map(ToString::to_string).collect();
    format!(": {}", parts.join("; "))
}

/// Result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message_lists_every_issue() {
        let err = ValidationError::new(vec![
            ValidationIssue::EmptyField("buyer"),
            ValidationIssue::EmptyDescription { slot: 2 },
        ]);
        assert_eq!(
            err.to_string(),
            "Validation failed: buyer is required; item 2: description is required"
        );
    }

    #[test]
    fn test_validation_error_converts_to_ledger_error() {
        let err: LedgerError = ValidationError::single(ValidationIssue::EmptyOrder).into();
        assert!(matches!(err, LedgerError::Validation(_)));
        assert_eq!(err.to_string(), ValidationError::single(ValidationIssue::EmptyOrder).to_string());
        assert_eq!(ValidationError::new(Vec::new()).to_string(), "Validation failed");
    }

    #[test]
    fn test_check_passes_without_issues() {
        assert!(ValidationError::check(Vec::new()).is_ok());
        assert!(ValidationError::check(vec![ValidationIssue::EmptyOrder]).is_err());
    }
}
