//! Error types shared across the pipeline
//!
//! Row-level gaps are not errors: extractors skip such rows and log them.
//! Everything here is either fatal for one document or, for
//! [`AdvisoryError::Unauthorized`], fatal for the whole run.

use crate::bank::BankIdentity;
use crate::store::StatementId;
use thiserror::Error;

/// Document-level extraction failures
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExtractionError {
    #[error("no transactions found in {document}")]
    NoTransactions { document: String },

    #[error("transaction dated {date} has no description line")]
    MissingDescription { date: String },

    #[error("description '{description}' repeats {count} times consecutively")]
    RepeatedDescription { description: String, count: usize },

    #[error("unreadable document: {0}")]
    Unreadable(String),

    #[error("invalid extraction pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Invariant violations that reject a whole statement
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("transaction {sr_no} belongs to {found}, statement is {expected}")]
    MixedBankIdentity {
        expected: BankIdentity,
        found: BankIdentity,
        sr_no: usize,
    },

    #[error("description '{description}' appears with different debits {first:.2} and {second:.2}")]
    ConflictingDuplicate {
        description: String,
        first: f64,
        second: f64,
    },

    #[error("could not resolve {field} after every fallback")]
    MissingAccountField { field: &'static str },
}

/// Advisory classification failures
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AdvisoryError {
    /// Invalid or rejected credential. Every later call would fail the same way.
    #[error("advisory service rejected credentials ({status}): {message}")]
    Unauthorized { status: u16, message: String },

    #[error("advisory request failed: {0}")]
    Transport(String),

    #[error("advisory request timed out")]
    Timeout,

    #[error("advisory service error {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed advisory response: {0}")]
    Malformed(String),
}

impl AdvisoryError {
    pub fn is_auth(&self) -> bool {
        matches!(self, AdvisoryError::Unauthorized { .. })
    }
}

/// Persistence collaborator failures
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    #[error("statement for {statement} carries a {transaction} transaction")]
    MixedBankIdentity {
        statement: BankIdentity,
        transaction: BankIdentity,
    },

    #[error("statement {0} not found")]
    NotFound(StatementId),
}

/// Everything that can stop one document
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DocumentError {
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Advisory(#[from] AdvisoryError),
}

impl DocumentError {
    /// Category label for per-document reports
    pub fn kind(&self) -> &'static str {
        match self {
            DocumentError::Extraction(_) => "extraction",
            DocumentError::Validation(_) | DocumentError::Store(_) => "validation",
            DocumentError::Advisory(e) if e.is_auth() => "advisory-auth",
            DocumentError::Advisory(_) => "advisory",
        }
    }

    /// True when the batch must stop instead of moving to the next document
    pub fn is_fatal_for_run(&self) -> bool {
        matches!(self, DocumentError::Advisory(e) if e.is_auth())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::missing_description(
        ExtractionError::MissingDescription { date: "05/01/24".into() }.into(),
        "extraction",
        "transaction dated 05/01/24 has no description line"
    )]
    #[case::mixed_bank(
        ValidationError::MixedBankIdentity { expected: BankIdentity::Cbi, found: BankIdentity::Sbi, sr_no: 3 }.into(),
        "validation",
        "transaction 3 belongs to SBI, statement is CBI"
    )]
    #[case::missing_field(
        ValidationError::MissingAccountField { field: "account_number" }.into(),
        "validation",
        "could not resolve account_number after every fallback"
    )]
    #[case::auth(
        AdvisoryError::Unauthorized { status: 401, message: "invalid_api_key".into() }.into(),
        "advisory-auth",
        "advisory service rejected credentials (401): invalid_api_key"
    )]
    fn test_document_error_kind_and_display(
        #[case] err: DocumentError,
        #[case] kind: &str,
        #[case] display: &str,
    ) {
        assert_eq!(err.kind(), kind);
        assert_eq!(err.to_string(), display);
    }

    #[test]
    fn test_only_auth_is_fatal_for_run() {
        let auth: DocumentError = AdvisoryError::Unauthorized { status: 403, message: String::new() }.into();
        let timeout: DocumentError = AdvisoryError::Timeout.into();
        let extraction: DocumentError = ExtractionError::NoTransactions { document: "x".into() }.into();
        assert!(auth.is_fatal_for_run());
        assert!(!timeout.is_fatal_for_run());
        assert!(!extraction.is_fatal_for_run());
    }

    #[test]
    fn test_conflicting_duplicate_formats_amounts() {
        let err = ValidationError::ConflictingDuplicate {
            description: "TRF TO RAVI".into(),
            first: 100.0,
            second: 250.5,
        };
        assert_eq!(
            err.to_string(),
            "description 'TRF TO RAVI' appears with different debits 100.00 and 250.50"
        );
    }
}
