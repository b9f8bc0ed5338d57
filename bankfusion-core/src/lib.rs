//! bankfusion-core: statement data model, error types and invariants

pub mod bank;
pub mod category;
pub mod consistency;
pub mod document;
pub mod error;
pub mod statement;
pub mod store;

pub use bank::BankIdentity;
pub use category::{Category, Channel, Direction, TransactionKind};
pub use consistency::{check_unique_debit_descriptions, validate_statement};
pub use document::{Document, Page, Row, Table, cell_text};
pub use error::{AdvisoryError, DocumentError, ExtractionError, StoreError, ValidationError};
pub use statement::{
    AccountInfo, BankStatement, ClassificationSource, NormalizationMethod, NormalizedTransaction,
    RawTransaction, StatementEntry, StatementMetadata, StatementSummary,
};
pub use store::{InMemoryRepository, StatementId, StatementRepository, StoredStatement};
