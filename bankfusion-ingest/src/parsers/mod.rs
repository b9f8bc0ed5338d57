//! Per-bank transaction parsers

pub mod central_bank;
pub mod columns;
pub mod narration;
pub mod table;
pub mod text_fallback;

use bankfusion_core::{BankIdentity, Document, ExtractionError, RawTransaction};
use tracing::{info, warn};

pub use central_bank::{CentralBankParser, LineKind, LineMachine, LineState};
pub use table::{BankProfile, TableParser};
pub use text_fallback::TextFallback;

/// One layout family. Implementations return rows in document order; row
/// gaps are logged and skipped, document-level failures are errors.
pub trait StatementParser: Send + Sync {
    fn bank(&self) -> BankIdentity;

    fn parse(&self, doc: &Document) -> Result<Vec<RawTransaction>, ExtractionError>;
}

/// Parser for a detected bank. Unidentified documents get the generic table parser.
pub fn parser_for(bank: BankIdentity) -> Result<Box<dyn StatementParser>, ExtractionError> {
    Ok(match bank {
        BankIdentity::Cbi => Box::new(CentralBankParser),
        other => Box::new(TableParser::new(BankProfile::for_bank(other))?),
    })
}

/// Run the bank's parser, fall back to a plain line scan when it finds
/// nothing, and number the result from 1.
pub fn extract_transactions(
    doc: &Document,
    bank: BankIdentity,
) -> Result<Vec<RawTransaction>, ExtractionError> {
    let parser = parser_for(bank)?;
    let mut txns = parser.parse(doc)?;

    if txns.is_empty() && bank != BankIdentity::Cbi {
        warn!(document = %doc.name, %bank, "no table rows, scanning text lines");
        txns = TextFallback::new()?.scan(doc);
    }
    if txns.is_empty() {
        return Err(ExtractionError::NoTransactions {
            document: doc.name.clone(),
        });
    }

    for (idx, txn) in txns.iter_mut().enumerate() {
        txn.sr_no = idx + 1;
    }
    info!(document = %doc.name, %bank, count = txns.len(), "transactions extracted");
    Ok(txns)
}
