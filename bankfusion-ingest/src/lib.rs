//! bankfusion-ingest: bank detection, account metadata and per-bank transaction parsers.

pub mod amount;
pub mod dates;
pub mod detect;
pub mod layout;
pub mod metadata;
pub mod parsers;

pub use detect::{BankDetector, Detection, DetectionStrategy};
pub use metadata::MetadataExtractor;
pub use parsers::{StatementParser, extract_transactions, parser_for};

use bankfusion_core::{AccountInfo, BankIdentity, Document, DocumentError, RawTransaction};
use tracing::info_span;

/// Everything pulled out of one document before normalization
#[derive(Debug, Clone)]
pub struct Extraction {
    pub detection: Detection,
    pub account: AccountInfo,
    pub transactions: Vec<RawTransaction>,
}

impl Extraction {
    pub fn bank(&self) -> BankIdentity {
        self.detection.bank
    }
}

/// Detector and metadata patterns compiled once, reused across documents
#[derive(Debug, Clone)]
pub struct StatementExtractor {
    detector: BankDetector,
    metadata: MetadataExtractor,
}

impl StatementExtractor {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            detector: BankDetector::new()?,
            metadata: MetadataExtractor::new()?,
        })
    }

    /// Detect the bank, then read account metadata and transactions.
    /// Text-only pages get whitespace-aligned tables first.
    pub fn extract(
        &self,
        doc: Document,
        hint: Option<BankIdentity>,
    ) -> Result<Extraction, DocumentError> {
        let _span = info_span!("extract", document = %doc.name).entered();
        let doc = layout::with_layout_tables(doc);
        let detection = self.detector.detect(&doc, hint);
        let account = self.metadata.extract(&doc, detection.bank)?;
        let transactions = extract_transactions(&doc, detection.bank)?;
        Ok(Extraction {
            detection,
            account,
            transactions,
        })
    }
}
