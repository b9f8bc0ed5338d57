//! One document end to end: load, extract, normalize, validate, persist, write

use bankfusion_core::{
    BankIdentity, BankStatement, DocumentError, InMemoryRepository, StatementId,
    StatementMetadata, StatementRepository, StatementSummary, validate_statement,
};
use bankfusion_ingest::StatementExtractor;
use bankfusion_normalize::Normalizer;
use chrono::Utc;
use chrono_tz::Tz;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;
use tracing::{Instrument, info, info_span};

use crate::loader::{document_stem, load_document};
use crate::output::{sidecar_path, write_sidecar};

/// Sidecars of loose documents go under this directory, split by bank
pub const LOOSE_DIR: &str = "loose";

/// Where a document was found; decides where its sidecar goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    /// Inside `<input_dir>/<name>`; mirrored as `<output_root>/<name>`
    BankFolder(String),
    /// Directly inside the input dir; `<output_root>/loose/<BANK>`
    Loose,
    /// Named on the command line; `<output_root>/<BANK>`
    Single,
}

/// A document waiting to be processed
#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    pub path: PathBuf,
    /// Informational; detection still runs
    pub hint: Option<BankIdentity>,
    pub origin: Origin,
}

impl Job {
    pub fn file(path: impl Into<PathBuf>, hint: Option<BankIdentity>) -> Self {
        Self {
            path: path.into(),
            hint,
            origin: Origin::Single,
        }
    }

    pub fn loose(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            hint: None,
            origin: Origin::Loose,
        }
    }

    /// Directory the sidecar is written to once the bank is known
    pub fn output_dir(&self, root: &Path, bank: BankIdentity) -> PathBuf {
        match &self.origin {
            Origin::BankFolder(name) => root.join(name),
            Origin::Loose => root.join(LOOSE_DIR).join(bank.code()),
            Origin::Single => root.join(bank.code()),
        }
    }
}

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error("write {path}: {source}")]
    Output {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl ProcessError {
    pub fn kind(&self) -> &'static str {
        match self {
            ProcessError::Document(e) => e.kind(),
            ProcessError::Output { .. } => "output",
        }
    }

    pub fn is_fatal_for_run(&self) -> bool {
        matches!(self, ProcessError::Document(e) if e.is_fatal_for_run())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Processed {
    pub id: StatementId,
    pub bank: BankIdentity,
    pub summary: StatementSummary,
    pub output: PathBuf,
}

pub struct Pipeline {
    extractor: StatementExtractor,
    normalizer: Normalizer,
    timezone: Tz,
    output_root: PathBuf,
    repository: Mutex<InMemoryRepository>,
    claimed: Mutex<HashSet<PathBuf>>,
}

impl Pipeline {
    pub fn new(
        extractor: StatementExtractor,
        normalizer: Normalizer,
        timezone: Tz,
        output_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            extractor,
            normalizer,
            timezone,
            output_root: output_root.into(),
            repository: Mutex::new(InMemoryRepository::new()),
            claimed: Mutex::new(HashSet::new()),
        }
    }

    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    pub fn stored_statements(&self) -> usize {
        self.repository
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    /// Reserve a sidecar path; a second document of the same run may not reuse it
    fn claim(&self, path: &Path) -> Result<(), ProcessError> {
        let fresh = self
            .claimed
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(path.to_path_buf());
        if fresh {
            Ok(())
        } else {
            Err(ProcessError::Output {
                path: path.to_path_buf(),
                source: std::io::Error::new(
                    std::io::ErrorKind::AlreadyExists,
                    "sidecar already written by another document in this run",
                ),
            })
        }
    }

    pub async fn process(&self, job: &Job) -> Result<Processed, ProcessError> {
        let span = info_span!("document", path = %job.path.display());
        self.process_inner(job).instrument(span).await
    }

    async fn process_inner(&self, job: &Job) -> Result<Processed, ProcessError> {
        let doc = load_document(&job.path).map_err(DocumentError::from)?;
        let extraction = self.extractor.extract(doc, job.hint)?;
        let bank = extraction.bank();

        let transactions = self
            .normalizer
            .normalize_batch(bank, &extraction.transactions)
            .await
            .map_err(DocumentError::from)?;

        let statement = BankStatement {
            bank,
            account: extraction.account,
            metadata: StatementMetadata {
                generated_at: Utc::now().with_timezone(&self.timezone).fixed_offset(),
                total_transactions: transactions.len(),
                bank_name: bank.display_name().to_string(),
                normalization_method: self.normalizer.method(),
            },
            transactions,
        };
        validate_statement(&statement).map_err(DocumentError::from)?;
        let summary = statement.summary();

        let dir = job.output_dir(&self.output_root, bank);
        let stem = document_stem(&job.path);
        self.claim(&sidecar_path(&dir, &stem))?;

        let id = self
            .repository
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(statement.clone())
            .map_err(DocumentError::from)?;

        let output = write_sidecar(&dir, &stem, &statement)
            .map_err(|source| ProcessError::Output { path: dir, source })?;

        info!(%bank, %id, rows = summary.total_transactions, output = %output.display(), "statement processed");
        Ok(Processed {
            id,
            bank,
            summary,
            output,
        })
    }
}
