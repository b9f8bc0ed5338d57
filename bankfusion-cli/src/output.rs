//! Sidecar JSON written next to each processed statement

use bankfusion_core::{
    AccountInfo, BankStatement, NormalizedTransaction, RawTransaction, StatementMetadata,
    StatementSummary,
};
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize)]
struct Sidecar<'a> {
    metadata: &'a StatementMetadata,
    account: &'a AccountInfo,
    transactions: Vec<SidecarEntry<'a>>,
    summary: StatementSummary,
}

#[derive(Debug, Serialize)]
struct SidecarEntry<'a> {
    original: &'a RawTransaction,
    normalized: &'a NormalizedTransaction,
}

pub fn render(statement: &BankStatement) -> serde_json::Result<String> {
    let sidecar = Sidecar {
        metadata: &statement.metadata,
        account: &statement.account,
        transactions: statement
            .transactions
            .iter()
            .map(|e| SidecarEntry {
                original: &e.original,
                normalized: &e.normalized,
            })
            .collect(),
        summary: statement.summary(),
    };
    serde_json::to_string_pretty(&sidecar)
}

pub fn sidecar_path(dir: &Path, stem: &str) -> PathBuf {
    dir.join(format!("{stem}.json"))
}

/// Write `<dir>/<stem>.json`, creating `dir` as needed
pub fn write_sidecar(dir: &Path, stem: &str, statement: &BankStatement) -> io::Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = sidecar_path(dir, stem);
    let json = render(statement).map_err(io::Error::other)?;
    fs::write(&path, json)?;
    Ok(path)
}
