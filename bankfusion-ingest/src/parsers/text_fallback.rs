//! Last-resort line scan for documents with no usable tables

use super::narration::collapse_whitespace;
use crate::amount::{self, Amount};
use bankfusion_core::{Document, RawTransaction};
use regex::Regex;
use tracing::debug;

const PLACEHOLDER_DESCRIPTION: &str = "Transaction";

#[derive(Debug, Clone)]
pub struct TextFallback {
    date: Regex,
    amount: Regex,
}

impl TextFallback {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            date: Regex::new(r"\d{1,2}[-/]\d{1,2}[-/]\d{2,4}")?,
            amount: Regex::new(r"[\d,]+\.\d{2}")?,
        })
    }

    pub fn scan(&self, doc: &Document) -> Vec<RawTransaction> {
        let text = doc.text();
        let mut out = Vec::new();
        for line in text.lines() {
            if let Some(txn) = self.scan_line(line, out.len() + 1) {
                out.push(txn);
            }
        }
        debug!(count = out.len(), "text fallback scanned");
        out
    }

    fn scan_line(&self, line: &str, sr_no: usize) -> Option<RawTransaction> {
        let date = self.date.find(line)?.as_str().to_string();
        let amounts: Vec<Amount> = self
            .amount
            .find_iter(line)
            .filter_map(|m| amount::classify_cell(m.as_str()).amount())
            .collect();

        let (debit, credit, balance) = match amounts.as_slice() {
            [] => return None,
            [only] => (only.value, 0.0, None),
            [value, balance] => (value.value, 0.0, Some(balance.value)),
            [debit, credit, balance, ..] => {
                let (d, c) = amount::resolve_exclusive(Some(*debit), Some(*credit));
                (d, c, Some(balance.value))
            }
        };

        let stripped = self.amount.replace_all(&self.date.replace_all(line, ""), "").into_owned();
        let description = match collapse_whitespace(&stripped) {
            d if d.is_empty() => PLACEHOLDER_DESCRIPTION.to_string(),
            d => d,
        };
        RawTransaction::from_amounts(sr_no, date, description, debit, credit, balance)
    }
}
