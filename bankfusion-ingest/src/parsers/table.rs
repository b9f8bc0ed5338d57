//! Column-driven parser for table layouts.
//!
//! Shared by SBI, HDFC, BOI, Axis, Union and unidentified banks; the
//! [`BankProfile`] carries what differs between them.

use super::StatementParser;
use super::columns::{ColumnMap, find_header_row, resolve_columns};
use super::narration::merge_description;
use crate::amount::{self, Amount, Cell, DECIMAL_LOSS_CEILING, DECIMAL_LOSS_THRESHOLD};
use crate::dates::DateMatcher;
use bankfusion_core::{
    BankIdentity, Direction, Document, ExtractionError, RawTransaction, Row, Table, cell_text,
};
use regex::Regex;
use tracing::{debug, warn};

const DEFAULT_CONTINUATION_LIMIT: usize = 5;
const AXIS_CONTINUATION_LIMIT: usize = 20;

/// Date-column values that mark a repeated header row
const HEADER_CELLS: [&str; 6] = [
    "DATE",
    "TXN DATE",
    "TRAN DATE",
    "VALUE DATE",
    "TRAN ID",
    "BALANCE",
];

/// Leading text of summary rows that are never transactions
const SUMMARY_PREFIXES: [&str; 5] = [
    "OPENING BALANCE",
    "CLOSING BALANCE",
    "TOTAL",
    "BALANCE B/F",
    "BALANCE BROUGHT",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BankProfile {
    pub bank: BankIdentity,
    /// Narration-only rows merged into one transaction
    pub continuation_limit: usize,
}

impl BankProfile {
    pub fn for_bank(bank: BankIdentity) -> Self {
        let continuation_limit = match bank {
            BankIdentity::Axis => AXIS_CONTINUATION_LIMIT,
            _ => DEFAULT_CONTINUATION_LIMIT,
        };
        Self {
            bank,
            continuation_limit,
        }
    }
}

#[derive(Debug, Clone)]
struct Patterns {
    medr: Regex,
    medr_ref: Regex,
    upi_ref: Regex,
    bare_ref: Regex,
    credit_words: Regex,
    dr_cr_suffix: Regex,
}

impl Patterns {
    fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            medr: Regex::new(r"\bMEDR\b")?,
            medr_ref: Regex::new(r"MEDR/[^/]+/(\d+)")?,
            upi_ref: Regex::new(r"UPI(?:AR|AB)/(\d{8,15})/")?,
            bare_ref: Regex::new(r"\b(\d{8,15})\b")?,
            credit_words: Regex::new(r"\b(?:CREDIT|CR|DEPOSIT)\b")?,
            dr_cr_suffix: Regex::new(r"(?i)\(?(DR|CR)\.?\)?\s*$")?,
        })
    }
}

/// Amount cells of one row before bank policies run
#[derive(Debug, Default)]
struct RowAmounts {
    debit: Option<Amount>,
    credit: Option<Amount>,
    /// Single-amount layouts: the value plus any explicit Dr/Cr marker
    single: Option<(Amount, Option<Direction>)>,
    balance: Option<f64>,
    /// Digit runs pulled out of amount columns
    routed: Option<String>,
}

impl RowAmounts {
    fn has_amount(&self) -> bool {
        let positive = |a: &Option<Amount>| a.is_some_and(|a| a.value.abs() > 0.0);
        positive(&self.debit)
            || positive(&self.credit)
            || self.single.is_some_and(|(a, _)| a.value.abs() > 0.0)
    }
}

#[derive(Debug, Clone)]
pub struct TableParser {
    profile: BankProfile,
    dates: DateMatcher,
    patterns: Patterns,
}

impl TableParser {
    pub fn new(profile: BankProfile) -> Result<Self, regex::Error> {
        Ok(Self {
            profile,
            dates: DateMatcher::new()?,
            patterns: Patterns::new()?,
        })
    }

    fn bank_id(&self) -> BankIdentity {
        self.profile.bank
    }

    fn parse_table(&self, table: &Table, out: &mut Vec<RawTransaction>) {
        if table.rows.len() < 2 {
            return;
        }
        let header_idx = find_header_row(&table.rows);
        let cols = resolve_columns(&table.rows[header_idx], self.bank_id());
        debug!(bank = %self.bank_id(), ?cols, "columns resolved");

        let rows = &table.rows[header_idx + 1..];
        let mut i = 0;
        while i < rows.len() {
            let row = &rows[i];
            i += 1;
            if is_blank(row) || is_header_like(row, &cols) {
                continue;
            }

            let amounts = self.read_amounts(row, &cols);
            let date_cell = cell_text(row, cols.date);
            let date = match self.dates.leading_date(date_cell) {
                Some(d) => d.to_string(),
                None if amounts.has_amount() => match self.borrow_date(row, &cols, out) {
                    Some(d) => d,
                    None => {
                        warn!(row = ?row, "amount row without any date skipped");
                        continue;
                    }
                },
                None => continue,
            };
            if !amounts.has_amount() {
                debug!(%date, "dated row without amount skipped");
                continue;
            }

            let mut lines = vec![cell_text(row, cols.description)];
            let mut merged = 0;
            while i < rows.len() && merged < self.profile.continuation_limit {
                let next = &rows[i];
                let next_desc = cell_text(next, cols.description);
                if is_blank(next)
                    || next_desc.is_empty()
                    || self.dates.is_date(cell_text(next, cols.date))
                    || self.read_amounts(next, &cols).has_amount()
                {
                    break;
                }
                lines.push(next_desc);
                i += 1;
                merged += 1;
            }
            let description = merge_description(&lines);

            let (debit, credit) = self.settle(&amounts, &description);
            let reference = self.reference(row, &cols, &description, amounts.routed.as_deref());
            match RawTransaction::from_amounts(
                out.len() + 1,
                date,
                description,
                debit,
                credit,
                amounts.balance,
            ) {
                Some(txn) => {
                    debug!(sr_no = txn.sr_no, debit, credit, "row accepted");
                    out.push(txn.with_reference(reference));
                }
                None => warn!(debit, credit, "row rejected: no single positive side"),
            }
        }
    }

    /// A date from another cell, else the previous transaction's date
    fn borrow_date(&self, row: &Row, cols: &ColumnMap, out: &[RawTransaction]) -> Option<String> {
        row.iter()
            .enumerate()
            .filter(|(idx, _)| Some(*idx) != cols.date)
            .find_map(|(idx, _)| self.dates.leading_date(cell_text(row, Some(idx))))
            .map(str::to_string)
            .or_else(|| out.last().map(|t| t.date.clone()))
    }

    fn read_amounts(&self, row: &Row, cols: &ColumnMap) -> RowAmounts {
        let tran_id = cols
            .tran_id
            .and_then(|idx| tran_id_number(cell_text(row, Some(idx))));
        let mut out = RowAmounts::default();

        if let Some(idx) = cols.amount {
            let raw = cell_text(row, Some(idx));
            match amount::classify_cell(raw) {
                Cell::Amount(a)
                    if matches_tran_id(&a, tran_id) || amount::rejected_by_bank(self.bank_id(), &a) =>
                {
                    out.routed = Some(raw.to_string());
                }
                Cell::Amount(a) if a.value != 0.0 => {
                    out.single = Some((a, self.dr_cr_marker(raw)));
                }
                Cell::Reference(r) => out.routed = Some(r),
                _ => {}
            }
        } else {
            out.debit = self.column_amount(row, cols.debit, tran_id, &mut out.routed);
            out.credit = self.column_amount(row, cols.credit, tran_id, &mut out.routed);
        }

        out.balance = match amount::classify_cell(cell_text(row, cols.balance)) {
            Cell::Amount(a) if self.bank_id() == BankIdentity::Union => Some(union_decimal_loss(a.value)),
            Cell::Amount(a) => Some(a.value),
            _ => None,
        };
        out
    }

    fn column_amount(
        &self,
        row: &Row,
        idx: Option<usize>,
        tran_id: Option<f64>,
        routed: &mut Option<String>,
    ) -> Option<Amount> {
        let raw = cell_text(row, Some(idx?));
        match amount::classify_cell(raw) {
            Cell::Amount(a) if a.value == 0.0 => None,
            Cell::Amount(a)
                if amount::rejected_by_bank(self.bank_id(), &a) || matches_tran_id(&a, tran_id) =>
            {
                debug!(raw, bank = %self.bank_id(), "amount demoted to reference");
                routed.get_or_insert_with(|| raw.to_string());
                None
            }
            Cell::Amount(a) => Some(a),
            Cell::Reference(r) => {
                routed.get_or_insert(r);
                None
            }
            Cell::Empty => None,
        }
    }

    fn dr_cr_marker(&self, raw: &str) -> Option<Direction> {
        let caps = self.patterns.dr_cr_suffix.captures(raw)?;
        Direction::from_label(&caps[1])
    }

    /// Direction for single-amount rows without a Dr/Cr marker
    fn narration_direction(&self, upper: &str) -> Direction {
        if upper.contains("/CR/") || upper.contains("SALARY CREDIT") {
            Direction::Credit
        } else if upper.contains("/DR/") {
            Direction::Debit
        } else if self.patterns.credit_words.is_match(upper) {
            Direction::Credit
        } else {
            Direction::Debit
        }
    }

    /// Apply layout and bank policies; returns `(debit, credit)`.
    fn settle(&self, amounts: &RowAmounts, description: &str) -> (f64, f64) {
        let upper = description.to_uppercase();

        let (mut debit, mut credit) = match amounts.single {
            Some((a, marker)) => {
                let mut value = a.value.abs();
                if value > DECIMAL_LOSS_THRESHOLD {
                    let corrected = amount::correct_decimal_loss(value);
                    if corrected > DECIMAL_LOSS_CEILING {
                        warn!(value, "implausible amount treated as reference");
                        return (0.0, 0.0);
                    }
                    warn!(value, corrected, "decimal loss corrected");
                    value = corrected;
                }
                let negative = (a.value < 0.0).then_some(Direction::Debit);
                match marker
                    .or(negative)
                    .unwrap_or_else(|| self.narration_direction(&upper))
                {
                    Direction::Debit => (value, 0.0),
                    Direction::Credit => (0.0, value),
                }
            }
            None => {
                let (debit, credit) = amount::resolve_exclusive(amounts.debit, amounts.credit);
                if self.bank_id() == BankIdentity::Union {
                    (union_decimal_loss(debit), union_decimal_loss(credit))
                } else {
                    (debit, credit)
                }
            }
        };

        if self.bank_id() == BankIdentity::Boi
            && self.patterns.medr.is_match(&upper)
            && credit > 0.0
        {
            debug!(credit, "MEDR row moved to debit");
            debit = debit.max(credit);
            credit = 0.0;
        }
        (debit, credit)
    }

    fn reference(
        &self,
        row: &Row,
        cols: &ColumnMap,
        description: &str,
        routed: Option<&str>,
    ) -> String {
        let upper = description.to_uppercase();
        let from_narration = match self.bank_id() {
            BankIdentity::Boi => self
                .patterns
                .medr_ref
                .captures(&upper)
                .map(|c| c[1].to_string()),
            BankIdentity::Union => self
                .patterns
                .upi_ref
                .captures(&upper)
                .or_else(|| self.patterns.bare_ref.captures(&upper))
                .map(|c| c[1].to_string()),
            _ => None,
        };
        let from_column = cols
            .reference
            .filter(|idx| !cols.is_value_column(*idx))
            .map(|idx| cell_text(row, Some(idx)))
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        from_narration
            .or(from_column)
            .or_else(|| routed.map(str::to_string))
            .unwrap_or_default()
    }
}

impl StatementParser for TableParser {
    fn bank(&self) -> BankIdentity {
        self.bank_id()
    }

    fn parse(&self, doc: &Document) -> Result<Vec<RawTransaction>, ExtractionError> {
        let mut out = Vec::new();
        for table in doc.tables() {
            self.parse_table(table, &mut out);
        }
        Ok(out)
    }
}

fn is_blank(row: &Row) -> bool {
    row.iter().flatten().all(|c| c.trim().is_empty())
}

fn is_header_like(row: &Row, cols: &ColumnMap) -> bool {
    let date_cell = cell_text(row, cols.date).to_uppercase();
    if HEADER_CELLS.contains(&date_cell.as_str()) {
        return true;
    }
    let first = row
        .iter()
        .flatten()
        .map(|c| c.trim())
        .find(|c| !c.is_empty())
        .unwrap_or("")
        .to_uppercase();
    SUMMARY_PREFIXES.iter().any(|p| first.starts_with(p))
}

/// Numeric part of a transaction id such as `S12345678`
fn tran_id_number(cell: &str) -> Option<f64> {
    let digits: String = cell
        .trim_start_matches(['S', 's'])
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

/// Union statements lose the decimal point in every amount column
fn union_decimal_loss(value: f64) -> f64 {
    let corrected = amount::correct_decimal_loss(value);
    if corrected != value {
        warn!(value, corrected, "decimal loss corrected");
    }
    corrected
}

fn matches_tran_id(a: &Amount, tran_id: Option<f64>) -> bool {
    tran_id.is_some_and(|id| (a.value.abs() - id).abs() < 0.01)
}
