//! Column role resolution for statement tables

use bankfusion_core::{BankIdentity, Row};
use serde::Serialize;

const DATE_KEYS: &[&str] = &["DATE", "TXN DATE", "TRAN DATE", "VALUE DATE", "TRANSACTION DATE"];
const DESC_KEYS: &[&str] = &[
    "PARTICULARS",
    "DESCRIPTION",
    "NARRATION",
    "DETAILS",
    "TRANSACTION",
    "REMARKS",
];
const DEBIT_KEYS: &[&str] = &["DEBIT", "WITHDRAWAL", "DR", "PAID OUT"];
const CREDIT_KEYS: &[&str] = &["CREDIT", "DEPOSIT", "CR", "PAID IN"];
const BALANCE_KEYS: &[&str] = &["BALANCE", "CLOSING", "AVAILABLE"];
const REF_KEYS: &[&str] = &["CHEQUE", "CHQ", "REFERENCE", "REF NO"];
const UNION_REF_KEYS: &[&str] = &[
    "REF",
    "REFERENCE",
    "TRAN ID",
    "TRANSACTION ID",
    "TXN ID",
    "CHQ",
    "CHEQUE",
];

/// Keywords that mark a row as a header
const HEADER_HINTS: &[&str] = &[
    "DATE",
    "TXN",
    "TRAN",
    "PARTICULARS",
    "DESCRIPTION",
    "DEBIT",
    "CREDIT",
    "WITHDRAWAL",
    "DEPOSIT",
];

/// Rows searched for a header
const HEADER_SCAN_ROWS: usize = 3;

/// Where each role lives in a table. `amount` is only set for single-amount layouts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ColumnMap {
    pub date: Option<usize>,
    pub description: Option<usize>,
    pub debit: Option<usize>,
    pub credit: Option<usize>,
    pub balance: Option<usize>,
    pub reference: Option<usize>,
    pub amount: Option<usize>,
    pub tran_id: Option<usize>,
}

impl ColumnMap {
    const fn fixed(
        date: usize,
        description: usize,
        debit: usize,
        credit: usize,
        balance: usize,
        reference: Option<usize>,
    ) -> Self {
        Self {
            date: Some(date),
            description: Some(description),
            debit: Some(debit),
            credit: Some(credit),
            balance: Some(balance),
            reference,
            amount: None,
            tran_id: None,
        }
    }

    pub fn is_single_amount(&self) -> bool {
        self.amount.is_some()
    }

    /// True when `idx` holds money or a date and can never carry narration
    pub fn is_value_column(&self, idx: usize) -> bool {
        [self.date, self.debit, self.credit, self.balance, self.amount]
            .contains(&Some(idx))
    }
}

fn normalize_header_cell(cell: &str) -> String {
    cell.to_uppercase().replace(['\n', '\r'], " ")
}

/// First column whose header contains any keyword (case-insensitive substring)
pub fn find_column_index(header: &Row, keywords: &[&str]) -> Option<usize> {
    header.iter().enumerate().find_map(|(idx, cell)| {
        let text = normalize_header_cell(cell.as_deref()?);
        keywords.iter().any(|k| text.contains(k)).then_some(idx)
    })
}

/// Locate the header among the first rows. Falls back to row 0.
pub fn find_header_row(rows: &[Row]) -> usize {
    rows.iter()
        .take(HEADER_SCAN_ROWS)
        .position(|row| {
            let joined = row
                .iter()
                .flatten()
                .map(|c| normalize_header_cell(c))
                .collect::<Vec<_>>()
                .join(" ");
            HEADER_HINTS.iter().any(|k| joined.contains(k))
        })
        .unwrap_or(0)
}

/// Resolve column roles from the header, applying the bank's defaults when
/// date or description cannot be found.
pub fn resolve_columns(header: &Row, bank: BankIdentity) -> ColumnMap {
    let date = find_column_index(header, DATE_KEYS);
    let desc = match find_column_index(header, DESC_KEYS) {
        Some(i) if Some(i) == date => find_column_after(header, DESC_KEYS, i),
        other => other,
    };
    // "DESCRIPTION" contains "CR"; narration never doubles as an amount column
    let skip_desc = |found: Option<usize>, keys: &[&str]| match found {
        Some(i) if Some(i) == desc => find_column_after(header, keys, i),
        other => other,
    };
    let detected = ColumnMap {
        date,
        description: desc,
        debit: skip_desc(find_column_index(header, DEBIT_KEYS), DEBIT_KEYS),
        credit: skip_desc(find_column_index(header, CREDIT_KEYS), CREDIT_KEYS),
        balance: find_column_index(header, BALANCE_KEYS),
        reference: find_column_index(header, REF_KEYS),
        amount: None,
        tran_id: None,
    };

    if bank == BankIdentity::Union {
        return union_columns(header, detected);
    }
    if detected.date.is_some() && detected.description.is_some() {
        return detected;
    }
    bank_defaults(bank, header.len())
}

fn find_column_after(header: &Row, keywords: &[&str], after: usize) -> Option<usize> {
    header
        .iter()
        .enumerate()
        .skip(after + 1)
        .find_map(|(idx, cell)| {
            let text = normalize_header_cell(cell.as_deref()?);
            keywords.iter().any(|k| text.contains(k)).then_some(idx)
        })
}

/// Positional layout per bank, used when the header is unreadable
pub fn bank_defaults(bank: BankIdentity, header_len: usize) -> ColumnMap {
    match bank {
        BankIdentity::Axis => ColumnMap::fixed(0, 2, 3, 4, 5, Some(1)),
        BankIdentity::Boi => {
            let wide = |want: usize| if header_len > want { want } else { want - 1 };
            ColumnMap::fixed(
                1,
                2,
                wide(4),
                wide(5),
                wide(6),
                (header_len > 3).then_some(3),
            )
        }
        BankIdentity::Hdfc => ColumnMap::fixed(0, 1, 4, 5, 6, Some(2)),
        BankIdentity::Sbi => ColumnMap::fixed(0, 1, 3, 4, 5, Some(2)),
        BankIdentity::Union => union_single_amount(),
        BankIdentity::Cbi | BankIdentity::Unidentified => ColumnMap::fixed(0, 1, 2, 3, 4, None),
    }
}

/// `Tran Id | Tran Date | Remarks | Amount | Balance`
fn union_single_amount() -> ColumnMap {
    ColumnMap {
        date: Some(1),
        description: Some(2),
        debit: None,
        credit: None,
        balance: Some(4),
        reference: Some(0),
        amount: Some(3),
        tran_id: Some(0),
    }
}

fn union_columns(header: &Row, detected: ColumnMap) -> ColumnMap {
    if detected.debit.is_none() || detected.credit.is_none() {
        return union_single_amount();
    }
    let reference = find_column_index(header, UNION_REF_KEYS)
        .filter(|i| Some(*i) != detected.description)
        .or(Some(2));
    ColumnMap {
        date: detected.date.or(Some(0)),
        description: detected.description.or(Some(1)),
        balance: detected
            .balance
            .or(Some(header.len().saturating_sub(1))),
        reference,
        tran_id: reference,
        ..detected
    }
}
