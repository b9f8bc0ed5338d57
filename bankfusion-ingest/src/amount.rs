//! Amount recognition and validation.
//!
//! A digit token is money only if it carries a decimal point or has at most
//! six digits. Anything else is a reference number and never lands in a
//! debit or credit column.

use bankfusion_core::BankIdentity;
use tracing::debug;

/// Longest integer (no decimal point) still accepted as money
pub const MAX_INTEGER_DIGITS: usize = 6;

/// Above this a value is assumed to have lost its decimal point
pub const DECIMAL_LOSS_THRESHOLD: f64 = 1_000_000.0;

/// Above this even a corrected value is treated as a reference
pub const DECIMAL_LOSS_CEILING: f64 = 10_000_000.0;

/// Integers without a decimal above this lose an exclusivity conflict
const LARGE_INTEGER: f64 = 100_000.0;

/// SBI rows never carry amounts above this
const SBI_LIMIT: f64 = 5_000_000.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Amount {
    pub value: f64,
    pub has_decimal: bool,
    pub int_digits: usize,
}

impl Amount {
    fn is_large_integer(&self) -> bool {
        !self.has_decimal && self.value.abs() > LARGE_INTEGER
    }
}

/// What a single amount-column cell turned out to hold
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Amount(Amount),
    Reference(String),
}

impl Cell {
    pub fn amount(&self) -> Option<Amount> {
        match self {
            Cell::Amount(a) => Some(*a),
            _ => None,
        }
    }

    pub fn value(&self) -> f64 {
        self.amount().map(|a| a.value.abs()).unwrap_or(0.0)
    }
}

/// Strip currency symbols, separators and Dr/Cr markers
fn clean(text: &str) -> String {
    let upper = text.to_uppercase().replace("DR", "").replace("CR", "");
    upper
        .chars()
        .filter(|c| !matches!(c, ',' | ' ' | '₹' | '$' | '€' | '£'))
        .collect()
}

/// First `\d+\.?\d*` run in the cleaned text
fn numeric_token(cleaned: &str) -> Option<&str> {
    let start = cleaned.find(|c: char| c.is_ascii_digit())?;
    let rest = &cleaned[start..];
    let mut end = 0;
    let mut seen_dot = false;
    for (i, c) in rest.char_indices() {
        if c.is_ascii_digit() {
            end = i + 1;
        } else if c == '.' && !seen_dot {
            seen_dot = true;
            end = i + 1;
        } else {
            break;
        }
    }
    Some(&rest[..end])
}

/// Parse a money-ish string. A leading `-` or `(` makes it negative.
pub fn parse_amount(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    let negative = trimmed.starts_with('-') || trimmed.starts_with('(');
    let cleaned = clean(trimmed);
    let token = numeric_token(&cleaned)?;
    let value: f64 = token.trim_end_matches('.').parse().ok()?;
    Some(if negative { -value } else { value })
}

/// Classify a cell under the golden rule
pub fn classify_cell(text: &str) -> Cell {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Cell::Empty;
    }
    let cleaned = clean(trimmed);
    let Some(token) = numeric_token(&cleaned) else {
        return Cell::Empty;
    };
    let has_decimal = token.contains('.');
    let int_digits = token.split('.').next().map(str::len).unwrap_or(0);
    if !has_decimal && int_digits > MAX_INTEGER_DIGITS {
        debug!(token, "digit run routed to reference");
        return Cell::Reference(token.to_string());
    }
    match parse_amount(trimmed) {
        Some(value) => Cell::Amount(Amount {
            value,
            has_decimal,
            int_digits,
        }),
        None => Cell::Empty,
    }
}

/// True when `token` passes the golden rule
pub fn is_amount_token(token: &str) -> bool {
    matches!(classify_cell(token), Cell::Amount(_))
}

/// Best-effort repair of a lost decimal point: values above
/// [`DECIMAL_LOSS_THRESHOLD`] are divided by 100.
pub fn correct_decimal_loss(value: f64) -> f64 {
    if value > DECIMAL_LOSS_THRESHOLD {
        value / 100.0
    } else {
        value
    }
}

/// Bank-specific checks that demote an otherwise valid amount to a reference
pub fn rejected_by_bank(bank: BankIdentity, amount: &Amount) -> bool {
    match bank {
        BankIdentity::Sbi => {
            (!amount.has_decimal && amount.int_digits >= MAX_INTEGER_DIGITS)
                || amount.value.abs() > SBI_LIMIT
        }
        BankIdentity::Union => amount.is_large_integer(),
        _ => false,
    }
}

/// Enforce `(debit > 0) XOR (credit > 0)`.
///
/// A large integer without a decimal is dropped first; otherwise the larger
/// value wins. Returns `(debit, credit)` as absolute values.
pub fn resolve_exclusive(debit: Option<Amount>, credit: Option<Amount>) -> (f64, f64) {
    let d = debit.map(|a| a.value.abs()).unwrap_or(0.0);
    let c = credit.map(|a| a.value.abs()).unwrap_or(0.0);
    if d <= 0.0 || c <= 0.0 {
        return (d, c);
    }
    let drop_debit = debit.is_some_and(|a| a.is_large_integer());
    let drop_credit = credit.is_some_and(|a| a.is_large_integer());
    let resolved = match (drop_debit, drop_credit) {
        (true, false) => (0.0, c),
        (false, true) => (d, 0.0),
        _ if d >= c => (d, 0.0),
        _ => (0.0, c),
    };
    debug!(debit = d, credit = c, ?resolved, "both sides populated");
    resolved
}
