//! Central Bank of India line machine.
//!
//! CBI statements print each transaction as a value-date line carrying the
//! amounts, followed by detail lines of which exactly one names the
//! counterparty:
//!
//! ```text
//! 01/04/24 01/04/24 TO TRF.            500.00      12,000.00
//! UPI RRN 412345678901 .
//! TRF TO RAVI KUMAR
//! ```

use super::StatementParser;
use crate::amount;
use bankfusion_core::{BankIdentity, Direction, Document, ExtractionError, RawTransaction};
use regex::Regex;
use tracing::{debug, warn};

/// Boilerplate skipped everywhere except on an anchor line
const SKIP_MARKERS: [&str; 9] = [
    "CARRIED FORWARD",
    "BROUGHT FORWARD",
    "BALANCE SUMMARY",
    "PAGE",
    "STATEMENT OF ACCOUNT",
    "CENTRAL BANK",
    "VALUE DATE",
    "POST DATE",
    "DETAILS",
];

const NOISE_MARKERS: [&str; 3] = ["TO TRF.", "BY TRF.", "UPI RRN"];

/// Identical consecutive descriptions tolerated before the document is rejected
const MAX_CONSECUTIVE_REPEATS: usize = 3;

#[derive(Debug, Clone)]
struct Patterns {
    anchor: Regex,
    first_date: Regex,
    amount: Regex,
    trf_to: Regex,
    trf_from: Regex,
    salary: Regex,
    refund: Regex,
}

impl Patterns {
    fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            anchor: Regex::new(r"^\d{2}/\d{2}/\d{2}\s+\d{2}/\d{2}/\d{2}")?,
            first_date: Regex::new(r"\d{2}/\d{2}/\d{2}")?,
            amount: Regex::new(r"[\d,]+\.\d{2}")?,
            trf_to: Regex::new(r"\bTRF\s+TO\b")?,
            trf_from: Regex::new(r"\bTRF\s+FROM\b")?,
            salary: Regex::new(r"\bSALARY\s+CREDIT\b")?,
            refund: Regex::new(r"\bREFUND\b")?,
        })
    }

    /// Description carried by a detail line, if any. First pattern wins.
    fn description(&self, line: &str) -> Option<String> {
        let upper = line.to_uppercase();
        let from = |start: usize| line.get(start..).unwrap_or(line).trim().to_string();
        if let Some(m) = self.trf_to.find(&upper).or_else(|| self.trf_from.find(&upper)) {
            return Some(from(m.start()));
        }
        if self.salary.is_match(&upper) {
            return Some("SALARY CREDIT".to_string());
        }
        self.refund.find(&upper).map(|m| from(m.start()))
    }
}

/// A transaction opened by an anchor line and still collecting detail lines
#[derive(Debug, Clone, PartialEq)]
pub struct PendingTransaction {
    pub date: String,
    pub amount: Option<f64>,
    pub direction: Direction,
    pub balance: Option<f64>,
    pub description: Option<String>,
}

/// What one input line means to the machine
#[derive(Debug, Clone, PartialEq)]
pub enum LineKind {
    Anchor(PendingTransaction),
    Boilerplate,
    Noise,
    Detail(Option<String>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum LineState {
    AwaitingTransaction,
    ReadingDetail(PendingTransaction),
}

pub struct LineMachine {
    patterns: Patterns,
    state: LineState,
    finished: Vec<RawTransaction>,
}

impl LineMachine {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            patterns: Patterns::new()?,
            state: LineState::AwaitingTransaction,
            finished: Vec::new(),
        })
    }

    pub fn state(&self) -> &LineState {
        &self.state
    }

    pub fn classify(&self, line: &str) -> LineKind {
        let upper = line.to_uppercase();
        if self.patterns.anchor.is_match(line) {
            return LineKind::Anchor(self.seed(line, &upper));
        }
        if SKIP_MARKERS.iter().any(|m| upper.contains(m)) {
            return LineKind::Boilerplate;
        }
        let description = self.patterns.description(line);
        if description.is_none() && NOISE_MARKERS.iter().any(|m| upper.contains(m)) {
            return LineKind::Noise;
        }
        LineKind::Detail(description)
    }

    fn seed(&self, line: &str, upper: &str) -> PendingTransaction {
        let date = self
            .patterns
            .first_date
            .find(line)
            .map(|m| m.as_str().to_string())
            .unwrap_or_default();
        let amounts: Vec<f64> = self
            .patterns
            .amount
            .find_iter(line)
            .filter_map(|m| amount::parse_amount(m.as_str()))
            .collect();
        let (amount, balance) = match amounts.len() {
            0 => (None, None),
            1 => (None, amounts.last().copied()),
            2 => (Some(amounts[0]), Some(amounts[1])),
            n => (Some(amounts[n - 2]), Some(amounts[n - 1])),
        };
        let direction = if upper.contains("BY TRF") || upper.contains("SALARY") {
            Direction::Credit
        } else {
            Direction::Debit
        };
        PendingTransaction {
            date,
            amount,
            direction,
            balance,
            description: None,
        }
    }

    /// Transition on one classified line
    fn transition(
        &mut self,
        state: LineState,
        kind: LineKind,
    ) -> Result<LineState, ExtractionError> {
        Ok(match (state, kind) {
            (LineState::AwaitingTransaction, LineKind::Anchor(seed)) => {
                LineState::ReadingDetail(seed)
            }
            (LineState::AwaitingTransaction, _) => LineState::AwaitingTransaction,
            (LineState::ReadingDetail(pending), LineKind::Anchor(seed)) => {
                self.finalize(pending)?;
                LineState::ReadingDetail(seed)
            }
            (LineState::ReadingDetail(mut pending), LineKind::Detail(Some(desc))) => {
                if pending.description.is_none() {
                    debug!(date = %pending.date, %desc, "description captured");
                    pending.description = Some(desc);
                }
                LineState::ReadingDetail(pending)
            }
            (state @ LineState::ReadingDetail(_), _) => state,
        })
    }

    pub fn feed(&mut self, line: &str) -> Result<(), ExtractionError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(());
        }
        let kind = self.classify(line);
        let state = std::mem::replace(&mut self.state, LineState::AwaitingTransaction);
        self.state = self.transition(state, kind)?;
        Ok(())
    }

    fn finalize(&mut self, pending: PendingTransaction) -> Result<(), ExtractionError> {
        let Some(description) = pending.description else {
            return Err(ExtractionError::MissingDescription { date: pending.date });
        };
        let Some(value) = pending.amount else {
            warn!(date = %pending.date, %description, "transaction without amount skipped");
            return Ok(());
        };
        let (debit, credit) = match pending.direction {
            Direction::Debit => (value, 0.0),
            Direction::Credit => (0.0, value),
        };
        match RawTransaction::from_amounts(
            self.finished.len() + 1,
            pending.date,
            description,
            debit,
            credit,
            pending.balance,
        ) {
            Some(txn) => self.finished.push(txn),
            None => warn!(value, "transaction with zero amount skipped"),
        }
        Ok(())
    }

    pub fn finish(mut self) -> Result<Vec<RawTransaction>, ExtractionError> {
        let state = std::mem::replace(&mut self.state, LineState::AwaitingTransaction);
        if let LineState::ReadingDetail(pending) = state {
            self.finalize(pending)?;
        }
        check_repeats(&self.finished)?;
        Ok(self.finished)
    }
}

fn check_repeats(txns: &[RawTransaction]) -> Result<(), ExtractionError> {
    let mut run = 0;
    let mut last: Option<&str> = None;
    for txn in txns {
        if last == Some(txn.description.as_str()) {
            run += 1;
            if run > MAX_CONSECUTIVE_REPEATS {
                return Err(ExtractionError::RepeatedDescription {
                    description: txn.description.clone(),
                    count: run,
                });
            }
        } else {
            run = 1;
            last = Some(&txn.description);
        }
    }
    Ok(())
}

/// Input lines per page: the page text, or joined table rows when a page has none
fn document_lines(doc: &Document) -> Vec<String> {
    let mut lines = Vec::new();
    for page in &doc.pages {
        if !page.text.trim().is_empty() {
            lines.extend(page.text.lines().map(str::to_string));
            continue;
        }
        for table in &page.tables {
            lines.extend(table.rows.iter().map(|row| {
                row.iter()
                    .flatten()
                    .map(|c| c.trim())
                    .filter(|c| !c.is_empty())
                    .collect::<Vec<_>>()
                    .join(" ")
            }));
        }
    }
    lines
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CentralBankParser;

impl StatementParser for CentralBankParser {
    fn bank(&self) -> BankIdentity {
        BankIdentity::Cbi
    }

    fn parse(&self, doc: &Document) -> Result<Vec<RawTransaction>, ExtractionError> {
        let mut machine = LineMachine::new()?;
        for line in document_lines(doc) {
            machine.feed(&line)?;
        }
        let txns = machine.finish()?;
        debug!(count = txns.len(), "central bank lines parsed");
        Ok(txns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STATEMENT: &str = "\
CENTRAL BANK OF INDIA
STATEMENT OF ACCOUNT
Post Date Value Date Details Debit Credit Balance
01/04/24 01/04/24 TO TRF. 500.00 12,000.00
UPI RRN 412345678901 .
TRF TO RAVI KUMAR
02/04/24 02/04/24 BY TRF. 30,000.00 42,000.00
NEFT SALARY CREDIT ACME LTD
Page 1 of 2
03/04/24 03/04/24 TO TRF. 250.00 41,750.00
TRF TO SWIGGY LIMITED
";

    fn run(text: &str) -> Result<Vec<RawTransaction>, ExtractionError> {
        CentralBankParser.parse(&Document::from_text("cbi", text))
    }

    #[test]
    fn test_three_transactions() {
        let txns = run(STATEMENT).unwrap();
        assert_eq!(txns.len(), 3);
        assert_eq!(txns[0].description, "TRF TO RAVI KUMAR");
        assert_eq!(txns[0].debit, 500.0);
        assert_eq!(txns[0].balance, Some(12_000.0));
        assert_eq!(txns[1].description, "SALARY CREDIT");
        assert_eq!(txns[1].credit, 30_000.0);
        assert_eq!(txns[2].date, "03/04/24");
        assert_eq!(txns[2].description, "TRF TO SWIGGY LIMITED");
    }

    #[test]
    fn test_state_transitions() {
        let mut m = LineMachine::new().unwrap();
        assert_eq!(m.state(), &LineState::AwaitingTransaction);
        m.feed("TRF TO NOBODY").unwrap();
        assert_eq!(m.state(), &LineState::AwaitingTransaction);
        m.feed("05/04/24 05/04/24 TO TRF. 99.00 1,000.00").unwrap();
        assert!(matches!(m.state(), LineState::ReadingDetail(p) if p.description.is_none()));
        m.feed("UPI RRN 1234").unwrap();
        m.feed("TRF TO FIRST").unwrap();
        m.feed("TRF TO SECOND").unwrap();
        let LineState::ReadingDetail(p) = m.state() else {
            panic!("expected detail state");
        };
        assert_eq!(p.description.as_deref(), Some("TRF TO FIRST"));
        assert_eq!(p.amount, Some(99.0));
    }

    #[test]
    fn test_amount_is_second_to_last_of_three() {
        let m = LineMachine::new().unwrap();
        let LineKind::Anchor(p) = m.classify("06/04/24 06/04/24 TO TRF. 1.00 75.50 900.00") else {
            panic!("expected anchor");
        };
        assert_eq!(p.amount, Some(75.5));
        assert_eq!(p.balance, Some(900.0));
        assert_eq!(p.direction, Direction::Debit);
    }

    #[test]
    fn test_noise_with_description_is_kept() {
        let m = LineMachine::new().unwrap();
        assert_eq!(m.classify("UPI RRN 41234 ."), LineKind::Noise);
        assert_eq!(
            m.classify("BY TRF. REFUND FROM AMAZON"),
            LineKind::Detail(Some("REFUND FROM AMAZON".into()))
        );
        assert_eq!(m.classify("Page 2 of 3"), LineKind::Boilerplate);
    }

    #[test]
    fn test_missing_description_is_fatal() {
        let err = run("01/04/24 01/04/24 TO TRF. 500.00 12,000.00\nUPI RRN 1 .\n").unwrap_err();
        assert_eq!(
            err,
            ExtractionError::MissingDescription {
                date: "01/04/24".into()
            }
        );
    }

    #[test]
    fn test_missing_amount_is_skipped() {
        let txns = run("01/04/24 01/04/24 TO TRF.\nTRF TO A\n02/04/24 02/04/24 TO TRF. 5.00 10.00\nTRF TO B\n")
            .unwrap();
        assert_eq!(txns.len(), 1);
        assert_eq!(txns[0].description, "TRF TO B");
    }

    #[test]
    fn test_repeated_description_is_fatal() {
        let block = "01/04/24 01/04/24 TO TRF. 5.00 10.00\nTRF TO SAME\n".repeat(4);
        let err = run(&block).unwrap_err();
        assert!(matches!(err, ExtractionError::RepeatedDescription { count: 4, .. }));
        let three = "01/04/24 01/04/24 TO TRF. 5.00 10.00\nTRF TO SAME\n".repeat(3);
        assert_eq!(run(&three).unwrap().len(), 3);
    }

    #[test]
    fn test_table_rows_used_when_page_has_no_text() {
        let rows = vec![
            vec![Some("01/04/24".into()), Some("01/04/24".into()), Some("TO TRF.".into()), Some("500.00".into()), Some("12,000.00".into())],
            vec![None, None, Some("TRF TO RAVI".into()), None, None],
        ];
        let doc = Document {
            name: "cbi".into(),
            pages: vec![bankfusion_core::Page {
                text: String::new(),
                tables: vec![bankfusion_core::Table::new(rows)],
            }],
        };
        let txns = CentralBankParser.parse(&doc).unwrap();
        assert_eq!(txns.len(), 1);
        assert_eq!(txns[0].description, "TRF TO RAVI");
    }
}
