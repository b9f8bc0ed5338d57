//! Account metadata extraction.
//!
//! Every field walks a fallback chain: label regex, then table cells, then an
//! aggressive whole-document scan, and for the holder name the file name as a
//! last resort. Central Bank statements only trust the header block above
//! "STATEMENT OF ACCOUNT" for the holder.

use crate::detect::title_case;
use bankfusion_core::{AccountInfo, BankIdentity, Document, Row, ValidationError};
use regex::Regex;
use tracing::{debug, info, warn};

/// Words that are never part of a holder's name
const HOLDER_BOILERPLATE: [&str; 15] = [
    "HOME", "ACCOUNT", "BANK", "STATEMENT", "OF", "INDIA", "LIMITED", "LTD", "DETAILS", "CUSTOMER",
    "HOLDER", "NAME", "BRANCH", "IFSC", "CODE",
];

const TITLES: [&str; 6] = ["MR.", "MRS.", "MS.", "MISS.", "M/S.", "M/S"];

/// Window before the Central Bank "STATEMENT OF ACCOUNT" anchor searched for the holder
const CBI_HOLDER_WINDOW: usize = 500;

/// Distance from an account keyword within which a bare digit run is accepted
const ACCOUNT_KEYWORD_RADIUS: usize = 50;

const FILENAME_SKIP: [&str; 8] = [
    "statement", "stmt", "bank", "pdf", "account", "of", "india", "statementof",
];

#[derive(Debug, Clone)]
pub struct MetadataExtractor {
    holder_labels: Vec<Regex>,
    plain_name_label: Regex,
    titled_name: Regex,
    cbi_anchor: Regex,
    cbi_titled_name: Regex,
    account_labels: Vec<Regex>,
    account_digits: Regex,
    ifsc_label: Regex,
    ifsc_code: Regex,
    branch_label: Regex,
    period_patterns: Vec<Regex>,
}

impl MetadataExtractor {
    pub fn new() -> Result<Self, regex::Error> {
        let name = r"(?:(?:Mr|Mrs|Ms|Miss)\.\s*)?([A-Z][A-Za-z \.]+?)\s*(?:$|IFSC|Account|Branch|Customer)";
        let date = r"\d{1,2}[-/](?:\d{1,2}|[A-Za-z]{3})[-/]\d{2,4}";
        Ok(Self {
            holder_labels: vec![
                Regex::new(&format!(r"(?im)Account\s+Holder(?:\s+Name)?\s*[:\s]\s*{name}"))?,
                Regex::new(&format!(r"(?im)Customer\s+Name\s*[:\s]\s*{name}"))?,
            ],
            plain_name_label: Regex::new(&format!(r"(?im)\bName\s*[:\s]\s*{name}"))?,
            titled_name: Regex::new(
                r"(?im)\b(?:Mr|Mrs|Ms|Miss|M/s)\.?\s+([A-Z][A-Za-z \.]+?)\s*(?:$|Account|Customer|IFSC|Branch)",
            )?,
            cbi_anchor: Regex::new(r"(?i)STATEMENT\s+OF\s+ACCOUNT")?,
            cbi_titled_name: Regex::new(
                r"(?i)\b(?:Mr|Mrs|Ms|Miss)\.\s+([A-Z][A-Z \.]{2,}?)\s*(?:\bSTATEMENT\b|\bOF\b|\bACCOUNT\b|\n|$)",
            )?,
            account_labels: vec![
                Regex::new(r"(?i)Account\s*(?:No|Number|#)\.?\s*[:\-\s]*(\d{10,16})\b")?,
                Regex::new(r"(?i)A/c\s*(?:No|Number)?\.?\s*[:\-\s]*(\d{10,16})\b")?,
                Regex::new(
                    r"(?i)(?:Savings|Current)\s+(?:A/c|Account)\s*(?:No\.?)?\s*[:\-\s]*(\d{10,16})\b",
                )?,
            ],
            account_digits: Regex::new(r"\b\d{10,16}\b")?,
            ifsc_label: Regex::new(r"(?i)IFSC\s*(?:Code)?\s*[:\-\s]*([A-Z]{4}0[A-Z0-9]{6})")?,
            ifsc_code: Regex::new(r"^[A-Z]{4}0[A-Z0-9]{6}$")?,
            branch_label: Regex::new(
                r"(?im)Branch(?:\s+Name)?\s*[:\s]\s*([A-Za-z][A-Za-z \-]+?)\s*(?:$|IFSC|Address|Period)",
            )?,
            period_patterns: vec![
                Regex::new(&format!(r"(?i)Period\s*[:\s]\s*({date})\s*(?:to|-)\s*({date})"))?,
                Regex::new(&format!(r"(?i)From\s*:?\s*({date})\s+To\s*:?\s*({date})"))?,
                Regex::new(&format!(r"(?i)For\s+the\s+period\s*:?\s*({date})\s+to\s+({date})"))?,
                Regex::new(&format!(r"(?i)({date})\s+to\s+({date})"))?,
            ],
        })
    }

    /// Resolve account metadata, failing when holder or number stays empty
    pub fn extract(
        &self,
        doc: &Document,
        bank: BankIdentity,
    ) -> Result<AccountInfo, ValidationError> {
        let text = doc.text();

        let account_number = self.account_number(&text, doc).ok_or_else(|| {
            warn!(document = %doc.name, "account number unresolved");
            ValidationError::MissingAccountField {
                field: "account_number",
            }
        })?;

        let holder = if bank == BankIdentity::Cbi {
            self.cbi_holder(&text)
        } else {
            self.holder(&text, doc)
        };
        let account_holder = holder.ok_or_else(|| {
            warn!(document = %doc.name, %bank, "account holder unresolved");
            ValidationError::MissingAccountField {
                field: "account_holder",
            }
        })?;

        let info = AccountInfo {
            account_holder,
            account_number,
            branch: self.branch(&text, doc),
            ifsc: self.ifsc(&text, doc),
            statement_period: self.period(&text, doc),
        };
        info!(
            document = %doc.name,
            holder = %info.account_holder,
            ifsc = info.ifsc.as_deref().unwrap_or("-"),
            "account metadata resolved"
        );
        Ok(info)
    }

    fn holder(&self, text: &str, doc: &Document) -> Option<String> {
        for re in &self.holder_labels {
            if let Some(name) = re.captures_iter(text).find_map(|c| clean_holder(&c[1])) {
                return Some(name);
            }
        }
        let plain = self.plain_name_label.captures_iter(text).find_map(|c| {
            let start = c.get(0).map(|m| m.start()).unwrap_or(0);
            let before = text[..start].trim_end().to_uppercase();
            if before.ends_with("BRANCH") || before.ends_with("BANK") {
                return None;
            }
            clean_holder(&c[1])
        });
        if plain.is_some() {
            return plain;
        }

        if let Some(name) = holder_from_tables(doc) {
            debug!("holder taken from table cells");
            return Some(name);
        }

        if let Some(name) = self
            .titled_name
            .captures_iter(text)
            .find_map(|c| clean_holder(&c[1]))
        {
            debug!("holder taken from titled name scan");
            return Some(name);
        }

        let name = holder_from_filename(&doc.name, text);
        if name.is_some() {
            debug!(file = %doc.name, "holder taken from file name");
        }
        name
    }

    /// Central Bank holder, read only from the header block above the anchor
    pub fn cbi_holder(&self, text: &str) -> Option<String> {
        let anchor = self.cbi_anchor.find(text)?;
        let window_start = text[..anchor.start()]
            .char_indices()
            .rev()
            .nth(CBI_HOLDER_WINDOW - 1)
            .map(|(i, _)| i)
            .unwrap_or(0);
        let window = &text[window_start..anchor.start()];

        self.cbi_titled_name.captures_iter(window).find_map(|c| {
            let stripped = c[1]
                .split_whitespace()
                .filter(|w| {
                    !matches!(
                        w.to_uppercase().as_str(),
                        "CENTRAL" | "BANK" | "OF" | "INDIA" | "STATEMENT" | "ACCOUNT"
                    )
                })
                .collect::<Vec<_>>()
                .join(" ");
            clean_holder(&stripped)
        })
    }

    fn account_number(&self, text: &str, doc: &Document) -> Option<String> {
        for re in &self.account_labels {
            if let Some(c) = re.captures(text) {
                return Some(c[1].to_string());
            }
        }

        for table in doc.tables() {
            for row in &table.rows {
                let joined = join_row(row).to_uppercase();
                if !(joined.contains("ACCOUNT") || joined.contains("A/C")) {
                    continue;
                }
                if let Some(m) = self.account_digits.find(&joined) {
                    debug!("account number taken from table row");
                    return Some(m.as_str().to_string());
                }
            }
        }

        self.aggressive_account_scan(text)
    }

    /// Longest 10 to 16 digit run near an account keyword
    fn aggressive_account_scan(&self, text: &str) -> Option<String> {
        let upper = text.to_uppercase();
        let mut best: Option<&str> = None;
        for m in self.account_digits.find_iter(&upper) {
            let lo = floor_boundary(&upper, m.start().saturating_sub(ACCOUNT_KEYWORD_RADIUS));
            let hi = ceil_boundary(&upper, m.end() + ACCOUNT_KEYWORD_RADIUS);
            let window = &upper[lo..hi];
            let near_keyword = ["ACCOUNT", "A/C", "SAVINGS", "CURRENT"]
                .iter()
                .any(|k| window.contains(k));
            if near_keyword && best.is_none_or(|b| m.as_str().len() > b.len()) {
                best = Some(m.as_str());
            }
        }
        if best.is_some() {
            debug!("account number taken from aggressive scan");
        }
        best.map(str::to_string)
    }

    fn ifsc(&self, text: &str, doc: &Document) -> Option<String> {
        if let Some(c) = self.ifsc_label.captures(text) {
            return Some(c[1].to_uppercase());
        }
        for table in doc.tables() {
            for row in &table.rows {
                for cell in row.iter().flatten() {
                    let code = cell.trim().to_uppercase();
                    if self.ifsc_code.is_match(&code) {
                        return Some(code);
                    }
                }
                if let Some(c) = self.ifsc_label.captures(&join_row(row)) {
                    return Some(c[1].to_uppercase());
                }
            }
        }
        None
    }

    fn branch(&self, text: &str, doc: &Document) -> Option<String> {
        if let Some(branch) = self
            .branch_label
            .captures_iter(text)
            .find_map(|c| clean_branch(&c[1]))
        {
            return Some(branch);
        }
        for table in doc.tables() {
            for row in &table.rows {
                let cells: Vec<&str> = row.iter().flatten().map(|c| c.trim()).collect();
                for (i, cell) in cells.iter().enumerate() {
                    if !cell.to_uppercase().contains("BRANCH") {
                        continue;
                    }
                    if let Some(branch) = cells
                        .get(i + 1)
                        .filter(|c| !c.is_empty())
                        .and_then(|c| clean_branch(c))
                    {
                        return Some(branch);
                    }
                }
            }
        }
        None
    }

    fn period(&self, text: &str, doc: &Document) -> Option<String> {
        let find = |haystack: &str| {
            self.period_patterns
                .iter()
                .find_map(|re| re.captures(haystack))
                .map(|c| format!("{} to {}", &c[1], &c[2]))
        };
        find(text).or_else(|| doc.tables().flat_map(|t| &t.rows).find_map(|r| find(&join_row(r))))
    }
}

fn join_row(row: &Row) -> String {
    row.iter()
        .flatten()
        .map(|c| c.trim())
        .filter(|c| !c.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn floor_boundary(s: &str, mut idx: usize) -> usize {
    while idx > 0 && !s.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

fn ceil_boundary(s: &str, mut idx: usize) -> usize {
    if idx >= s.len() {
        return s.len();
    }
    while !s.is_char_boundary(idx) {
        idx += 1;
    }
    idx
}

/// A token shaped like a row counter rather than a name part
fn is_counter_token(word: &str) -> bool {
    let digits = word.chars().take_while(|c| c.is_ascii_digit()).count();
    let txn_counter = digits > 0 && &word[digits..] == "TXN";
    let page_counter = word
        .strip_prefix("PAGE")
        .is_some_and(|rest| rest.starts_with(|c: char| c.is_ascii_digit()));
    txn_counter || page_counter
}

/// Validate and normalize a holder-name candidate
pub fn clean_holder(raw: &str) -> Option<String> {
    let mut upper = raw.trim().to_uppercase();
    for title in TITLES {
        if let Some(rest) = upper.strip_prefix(title) {
            if rest.starts_with(char::is_whitespace) {
                upper = rest.trim_start().to_string();
                break;
            }
        }
    }

    let words: Vec<&str> = upper
        .split_whitespace()
        .filter(|w| w.chars().count() > 1 && !HOLDER_BOILERPLATE.contains(w))
        .collect();
    if words.len() < 2 {
        return None;
    }
    if words[0].starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }
    if words.iter().any(|w| is_counter_token(w)) {
        return None;
    }
    if words
        .iter()
        .all(|w| w.chars().all(|c| c.is_ascii_digit() || c == '.'))
    {
        return None;
    }
    Some(words.join(" "))
}

fn holder_from_tables(doc: &Document) -> Option<String> {
    for table in doc.tables() {
        for row in &table.rows {
            let cells: Vec<&str> = row.iter().flatten().map(|c| c.trim()).collect();
            for (i, cell) in cells.iter().enumerate() {
                let label = cell.to_uppercase();
                let is_label = label.contains("ACCOUNT HOLDER")
                    || label.contains("CUSTOMER NAME")
                    || label.trim_end_matches(':').trim() == "NAME";
                if !is_label {
                    continue;
                }
                if let Some(name) = cells.get(i + 1).and_then(|c| clean_holder(c)) {
                    return Some(name);
                }
            }
        }
    }
    None
}

/// Last-resort holder from a file name like `tejal_raut_statement`.
/// At least one name part must also appear in the document text.
pub fn holder_from_filename(file_name: &str, text: &str) -> Option<String> {
    let mut stem = file_name.to_lowercase();
    if let Some(dot) = stem.rfind('.') {
        stem.truncate(dot);
    }
    for suffix in ["_statement", "_stmt", "_bank", "statement", "stmt"] {
        if let Some(rest) = stem.strip_suffix(suffix) {
            stem = rest.to_string();
            break;
        }
    }

    let parts: Vec<String> = stem
        .split(['_', '-', ' '])
        .filter(|p| p.len() > 1 && !FILENAME_SKIP.contains(p))
        .filter(|p| !p.chars().all(|c| c.is_ascii_digit()))
        .map(str::to_uppercase)
        .collect();
    if parts.len() < 2 {
        return None;
    }
    let upper_text = text.to_uppercase();
    if !parts.iter().any(|p| upper_text.contains(p.as_str())) {
        return None;
    }
    clean_holder(&parts.join(" "))
}

fn clean_branch(raw: &str) -> Option<String> {
    let upper = raw.trim().to_uppercase();
    if matches!(
        upper.as_str(),
        "DETAILS OF STATEMENT" | "STATEMENT OF ACCOUNT"
    ) {
        return None;
    }
    let kept: Vec<&str> = raw
        .split_whitespace()
        .filter(|w| {
            !matches!(
                w.to_uppercase().as_str(),
                "BRANCH" | "BANK" | "DETAILS" | "OF" | "STATEMENT" | "NAME"
            )
        })
        .collect();
    if kept.is_empty() {
        return None;
    }
    Some(title_case(&kept.join(" ")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bankfusion_core::{Page, Table};
    use rstest::rstest;

    const SBI_HEADER: &str = r#"STATE BANK OF INDIA
Account Name    : Mr. RAVI KUMAR SHARMA
Account Number  : 00000012345678901
Account No      : 12345678901
Branch          : KORAMANGALA
IFSC Code       : SBIN0001234
Statement Period: 01/01/2024 to 31/01/2024
"#;

    fn extractor() -> MetadataExtractor {
        MetadataExtractor::new().unwrap()
    }

    #[rstest]
    #[case("Mr. RAVI KUMAR", Some("RAVI KUMAR"))]
    #[case("M/s ACME TRADERS LTD", Some("ACME TRADERS"))]
    #[case("priya  nair", Some("PRIYA NAIR"))]
    #[case("RAVI", None)]
    #[case("ACCOUNT HOLDER NAME", None)]
    #[case("12TXN RAVI", None)]
    #[case("RAVI PAGE2", None)]
    #[case("1234 5678", None)]
    #[case("A B", None)]
    fn test_clean_holder(#[case] raw: &str, #[case] expected: Option<&str>) {
        assert_eq!(clean_holder(raw).as_deref(), expected);
    }

    #[test]
    fn test_label_fields() {
        let doc = Document::from_text("s", SBI_HEADER);
        let info = extractor().extract(&doc, BankIdentity::Sbi).unwrap();
        assert_eq!(info.account_holder, "RAVI KUMAR SHARMA");
        assert_eq!(info.account_number, "12345678901");
        assert_eq!(info.branch.as_deref(), Some("Koramangala"));
        assert_eq!(info.ifsc.as_deref(), Some("SBIN0001234"));
        assert_eq!(
            info.statement_period.as_deref(),
            Some("01/01/2024 to 31/01/2024")
        );
    }

    #[test]
    fn test_cbi_holder_only_from_header_block() {
        let text = r#"CENTRAL BANK OF INDIA
Mrs. ANITA DESAI
STATEMENT OF ACCOUNT
Account Number: 3456789012
"#;
        let ex = extractor();
        assert_eq!(ex.cbi_holder(text).as_deref(), Some("ANITA DESAI"));

        let doc = Document::from_text("anita_desai_statement", "CENTRAL BANK\nSavings A/c 3456789012");
        assert_eq!(
            ex.extract(&doc, BankIdentity::Cbi),
            Err(ValidationError::MissingAccountField {
                field: "account_holder"
            })
        );
    }

    #[test]
    fn test_holder_from_table_cells() {
        let doc = Document {
            name: "x".into(),
            pages: vec![Page {
                text: "A/c No: 987654321012".into(),
                tables: vec![Table::new(vec![vec![
                    Some("Customer Name".into()),
                    Some("Meera Iyer".into()),
                ]])],
            }],
        };
        let info = extractor().extract(&doc, BankIdentity::Hdfc).unwrap();
        assert_eq!(info.account_holder, "MEERA IYER");
        assert_eq!(info.account_number, "987654321012");
    }

    #[test]
    fn test_filename_fallback_requires_text_match() {
        assert_eq!(
            holder_from_filename("tejal_raut_statement.pdf", "Dear TEJAL"),
            Some("TEJAL RAUT".into())
        );
        assert_eq!(holder_from_filename("tejal_raut_statement.pdf", "nobody"), None);
        assert_eq!(holder_from_filename("statement_2024.pdf", "x"), None);
    }

    #[test]
    fn test_aggressive_account_prefers_longest() {
        let text = "Savings details 1234567890 and reference 99999999999999 for current";
        let ex = extractor();
        assert_eq!(
            ex.aggressive_account_scan(text).as_deref(),
            Some("99999999999999")
        );
    }

    #[test]
    fn test_missing_account_number_is_fatal() {
        let doc = Document::from_text("x", "Name: RAVI KUMAR\nno numbers here");
        assert_eq!(
            extractor().extract(&doc, BankIdentity::Axis),
            Err(ValidationError::MissingAccountField {
                field: "account_number"
            })
        );
    }
}
