//! Issuing-bank detection from header text, IFSC codes and bank names

use bankfusion_core::{BankIdentity, Document};
use regex::Regex;
use serde::Serialize;
use tracing::{debug, info, warn};

/// Pages considered when looking for the issuing bank
const HEADER_PAGES: usize = 2;

/// Characters of the header region scanned for bare keywords
const HEADER_CHARS: usize = 2000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionStrategy {
    IfscPrefix,
    BankName,
    HeaderKeyword,
    GenericName,
    Unmatched,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Detection {
    pub bank: BankIdentity,
    pub strategy: DetectionStrategy,
    /// Name pulled by the generic `<Name> Bank` scan when no known bank matched
    pub generic_name: Option<String>,
}

impl Detection {
    fn found(bank: BankIdentity, strategy: DetectionStrategy) -> Self {
        Self {
            bank,
            strategy,
            generic_name: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BankDetector {
    ifsc: Regex,
    central: Regex,
    cbi: Regex,
    union: Regex,
    bank_of_india: Regex,
    boi: Regex,
    named_bank_of_india: Regex,
    named_bank: Regex,
}

impl BankDetector {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            ifsc: Regex::new(r"IFSC[:\s]*(?:CODE)?[:\s]*([A-Z]{4}0[A-Z0-9]{6})")?,
            central: Regex::new(r"CENTRAL\s+BANK")?,
            cbi: Regex::new(r"\bCBI\b")?,
            union: Regex::new(r"UNION\s+BANK")?,
            bank_of_india: Regex::new(r"BANK\s+OF\s+INDIA")?,
            boi: Regex::new(r"\bBOI\b")?,
            named_bank_of_india: Regex::new(r"([A-Z][A-Z ]+?)\s+BANK\s+OF\s+INDIA")?,
            named_bank: Regex::new(r"([A-Z][A-Z ]+?)\s+BANK\b")?,
        })
    }

    /// Classify the document's issuing bank. Never fails: the worst case is
    /// [`BankIdentity::Unidentified`]. A caller hint is only compared and logged.
    pub fn detect(&self, doc: &Document, hint: Option<BankIdentity>) -> Detection {
        let text = doc.leading_text(HEADER_PAGES).to_uppercase();

        let detection = self
            .by_ifsc(&text, doc)
            .map(|b| Detection::found(b, DetectionStrategy::IfscPrefix))
            .or_else(|| {
                self.by_name(&text)
                    .map(|b| Detection::found(b, DetectionStrategy::BankName))
            })
            .or_else(|| {
                by_header_keyword(&text)
                    .map(|b| Detection::found(b, DetectionStrategy::HeaderKeyword))
            })
            .unwrap_or_else(|| self.by_generic_name(&text));

        if let Some(hint) = hint {
            if hint != detection.bank {
                warn!(
                    document = %doc.name,
                    %hint,
                    detected = %detection.bank,
                    "bank hint disagrees with document content"
                );
            }
        }
        info!(
            document = %doc.name,
            bank = %detection.bank,
            strategy = ?detection.strategy,
            "bank detected"
        );
        detection
    }

    fn by_ifsc(&self, text: &str, doc: &Document) -> Option<BankIdentity> {
        let from_text = self
            .ifsc
            .captures_iter(text)
            .find_map(|c| prefix_bank(&c[1]));
        if from_text.is_some() {
            return from_text;
        }
        for table in doc.leading_tables(HEADER_PAGES) {
            for row in &table.rows {
                let joined = row
                    .iter()
                    .flatten()
                    .map(|c| c.to_uppercase())
                    .collect::<Vec<_>>()
                    .join(" ");
                if let Some(bank) = self
                    .ifsc
                    .captures_iter(&joined)
                    .find_map(|c| prefix_bank(&c[1]))
                {
                    debug!(%bank, "IFSC found in table cell");
                    return Some(bank);
                }
            }
        }
        None
    }

    fn by_name(&self, text: &str) -> Option<BankIdentity> {
        if self.central.is_match(text) || self.cbi.is_match(text) {
            return Some(BankIdentity::Cbi);
        }
        if text.contains("STATE BANK OF INDIA") {
            return Some(BankIdentity::Sbi);
        }
        if self.union.is_match(text) {
            return Some(BankIdentity::Union);
        }
        if self.is_plain_bank_of_india(text) || self.boi.is_match(text) {
            return Some(BankIdentity::Boi);
        }
        if text.contains("AXIS BANK") {
            return Some(BankIdentity::Axis);
        }
        if text.contains("HDFC BANK") {
            return Some(BankIdentity::Hdfc);
        }
        None
    }

    /// "BANK OF INDIA" not preceded by "UNION " or owned by State/Central Bank
    fn is_plain_bank_of_india(&self, text: &str) -> bool {
        if text.contains("STATE BANK OF INDIA") || text.contains("CENTRAL BANK") {
            return false;
        }
        self.bank_of_india
            .find_iter(text)
            .any(|m| !text[..m.start()].trim_end().ends_with("UNION"))
    }

    fn by_generic_name(&self, text: &str) -> Detection {
        let header = header_region(text);
        if let Some(caps) = self.named_bank_of_india.captures(header) {
            let bank = match caps[1].trim() {
                "CENTRAL" => BankIdentity::Cbi,
                "UNION" => BankIdentity::Union,
                _ => BankIdentity::Boi,
            };
            return Detection::found(bank, DetectionStrategy::GenericName);
        }
        let generic_name = self
            .named_bank
            .captures(header)
            .map(|c| format!("{} Bank", title_case(c[1].trim())));
        if let Some(name) = &generic_name {
            debug!(name, "unrecognized bank name");
        }
        Detection {
            bank: BankIdentity::Unidentified,
            strategy: if generic_name.is_some() {
                DetectionStrategy::GenericName
            } else {
                DetectionStrategy::Unmatched
            },
            generic_name,
        }
    }
}

fn prefix_bank(code: &str) -> Option<BankIdentity> {
    code.get(..4).and_then(BankIdentity::from_ifsc_prefix)
}

fn header_region(text: &str) -> &str {
    match text.char_indices().nth(HEADER_CHARS) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

fn by_header_keyword(text: &str) -> Option<BankIdentity> {
    let header = header_region(text);
    const KEYWORDS: [(&str, BankIdentity); 6] = [
        ("CENTRAL", BankIdentity::Cbi),
        ("UNION", BankIdentity::Union),
        ("AXIS", BankIdentity::Axis),
        ("HDFC", BankIdentity::Hdfc),
        ("STATE BANK", BankIdentity::Sbi),
        ("BANK OF INDIA", BankIdentity::Boi),
    ];
    KEYWORDS
        .iter()
        .find(|(kw, _)| header.contains(*kw))
        .map(|(_, bank)| *bank)
}

pub(crate) fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use bankfusion_core::{Page, Table};
    use rstest::rstest;

    fn detect(text: &str) -> Detection {
        BankDetector::new()
            .unwrap()
            .detect(&Document::from_text("t", text), None)
    }

    #[rstest]
    #[case("Statement\nIFSC Code: SBIN0001234\nHDFC BANK promo", BankIdentity::Sbi)]
    #[case("IFSC: UBIN0530000", BankIdentity::Union)]
    #[case("IFSC CODE: ICIC0000001\nAXIS BANK LTD", BankIdentity::Axis)]
    #[case("CENTRAL BANK OF INDIA\nStatement of account", BankIdentity::Cbi)]
    #[case("UNION BANK OF INDIA\nStatement", BankIdentity::Union)]
    #[case("BANK OF INDIA\nStatement", BankIdentity::Boi)]
    #[case("State Bank of India", BankIdentity::Sbi)]
    #[case("HDFC Bank Ltd", BankIdentity::Hdfc)]
    fn test_detection_order(#[case] text: &str, #[case] expected: BankIdentity) {
        assert_eq!(detect(text).bank, expected);
    }

    #[test]
    fn test_ifsc_wins_over_name() {
        let d = detect("IFSC: CBIN0281234\nSTATE BANK OF INDIA ATM");
        assert_eq!(d.bank, BankIdentity::Cbi);
        assert_eq!(d.strategy, DetectionStrategy::IfscPrefix);
    }

    #[test]
    fn test_ifsc_from_table_cell() {
        let doc = Document {
            name: "t".into(),
            pages: vec![Page {
                text: "Account statement".into(),
                tables: vec![Table::new(vec![vec![
                    Some("IFSC".into()),
                    Some("UTIB0000123".into()),
                ]])],
            }],
        };
        let d = BankDetector::new().unwrap().detect(&doc, None);
        assert_eq!(d.bank, BankIdentity::Axis);
        assert_eq!(d.strategy, DetectionStrategy::IfscPrefix);
    }

    #[test]
    fn test_unknown_bank_is_unidentified_with_name() {
        let d = detect("Punjab National Bank\nStatement");
        assert_eq!(d.bank, BankIdentity::Unidentified);
        assert_eq!(d.generic_name.as_deref(), Some("Punjab National Bank"));
    }

    #[test]
    fn test_nothing_matches() {
        let d = detect("hello world");
        assert_eq!(d.bank, BankIdentity::Unidentified);
        assert_eq!(d.strategy, DetectionStrategy::Unmatched);
    }
}
