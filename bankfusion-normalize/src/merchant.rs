//! Merchant and counterparty names pulled out of narration text

use crate::rules::{RuleTables, title_case};
use regex::Regex;

/// Display name when nothing could be isolated
pub const UNKNOWN_MERCHANT: &str = "Unknown";

const SKIPPED_PARTS: &[&str] = &["UPI", "PAYMENT", "TRANSFER"];

#[derive(Debug, Clone)]
pub struct MerchantPatterns {
    upi_handle: Regex,
    code_part: Regex,
    name_like: Regex,
    pos: [Regex; 3],
    pos_suffix: Regex,
    cleanup: [Regex; 6],
    cr_name: Regex,
    dr_name: Regex,
    cr_short: Regex,
    dr_short: Regex,
    upi_segment: Regex,
    neft_name: Regex,
    imps_name: Regex,
    handle_tail: Regex,
    slash_tail: Regex,
    person_noise: Regex,
    non_letters: Regex,
}

impl MerchantPatterns {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            upi_handle: Regex::new(r"([A-Z][A-Z0-9\s&]+)@[A-Z]+")?,
            code_part: Regex::new(r"^[A-Z0-9]{4,}$")?,
            name_like: Regex::new(r"[A-Z][A-Z\s]+[A-Z]")?,
            pos: [
                Regex::new(r"POS\s+\d+X+\d+\s+([A-Z][A-Z\s&]+?)(?:\s+POS|\s+[0-9]|$)")?,
                Regex::new(r"POS\s+[0-9X]+\s+([A-Z][A-Z\s&]+?)(?:\s+[0-9]|$)")?,
                Regex::new(r"[0-9X]{4,}\s+([A-Z][A-Z\s&]{3,})")?,
            ],
            pos_suffix: Regex::new(r"\s+(?:POS|CARD|PAYMENT|TRANSACTION)$")?,
            cleanup: [
                Regex::new(r"UPI[-\s]*[A-Z0-9]+")?,
                Regex::new(r"[0-9]{10,}")?,
                Regex::new(r"\d{4}[-\s]?\d{4}[-\s]?\d{4}[-\s]?\d{4}")?,
                Regex::new(r"ACH[-\s]*[A-Z0-9-]+")?,
                Regex::new(r"POS[-\s]*[A-Z0-9]+")?,
                Regex::new(r"[A-Z]{2,}\d{6,}")?,
            ],
            cr_name: Regex::new(r"CR/([^/]+?)(?:\s*/[^/]+/[^/]+|$)")?,
            dr_name: Regex::new(r"DR/([^/]+?)(?:\s*/[^/]+/[^/]+|$)")?,
            cr_short: Regex::new(r"CR/([^/]+?)(?:/|$)")?,
            dr_short: Regex::new(r"DR/([^/]+?)(?:/|$)")?,
            upi_segment: Regex::new(r"UPIA[RB]/[^/]+/(?:DR|CR)/([^/]+?)(?:\s*/[^/]+/[^/]+|$)")?,
            neft_name: Regex::new(r"NEFT\s+DR\s*-[^-]*-\s*([A-Z][A-Z\s]*?)(?:\s*-|$)")?,
            imps_name: Regex::new(r"IMPS\s*-[^-]*-\s*([A-Z][A-Z\s]*?)(?:\s*-|$)")?,
            handle_tail: Regex::new(r"@.*$")?,
            slash_tail: Regex::new(r"\s+/.*$")?,
            person_noise: Regex::new(
                r"\b(?:TO|FROM|FOR|PAYMENT|TRANSFER|UPI|CR|DEBIT|CREDIT|DR)\b",
            )?,
            non_letters: Regex::new(r"[^A-Z\s]")?,
        })
    }

    fn capture<'t>(re: &Regex, text: &'t str) -> Option<&'t str> {
        re.captures(text).and_then(|c| c.get(1)).map(|m| m.as_str().trim())
    }

    fn strip_tails(&self, name: &str) -> String {
        let name = self.handle_tail.replace(name, "");
        self.slash_tail.replace(name.trim(), "").trim().to_string()
    }

    /// `UPIAR/<id>/<DR|CR>/<name>` segment without the bank and handle parts
    fn segment(&self, text: &str) -> Option<String> {
        Self::capture(&self.upi_segment, text).map(|s| self.slash_tail.replace(s, "").trim().to_string())
    }
}

/// Deterministic merchant guess: brand table, UPI handle or dash/slash
/// parts, POS patterns, then the first few plain words.
pub fn suggest_merchant(tables: &RuleTables, text: &str) -> Option<String> {
    let p = &tables.merchant;

    if let Some(brand) = tables.brand_in(text) {
        return Some(brand.name.to_string());
    }

    if text.contains("UPI") {
        if let Some(handle) = MerchantPatterns::capture(&p.upi_handle, text) {
            return Some(title_case(handle));
        }
        for part in text.split(['-', '/']).map(str::trim) {
            if SKIPPED_PARTS.contains(&part) || p.code_part.is_match(part) {
                continue;
            }
            let alphabetic = part.chars().all(|c| c.is_ascii_alphabetic());
            if part.len() > 2 && (p.name_like.is_match(part) || (part.len() < 30 && alphabetic)) {
                return Some(title_case(part));
            }
        }
    }

    if text.contains("POS") {
        for re in &p.pos {
            if let Some(name) = MerchantPatterns::capture(re, text) {
                let name = p.pos_suffix.replace(name, "");
                if name.len() > 2 {
                    return Some(title_case(&name));
                }
            }
        }
    }

    let mut cleaned = text.to_string();
    for re in &p.cleanup {
        cleaned = re.replace_all(&cleaned, " ").into_owned();
    }
    let words: Vec<String> = cleaned
        .split(|c: char| c.is_whitespace() || c == '-' || c == '/')
        .map(|w| w.chars().filter(|c| c.is_ascii_alphabetic()).collect::<String>())
        .filter(|w| w.len() >= 3)
        .take(3)
        .collect();
    if words.is_empty() {
        None
    } else {
        Some(title_case(&words.join(" ")))
    }
}

/// Merchant read straight from the narration before any rule runs.
///
/// A person after `CR/` or `DR/` wins unless the segment names a brand;
/// then the UPI merchant segment, a whole-word brand, and a POS name.
pub fn extract_merchant(tables: &RuleTables, text: &str) -> Option<String> {
    let p = &tables.merchant;

    for re in [&p.cr_name, &p.dr_name] {
        if let Some(raw) = MerchantPatterns::capture(re, text) {
            let name = p.strip_tails(raw);
            if name.len() > 1 && !tables.person_blockers.matches(&name) {
                return Some(title_case(&name));
            }
        }
    }

    if text.contains("UPI") || text.contains("MOBFT") {
        if let Some(segment) = p.segment(text).filter(|s| s.len() > 1) {
            return Some(match tables.brand_in(&segment) {
                Some(brand) => brand.name.to_string(),
                None => title_case(&segment),
            });
        }
    }

    if let Some(brand) = tables.brand_in(text) {
        return Some(brand.name.to_string());
    }

    if text.contains("POS") {
        if let Some(name) = MerchantPatterns::capture(&p.pos[0], text).filter(|n| n.len() > 2) {
            return Some(title_case(name));
        }
    }
    None
}

/// Counterparty of a person-to-person transfer, when one can be isolated
pub fn person_name(tables: &RuleTables, text: &str) -> Option<String> {
    let p = &tables.merchant;

    let candidate = p
        .segment(text)
        .filter(|s| s.len() > 1 && !tables.names_brand(s))
        .or_else(|| {
            [&p.cr_short, &p.dr_short].into_iter().find_map(|re| {
                MerchantPatterns::capture(re, text)
                    .map(|raw| p.strip_tails(raw))
                    .filter(|n| !n.is_empty() && !tables.names_brand(n))
            })
        })
        .or_else(|| {
            [&p.neft_name, &p.imps_name].into_iter().find_map(|re| {
                MerchantPatterns::capture(re, text)
                    .map(|raw| p.non_letters.replace_all(raw, "").trim().to_string())
                    .filter(|n| !n.is_empty())
            })
        })?;

    if candidate.len() <= 2 {
        return None;
    }
    let cleaned = p.person_noise.replace_all(&candidate, " ");
    let cleaned = p.non_letters.replace_all(&cleaned, "");
    let cleaned = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    (cleaned.len() > 2).then(|| title_case(&cleaned))
}

/// Credit arriving from a named person over a transfer rail. Such rows are
/// never salary, whatever the narration says.
pub fn is_person_credit(tables: &RuleTables, text: &str, debit: f64, credit: f64) -> bool {
    if !(credit > 0.0 && debit == 0.0) || !tables.person_rails.matches(text) {
        return false;
    }
    let p = &tables.merchant;
    let from_cr = MerchantPatterns::capture(&p.cr_short, text)
        .map(|raw| p.handle_tail.replace(raw, "").trim().to_string())
        .is_some_and(|n| n.len() > 1 && !tables.names_brand(&n));
    from_cr
        || p
            .segment(text)
            .is_some_and(|s| s.len() > 1 && !tables.names_brand(&s))
}
