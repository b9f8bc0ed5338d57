//! Lenient date recognition for statement cells and lines

use regex::Regex;

const MONTHS: &str = "(?:JAN|FEB|MAR|APR|MAY|JUN|JUL|AUG|SEP|OCT|NOV|DEC)[A-Z]*";

/// Compiled date shapes seen across bank layouts
#[derive(Debug, Clone)]
pub struct DateMatcher {
    leading: Regex,
    anywhere: Regex,
}

impl DateMatcher {
    pub fn new() -> Result<Self, regex::Error> {
        let shapes = [
            r"\d{4}[-/]\d{1,2}[-/]\d{1,2}".to_string(),
            r"\d{1,2}[-/]\d{1,2}[-/]\d{2,4}".to_string(),
            format!(r"\d{{1,2}}[-/]{MONTHS}[-/]\d{{2,4}}"),
            format!(r"\d{{1,2}}\s+{MONTHS}\s+\d{{2,4}}"),
            r"\d{1,2}[-/]\d{1,2}".to_string(),
        ];
        let alt = shapes.join("|");
        Ok(Self {
            leading: Regex::new(&format!(r"(?i)^\s*({alt})(?:\s|$)"))?,
            anywhere: Regex::new(&format!(r"(?i)\b({alt})\b"))?,
        })
    }

    /// True when the cell starts with a recognizable date
    pub fn is_date(&self, cell: &str) -> bool {
        self.leading.is_match(cell)
    }

    /// The leading date of a cell, trimmed
    pub fn leading_date<'a>(&self, cell: &'a str) -> Option<&'a str> {
        self.leading
            .captures(cell)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str())
    }

    /// First date anywhere in the text
    pub fn find<'a>(&self, text: &'a str) -> Option<&'a str> {
        self.anywhere
            .captures(text)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str())
    }
}
