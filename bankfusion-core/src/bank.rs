//! Issuing-bank identity

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The bank that issued a statement. Derived once per document.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum BankIdentity {
    #[serde(rename = "SBI")]
    Sbi,
    #[serde(rename = "HDFC")]
    Hdfc,
    #[serde(rename = "BOI")]
    Boi,
    #[serde(rename = "CBI")]
    Cbi,
    #[serde(rename = "UNION")]
    Union,
    #[serde(rename = "AXIS")]
    Axis,
    /// Sentinel for documents no detection strategy could place.
    #[serde(rename = "UNIDENTIFIED")]
    Unidentified,
}

impl BankIdentity {
    pub const KNOWN: [BankIdentity; 6] = [
        BankIdentity::Sbi,
        BankIdentity::Hdfc,
        BankIdentity::Boi,
        BankIdentity::Cbi,
        BankIdentity::Union,
        BankIdentity::Axis,
    ];

    /// Short code used in output records and folder names
    pub fn code(&self) -> &'static str {
        match self {
            BankIdentity::Sbi => "SBI",
            BankIdentity::Hdfc => "HDFC",
            BankIdentity::Boi => "BOI",
            BankIdentity::Cbi => "CBI",
            BankIdentity::Union => "UNION",
            BankIdentity::Axis => "AXIS",
            BankIdentity::Unidentified => "UNIDENTIFIED",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            BankIdentity::Sbi => "State Bank of India",
            BankIdentity::Hdfc => "HDFC Bank",
            BankIdentity::Boi => "Bank of India",
            BankIdentity::Cbi => "Central Bank of India",
            BankIdentity::Union => "Union Bank of India",
            BankIdentity::Axis => "Axis Bank",
            BankIdentity::Unidentified => "Bank (Unidentified)",
        }
    }

    /// Map the four-letter IFSC prefix to a bank. Prefixes of other banks are not conclusive.
    pub fn from_ifsc_prefix(prefix: &str) -> Option<BankIdentity> {
        match prefix.to_ascii_uppercase().as_str() {
            "SBIN" => Some(BankIdentity::Sbi),
            "BKID" => Some(BankIdentity::Boi),
            "UTIB" => Some(BankIdentity::Axis),
            "HDFC" => Some(BankIdentity::Hdfc),
            "CBIN" => Some(BankIdentity::Cbi),
            "UBIN" => Some(BankIdentity::Union),
            _ => None,
        }
    }

    pub fn is_identified(&self) -> bool {
        !matches!(self, BankIdentity::Unidentified)
    }
}

impl fmt::Display for BankIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Parses bank hints such as folder names ("HDFC", "central_bank", "Bank of India").
impl FromStr for BankIdentity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .trim()
            .to_ascii_uppercase()
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { ' ' })
            .collect();
        let key = key.split_whitespace().collect::<Vec<_>>().join(" ");

        let bank = match key.as_str() {
            "SBI" | "STATE BANK" | "STATE BANK OF INDIA" => BankIdentity::Sbi,
            "HDFC" | "HDFC BANK" => BankIdentity::Hdfc,
            "BOI" | "BANK OF INDIA" => BankIdentity::Boi,
            "CBI" | "CENTRAL" | "CENTRAL BANK" | "CENTRAL BANK OF INDIA" => BankIdentity::Cbi,
            "UNION" | "UNION BANK" | "UNION BANK OF INDIA" => BankIdentity::Union,
            "AXIS" | "AXIS BANK" => BankIdentity::Axis,
            "UNIDENTIFIED" | "GENERIC" => BankIdentity::Unidentified,
            _ => return Err(format!("unknown bank: {s}")),
        };
        Ok(bank)
    }
}
