//! Statement records: raw rows, their normalized counterparts and the parent statement

use crate::bank::BankIdentity;
use crate::category::{Category, Channel, Direction, TransactionKind};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Account metadata. Holder and number are never empty in an accepted statement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountInfo {
    pub account_holder: String,
    pub account_number: String,
    pub branch: Option<String>,
    pub ifsc: Option<String>,
    pub statement_period: Option<String>,
}

/// One extracted row. Exactly one of `debit`/`credit` is positive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTransaction {
    pub sr_no: usize,
    pub date: String,
    pub description: String,
    #[serde(default)]
    pub reference: String,
    pub debit: f64,
    pub credit: f64,
    pub balance: Option<f64>,
    pub amount: f64,
    pub transaction_type: Direction,
}

impl RawTransaction {
    /// Build a row from already-validated amounts.
    ///
    /// Returns `None` unless exactly one side is positive; direction and
    /// `amount` are derived from that side only.
    pub fn from_amounts(
        sr_no: usize,
        date: impl Into<String>,
        description: impl Into<String>,
        debit: f64,
        credit: f64,
        balance: Option<f64>,
    ) -> Option<Self> {
        let (amount, transaction_type) = match (debit > 0.0, credit > 0.0) {
            (true, false) => (debit, Direction::Debit),
            (false, true) => (credit, Direction::Credit),
            _ => return None,
        };
        Some(Self {
            sr_no,
            date: date.into(),
            description: description.into(),
            reference: String::new(),
            debit: debit.max(0.0),
            credit: credit.max(0.0),
            balance,
            amount,
            transaction_type,
        })
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = reference.into();
        self
    }

    pub fn is_debit(&self) -> bool {
        self.transaction_type == Direction::Debit
    }
}

/// Where the final classification came from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationSource {
    Rules,
    Advisory,
    /// Advisory was attempted and failed transiently
    RulesFallback,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedTransaction {
    pub merchant: String,
    pub category: Category,
    pub channel: Channel,
    pub debit_or_credit: Direction,
    pub transaction_type: TransactionKind,
    pub confidence: f32,
    pub source: ClassificationSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementEntry {
    pub original: RawTransaction,
    pub normalized: NormalizedTransaction,
    pub bank: BankIdentity,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NormalizationMethod {
    /// Rules plus advisory escalation
    Hybrid,
    RulesOnly,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementMetadata {
    pub generated_at: DateTime<FixedOffset>,
    pub total_transactions: usize,
    pub bank_name: String,
    pub normalization_method: NormalizationMethod,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankStatement {
    pub bank: BankIdentity,
    pub account: AccountInfo,
    pub metadata: StatementMetadata,
    pub transactions: Vec<StatementEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatementSummary {
    pub total_transactions: usize,
    pub total_debit: f64,
    pub total_credit: f64,
    pub net_change: f64,
}

impl BankStatement {
    pub fn summary(&self) -> StatementSummary {
        let total_debit: f64 = self.transactions.iter().map(|e| e.original.debit).sum();
        let total_credit: f64 = self.transactions.iter().map(|e| e.original.credit).sum();
        StatementSummary {
            total_transactions: self.transactions.len(),
            total_debit: round2(total_debit),
            total_credit: round2(total_credit),
            net_change: round2(total_credit - total_debit),
        }
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
