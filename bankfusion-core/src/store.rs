//! Persistence boundary for accepted statements.
//!
//! Statements and their transactions are stored as separate collections
//! linked by [`StatementId`]. Inserts re-check the anti-mixing invariant;
//! deletes cascade so no transaction outlives its statement.

use crate::bank::BankIdentity;
use crate::error::StoreError;
use crate::statement::{AccountInfo, BankStatement, StatementEntry, StatementMetadata};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StatementId(pub u64);

impl fmt::Display for StatementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stmt-{}", self.0)
    }
}

/// Parent record without its children
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredStatement {
    pub id: StatementId,
    pub bank: BankIdentity,
    pub account: AccountInfo,
    pub metadata: StatementMetadata,
}

pub trait StatementRepository: Send {
    /// Persist a statement and its transactions as one unit.
    fn insert(&mut self, statement: BankStatement) -> Result<StatementId, StoreError>;

    /// Remove a statement together with every transaction it owns.
    /// Returns the number of transactions removed.
    fn delete(&mut self, id: StatementId) -> Result<usize, StoreError>;

    fn transactions(&self, id: StatementId) -> Result<Vec<StatementEntry>, StoreError>;

    fn statements(&self) -> Vec<StoredStatement>;
}

#[derive(Debug, Default)]
pub struct InMemoryRepository {
    next_id: u64,
    statements: BTreeMap<StatementId, StoredStatement>,
    transactions: BTreeMap<StatementId, Vec<StatementEntry>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    /// Total stored transactions across all statements
    pub fn transaction_count(&self) -> usize {
        self.transactions.values().map(Vec::len).sum()
    }
}

impl StatementRepository for InMemoryRepository {
    fn insert(&mut self, statement: BankStatement) -> Result<StatementId, StoreError> {
        if let Some(bad) = statement
            .transactions
            .iter()
            .find(|e| e.bank != statement.bank)
        {
            return Err(StoreError::MixedBankIdentity {
                statement: statement.bank,
                transaction: bad.bank,
            });
        }

        self.next_id += 1;
        let id = StatementId(self.next_id);
        let BankStatement {
            bank,
            account,
            metadata,
            transactions,
        } = statement;

        debug!(%id, %bank, count = transactions.len(), "statement stored");
        self.statements.insert(
            id,
            StoredStatement {
                id,
                bank,
                account,
                metadata,
            },
        );
        self.transactions.insert(id, transactions);
        Ok(id)
    }

    fn delete(&mut self, id: StatementId) -> Result<usize, StoreError> {
        if self.statements.remove(&id).is_none() {
            return Err(StoreError::NotFound(id));
        }
        let removed = self.transactions.remove(&id).map(|t| t.len()).unwrap_or(0);
        debug!(%id, removed, "statement deleted");
        Ok(removed)
    }

    fn transactions(&self, id: StatementId) -> Result<Vec<StatementEntry>, StoreError> {
        if !self.statements.contains_key(&id) {
            return Err(StoreError::NotFound(id));
        }
        Ok(self.transactions.get(&id).cloned().unwrap_or_default())
    }

    fn statements(&self) -> Vec<StoredStatement> {
        self.statements.values().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::{Category, Channel, Direction, TransactionKind};
    use crate::statement::{
        ClassificationSource, NormalizationMethod, NormalizedTransaction, RawTransaction,
    };
    use chrono::DateTime;

    fn statement(bank: BankIdentity, child_banks: &[BankIdentity]) -> BankStatement {
        let transactions = child_banks
            .iter()
            .enumerate()
            .map(|(i, b)| StatementEntry {
                original: RawTransaction::from_amounts(i + 1, "01/03/24", "UPI/X", 10.0, 0.0, None)
                    .unwrap(),
                normalized: NormalizedTransaction {
                    merchant: "X".into(),
                    category: Category::Transfer,
                    channel: Channel::Upi,
                    debit_or_credit: Direction::Debit,
                    transaction_type: TransactionKind::Transfer,
                    confidence: 0.8,
                    source: ClassificationSource::Rules,
                    rationale: None,
                },
                bank: *b,
            })
            .collect::<Vec<_>>();
        BankStatement {
            bank,
            account: AccountInfo::default(),
            metadata: StatementMetadata {
                generated_at: DateTime::parse_from_rfc3339("2024-03-02T12:00:00+05:30").unwrap(),
                total_transactions: transactions.len(),
                bank_name: bank.display_name().into(),
                normalization_method: NormalizationMethod::Hybrid,
            },
            transactions,
        }
    }

    #[test]
    fn test_insert_and_cascade_delete() {
        let mut repo = InMemoryRepository::new();
        let a = repo
            .insert(statement(BankIdentity::Union, &[BankIdentity::Union; 3]))
            .unwrap();
        let b = repo
            .insert(statement(BankIdentity::Sbi, &[BankIdentity::Sbi]))
            .unwrap();
        assert_ne!(a, b);
        assert_eq!(repo.transaction_count(), 4);

        assert_eq!(repo.delete(a).unwrap(), 3);
        assert_eq!(repo.transaction_count(), 1);
        assert_eq!(repo.transactions(a), Err(StoreError::NotFound(a)));
        assert_eq!(repo.statements().len(), 1);
    }

    #[test]
    fn test_insert_rejects_mixed_children() {
        let mut repo = InMemoryRepository::new();
        let err = repo
            .insert(statement(
                BankIdentity::Cbi,
                &[BankIdentity::Cbi, BankIdentity::Boi],
            ))
            .unwrap_err();
        assert_eq!(
            err,
            StoreError::MixedBankIdentity {
                statement: BankIdentity::Cbi,
                transaction: BankIdentity::Boi,
            }
        );
        assert!(repo.is_empty());
        assert_eq!(repo.transaction_count(), 0);
    }

    #[test]
    fn test_delete_unknown_id() {
        let mut repo = InMemoryRepository::new();
        assert_eq!(
            repo.delete(StatementId(9)),
            Err(StoreError::NotFound(StatementId(9)))
        );
    }
}
