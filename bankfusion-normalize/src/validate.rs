//! Checks an advisory answer must pass before it may replace the suggestion

use crate::advisory::AdvisorySuggestion;
use crate::rules::RuleTables;
use bankfusion_core::{
    Category, Channel, ClassificationSource, Direction, NormalizedTransaction, RawTransaction,
};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Rejection {
    #[error("advisory direction {advised:?} contradicts the amounts")]
    Direction { advised: Direction },

    #[error("advisory category {advised} where keywords require {expected}")]
    Keyword { advised: Category, expected: Category },

    #[error("advisory category '{0}' has no canonical counterpart")]
    UnknownCategory(String),
}

/// Accept the advisory answer as a new suggestion, or say why not
pub fn accept(
    tables: &RuleTables,
    txn: &RawTransaction,
    suggestion: &NormalizedTransaction,
    advice: &AdvisorySuggestion,
) -> Result<NormalizedTransaction, Rejection> {
    let text = txn.description.to_uppercase();

    if let Some(advised) = Direction::from_label(&advice.debit_or_credit) {
        let debit_only = txn.debit > 0.0 && txn.credit == 0.0;
        let credit_only = txn.credit > 0.0 && txn.debit == 0.0;
        if (debit_only && advised == Direction::Credit) || (credit_only && advised == Direction::Debit) {
            return Err(Rejection::Direction { advised });
        }
    }

    let category = Category::from_label(&advice.category)
        .ok_or_else(|| Rejection::UnknownCategory(advice.category.clone()))?;

    if tables.advisory_cash.matches(&text) && txn.debit > 0.0 && category != Category::Cash {
        return Err(Rejection::Keyword {
            advised: category,
            expected: Category::Cash,
        });
    }
    if let Some((_, expected)) = tables
        .advisory_checks
        .iter()
        .find(|(set, expected)| set.matches(&text) && *expected != category)
    {
        return Err(Rejection::Keyword {
            advised: category,
            expected: *expected,
        });
    }

    let merchant = advice.merchant.trim();
    Ok(NormalizedTransaction {
        merchant: if merchant.is_empty() {
            suggestion.merchant.clone()
        } else {
            merchant.to_string()
        },
        category,
        channel: Channel::from_label(&advice.channel).unwrap_or(suggestion.channel),
        debit_or_credit: txn.transaction_type,
        transaction_type: suggestion.transaction_type,
        confidence: advice.confidence.clamp(0.0, 1.0),
        source: ClassificationSource::Advisory,
        rationale: Some(advice.rationale.clone()).filter(|r| !r.is_empty()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::suggest::suggest;
    use bankfusion_core::TransactionKind;

    fn advice(merchant: &str, category: &str, direction: &str) -> AdvisorySuggestion {
        AdvisorySuggestion {
            merchant: merchant.into(),
            category: category.into(),
            channel: "CARD".into(),
            debit_or_credit: direction.into(),
            confidence: 1.4,
            rationale: "test".into(),
        }
    }

    fn check(description: &str, debit: f64, credit: f64, a: &AdvisorySuggestion) -> Result<NormalizedTransaction, Rejection> {
        let tables = RuleTables::new().unwrap();
        let txn = RawTransaction::from_amounts(1, "05/01/24", description, debit, credit, None).unwrap();
        let s = suggest(&tables, &txn);
        accept(&tables, &txn, &s, a)
    }

    #[test]
    fn test_accepts_consistent_answer() {
        let out = check("POS 4111XX1234 BLUE TOKAI COFFEE", 320.0, 0.0, &advice("Blue Tokai", "Food", "debit")).unwrap();
        assert_eq!(out.category, Category::FoodDining);
        assert_eq!(out.channel, Channel::Card);
        assert_eq!(out.source, ClassificationSource::Advisory);
        assert_eq!(out.confidence, 1.0);
        assert_eq!(out.transaction_type, TransactionKind::Purchase);
    }

    #[test]
    fn test_rejects_direction_contradiction() {
        let err = check("BY CLEARING 004512", 0.0, 5_000.0, &advice("Acme", "Shopping", "debit")).unwrap_err();
        assert_eq!(err, Rejection::Direction { advised: Direction::Debit });
    }

    #[test]
    fn test_rejects_keyword_disagreement() {
        let err = check("UPI/SWIGGY/1234567890/DR", 350.0, 0.0, &advice("Swiggy", "Transfer", "debit")).unwrap_err();
        assert_eq!(
            err,
            Rejection::Keyword {
                advised: Category::Transfer,
                expected: Category::FoodDining
            }
        );

        let err = check("ATM CASH 412345", 500.0, 0.0, &advice("ATM", "Others", "debit")).unwrap_err();
        assert!(matches!(err, Rejection::Keyword { expected: Category::Cash, .. }));
    }

    #[test]
    fn test_rejects_unknown_category() {
        let err = check("BY CLEARING 004512", 900.0, 0.0, &advice("X", "Crypto", "debit")).unwrap_err();
        assert_eq!(err, Rejection::UnknownCategory("Crypto".into()));
    }
}
