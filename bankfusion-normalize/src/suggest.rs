//! Deterministic first-pass classification.
//!
//! The suggestion is only a starting point: the rule ladder runs over it
//! afterwards and has the final word.

use crate::channel::suggest_channel;
use crate::merchant::{UNKNOWN_MERCHANT, suggest_merchant};
use crate::rules::RuleTables;
use bankfusion_core::{
    Category, Channel, ClassificationSource, Direction, NormalizedTransaction, RawTransaction,
    TransactionKind,
};

/// Confidence attached to a rules-only classification
pub const RULES_CONFIDENCE: f32 = 0.7;

/// Shorter descriptions without digits are plain transfers not worth escalating
const SIMPLE_TRANSFER_LEN: usize = 20;

pub fn suggest(tables: &RuleTables, txn: &RawTransaction) -> NormalizedTransaction {
    let text = txn.description.to_uppercase();
    let direction = txn.transaction_type;
    let category = suggest_category(tables, &text, txn.debit);

    let (merchant, channel, kind) = if category == Category::Cash {
        ("ATM Withdrawal".to_string(), Channel::Atm, TransactionKind::Withdrawal)
    } else {
        (
            suggest_merchant(tables, &text).unwrap_or_else(|| UNKNOWN_MERCHANT.to_string()),
            suggest_channel(&text),
            suggest_kind(&text, direction),
        )
    };

    NormalizedTransaction {
        merchant,
        category,
        channel,
        debit_or_credit: direction,
        transaction_type: kind,
        confidence: RULES_CONFIDENCE,
        source: ClassificationSource::Rules,
        rationale: None,
    }
}

pub fn suggest_category(tables: &RuleTables, text: &str, debit: f64) -> Category {
    if tables.atm.matches(text) && tables.atm_cash.matches(text) && debit > 0.0 {
        return Category::Cash;
    }
    if tables.interest.matches(text) {
        return Category::InterestIncome;
    }
    if tables.card_payment.matches(text) {
        return Category::CreditCardPayment;
    }
    if tables.ach_debit.matches(text) && tables.lender.matches(text) {
        return Category::EmiLoan;
    }

    let ordered = [
        (&tables.food, Category::FoodDining),
        (&tables.groceries, Category::Groceries),
        (&tables.entertainment, Category::Entertainment),
        (&tables.travel, Category::Travel),
        (&tables.healthcare, Category::Healthcare),
    ];
    if let Some((_, category)) = ordered.iter().find(|(set, _)| set.matches(text)) {
        return *category;
    }
    if tables.fuel.matches(text) || tables.petrol.matches(text) {
        return Category::Fuel;
    }
    if tables.telecom.any(text) || tables.home_connection.matches(text) {
        return Category::BillsUtilities;
    }
    if tables.transfer_words.matches(text) {
        return Category::Transfer;
    }
    Category::Unclassified
}

pub fn suggest_kind(text: &str, direction: Direction) -> TransactionKind {
    let has = |marks: &[&str]| marks.iter().any(|m| text.contains(m));
    match direction {
        Direction::Credit => {
            if has(&["SALARY", "SAL "]) {
                TransactionKind::Salary
            } else if has(&["TRANSFER", "IMPS", "NEFT"]) {
                TransactionKind::TransferReceived
            } else if has(&["REFUND", "REVERSAL"]) {
                TransactionKind::Refund
            } else if has(&["INTEREST"]) {
                TransactionKind::Interest
            } else if has(&["CASH DEP"]) {
                TransactionKind::Deposit
            } else {
                TransactionKind::Credit
            }
        }
        Direction::Debit => {
            if has(&["ATM", "ATW"]) {
                TransactionKind::Withdrawal
            } else if has(&["POS", "SWIPE"]) {
                TransactionKind::Purchase
            } else if has(&["UPI"]) {
                TransactionKind::UpiPayment
            } else if has(&["BILLPAY", "BILL"]) {
                TransactionKind::BillPayment
            } else if has(&["EMI"]) {
                TransactionKind::Emi
            } else if has(&["TRANSFER", "IMPS", "NEFT"]) {
                TransactionKind::Transfer
            } else if has(&["FEE", "CHARGE"]) {
                TransactionKind::Fee
            } else {
                TransactionKind::Debit
            }
        }
    }
}

/// Whether a suggestion is weak enough to ask the advisory service about
pub fn needs_advisory(suggestion: &NormalizedTransaction, description: &str) -> bool {
    let weak = matches!(suggestion.category, Category::Transfer | Category::Unclassified)
        || suggestion.merchant.is_empty()
        || suggestion.merchant == UNKNOWN_MERCHANT;
    let simple_transfer = description.len() < SIMPLE_TRANSFER_LEN
        && suggestion.category == Category::Transfer
        && !description.chars().take(30).any(|c| c.is_ascii_digit());
    weak && !simple_transfer
}
