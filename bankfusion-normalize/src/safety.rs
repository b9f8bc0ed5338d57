//! Last corrections after the ladder: intents that a weak category must not
//! hide, merchant fill-ins, and direction settled from the amounts.

use crate::ladder::{Facts, is_unknown};
use bankfusion_core::{Category, Channel, Direction, NormalizedTransaction, TransactionKind};

pub fn apply(f: &Facts<'_>, out: &mut NormalizedTransaction) {
    let t = f.tables;

    if t.is_atm(f.text)
        && f.debit > 0.0
        && matches!(
            out.category,
            Category::Shopping
                | Category::Groceries
                | Category::FoodDining
                | Category::Travel
                | Category::Transfer
        )
    {
        out.category = Category::Cash;
        out.merchant = "ATM Withdrawal".into();
        out.transaction_type = TransactionKind::Withdrawal;
        out.channel = Channel::Atm;
    }

    if t.rent.matches(f.text) && out.category == Category::Transfer {
        out.category = Category::Rent;
        out.merchant = f.extracted.clone().unwrap_or_else(|| "Rent Payment".into());
    }

    if let Some(label) = t.education_final.first(f.text) {
        if matches!(
            out.category,
            Category::Transfer | Category::Unclassified | Category::Shopping
        ) {
            out.category = Category::Education;
            out.transaction_type = TransactionKind::Expense;
            out.merchant = label.to_string();
        }
    }

    if let Some(label) = t.travel_booking.first(f.text) {
        if matches!(out.category, Category::Transfer | Category::Unclassified) {
            out.category = Category::Travel;
            out.transaction_type = TransactionKind::Expense;
            out.merchant = label.to_string();
        }
    }

    if let Some(label) = t.loans.first(f.text) {
        if out.category == Category::Transfer || out.category.is_discretionary_spend() {
            out.category = Category::EmiLoan;
            out.transaction_type = TransactionKind::LoanPayment;
            out.merchant = label
                .map(str::to_string)
                .or_else(|| f.extracted.clone())
                .unwrap_or_else(|| "Loan EMI Payment".into());
        }
    }

    if t.has_utility(f.text) && matches!(out.category, Category::Transfer | Category::Fuel) {
        out.category = Category::BillsUtilities;
        let named = t
            .utilities
            .first(f.text)
            .flatten()
            .or_else(|| t.telecom.first(f.text));
        if let Some(name) = named {
            out.merchant = name.to_string();
        } else if f.text.contains("INTERNET") {
            out.merchant = "Internet Service".into();
        } else if is_unknown(&out.merchant) {
            out.merchant = "Utility".into();
        }
    }

    if out.channel == Channel::Upi && out.category == Category::Transfer && is_unknown(&out.merchant) {
        out.merchant = "UPI Transfer".into();
    }

    if is_unknown(&out.merchant) {
        if let Some(name) = &f.extracted {
            out.merchant = name.clone();
        }
    }

    if out.category == Category::Transfer {
        if let Some(category) = t.brand_category(&out.merchant) {
            out.category = category;
        }
    }

    if out.category == Category::Entertainment
        && (t.home_connection.matches(f.text) || t.telecom.any(f.text))
    {
        out.category = Category::BillsUtilities;
        if let Some(brand) = t.telecom.first(f.text) {
            out.merchant = brand.to_string();
        }
    }

    if out.category == Category::Unclassified {
        if let Some(category) = f.extracted.as_deref().and_then(|m| t.brand_category(m)) {
            out.category = category;
        }
    }

    // A cash withdrawal at an ATM outranks every rule above, the ladder included.
    if f.debit > 0.0 && t.is_atm_cash(f.text) && !t.cash_deposit.matches(f.text) {
        out.category = Category::Cash;
        out.merchant = "ATM Withdrawal".into();
        out.transaction_type = TransactionKind::Withdrawal;
        out.channel = Channel::Atm;
    }
}

/// Direction always follows the amounts; the kind is brought in line with it
pub fn settle_direction(f: &Facts<'_>, out: &mut NormalizedTransaction) {
    let direction = if f.debit > 0.0 && f.credit == 0.0 {
        Direction::Debit
    } else if f.credit > 0.0 && f.debit == 0.0 {
        Direction::Credit
    } else if f.tables.medr.matches(f.text) {
        Direction::Debit
    } else {
        out.debit_or_credit
    };
    out.debit_or_credit = direction;
    out.transaction_type = reconcile_kind(out.transaction_type, direction, out.category);
}

/// Keep a kind that agrees with the direction, otherwise pick the plain one
pub fn reconcile_kind(kind: TransactionKind, direction: Direction, category: Category) -> TransactionKind {
    if kind.direction() == direction {
        return kind;
    }
    match (direction, category) {
        (Direction::Debit, Category::Transfer) => TransactionKind::Transfer,
        (Direction::Debit, Category::Cash) => TransactionKind::Withdrawal,
        (direction, _) => TransactionKind::plain(direction),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::RuleTables;
    use bankfusion_core::{ClassificationSource, RawTransaction};
    use rstest::rstest;

    fn normalized(category: Category, merchant: &str) -> NormalizedTransaction {
        NormalizedTransaction {
            merchant: merchant.into(),
            category,
            channel: Channel::Other,
            debit_or_credit: Direction::Debit,
            transaction_type: TransactionKind::Debit,
            confidence: 0.7,
            source: ClassificationSource::Rules,
            rationale: None,
        }
    }

    fn run(text: &str, debit: f64, credit: f64, mut out: NormalizedTransaction) -> NormalizedTransaction {
        let tables = RuleTables::new().unwrap();
        let txn = RawTransaction::from_amounts(1, "01/02/24", text, debit, credit, None).unwrap();
        let upper = text.to_uppercase();
        let facts = Facts::new(&tables, &upper, &txn, out.channel);
        apply(&facts, &mut out);
        settle_direction(&facts, &mut out);
        out
    }

    #[test]
    fn test_atm_overrides_spend() {
        let out = run("ATW-512345-DMART", 2_000.0, 0.0, normalized(Category::Groceries, "DMart"));
        assert_eq!(out.category, Category::Cash);
        assert_eq!(out.channel, Channel::Atm);
        assert_eq!(out.transaction_type, TransactionKind::Withdrawal);
    }

    #[rstest]
    #[case("ATM WDL CASH COLLEGE ROAD", Category::Education, "College")]
    #[case("ATW-512345-SCHOOL LANE BRANCH", Category::Education, "School")]
    #[case("ATM CASH WITHDRAWAL IRCTC COMPLEX", Category::Travel, "IRCTC")]
    fn test_atm_cash_outranks_earlier_rules(
        #[case] text: &str,
        #[case] category: Category,
        #[case] merchant: &str,
    ) {
        let mut n = normalized(category, merchant);
        n.channel = Channel::Atm;
        let out = run(text, 1_000.0, 0.0, n);
        assert_eq!(out.category, Category::Cash);
        assert_eq!(out.channel, Channel::Atm);
        assert_eq!(out.merchant, "ATM Withdrawal");
        assert_eq!(out.transaction_type, TransactionKind::Withdrawal);
    }

    #[test]
    fn test_atm_credit_left_alone() {
        let out = run("ATM CASH REVERSAL", 0.0, 1_000.0, normalized(Category::Transfer, "Unknown"));
        assert_ne!(out.category, Category::Cash);
    }

    #[test]
    fn test_person_name_with_brand_fragment_stays_transfer() {
        let out = run(
            "UPIAB/412345678901/DR/ALICE DSOUZA/SBIN",
            2_000.0,
            0.0,
            normalized(Category::Transfer, "Alice Dsouza"),
        );
        assert_eq!(out.category, Category::Transfer);
        assert_eq!(out.merchant, "Alice Dsouza");
    }

    #[test]
    fn test_loan_beats_shopping() {
        let out = run("AMAZON PERSONAL LOAN EMI", 3_000.0, 0.0, normalized(Category::Shopping, "Amazon"));
        assert_eq!(out.category, Category::EmiLoan);
        assert_eq!(out.merchant, "Personal Loan EMI");
    }

    #[test]
    fn test_transfer_to_brand_recategorized() {
        let out = run("BY TRANSFER 004512", 450.0, 0.0, normalized(Category::Transfer, "Swiggy"));
        assert_eq!(out.category, Category::FoodDining);
    }

    #[test]
    fn test_upi_transfer_placeholder() {
        let mut n = normalized(Category::Transfer, "Unknown");
        n.channel = Channel::Upi;
        let out = run("UPI 1234567", 100.0, 0.0, n);
        assert_eq!(out.merchant, "UPI Transfer");
    }

    #[test]
    fn test_direction_follows_amounts() {
        let mut n = normalized(Category::Transfer, "Ravi");
        n.transaction_type = TransactionKind::Transfer;
        let out = run("NEFT RAVI", 0.0, 900.0, n);
        assert_eq!(out.debit_or_credit, Direction::Credit);
        assert_eq!(out.transaction_type, TransactionKind::Credit);
    }

    #[rstest]
    #[case(TransactionKind::Salary, Direction::Credit, Category::Income, TransactionKind::Salary)]
    #[case(TransactionKind::Refund, Direction::Debit, Category::Transfer, TransactionKind::Transfer)]
    #[case(TransactionKind::Deposit, Direction::Debit, Category::Cash, TransactionKind::Withdrawal)]
    #[case(TransactionKind::UpiPayment, Direction::Credit, Category::Shopping, TransactionKind::Credit)]
    #[case(TransactionKind::Credit, Direction::Debit, Category::Rent, TransactionKind::Debit)]
    fn test_reconcile_kind(
        #[case] kind: TransactionKind,
        #[case] direction: Direction,
        #[case] category: Category,
        #[case] expected: TransactionKind,
    ) {
        assert_eq!(reconcile_kind(kind, direction, category), expected);
    }
}
