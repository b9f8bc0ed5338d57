//! Canonical classification vocabulary: category, channel, direction and transaction kind

use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed set of canonical categories assigned by the rule ladder
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Category {
    #[serde(rename = "emi_loan")]
    EmiLoan,
    #[serde(rename = "education")]
    Education,
    #[serde(rename = "travel")]
    Travel,
    #[serde(rename = "cash")]
    Cash,
    #[serde(rename = "fuel")]
    Fuel,
    #[serde(rename = "bills_utilities")]
    BillsUtilities,
    #[serde(rename = "groceries")]
    Groceries,
    #[serde(rename = "food_dining")]
    FoodDining,
    #[serde(rename = "entertainment")]
    Entertainment,
    #[serde(rename = "shopping")]
    Shopping,
    #[serde(rename = "healthcare")]
    Healthcare,
    #[serde(rename = "rent")]
    Rent,
    #[serde(rename = "insurance")]
    Insurance,
    #[serde(rename = "income")]
    Income,
    #[serde(rename = "bank_charges")]
    BankCharges,
    #[serde(rename = "investment")]
    Investment,
    #[serde(rename = "transfer")]
    Transfer,
    #[serde(rename = "interest_income")]
    InterestIncome,
    #[serde(rename = "credit_card_payment")]
    CreditCardPayment,
    /// Sentinel. Never the final answer when any keyword rule matched.
    #[serde(rename = "unclassified")]
    Unclassified,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::EmiLoan => "emi_loan",
            Category::Education => "education",
            Category::Travel => "travel",
            Category::Cash => "cash",
            Category::Fuel => "fuel",
            Category::BillsUtilities => "bills_utilities",
            Category::Groceries => "groceries",
            Category::FoodDining => "food_dining",
            Category::Entertainment => "entertainment",
            Category::Shopping => "shopping",
            Category::Healthcare => "healthcare",
            Category::Rent => "rent",
            Category::Insurance => "insurance",
            Category::Income => "income",
            Category::BankCharges => "bank_charges",
            Category::Investment => "investment",
            Category::Transfer => "transfer",
            Category::InterestIncome => "interest_income",
            Category::CreditCardPayment => "credit_card_payment",
            Category::Unclassified => "unclassified",
        }
    }

    /// Map a free-form label (canonical or advisory vocabulary) onto the closed set.
    pub fn from_label(label: &str) -> Option<Category> {
        let key = label.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        let cat = match key.as_str() {
            "emi_loan" | "emi" | "loan" => Category::EmiLoan,
            "education" => Category::Education,
            "travel" | "transport" => Category::Travel,
            "cash" | "cash_withdrawal" => Category::Cash,
            "fuel" | "petrol" => Category::Fuel,
            "bills_utilities" | "utilities" | "bills" => Category::BillsUtilities,
            "groceries" | "grocery" => Category::Groceries,
            "food_dining" | "food" => Category::FoodDining,
            "entertainment" => Category::Entertainment,
            "shopping" => Category::Shopping,
            "healthcare" | "health" => Category::Healthcare,
            "rent" => Category::Rent,
            "insurance" => Category::Insurance,
            "income" | "salary" => Category::Income,
            "bank_charges" | "charges" => Category::BankCharges,
            "investment" => Category::Investment,
            "transfer" => Category::Transfer,
            "interest_income" | "interest" => Category::InterestIncome,
            "credit_card_payment" => Category::CreditCardPayment,
            "unclassified" | "others" | "other" | "unknown" => Category::Unclassified,
            _ => return None,
        };
        Some(cat)
    }

    /// Spend categories the safety pass may pull back to a stronger intent
    pub fn is_discretionary_spend(&self) -> bool {
        matches!(
            self,
            Category::Shopping
                | Category::FoodDining
                | Category::Groceries
                | Category::Entertainment
                | Category::Travel
                | Category::Healthcare
                | Category::Fuel
                | Category::BillsUtilities
        )
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payment rail. Decided from rail keywords only, never from merchant identity.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Channel {
    Upi,
    Atm,
    Neft,
    Rtgs,
    Imps,
    Card,
    Ach,
    Cash,
    Cheque,
    Online,
    BankTransfer,
    Other,
}

impl Channel {
    pub fn from_label(label: &str) -> Option<Channel> {
        let ch = match label.trim().to_ascii_uppercase().replace([' ', '-'], "_").as_str() {
            "UPI" => Channel::Upi,
            "ATM" => Channel::Atm,
            "NEFT" => Channel::Neft,
            "RTGS" => Channel::Rtgs,
            "IMPS" => Channel::Imps,
            "CARD" | "POS" => Channel::Card,
            "ACH" | "NACH" => Channel::Ach,
            "CASH" => Channel::Cash,
            "CHEQUE" | "CHQ" => Channel::Cheque,
            "ONLINE" => Channel::Online,
            "BANK_TRANSFER" => Channel::BankTransfer,
            "OTHER" => Channel::Other,
            _ => return None,
        };
        Some(ch)
    }

    pub fn is_transfer_rail(&self) -> bool {
        matches!(self, Channel::Upi | Channel::Imps | Channel::Neft | Channel::Rtgs)
    }
}

/// Money direction relative to the account holder
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Debit,
    Credit,
}

impl Direction {
    pub fn from_label(label: &str) -> Option<Direction> {
        match label.trim().to_ascii_lowercase().as_str() {
            "debit" | "dr" => Some(Direction::Debit),
            "credit" | "cr" => Some(Direction::Credit),
            _ => None,
        }
    }
}

/// Semantic transaction kind carried on normalized records
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Withdrawal,
    Purchase,
    UpiPayment,
    BillPayment,
    Emi,
    LoanPayment,
    Transfer,
    Fee,
    Expense,
    Debit,
    Deposit,
    Salary,
    TransferReceived,
    Refund,
    Interest,
    Credit,
}

impl TransactionKind {
    /// The direction this kind implies
    pub fn direction(&self) -> Direction {
        match self {
            TransactionKind::Withdrawal
            | TransactionKind::Purchase
            | TransactionKind::UpiPayment
            | TransactionKind::BillPayment
            | TransactionKind::Emi
            | TransactionKind::LoanPayment
            | TransactionKind::Transfer
            | TransactionKind::Fee
            | TransactionKind::Expense
            | TransactionKind::Debit => Direction::Debit,
            TransactionKind::Deposit
            | TransactionKind::Salary
            | TransactionKind::TransferReceived
            | TransactionKind::Refund
            | TransactionKind::Interest
            | TransactionKind::Credit => Direction::Credit,
        }
    }

    pub fn plain(direction: Direction) -> TransactionKind {
        match direction {
            Direction::Debit => TransactionKind::Debit,
            Direction::Credit => TransactionKind::Credit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Food", Category::FoodDining)]
    #[case("Transport", Category::Travel)]
    #[case("Utilities", Category::BillsUtilities)]
    #[case("Cash Withdrawal", Category::Cash)]
    #[case("Salary", Category::Income)]
    #[case("Bank Charges", Category::BankCharges)]
    #[case("Others", Category::Unclassified)]
    #[case("emi_loan", Category::EmiLoan)]
    fn test_category_labels(#[case] label: &str, #[case] expected: Category) {
        assert_eq!(Category::from_label(label), Some(expected));
    }

    #[test]
    fn test_unknown_category_label() {
        assert_eq!(Category::from_label("crypto"), None);
    }

    #[test]
    fn test_category_serde_matches_as_str() {
        for cat in [Category::FoodDining, Category::CreditCardPayment, Category::Unclassified] {
            let json = serde_json::to_string(&cat).unwrap();
            assert_eq!(json, format!("\"{}\"", cat.as_str()));
        }
    }

    #[test]
    fn test_channel_serde() {
        assert_eq!(serde_json::to_string(&Channel::BankTransfer).unwrap(), "\"BANK_TRANSFER\"");
        assert_eq!(Channel::from_label("pos"), Some(Channel::Card));
    }

    #[test]
    fn test_kind_direction() {
        assert_eq!(TransactionKind::Withdrawal.direction(), Direction::Debit);
        assert_eq!(TransactionKind::TransferReceived.direction(), Direction::Credit);
        assert_eq!(TransactionKind::plain(Direction::Credit), TransactionKind::Credit);
    }
}
