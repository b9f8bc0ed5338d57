//! The absolute-authority rule ladder.
//!
//! Rules are a fixed, ordered table. The first rule whose predicate holds
//! decides the category and may override merchant, kind, channel and
//! direction. Every suggestion, whether from rules or the advisory service,
//! passes through here before it is final.

use crate::channel::rail_channel;
use crate::merchant::{self, UNKNOWN_MERCHANT};
use crate::rules::{RuleTables, title_case};
use crate::safety;
use bankfusion_core::{
    Category, Channel, Direction, NormalizedTransaction, RawTransaction, TransactionKind,
};
use tracing::debug;

/// What the ladder knows about one row
#[derive(Debug, Clone)]
pub struct Facts<'a> {
    pub tables: &'a RuleTables,
    /// Upper-cased narration
    pub text: &'a str,
    pub debit: f64,
    pub credit: f64,
    /// Merchant read from the narration, before any rule
    pub extracted: Option<String>,
    pub channel: Channel,
}

impl<'a> Facts<'a> {
    pub fn new(tables: &'a RuleTables, text: &'a str, txn: &RawTransaction, channel: Channel) -> Self {
        Self {
            tables,
            text,
            debit: txn.debit,
            credit: txn.credit,
            extracted: merchant::extract_merchant(tables, text),
            channel,
        }
    }

    fn extracted_or(&self, fallback: &str) -> String {
        self.extracted.clone().unwrap_or_else(|| fallback.to_string())
    }

    fn is_debit(&self) -> bool {
        self.debit > 0.0 && self.credit == 0.0
    }
}

/// Overrides produced by the winning rule
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    pub category: Category,
    pub merchant: Option<String>,
    pub kind: Option<TransactionKind>,
    pub channel: Option<Channel>,
    pub direction: Option<Direction>,
}

impl Verdict {
    fn category(category: Category) -> Self {
        Self {
            category,
            merchant: None,
            kind: None,
            channel: None,
            direction: None,
        }
    }

    fn merchant(mut self, merchant: Option<String>) -> Self {
        self.merchant = merchant;
        self
    }

    fn kind(mut self, kind: TransactionKind) -> Self {
        self.kind = Some(kind);
        self
    }

    fn channel(mut self, channel: Channel) -> Self {
        self.channel = Some(channel);
        self
    }

    fn direction(mut self, direction: Direction) -> Self {
        self.direction = Some(direction);
        self
    }
}

pub struct Rule {
    pub priority: u8,
    pub name: &'static str,
    pub applies: fn(&Facts<'_>) -> bool,
    pub effect: fn(&Facts<'_>) -> Verdict,
}

pub const LADDER: &[Rule] = &[
    Rule { priority: 1, name: "emi_loan", applies: is_loan, effect: loan },
    Rule { priority: 2, name: "education", applies: is_education, effect: education },
    Rule { priority: 3, name: "travel_booking", applies: is_travel_booking, effect: travel_booking },
    Rule { priority: 4, name: "atm_withdrawal", applies: is_atm_withdrawal, effect: atm_withdrawal },
    Rule { priority: 4, name: "cash_deposit", applies: is_cash_deposit, effect: cash_deposit },
    Rule { priority: 5, name: "fuel", applies: is_fuel, effect: fuel },
    Rule { priority: 6, name: "bills_utilities", applies: is_utility, effect: utility },
    Rule { priority: 7, name: "groceries", applies: is_groceries, effect: groceries },
    Rule { priority: 8, name: "food_dining", applies: is_food, effect: food },
    Rule { priority: 9, name: "entertainment", applies: is_entertainment, effect: entertainment },
    Rule { priority: 10, name: "shopping", applies: is_shopping, effect: shopping },
    Rule { priority: 11, name: "travel", applies: is_travel, effect: travel },
    Rule { priority: 12, name: "healthcare", applies: is_healthcare, effect: healthcare },
    Rule { priority: 13, name: "rent", applies: is_rent, effect: rent },
    Rule { priority: 14, name: "insurance", applies: is_insurance, effect: insurance },
    Rule { priority: 15, name: "salary", applies: is_salary, effect: salary },
    Rule { priority: 16, name: "p2p_transfer", applies: is_p2p, effect: p2p },
    Rule { priority: 17, name: "interest_income", applies: is_interest, effect: interest },
    Rule { priority: 18, name: "card_bill_desk", applies: is_billdk_card, effect: billdk_card },
    Rule { priority: 19, name: "credit_card_payment", applies: is_card_payment, effect: card_payment },
];

/// First rule that applies, with its verdict
pub fn evaluate(facts: &Facts<'_>) -> Option<(&'static Rule, Verdict)> {
    LADDER
        .iter()
        .find(|rule| (rule.applies)(facts))
        .map(|rule| (rule, (rule.effect)(facts)))
}

/// Run the ladder and the safety pass over a suggestion
pub fn finalize(
    tables: &RuleTables,
    txn: &RawTransaction,
    suggestion: NormalizedTransaction,
) -> NormalizedTransaction {
    let text = txn.description.to_uppercase();
    let channel = rail_channel(tables, &text).unwrap_or(suggestion.channel);
    let facts = Facts::new(tables, &text, txn, channel);

    let mut out = suggestion;
    out.channel = channel;
    if let Some(name) = &facts.extracted {
        out.merchant = name.clone();
    }

    if let Some((rule, verdict)) = evaluate(&facts) {
        debug!(sr_no = txn.sr_no, rule = rule.name, category = %verdict.category, "ladder matched");
        out.category = verdict.category;
        if let Some(merchant) = verdict.merchant {
            out.merchant = merchant;
        }
        if let Some(kind) = verdict.kind {
            out.transaction_type = kind;
        }
        if let Some(channel) = verdict.channel {
            out.channel = channel;
        }
        if let Some(direction) = verdict.direction {
            out.debit_or_credit = direction;
        }
    }

    safety::apply(&facts, &mut out);
    safety::settle_direction(&facts, &mut out);
    out
}

fn is_loan(f: &Facts<'_>) -> bool {
    f.tables.loans.any(f.text)
}

fn loan(f: &Facts<'_>) -> Verdict {
    let merchant = match f.tables.loans.first(f.text).flatten() {
        Some(label) => label.to_string(),
        None => f.extracted_or("Loan EMI Payment"),
    };
    Verdict::category(Category::EmiLoan)
        .merchant(Some(merchant))
        .kind(TransactionKind::LoanPayment)
}

fn is_education(f: &Facts<'_>) -> bool {
    f.tables.education.any(f.text)
}

fn education(f: &Facts<'_>) -> Verdict {
    let merchant = match f.tables.education.first(f.text).flatten() {
        Some(label) => label.to_string(),
        None => f.extracted_or("Education"),
    };
    Verdict::category(Category::Education)
        .merchant(Some(merchant))
        .kind(TransactionKind::Expense)
}

fn is_travel_booking(f: &Facts<'_>) -> bool {
    f.tables.travel_booking.any(f.text)
}

fn travel_booking(f: &Facts<'_>) -> Verdict {
    let merchant = f.tables.travel_booking.first(f.text).map(str::to_string);
    Verdict::category(Category::Travel)
        .merchant(merchant)
        .kind(TransactionKind::Expense)
}

fn is_atm_withdrawal(f: &Facts<'_>) -> bool {
    f.tables.is_atm(f.text) && !f.tables.cash_deposit.matches(f.text)
}

fn atm_withdrawal(_: &Facts<'_>) -> Verdict {
    Verdict::category(Category::Cash)
        .merchant(Some("ATM Withdrawal".into()))
        .kind(TransactionKind::Withdrawal)
        .channel(Channel::Atm)
        .direction(Direction::Debit)
}

fn is_cash_deposit(f: &Facts<'_>) -> bool {
    f.tables.cash_deposit.matches(f.text)
}

fn cash_deposit(_: &Facts<'_>) -> Verdict {
    Verdict::category(Category::Cash)
        .merchant(Some("Cash Deposit".into()))
        .kind(TransactionKind::Deposit)
        .channel(Channel::Cash)
        .direction(Direction::Credit)
}

fn is_fuel(f: &Facts<'_>) -> bool {
    let t = f.tables;
    if t.utility_payment.matches(f.text) {
        return false;
    }
    t.fuel.matches(f.text) || (t.petrol.matches(f.text) && !t.gas.matches(f.text))
}

fn fuel(f: &Facts<'_>) -> Verdict {
    Verdict::category(Category::Fuel).merchant(f.extracted.clone())
}

fn is_utility(f: &Facts<'_>) -> bool {
    f.tables.has_utility(f.text)
}

fn utility(f: &Facts<'_>) -> Verdict {
    let t = f.tables;
    let merchant = t
        .telecom_with_service(f.text)
        .or_else(|| t.utilities.first(f.text).flatten())
        .map(str::to_string)
        .or_else(|| f.extracted.clone());
    Verdict::category(Category::BillsUtilities).merchant(merchant)
}

fn is_groceries(f: &Facts<'_>) -> bool {
    let t = f.tables;
    t.groceries.matches(f.text)
        && !t.telecom.any(f.text)
        && !t.fuel_words.matches(f.text)
        && !t.has_utility(f.text)
}

fn groceries(f: &Facts<'_>) -> Verdict {
    Verdict::category(Category::Groceries).merchant(f.extracted.clone())
}

fn is_food(f: &Facts<'_>) -> bool {
    f.tables.food.matches(f.text)
}

fn food(f: &Facts<'_>) -> Verdict {
    Verdict::category(Category::FoodDining).merchant(f.extracted.clone())
}

fn is_entertainment(f: &Facts<'_>) -> bool {
    f.tables.entertainment.matches(f.text)
}

fn entertainment(f: &Facts<'_>) -> Verdict {
    Verdict::category(Category::Entertainment).merchant(f.extracted.clone())
}

fn is_shopping(f: &Facts<'_>) -> bool {
    f.tables.shopping.matches(f.text)
}

fn shopping(f: &Facts<'_>) -> Verdict {
    let merchant = if f.tables.ajio.matches(f.text) {
        Some("AJIO".to_string())
    } else {
        f.extracted.clone()
    };
    Verdict::category(Category::Shopping).merchant(merchant)
}

fn is_travel(f: &Facts<'_>) -> bool {
    f.tables.travel.matches(f.text)
}

fn travel(f: &Facts<'_>) -> Verdict {
    let merchant = if f.tables.toll.matches(f.text) {
        Some("Fastag".to_string())
    } else {
        f.extracted.clone()
    };
    Verdict::category(Category::Travel).merchant(merchant)
}

fn is_healthcare(f: &Facts<'_>) -> bool {
    f.tables.healthcare.matches(f.text)
}

fn healthcare(f: &Facts<'_>) -> Verdict {
    Verdict::category(Category::Healthcare).merchant(f.extracted.clone())
}

fn is_rent(f: &Facts<'_>) -> bool {
    f.tables.rent.matches(f.text)
}

fn rent(f: &Facts<'_>) -> Verdict {
    Verdict::category(Category::Rent).merchant(Some(f.extracted_or("Rent Payment")))
}

fn is_insurance(f: &Facts<'_>) -> bool {
    f.tables.insurance.any(f.text)
}

fn insurance(f: &Facts<'_>) -> Verdict {
    let t = f.tables;
    let merchant = match t.insurance.first(f.text).flatten() {
        Some(label) => label.to_string(),
        None => t
            .insurer
            .captures(f.text)
            .and_then(|c| c.get(1))
            .map(|m| format!("{} Insurance", title_case(m.as_str())))
            .unwrap_or_else(|| f.extracted_or("LIC")),
    };
    Verdict::category(Category::Insurance).merchant(Some(merchant))
}

fn is_salary(f: &Facts<'_>) -> bool {
    f.tables.salary.matches(f.text)
        && !merchant::is_person_credit(f.tables, f.text, f.debit, f.credit)
}

fn salary(f: &Facts<'_>) -> Verdict {
    if f.is_debit() {
        return Verdict::category(Category::BankCharges)
            .merchant(Some("Bank".into()))
            .kind(TransactionKind::Debit)
            .direction(Direction::Debit);
    }
    Verdict::category(Category::Income)
        .merchant(Some(employer(f)))
        .kind(TransactionKind::Salary)
        .direction(Direction::Credit)
}

fn employer(f: &Facts<'_>) -> String {
    let t = f.tables;
    let prefix = t
        .employer_prefix
        .captures(f.text)
        .and_then(|c| c.get(1))
        .map(|m| t.employer_noise.replace_all(m.as_str(), " "))
        .map(|name| name.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|name| name.len() > 2);
    match prefix {
        Some(name) => title_case(&name),
        None => t
            .employer_in(f.text)
            .map(title_case)
            .unwrap_or_else(|| "Salary".to_string()),
    }
}

fn is_p2p(f: &Facts<'_>) -> bool {
    let t = f.tables;
    let blocked = t.loans.any(f.text) || t.education.any(f.text) || t.travel_booking.any(f.text);
    let rail = t.transfer_rails.matches(f.text) || f.channel.is_transfer_rail();
    let branded = t.brand_in(f.text).is_some()
        || f.extracted.as_deref().is_some_and(|m| t.names_brand(m));
    !blocked && rail && !branded
}

fn p2p(f: &Facts<'_>) -> Verdict {
    let merchant = merchant::person_name(f.tables, f.text)
        .or_else(|| f.extracted.clone())
        .unwrap_or_else(|| "Transfer".to_string());
    let verdict = Verdict::category(Category::Transfer).merchant(Some(merchant));
    if f.debit > 0.0 {
        verdict.kind(TransactionKind::Transfer).direction(Direction::Debit)
    } else {
        verdict
            .kind(TransactionKind::TransferReceived)
            .direction(Direction::Credit)
    }
}

fn is_interest(f: &Facts<'_>) -> bool {
    f.tables.interest.matches(f.text)
}

fn interest(_: &Facts<'_>) -> Verdict {
    Verdict::category(Category::InterestIncome)
        .kind(TransactionKind::Interest)
        .direction(Direction::Credit)
}

fn is_billdk_card(f: &Facts<'_>) -> bool {
    f.tables.billdk.matches(f.text) && f.tables.cards.matches(f.text)
}

fn billdk_card(f: &Facts<'_>) -> Verdict {
    let merchant = match f.tables.card_banks.captures(f.text).and_then(|c| c.get(1)) {
        Some(bank) => format!("{} Credit Card", bank.as_str()),
        None => "Credit Card".to_string(),
    };
    Verdict::category(Category::CreditCardPayment).merchant(Some(merchant))
}

fn is_card_payment(f: &Facts<'_>) -> bool {
    f.tables.card_payment.matches(f.text)
}

fn card_payment(_: &Facts<'_>) -> Verdict {
    Verdict::category(Category::CreditCardPayment)
}

/// True when the merchant is still the unknown placeholder
pub(crate) fn is_unknown(merchant: &str) -> bool {
    merchant.is_empty() || merchant == UNKNOWN_MERCHANT
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::suggest::suggest;
    use bankfusion_core::ClassificationSource;
    use rstest::rstest;

    fn debit(description: &str, amount: f64) -> RawTransaction {
        RawTransaction::from_amounts(1, "12/01/24", description, amount, 0.0, None).unwrap()
    }

    fn credit(description: &str, amount: f64) -> RawTransaction {
        RawTransaction::from_amounts(1, "12/01/24", description, 0.0, amount, None).unwrap()
    }

    fn run(txn: &RawTransaction) -> NormalizedTransaction {
        let tables = RuleTables::new().unwrap();
        let suggestion = suggest(&tables, txn);
        finalize(&tables, txn, suggestion)
    }

    #[test]
    fn test_ladder_is_ordered() {
        assert!(LADDER.windows(2).all(|w| w[0].priority <= w[1].priority));
    }

    #[test]
    fn test_swiggy_upi_debit() {
        let out = run(&debit("UPI/SWIGGY/1234567890/DR", 350.0));
        assert_eq!(out.category, Category::FoodDining);
        assert_eq!(out.merchant, "Swiggy");
        assert_eq!(out.channel, Channel::Upi);
        assert_eq!(out.debit_or_credit, Direction::Debit);
    }

    #[test]
    fn test_atm_withdrawal() {
        let out = run(&debit("ATM WDL CASH", 500.0));
        assert_eq!(out.category, Category::Cash);
        assert_eq!(out.channel, Channel::Atm);
        assert_eq!(out.merchant, "ATM Withdrawal");
        assert_eq!(out.transaction_type, TransactionKind::Withdrawal);
        assert_eq!(out.debit_or_credit, Direction::Debit);
    }

    #[rstest]
    #[case("UPI/LOAN EMI/HDFC0001/998877", "Loan EMI Payment")]
    #[case("UPI-HOME LOAN EMI-412345", "Home Loan EMI")]
    #[case("UPIAR/412345/DR/EMI PAYMENT /HDFC/EMI@HDFC", "EMI Payment")]
    fn test_emi_over_upi_is_never_transfer(#[case] text: &str, #[case] merchant: &str) {
        let out = run(&debit(text, 5_000.0));
        assert_eq!(out.category, Category::EmiLoan);
        assert_eq!(out.merchant, merchant);
        assert_eq!(out.transaction_type, TransactionKind::LoanPayment);
        assert_eq!(out.channel, Channel::Upi);
    }

    #[test]
    fn test_food_brand_beats_transfer_suggestion() {
        let tables = RuleTables::new().unwrap();
        let txn = debit("UPIAR/412345/DR/ZOMATO LTD /YESB/ZOMATO@YBL", 420.0);
        let advised = NormalizedTransaction {
            merchant: "Friend".into(),
            category: Category::Transfer,
            channel: Channel::Upi,
            debit_or_credit: Direction::Debit,
            transaction_type: TransactionKind::Transfer,
            confidence: 0.9,
            source: ClassificationSource::Advisory,
            rationale: Some("looks like a transfer".into()),
        };
        let out = finalize(&tables, &txn, advised);
        assert_eq!(out.category, Category::FoodDining);
        assert_eq!(out.merchant, "Zomato");
        assert_eq!(out.source, ClassificationSource::Advisory);
    }

    #[test]
    fn test_person_transfer() {
        let out = run(&debit("UPIAB/998877/DR/KAVITA NAIR /HDFC/KAVITA@OKHDFC", 1_500.0));
        assert_eq!(out.category, Category::Transfer);
        assert_eq!(out.merchant, "Kavita Nair");
        assert_eq!(out.transaction_type, TransactionKind::Transfer);

        let out = run(&credit("UPIAB/998877/CR/KAVITA NAIR /HDFC/KAVITA@OKHDFC", 1_500.0));
        assert_eq!(out.transaction_type, TransactionKind::TransferReceived);
        assert_eq!(out.debit_or_credit, Direction::Credit);
    }

    #[rstest]
    #[case("ATM WDL CASH COLLEGE ROAD")]
    #[case("ATW-512345-SCHOOL LANE BRANCH")]
    fn test_atm_cash_beats_education(#[case] text: &str) {
        let out = run(&debit(text, 2_000.0));
        assert_eq!(out.category, Category::Cash);
        assert_eq!(out.channel, Channel::Atm);
        assert_eq!(out.merchant, "ATM Withdrawal");
        assert_eq!(out.transaction_type, TransactionKind::Withdrawal);
    }

    #[test]
    fn test_person_named_alice_is_not_insurance() {
        let out = run(&debit("UPIAB/412345678901/DR/ALICE DSOUZA/SBIN", 2_000.0));
        assert_eq!(out.merchant, "Alice Dsouza");
        assert_eq!(out.category, Category::Transfer);
    }

    #[test]
    fn test_salary_credit_names_employer() {
        let out = run(&credit("NEFT ACME CORP SALARY", 85_000.0));
        assert_eq!(out.category, Category::Income);
        assert_eq!(out.merchant, "Acme Corp");
        assert_eq!(out.transaction_type, TransactionKind::Salary);

        let out = run(&credit("SALARY CREDIT", 45_000.0));
        assert_eq!(out.merchant, "Salary");
    }

    #[test]
    fn test_salary_debit_is_bank_charge() {
        let out = run(&debit("SALARY ACCOUNT CHARGES", 118.0));
        assert_eq!(out.category, Category::BankCharges);
        assert_eq!(out.merchant, "Bank");
    }

    #[rstest]
    #[case("BILLPAY MSEDCL ELECTRICITY", Category::BillsUtilities, "MSEDCL")]
    #[case("AIRTEL BROADBAND BILL", Category::BillsUtilities, "Airtel")]
    #[case("HP PETROL PUMP BANER", Category::Fuel, "Petrol Pump")]
    #[case("IRCTC E TICKET", Category::Travel, "IRCTC")]
    #[case("FASTAG RECHARGE PAYTM", Category::Travel, "Fastag")]
    #[case("AJIO ONLINE ORDER", Category::Shopping, "AJIO")]
    #[case("HOUSE RENT JAN", Category::Rent, "Rent Payment")]
    #[case("STAR HEALTH INSURANCE PREMIUM", Category::Insurance, "Star Insurance")]
    #[case("BILLDK HDFC CARDS 4111", Category::CreditCardPayment, "HDFC Credit Card")]
    #[case("SCHOOL FEES TERM 2", Category::Education, "School Fees")]
    fn test_priority_rules(#[case] text: &str, #[case] category: Category, #[case] merchant: &str) {
        let out = run(&debit(text, 1_000.0));
        assert_eq!(out.category, category);
        assert_eq!(out.merchant, merchant);
    }

    #[test]
    fn test_interest_is_credit() {
        let out = run(&credit("CREDIT INTEREST", 212.0));
        assert_eq!(out.category, Category::InterestIncome);
        assert_eq!(out.transaction_type, TransactionKind::Interest);
        assert_eq!(out.debit_or_credit, Direction::Credit);
    }
}
