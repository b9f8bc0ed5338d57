use async_trait::async_trait;
use bankfusion_core::{
    AdvisoryError, BankIdentity, Category, Channel, ClassificationSource, Direction,
    NormalizationMethod, RawTransaction, TransactionKind,
};
use bankfusion_normalize::{
    AdvisoryClassifier, AdvisoryRequest, AdvisorySuggestion, FALLBACK_CONFIDENCE, Normalizer,
    RuleTables,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

type Answer = fn(&AdvisoryRequest) -> Result<AdvisorySuggestion, AdvisoryError>;

/// Advisory stand-in with a scripted answer and an optional delay per row
struct Scripted {
    answer: Answer,
    delay: fn(&AdvisoryRequest) -> Duration,
    calls: AtomicUsize,
}

impl Scripted {
    fn new(answer: Answer) -> Self {
        Self {
            answer,
            delay: |_| Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    fn with_delay(mut self, delay: fn(&AdvisoryRequest) -> Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[async_trait]
impl AdvisoryClassifier for Scripted {
    async fn classify(&self, request: &AdvisoryRequest) -> Result<AdvisorySuggestion, AdvisoryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let delay = (self.delay)(request);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        (self.answer)(request)
    }
}

fn advice(merchant: &str, category: &str, channel: &str, direction: &str) -> AdvisorySuggestion {
    AdvisorySuggestion {
        merchant: merchant.into(),
        category: category.into(),
        channel: channel.into(),
        debit_or_credit: direction.into(),
        confidence: 0.9,
        rationale: "scripted".into(),
    }
}

fn debit(sr_no: usize, description: &str, amount: f64) -> RawTransaction {
    RawTransaction::from_amounts(sr_no, "12/01/24", description, amount, 0.0, None).unwrap()
}

fn credit(sr_no: usize, description: &str, amount: f64) -> RawTransaction {
    RawTransaction::from_amounts(sr_no, "12/01/24", description, 0.0, amount, None).unwrap()
}

fn hybrid(stub: Arc<Scripted>) -> Normalizer {
    Normalizer::new(RuleTables::shared().unwrap()).with_advisory(stub)
}

#[tokio::test]
async fn test_atm_line_is_cash_withdrawal() {
    let n = Normalizer::new(RuleTables::shared().unwrap());
    let rows = [RawTransaction::from_amounts(1, "12/01/24", "ATM WDL CASH", 500.0, 0.0, Some(9_500.0)).unwrap()];
    let out = n.normalize_batch(BankIdentity::Sbi, &rows).await.unwrap();

    let entry = &out[0];
    assert_eq!(entry.original.debit, 500.0);
    assert_eq!(entry.bank, BankIdentity::Sbi);
    assert_eq!(entry.normalized.category, Category::Cash);
    assert_eq!(entry.normalized.channel, Channel::Atm);
    assert_eq!(entry.normalized.merchant, "ATM Withdrawal");
    assert_eq!(entry.normalized.transaction_type, TransactionKind::Withdrawal);
}

#[tokio::test]
async fn test_swiggy_never_reaches_advisory() {
    let stub = Arc::new(Scripted::new(|_| Ok(advice("Friend", "Transfer", "UPI", "debit"))));
    let n = hybrid(stub.clone());
    assert_eq!(n.method(), NormalizationMethod::Hybrid);

    let out = n.normalize(&debit(1, "UPI/SWIGGY/1234567890/DR", 350.0)).await.unwrap();
    assert_eq!(out.category, Category::FoodDining);
    assert_eq!(out.merchant, "Swiggy");
    assert_eq!(out.channel, Channel::Upi);
    assert_eq!(out.debit_or_credit, Direction::Debit);
    assert_eq!(stub.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_ladder_overrides_accepted_transfer() {
    let stub = Arc::new(Scripted::new(|_| Ok(advice("HDFC", "Transfer", "UPI", "debit"))));
    let n = hybrid(stub.clone());

    let out = n.normalize(&debit(1, "UPI/LOAN EMI/HDFC0001/998877", 5_000.0)).await.unwrap();
    assert_eq!(stub.calls.load(Ordering::SeqCst), 1);
    assert_eq!(out.category, Category::EmiLoan);
    assert_eq!(out.merchant, "Loan EMI Payment");
    assert_eq!(out.transaction_type, TransactionKind::LoanPayment);
    assert_eq!(out.source, ClassificationSource::Advisory);
}

#[tokio::test]
async fn test_food_brand_wins_over_transfer_advice() {
    let stub = Arc::new(Scripted::new(|_| Ok(advice("Friend", "Transfer", "UPI", "debit"))));
    let n = hybrid(stub);

    let out = n
        .normalize(&debit(1, "UPIAR/412345/DR/ZOMATO LTD /YESB/ZOMATO@YBL", 420.0))
        .await
        .unwrap();
    assert_eq!(out.category, Category::FoodDining);
    assert_eq!(out.merchant, "Zomato");
}

#[tokio::test]
async fn test_advisory_fills_unknown_merchant() {
    let stub = Arc::new(Scripted::new(|_| Ok(advice("Blue Tokai", "Food", "CARD", "debit"))));
    let n = hybrid(stub);

    let out = n
        .normalize(&debit(1, "POS 4111XX1234 BLUE TOKAI COFFEE", 320.0))
        .await
        .unwrap();
    assert_eq!(out.category, Category::FoodDining);
    assert_eq!(out.channel, Channel::Card);
    assert_eq!(out.source, ClassificationSource::Advisory);
    assert_eq!(out.rationale.as_deref(), Some("scripted"));
}

#[tokio::test]
async fn test_contradicting_direction_is_discarded() {
    let stub = Arc::new(Scripted::new(|_| Ok(advice("Acme", "Shopping", "CARD", "debit"))));
    let n = hybrid(stub.clone());

    let out = n.normalize(&credit(1, "BY CLEARING 004512", 5_000.0)).await.unwrap();
    assert_eq!(stub.calls.load(Ordering::SeqCst), 1);
    assert_eq!(out.source, ClassificationSource::Rules);
    assert_eq!(out.debit_or_credit, Direction::Credit);
    assert_ne!(out.category, Category::Shopping);
}

#[tokio::test]
async fn test_timeout_falls_back_to_rules() {
    let stub = Arc::new(
        Scripted::new(|_| Ok(advice("Late", "Food", "CARD", "debit")))
            .with_delay(|_| Duration::from_millis(500)),
    );
    let n = hybrid(stub).with_timeout(Duration::from_millis(20));

    let out = n.normalize(&debit(1, "BY CLEARING 004512", 900.0)).await.unwrap();
    assert_eq!(out.source, ClassificationSource::RulesFallback);
    assert_eq!(out.confidence, FALLBACK_CONFIDENCE);
    assert_eq!(out.rationale.as_deref(), Some("Rule-based fallback"));
}

#[tokio::test]
async fn test_malformed_answer_falls_back() {
    let stub = Arc::new(Scripted::new(|_| Err(AdvisoryError::Malformed("not json".into()))));
    let n = hybrid(stub);

    let out = n.normalize(&debit(1, "BY CLEARING 004512", 900.0)).await.unwrap();
    assert_eq!(out.source, ClassificationSource::RulesFallback);
}

#[tokio::test]
async fn test_unauthorized_aborts_batch() {
    let stub = Arc::new(Scripted::new(|_| {
        Err(AdvisoryError::Unauthorized {
            status: 401,
            message: "invalid_api_key".into(),
        })
    }));
    let n = hybrid(stub);

    let rows = [
        debit(1, "BY CLEARING 004512", 900.0),
        debit(2, "BY CLEARING 004513", 100.0),
    ];
    let err = n.normalize_batch(BankIdentity::Hdfc, &rows).await.unwrap_err();
    assert!(err.is_auth());
}

#[tokio::test]
async fn test_batch_restores_row_order() {
    let stub = Arc::new(
        Scripted::new(|_| Ok(advice("Clearing", "Others", "OTHER", "debit"))).with_delay(|req| {
            // earlier rows answer last
            let last = req.description.chars().last().and_then(|c| c.to_digit(10)).unwrap_or(0);
            Duration::from_millis(u64::from(10 - last) * 15)
        }),
    );
    let n = hybrid(stub.clone()).with_concurrency(5);

    let rows: Vec<RawTransaction> = (1..=5)
        .map(|i| debit(i, &format!("BY CLEARING 00451{i}"), 100.0 * i as f64))
        .collect();
    let out = n.normalize_batch(BankIdentity::Boi, &rows).await.unwrap();

    let order: Vec<usize> = out.iter().map(|e| e.original.sr_no).collect();
    assert_eq!(order, vec![1, 2, 3, 4, 5]);
    assert_eq!(stub.calls.load(Ordering::SeqCst), 5);
    assert!(out.iter().all(|e| e.bank == BankIdentity::Boi));
}
