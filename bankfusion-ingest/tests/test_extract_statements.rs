use bankfusion_core::{BankIdentity, Direction, Document, DocumentError, ExtractionError};
use bankfusion_ingest::{StatementExtractor, extract_transactions, layout};

const SBI_STATEMENT: &str = r#"STATE BANK OF INDIA
Account Name    : Mr. RAVI KUMAR SHARMA
Account No      : 12345678901
IFSC Code       : SBIN0001234
Branch          : KORAMANGALA
Statement Period: 01/01/2024 to 31/01/2024

Txn Date    Description              Ref No        Debit       Credit      Balance
12/01/24    ATM WDL CASH             SBIN000123    500.00                  9500.00
            BRANCH KORAMANGALA
15/01/24    SALARY CREDIT                                      45,000.00   54500.00
"#;

const SBI_RIGHT_ALIGNED_STATEMENT: &str = r#"STATE BANK OF INDIA
Account Name    : Mr. RAVI KUMAR SHARMA
Account No      : 12345678901
IFSC Code       : SBIN0001234

Txn Date    Description              Ref No           Debit        Credit       Balance
12/01/24    ATM WDL CASH             SBIN000123   12,500.00                    9,500.00
15/01/24    SALARY CREDIT                                       45,000.00     54,500.00
"#;

const CBI_STATEMENT: &str = r#"CENTRAL BANK OF INDIA
Mrs. ANITA DESAI
STATEMENT OF ACCOUNT
Account Number: 3456789012
01/04/24 01/04/24 TO TRF. 500.00 12,000.00
UPI RRN 412345678901 .
TRF TO RAVI KUMAR
02/04/24 02/04/24 TO TRF. 250.00 11,750.00
TRF TO SWIGGY LIMITED
"#;

#[test]
fn test_sbi_text_statement_end_to_end() {
    let extractor = StatementExtractor::new().unwrap();
    let out = extractor
        .extract(Document::from_text("sbi_jan", SBI_STATEMENT), None)
        .unwrap();

    assert_eq!(out.bank(), BankIdentity::Sbi);
    assert_eq!(out.account.account_holder, "RAVI KUMAR SHARMA");
    assert_eq!(out.account.account_number, "12345678901");
    assert_eq!(out.transactions.len(), 2);

    let atm = &out.transactions[0];
    assert_eq!(atm.sr_no, 1);
    assert_eq!(atm.description, "ATM WDL CASH BRANCH KORAMANGALA");
    assert_eq!(atm.reference, "SBIN000123");
    assert_eq!(atm.debit, 500.0);
    assert_eq!(atm.credit, 0.0);

    let salary = &out.transactions[1];
    assert_eq!(salary.sr_no, 2);
    assert_eq!(salary.transaction_type, Direction::Credit);
    assert_eq!(salary.amount, 45_000.0);
}

#[test]
fn test_sbi_right_aligned_amount_columns() {
    let extractor = StatementExtractor::new().unwrap();
    let out = extractor
        .extract(Document::from_text("sbi_jan", SBI_RIGHT_ALIGNED_STATEMENT), None)
        .unwrap();

    assert_eq!(out.transactions.len(), 2);

    let atm = &out.transactions[0];
    assert_eq!(atm.description, "ATM WDL CASH");
    assert_eq!(atm.debit, 12_500.0);
    assert_eq!(atm.credit, 0.0);
    assert_eq!(atm.balance, Some(9_500.0));

    let salary = &out.transactions[1];
    assert_eq!(salary.description, "SALARY CREDIT");
    assert_eq!(salary.debit, 0.0);
    assert_eq!(salary.credit, 45_000.0);
    assert_eq!(salary.transaction_type, Direction::Credit);
}

#[test]
fn test_aligned_atm_line() {
    let text = "Date      Description   Debit   Balance\n12/01/24  ATM WDL CASH  500.00  9500.00\n";
    let doc = layout::with_layout_tables(Document::from_text("atm", text));
    let txns = extract_transactions(&doc, BankIdentity::Sbi).unwrap();
    assert_eq!(txns.len(), 1);
    assert_eq!(txns[0].date, "12/01/24");
    assert_eq!(txns[0].description, "ATM WDL CASH");
    assert_eq!(txns[0].debit, 500.0);
    assert_eq!(txns[0].balance, Some(9500.0));
    assert_eq!(txns[0].transaction_type, Direction::Debit);
}

#[test]
fn test_reference_digits_never_become_amounts() {
    let json = r#"{
        "name": "hdfc_feb",
        "pages": [{
            "text": "",
            "tables": [{"rows": [
                ["Date", "Narration", "Chq./Ref.No.", "Withdrawal Amt.", "Deposit Amt.", "Closing Balance"],
                ["03/02/24", "UPI-SWIGGY-1234567890", null, "1234567890", null, "9,650.00"],
                ["04/02/24", "UPI-ZOMATO", null, "350.00", null, "9,300.00"]
            ]}]
        }]
    }"#;
    let doc: Document = serde_json::from_str(json).unwrap();
    let txns = extract_transactions(&doc, BankIdentity::Hdfc).unwrap();
    assert_eq!(txns.len(), 1);
    assert_eq!(txns[0].sr_no, 1);
    assert_eq!(txns[0].debit, 350.0);
    for txn in &txns {
        assert!((txn.debit > 0.0) ^ (txn.credit > 0.0));
    }
}

#[test]
fn test_cbi_statement_end_to_end() {
    let extractor = StatementExtractor::new().unwrap();
    let out = extractor
        .extract(Document::from_text("cbi_apr", CBI_STATEMENT), None)
        .unwrap();
    assert_eq!(out.bank(), BankIdentity::Cbi);
    assert_eq!(out.account.account_holder, "ANITA DESAI");
    let descriptions: Vec<_> = out.transactions.iter().map(|t| t.description.as_str()).collect();
    assert_eq!(descriptions, vec!["TRF TO RAVI KUMAR", "TRF TO SWIGGY LIMITED"]);
}

#[test]
fn test_cbi_missing_description_abandons_document() {
    let text = CBI_STATEMENT.replace("TRF TO SWIGGY LIMITED", "UPI RRN 99 .");
    let err = StatementExtractor::new()
        .unwrap()
        .extract(Document::from_text("cbi_bad", &text), None)
        .unwrap_err();
    assert_eq!(err.kind(), "extraction");
    assert!(matches!(
        err,
        DocumentError::Extraction(ExtractionError::MissingDescription { .. })
    ));
}
