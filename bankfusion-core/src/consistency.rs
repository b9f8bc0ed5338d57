//! Cross-transaction checks run before a statement is persisted

use crate::bank::BankIdentity;
use crate::error::ValidationError;
use crate::statement::{BankStatement, RawTransaction};
use std::collections::HashMap;
use tracing::warn;

/// Validate the whole statement. Any violation rejects it; nothing is patched.
pub fn validate_statement(statement: &BankStatement) -> Result<(), ValidationError> {
    if statement.account.account_holder.trim().is_empty() {
        return Err(ValidationError::MissingAccountField {
            field: "account_holder",
        });
    }
    if statement.account.account_number.trim().is_empty() {
        return Err(ValidationError::MissingAccountField {
            field: "account_number",
        });
    }

    for entry in &statement.transactions {
        if entry.bank != statement.bank {
            warn!(
                expected = %statement.bank,
                found = %entry.bank,
                sr_no = entry.original.sr_no,
                "bank identity mismatch"
            );
            return Err(ValidationError::MixedBankIdentity {
                expected: statement.bank,
                found: entry.bank,
                sr_no: entry.original.sr_no,
            });
        }
    }

    if statement.bank == BankIdentity::Cbi {
        check_unique_debit_descriptions(statement.transactions.iter().map(|e| &e.original))?;
    }
    Ok(())
}

/// Two debits sharing a description must carry the same amount. A mismatch
/// means descriptions were attached to the wrong rows.
pub fn check_unique_debit_descriptions<'a>(
    rows: impl IntoIterator<Item = &'a RawTransaction>,
) -> Result<(), ValidationError> {
    let mut seen: HashMap<&str, f64> = HashMap::new();
    for row in rows {
        if row.debit <= 0.0 {
            continue;
        }
        let desc = row.description.trim();
        if desc.is_empty() {
            continue;
        }
        match seen.get(desc) {
            Some(&first) if (first - row.debit).abs() > 0.005 => {
                return Err(ValidationError::ConflictingDuplicate {
                    description: desc.to_string(),
                    first,
                    second: row.debit,
                });
            }
            Some(_) => {}
            None => {
                seen.insert(desc, row.debit);
            }
        }
    }
    Ok(())
}
