//! Maps raw transaction records onto the canonical schema.

use crate::normalize::{normalize_amount, normalize_date, normalize_type};
use crate::types::{CanonicalTransaction, RawRecord, Rejection};

// Filings are inconsistent about column naming; accept the long and short
// spellings for the date and type columns.
const DATE_KEYS: [&str; 2] = ["transaction_date", "date"];
const TYPE_KEYS: [&str; 2] = ["transaction_type", "type"];

fn field<'a>(record: &'a RawRecord, keys: &[&str]) -> &'a str {
    keys.iter()
        .find_map(|key| record.get(*key))
        .map(String::as_str)
        .unwrap_or("")
}

/// Builds a canonical transaction from one raw record plus the filer it
/// belongs to. Pure transform: a rejection is a value for the caller to count
/// and report, never an error to propagate.
pub fn build(record: &RawRecord, filer_name: &str) -> Result<CanonicalTransaction, Rejection> {
    let raw_date = field(record, &DATE_KEYS);
    let transaction_date = match normalize_date(raw_date) {
        Some(date) => date,
        None => {
            return Err(Rejection::UnparseableDate {
                raw: raw_date.to_string(),
            })
        }
    };

    let transaction = CanonicalTransaction {
        owner: filer_name.to_string(),
        ticker: field(record, &["ticker"]).to_string(),
        asset_name: field(record, &["asset_name"]).to_string(),
        transaction_type: normalize_type(field(record, &TYPE_KEYS)),
        transaction_date,
        amount: normalize_amount(field(record, &["amount"])),
    };

    // ticker and transaction_type may be empty or unmapped; these may not.
    let mut missing = Vec::new();
    if transaction.transaction_date.is_empty() {
        missing.push("transaction_date");
    }
    if transaction.amount.is_empty() {
        missing.push("amount");
    }
    if transaction.asset_name.is_empty() {
        missing.push("asset_name");
    }
    if transaction.owner.is_empty() {
        missing.push("owner");
    }
    if !missing.is_empty() {
        return Err(Rejection::MissingFields { fields: missing });
    }

    Ok(transaction)
}
