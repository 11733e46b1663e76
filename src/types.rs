use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One extracted table row, keyed by normalized header text. Keys vary per
/// filing since headers are discovered at parse time, not fixed.
pub type RawRecord = HashMap<String, String>;

/// Everything extracted from one annual filing, one list per known section.
/// Sections absent from the filing are simply empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilingRecord {
    pub income: Vec<RawRecord>,
    pub assets: Vec<RawRecord>,
    pub transactions: Vec<RawRecord>,
    pub gifts: Vec<RawRecord>,
    pub liabilities: Vec<RawRecord>,
    pub positions: Vec<RawRecord>,
    pub agreements: Vec<RawRecord>,
}

/// A securities transaction in its persisted shape.
///
/// `amount` stays a string: filings report ranges like "$1,001 - $15,000" and
/// normalization only strips symbols, it never collapses the range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalTransaction {
    pub owner: String,
    pub ticker: String,
    pub asset_name: String,
    pub transaction_type: String,
    pub transaction_date: String,
    pub amount: String,
}

impl CanonicalTransaction {
    /// Logical identity used by both the write-path probe and reconciliation.
    pub fn logical_key(&self) -> TransactionKey {
        TransactionKey {
            owner: self.owner.clone(),
            ticker: self.ticker.clone(),
            transaction_type: self.transaction_type.clone(),
            transaction_date: self.transaction_date.clone(),
            amount: self.amount.clone(),
        }
    }
}

/// Dedup key: at most one stored row may exist per distinct key at rest.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TransactionKey {
    pub owner: String,
    pub ticker: String,
    pub transaction_type: String,
    pub transaction_date: String,
    pub amount: String,
}

/// A stored row: canonical transaction plus the store-assigned id.
#[derive(Debug, Clone)]
pub struct StoredTransaction {
    pub id: i64,
    pub transaction: CanonicalTransaction,
}

/// One disclosure entry as returned by the trading APIs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisclosureSummary {
    #[serde(rename = "filerName")]
    pub filer_name: String,
    #[serde(rename = "reportLink")]
    pub report_link: String,
}

impl DisclosureSummary {
    /// Report id from a link shaped ".../view/annual/<report-id>/". Feed
    /// links carry a trailing slash, making the id the second-to-last raw
    /// segment; taking the last non-empty segment reads the same id and also
    /// tolerates links without the trailing slash.
    pub fn report_id(&self) -> Option<&str> {
        self.report_link
            .split('/')
            .filter(|s| !s.is_empty())
            .next_back()
    }
}

/// One page of disclosures from the trading API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisclosureBatch {
    #[serde(default)]
    pub data: Vec<DisclosureSummary>,
    #[serde(rename = "recordsTotal", default)]
    pub records_total: u64,
}

/// Why a raw record did not become a canonical transaction. Rejections are
/// reported and counted, never propagated as errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    UnparseableDate { raw: String },
    MissingFields { fields: Vec<&'static str> },
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rejection::UnparseableDate { raw } => {
                write!(f, "unparseable date: '{raw}'")
            }
            Rejection::MissingFields { fields } => {
                write!(f, "missing fields: {}", fields.join(", "))
            }
        }
    }
}
