//! Idempotent write path and offline duplicate reconciliation.
//!
//! Both paths key rows by the full logical identity `(owner, ticker,
//! transaction_type, transaction_date, amount)`. The write path enforces it
//! prospectively with an existence probe; `reconcile` enforces it
//! retrospectively over the whole table.

use crate::error::Result;
use crate::storage::TransactionStore;
use crate::types::{CanonicalTransaction, TransactionKey};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Exact legacy type spellings rewritten by the fix-types pass.
fn canonical_type_for(current: &str) -> Option<&'static str> {
    match current {
        "Sale (Full)" | "Sale (Partial)" | "Sale" => Some("sell"),
        "Purchase" | "Buy" => Some("buy"),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Inserted,
    SkippedDuplicate,
}

#[derive(Debug, Default)]
pub struct ReconcileReport {
    pub rows_scanned: usize,
    pub duplicate_groups: usize,
    pub rows_removed: usize,
}

#[derive(Debug, Default)]
pub struct FixTypesReport {
    pub rows_scanned: usize,
    pub rows_updated: usize,
}

/// Deduplicating facade over the transaction store.
pub struct DedupStore {
    store: Arc<dyn TransactionStore>,
    page_size: u64,
}

impl DedupStore {
    pub fn new(store: Arc<dyn TransactionStore>, page_size: u64) -> Self {
        Self { store, page_size }
    }

    /// Inserts unless a row with the same logical key already exists. The
    /// probe-then-insert makes repeated runs over already-ingested filings
    /// no-ops; a single-writer process is assumed.
    pub async fn write(&self, transaction: &CanonicalTransaction) -> Result<WriteOutcome> {
        let key = transaction.logical_key();
        let existing = self.store.find_matching(&key).await?;

        if !existing.is_empty() {
            debug!(
                "Skipping duplicate transaction for {} - {}",
                transaction.owner, transaction.ticker
            );
            return Ok(WriteOutcome::SkippedDuplicate);
        }

        self.store.insert(transaction).await?;
        Ok(WriteOutcome::Inserted)
    }

    /// Pages through the whole table, groups row ids by logical key in
    /// returned order, and deletes every id after the first of each group.
    ///
    /// A delete failure aborts the remaining deletions of this invocation;
    /// re-running is safe since removed duplicates no longer group.
    pub async fn reconcile(&self) -> Result<ReconcileReport> {
        info!("Finding duplicate transactions...");

        let mut groups: HashMap<TransactionKey, Vec<i64>> = HashMap::new();
        let mut offset = 0u64;
        let mut rows_scanned = 0usize;

        loop {
            let page = self.store.fetch_page(offset, self.page_size).await?;
            if page.is_empty() {
                break;
            }
            rows_scanned += page.len();
            for row in &page {
                groups
                    .entry(row.transaction.logical_key())
                    .or_default()
                    .push(row.id);
            }
            offset += self.page_size;
        }

        let duplicates: Vec<&Vec<i64>> = groups.values().filter(|ids| ids.len() > 1).collect();
        info!("Found {} sets of duplicate transactions", duplicates.len());

        let mut report = ReconcileReport {
            rows_scanned,
            duplicate_groups: duplicates.len(),
            rows_removed: 0,
        };

        for ids in duplicates {
            // First-seen-by-storage-order survives.
            for id in &ids[1..] {
                self.store.delete_by_id(*id).await?;
                report.rows_removed += 1;
                if report.rows_removed % 100 == 0 {
                    info!("Removed {} duplicate transactions so far...", report.rows_removed);
                }
            }
        }

        info!("Total duplicate transactions removed: {}", report.rows_removed);
        Ok(report)
    }

    /// Maintenance pass: report the distinct transaction types present, then
    /// rewrite legacy spellings onto the canonical buy/sell values.
    pub async fn fix_types(&self) -> Result<FixTypesReport> {
        info!("Analyzing transaction types...");

        let mut report = FixTypesReport::default();
        let mut distinct: Vec<String> = Vec::new();
        let mut offset = 0u64;

        loop {
            let page = self.store.fetch_page(offset, self.page_size).await?;
            if page.is_empty() {
                break;
            }

            for row in &page {
                report.rows_scanned += 1;
                let current = &row.transaction.transaction_type;
                if !distinct.contains(current) {
                    distinct.push(current.clone());
                }
                if let Some(canonical) = canonical_type_for(current) {
                    self.store.update_type_by_id(row.id, canonical).await?;
                    report.rows_updated += 1;
                    if report.rows_updated % 100 == 0 {
                        info!("Updated {} transactions so far...", report.rows_updated);
                    }
                }
            }
            offset += self.page_size;
        }

        distinct.sort();
        info!("Found transaction types: {}", distinct.join(", "));
        info!("Total transactions updated: {}", report.rows_updated);
        Ok(report)
    }
}
