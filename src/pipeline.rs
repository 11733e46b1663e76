//! Batch orchestration: trading feed -> filing HTML -> canonical
//! transactions -> deduplicated store.

use crate::apis::DisclosureSource;
use crate::builder;
use crate::dedup::{DedupStore, WriteOutcome};
use crate::error::Result;
use crate::parser;
use crate::types::DisclosureSummary;
use metrics::{counter, histogram};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

/// Result of a complete ingest run over one disclosure feed.
#[derive(Debug, Default, Serialize)]
pub struct PipelineResult {
    pub source_name: String,
    pub disclosures_seen: usize,
    pub disclosures_skipped: usize,
    pub transactions_found: usize,
    pub transactions_saved: usize,
    pub duplicates_skipped: usize,
    pub rejected: usize,
    pub errors: Vec<String>,
}

pub struct Pipeline {
    source: Box<dyn DisclosureSource>,
    dedup: DedupStore,
    batch_length: u64,
    delay_ms: u64,
}

impl Pipeline {
    pub fn new(
        source: Box<dyn DisclosureSource>,
        dedup: DedupStore,
        batch_length: u64,
        delay_ms: u64,
    ) -> Self {
        Self {
            source,
            dedup,
            batch_length,
            delay_ms,
        }
    }

    /// Pages through the disclosure feed and processes each disclosure
    /// fully before advancing to the next. Sequential by design: the only
    /// cross-record state is the feed's page cursor, and the fixed delay is
    /// rate-limiting courtesy to the remote source.
    pub async fn run(&self) -> Result<PipelineResult> {
        let source_name = self.source.source_name().to_string();
        info!("Starting ingest pipeline for {}", source_name);
        println!("🚀 Starting ingest pipeline for {source_name}");
        counter!("fd_pipeline_runs_total", "source" => source_name.clone()).increment(1);
        let t_pipeline = std::time::Instant::now();

        let mut result = PipelineResult {
            source_name: source_name.clone(),
            ..Default::default()
        };

        let mut start = 0u64;
        loop {
            let batch = self.source.fetch_disclosures(start, self.batch_length).await?;
            if batch.data.is_empty() {
                info!("No more disclosures to process");
                break;
            }

            info!("Processing {} disclosures", batch.data.len());
            println!("📡 Processing {} disclosures...", batch.data.len());

            for disclosure in &batch.data {
                self.process_disclosure(disclosure, &mut result).await;
                tokio::time::sleep(std::time::Duration::from_millis(self.delay_ms)).await;
            }

            start += self.batch_length;
            if start >= batch.records_total {
                break;
            }
        }

        let total_secs = t_pipeline.elapsed().as_secs_f64();
        histogram!("fd_pipeline_duration_seconds", "source" => source_name.clone())
            .record(total_secs);
        counter!("fd_transactions_saved_total", "source" => source_name.clone())
            .increment(result.transactions_saved as u64);
        counter!("fd_transactions_rejected_total", "source" => source_name)
            .increment(result.rejected as u64);

        info!(
            "Pipeline finished: {} disclosures, {} transactions saved, {} duplicates, {} rejected",
            result.disclosures_seen,
            result.transactions_saved,
            result.duplicates_skipped,
            result.rejected
        );
        Ok(result)
    }

    /// One disclosure, end to end. Every failure here is contained: a fetch
    /// failure skips the disclosure, a rejection or store error skips the
    /// single record.
    #[instrument(skip(self, disclosure, result), fields(filer = %disclosure.filer_name))]
    async fn process_disclosure(&self, disclosure: &DisclosureSummary, result: &mut PipelineResult) {
        result.disclosures_seen += 1;

        let Some(report_id) = disclosure.report_id() else {
            warn!("Disclosure has no usable report link: {}", disclosure.report_link);
            result.disclosures_skipped += 1;
            return;
        };

        let html = match self.source.fetch_filing(report_id).await {
            Ok(Some(html)) => html,
            Ok(None) => {
                warn!("Failed to fetch disclosure for {}", disclosure.filer_name);
                result.disclosures_skipped += 1;
                return;
            }
            Err(e) => {
                warn!("Fetch error for {}: {}", disclosure.filer_name, e);
                result.disclosures_skipped += 1;
                return;
            }
        };

        let records = parser::parse_transactions(&html);
        if records.is_empty() {
            debug!("No transactions found for {}", disclosure.filer_name);
            return;
        }
        result.transactions_found += records.len();

        for record in &records {
            let transaction = match builder::build(record, &disclosure.filer_name) {
                Ok(transaction) => transaction,
                Err(rejection) => {
                    info!(
                        "Skipping transaction for {}: {}",
                        disclosure.filer_name, rejection
                    );
                    result.rejected += 1;
                    continue;
                }
            };

            match self.dedup.write(&transaction).await {
                Ok(WriteOutcome::Inserted) => {
                    result.transactions_saved += 1;
                    info!(
                        "Saved transaction: {} - {} ({}) - {} - {} on {}",
                        transaction.owner,
                        transaction.asset_name,
                        transaction.ticker,
                        transaction.transaction_type,
                        transaction.amount,
                        transaction.transaction_date
                    );
                }
                Ok(WriteOutcome::SkippedDuplicate) => {
                    result.duplicates_skipped += 1;
                }
                Err(e) => {
                    // Each record is an independent unit of work; keep going.
                    let message =
                        format!("Error saving transaction for {}: {}", transaction.owner, e);
                    warn!("{}", message);
                    result.errors.push(message);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apis::DisclosureSource;
    use crate::error::ScraperError;
    use crate::storage::{InMemoryStore, TransactionStore};
    use crate::types::{CanonicalTransaction, DisclosureBatch, StoredTransaction, TransactionKey};
    use std::sync::Arc;

    const FILING_HTML: &str = r#"
    <html><body>
    <h3>Part 4b. Transactions</h3>
    <table>
        <tr class="header">
            <th>Transaction Date</th><th>Ticker</th><th>Asset Name</th>
            <th>Type</th><th>Amount</th>
        </tr>
        <tr>
            <td>01/15/2023</td><td>ABC</td><td>Example Corp</td>
            <td>Purchase</td><td>$1,001 - $15,000</td>
        </tr>
        <tr>
            <td>not a date</td><td>BAD</td><td>Bad Corp</td>
            <td>Purchase</td><td>$500</td>
        </tr>
    </table>
    </body></html>
    "#;

    struct StubSource;

    #[async_trait::async_trait]
    impl DisclosureSource for StubSource {
        fn source_name(&self) -> &'static str {
            "stub"
        }

        async fn fetch_disclosures(&self, start: u64, _length: u64) -> Result<DisclosureBatch> {
            if start > 0 {
                return Ok(DisclosureBatch {
                    data: Vec::new(),
                    records_total: 2,
                });
            }
            Ok(DisclosureBatch {
                data: vec![
                    DisclosureSummary {
                        filer_name: "Jane Doe".to_string(),
                        report_link: "https://example.test/view/annual/abc-123/".to_string(),
                    },
                    DisclosureSummary {
                        filer_name: "John Roe".to_string(),
                        report_link: "https://example.test/view/annual/missing/".to_string(),
                    },
                ],
                records_total: 2,
            })
        }

        async fn fetch_filing(&self, report_id: &str) -> Result<Option<String>> {
            match report_id {
                "abc-123" => Ok(Some(FILING_HTML.to_string())),
                _ => Ok(None),
            }
        }
    }

    #[tokio::test]
    async fn test_pipeline_end_to_end() {
        let store = Arc::new(InMemoryStore::new());
        let dedup = DedupStore::new(store.clone(), 100);
        let pipeline = Pipeline::new(Box::new(StubSource), dedup, 100, 0);

        let result = pipeline.run().await.unwrap();
        assert_eq!(result.disclosures_seen, 2);
        assert_eq!(result.disclosures_skipped, 1);
        assert_eq!(result.transactions_found, 2);
        assert_eq!(result.transactions_saved, 1);
        assert_eq!(result.rejected, 1);
        assert!(result.errors.is_empty());

        let rows = store.fetch_page(0, 10).await.unwrap();
        assert_eq!(rows.len(), 1);
        let tx = &rows[0].transaction;
        assert_eq!(tx.owner, "Jane Doe");
        assert_eq!(tx.ticker, "ABC");
        assert_eq!(tx.asset_name, "Example Corp");
        assert_eq!(tx.transaction_type, "buy");
        assert_eq!(tx.transaction_date, "2023-01-15");
        assert_eq!(tx.amount, "1001 - 15000");
    }

    /// Two rows that both build cleanly, so failures past the builder are
    /// visible.
    const TWO_ROW_FILING: &str = r#"
    <html><body>
    <h3>Part 4b. Transactions</h3>
    <table>
        <tr class="header">
            <th>Transaction Date</th><th>Ticker</th><th>Asset Name</th>
            <th>Type</th><th>Amount</th>
        </tr>
        <tr>
            <td>01/15/2023</td><td>ABC</td><td>Example Corp</td>
            <td>Purchase</td><td>$1,001 - $15,000</td>
        </tr>
        <tr>
            <td>02/01/2023</td><td>DEF</td><td>Widget Inc</td>
            <td>Sale (Full)</td><td>$500</td>
        </tr>
    </table>
    </body></html>
    "#;

    struct TwoRowSource;

    #[async_trait::async_trait]
    impl DisclosureSource for TwoRowSource {
        fn source_name(&self) -> &'static str {
            "stub"
        }

        async fn fetch_disclosures(&self, _start: u64, _length: u64) -> Result<DisclosureBatch> {
            Ok(DisclosureBatch {
                data: vec![DisclosureSummary {
                    filer_name: "Jane Doe".to_string(),
                    report_link: "https://example.test/view/annual/abc-123/".to_string(),
                }],
                records_total: 1,
            })
        }

        async fn fetch_filing(&self, _report_id: &str) -> Result<Option<String>> {
            Ok(Some(TWO_ROW_FILING.to_string()))
        }
    }

    /// Store that fails inserts for one ticker and otherwise delegates.
    struct InsertFailingStore {
        inner: Arc<InMemoryStore>,
        fail_ticker: &'static str,
    }

    #[async_trait::async_trait]
    impl TransactionStore for InsertFailingStore {
        async fn find_matching(&self, key: &TransactionKey) -> Result<Vec<StoredTransaction>> {
            self.inner.find_matching(key).await
        }

        async fn insert(&self, transaction: &CanonicalTransaction) -> Result<i64> {
            if transaction.ticker == self.fail_ticker {
                return Err(ScraperError::Store {
                    message: "insert refused".to_string(),
                });
            }
            self.inner.insert(transaction).await
        }

        async fn fetch_page(&self, offset: u64, limit: u64) -> Result<Vec<StoredTransaction>> {
            self.inner.fetch_page(offset, limit).await
        }

        async fn delete_by_id(&self, id: i64) -> Result<()> {
            self.inner.delete_by_id(id).await
        }

        async fn update_type_by_id(&self, id: i64, transaction_type: &str) -> Result<()> {
            self.inner.update_type_by_id(id, transaction_type).await
        }
    }

    #[tokio::test]
    async fn test_pipeline_contains_store_failure_to_one_record() {
        let inner = Arc::new(InMemoryStore::new());
        let store = Arc::new(InsertFailingStore {
            inner: inner.clone(),
            fail_ticker: "ABC",
        });
        let dedup = DedupStore::new(store, 100);
        let pipeline = Pipeline::new(Box::new(TwoRowSource), dedup, 100, 0);

        let result = pipeline.run().await.unwrap();

        // The refused insert is reported against the record; the run itself
        // succeeds and the later record still lands.
        assert_eq!(result.transactions_found, 2);
        assert_eq!(result.transactions_saved, 1);
        assert_eq!(result.rejected, 0);
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].contains("insert refused"));

        let rows = inner.fetch_page(0, 10).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].transaction.ticker, "DEF");
    }

    #[tokio::test]
    async fn test_pipeline_rerun_skips_already_ingested() {
        let store = Arc::new(InMemoryStore::new());

        for _ in 0..2 {
            let dedup = DedupStore::new(store.clone(), 100);
            let pipeline = Pipeline::new(Box::new(StubSource), dedup, 100, 0);
            pipeline.run().await.unwrap();
        }

        assert_eq!(store.row_count(), 1);
    }
}
