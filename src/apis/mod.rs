pub mod house_trading;
pub mod senate_trading;

use crate::error::Result;
use crate::types::DisclosureBatch;

/// A remote feed of disclosures plus the filings they point at.
///
/// Fetch failures for a single filing are data-absence, not errors: a
/// non-success status yields `Ok(None)` and the caller moves on.
#[async_trait::async_trait]
pub trait DisclosureSource: Send + Sync {
    fn source_name(&self) -> &'static str;

    /// One page of the disclosure index.
    async fn fetch_disclosures(&self, start: u64, length: u64) -> Result<DisclosureBatch>;

    /// Raw filing markup for a report id, or `None` when unavailable.
    async fn fetch_filing(&self, report_id: &str) -> Result<Option<String>>;
}
