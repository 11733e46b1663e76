use crate::apis::DisclosureSource;
use crate::error::Result;
use crate::types::DisclosureBatch;
use chrono::{Duration, Local};
use serde_json::json;
use tracing::{info, warn};

const TRADING_API_URL: &str = "https://investassist.app/api/senator-trading";
const FILING_URL_BASE: &str = "https://efdsearch.senate.gov/search/view/annual";

const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Senate trading feed: a JSON index of recent disclosures, each pointing at
/// an annual filing served as HTML.
pub struct SenateTradingApi {
    client: reqwest::Client,
    lookback_days: i64,
}

impl SenateTradingApi {
    pub fn new(timeout_seconds: u64, lookback_days: i64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_seconds))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            client,
            lookback_days,
        }
    }
}

#[async_trait::async_trait]
impl DisclosureSource for SenateTradingApi {
    fn source_name(&self) -> &'static str {
        "senate"
    }

    async fn fetch_disclosures(&self, start: u64, length: u64) -> Result<DisclosureBatch> {
        // The API wants an explicit date window, MM/DD/YYYY HH:MM:SS.
        let end_date = Local::now();
        let start_date = end_date - Duration::days(self.lookback_days);
        let body = json!({
            "draw": 1,
            "start": start,
            "length": length,
            "dateStart": start_date.format("%m/%d/%Y %H:%M:%S").to_string(),
            "dateEnd": end_date.format("%m/%d/%Y %H:%M:%S").to_string(),
        });

        info!("Fetching disclosures batch starting at {}", start);
        let batch: DisclosureBatch = self
            .client
            .post(TRADING_API_URL)
            .header("Accept", "application/json")
            .header("User-Agent", USER_AGENT)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(batch)
    }

    async fn fetch_filing(&self, report_id: &str) -> Result<Option<String>> {
        let url = format!("{FILING_URL_BASE}/{report_id}/");

        let response = self
            .client
            .get(&url)
            .header(
                "Accept",
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            )
            .header("Accept-Language", "en-US,en;q=0.9")
            .header("User-Agent", USER_AGENT)
            .send()
            .await?;

        if !response.status().is_success() {
            warn!(
                "Filing request for {} failed with status {}",
                report_id,
                response.status().as_u16()
            );
            return Ok(None);
        }

        Ok(Some(response.text().await?))
    }
}
