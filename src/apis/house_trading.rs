use crate::apis::DisclosureSource;
use crate::error::Result;
use crate::types::DisclosureBatch;
use chrono::Datelike;
use serde_json::json;
use tracing::info;

const TRADING_API_URL: &str = "https://investassist.app/api/house-rep-trading";
const FILING_URL_BASE: &str = "https://efdsearch.senate.gov/search/view/annual";

/// House trading feed. Unlike the senate feed it is keyed by filing year and
/// returns the whole year in one response, so only the first page is real.
pub struct HouseTradingApi {
    client: reqwest::Client,
}

impl HouseTradingApi {
    pub fn new(timeout_seconds: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_seconds))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { client }
    }
}

#[async_trait::async_trait]
impl DisclosureSource for HouseTradingApi {
    fn source_name(&self) -> &'static str {
        "house"
    }

    async fn fetch_disclosures(&self, start: u64, _length: u64) -> Result<DisclosureBatch> {
        if start > 0 {
            // Single-shot feed; any later page is empty by construction.
            return Ok(DisclosureBatch {
                data: Vec::new(),
                records_total: 0,
            });
        }

        let current_year = chrono::Local::now().year();
        let body = json!({ "filingYear": current_year.to_string() });

        info!("Fetching house disclosures for filing year {}", current_year);
        let batch: DisclosureBatch = self
            .client
            .post(TRADING_API_URL)
            .header("Accept", "application/json")
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
        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Ok(None);
        }
        Ok(Some(response.text().await?))
    }
}
