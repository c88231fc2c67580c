use super::SheetError;
use async_trait::async_trait;
use std::env;
use std::time::Duration;

/// Fetch seam for the sheet host. The store talks to this trait so tests can
/// substitute canned or failing fetchers.
#[async_trait]
pub trait SheetFetch: Send + Sync {
    async fn fetch_csv(&self, url: &str) -> Result<Vec<u8>, SheetError>;
}

/// HTTP GET against the CSV export endpoint.
pub struct HttpSheetFetcher {
    client: reqwest::Client,
}

impl HttpSheetFetcher {
    pub fn new() -> Result<Self, SheetError> {
        // Minimal production-friendly defaults (env-overridable).
        let timeout_secs = env::var("DAVER_HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(30);

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| SheetError::Network(e.to_string()))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl SheetFetch for HttpSheetFetcher {
    async fn fetch_csv(&self, url: &str) -> Result<Vec<u8>, SheetError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| SheetError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SheetError::Status(status.as_u16()));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| SheetError::Network(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}
