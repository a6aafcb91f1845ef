//! Thin asynchronous client for the scan/prewarm service API.
//!
//! - `GET api/scan` runs one route scan with the full parameter set.
//! - `GET api/prewarm/status` reports per-system cache timestamps.

use reqwest::{Client, Url};
use thiserror::Error;

use crate::config::ScanParams;
use crate::domain::{PrewarmStatusPayload, ScanPayload};

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000/";
const USER_AGENT: &str = "trade-route-scanner/1.0.0";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("http request error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("malformed payload: {0}")]
    Malformed(#[from] serde_json::Error),
}

#[derive(Clone)]
pub struct ScanApiClient {
    http: Client,
    base_url: Url,
}

impl ScanApiClient {
    pub fn new() -> Result<Self, ApiError> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base: &str) -> Result<Self, ApiError> {
        let base_url = Url::parse(base)?;
        let http = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self { http, base_url })
    }

    /// Run one scan. The body is read as text and parsed separately so a
    /// garbage payload surfaces as [`ApiError::Malformed`], not as a
    /// transport error.
    pub async fn scan(&self, params: &ScanParams) -> Result<ScanPayload, ApiError> {
        let url = scan_url(&self.base_url, params)?;
        tracing::debug!(%url, "requesting scan");
        let body = self
            .http
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Fetch prewarm status. An empty `systems` slice asks the service for
    /// its default set.
    pub async fn prewarm_status(
        &self,
        systems: &[String],
    ) -> Result<PrewarmStatusPayload, ApiError> {
        let url = status_url(&self.base_url, systems)?;
        tracing::debug!(%url, "requesting prewarm status");
        let body = self
            .http
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(serde_json::from_str(&body)?)
    }
}

fn scan_url(base: &Url, params: &ScanParams) -> Result<Url, url::ParseError> {
    let mut url = base.join("api/scan")?;
    url.query_pairs_mut()
        .append_pair("start_system", &params.start_system)
        .append_pair("budget", &params.budget.to_string())
        .append_pair("max_jumps", &params.max_jumps.to_string())
        .append_pair("min_security", &params.min_security.to_string())
        .append_pair("min_margin_pct", &params.min_margin_pct.to_string())
        .append_pair("sample_size", &params.sample_size.to_string())
        .append_pair("order_pages", &params.order_pages.to_string())
        .append_pair("mode", params.mode.as_query())
        .append_pair("limit", &params.limit.to_string());
    Ok(url)
}

fn status_url(base: &Url, systems: &[String]) -> Result<Url, url::ParseError> {
    let mut url = base.join("api/prewarm/status")?;
    if !systems.is_empty() {
        url.query_pairs_mut()
            .append_pair("systems", &systems.join(","));
    }
    Ok(url)
}
