use std::time::Duration;

use reqwest::Client as HttpClient;
use tracing::debug;

use super::models::{FetchError, Point, ResponseBody};

/// Client for the aggregator's data endpoint
pub struct AggregatorClient {
    http_client: HttpClient,
    base_url: String,
    endpoint: String,
}

impl AggregatorClient {
    pub const DEFAULT_BASE_URL: &'static str = "http://127.0.0.1:8080";
    pub const DEFAULT_ENDPOINT: &'static str = "/api";

    /// Create a client for `{base_url}{endpoint}` with no request timeout
    pub fn new(base_url: String, endpoint: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            base_url,
            endpoint,
        }
    }

    /// Create a client whose requests give up after `timeout`
    pub fn with_timeout(
        base_url: String,
        endpoint: String,
        timeout: Duration,
    ) -> Result<Self, FetchError> {
        let http_client = HttpClient::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url,
            endpoint,
        })
    }

    /// Full URL polled by this client
    pub fn url(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        if self.endpoint.starts_with('/') {
            format!("{}{}", base, self.endpoint)
        } else {
            format!("{}/{}", base, self.endpoint)
        }
    }

    /// GET the endpoint and return its points in payload order.
    ///
    /// A non-success status is not an error by itself: the body is still
    /// parsed and must carry `"message": "ok"`.
    pub async fn fetch_points(&self) -> Result<Vec<Point>, FetchError> {
        let url = self.url();

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| FetchError::Network(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            debug!("{} answered with status {}", url, status);
        }

        let body_text = response
            .text()
            .await
            .map_err(|e| FetchError::Network(format!("Failed to read body: {}", e)))?;

        let body: ResponseBody = serde_json::from_str(&body_text)
            .map_err(|e| FetchError::Parse(format!("Failed to parse response: {}", e)))?;

        body.into_points()
    }
}
