//! Shared HTTP client for every metadata API and cover download.

use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use kawaii_shared::{AppConfig, EndpointsConfig, KawaiiError, Result};

/// Maximum number of redirects to follow (cover CDNs redirect once or twice).
const MAX_REDIRECTS: usize = 5;

/// One `reqwest::Client` plus the configured API base URLs.
#[derive(Debug, Clone)]
pub struct SourceClient {
    http: Client,
    endpoints: EndpointsConfig,
}

impl SourceClient {
    /// Build a client from the application config.
    pub fn new(config: &AppConfig) -> Result<Self> {
        let http = Client::builder()
            .user_agent(config.defaults.user_agent.as_str())
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .timeout(Duration::from_secs(config.defaults.timeout_secs))
            .build()
            .map_err(|e| KawaiiError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            endpoints: config.endpoints.clone(),
        })
    }

    pub fn endpoints(&self) -> &EndpointsConfig {
        &self.endpoints
    }

    /// `base` + `path` with query parameters appended.
    pub(crate) fn url(&self, base: &str, path: &str, params: &[(&str, &str)]) -> Result<Url> {
        let raw = format!("{}{path}", base.trim_end_matches('/'));
        Url::parse_with_params(&raw, params)
            .map_err(|e| KawaiiError::validation(format!("invalid URL '{raw}': {e}")))
    }

    /// GET `url` and decode the JSON body. Non-2xx statuses are errors.
    pub(crate) async fn get_json<T: DeserializeOwned>(&self, url: &Url) -> Result<T> {
        debug!(%url, "GET");
        let response = self
            .http
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| KawaiiError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(KawaiiError::Network(format!("{url}: HTTP {status}")));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| KawaiiError::parse(format!("{url}: invalid JSON: {e}")))
    }

    /// POST a JSON body to `url` and decode the JSON response.
    pub(crate) async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<T> {
        debug!(%url, "POST");
        let response = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| KawaiiError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(KawaiiError::Network(format!("{url}: HTTP {status}")));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| KawaiiError::parse(format!("{url}: invalid JSON: {e}")))
    }

    /// Download a binary resource (cover art).
    pub async fn download(&self, url: &str) -> Result<Vec<u8>> {
        debug!(%url, "downloading");
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| KawaiiError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(KawaiiError::Network(format!(
                "failed to download image: HTTP {status}"
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| KawaiiError::Network(format!("{url}: failed to read body: {e}")))?;
        Ok(bytes.to_vec())
    }
}
