//! HTTP Backend Implementation
//!
//! Talks to the hosted lookup service:
//!
//! - `GET {base}/search?username={query}` - run a lookup
//! - `GET {base}/` - reachability probe
//!
//! The client is built without a global timeout; the orchestrator enforces
//! the search deadline by dropping the request future.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;

use super::traits::{LookupBackend, RawResponse};
use crate::config::LookupConfig;
use crate::error::LookupError;
use crate::result::SearchQuery;

const HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

/// HTTP lookup backend
#[derive(Clone, Debug)]
pub struct HttpLookupBackend {
    /// Base URL, always ending in `/`
    base_url: Url,
    /// HTTP client
    http_client: reqwest::Client,
}

impl HttpLookupBackend {
    /// Create a backend for the service at `base_url`
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::Client`] if the URL does not parse or the HTTP
    /// client cannot be built.
    pub fn new(base_url: &str) -> Result<Self, LookupError> {
        let mut url = Url::parse(base_url).map_err(|e| LookupError::Client {
            message: format!("invalid backend URL {base_url:?}: {e}"),
        })?;
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }

        let http_client = reqwest::Client::builder().build()?;

        Ok(Self {
            base_url: url,
            http_client,
        })
    }

    /// Create from the loaded configuration
    ///
    /// # Errors
    ///
    /// See [`HttpLookupBackend::new`].
    pub fn from_config(config: &LookupConfig) -> Result<Self, LookupError> {
        Self::new(&config.backend_url)
    }

    /// Base URL requests are resolved against
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Full search URL for `query`, with the username form-encoded
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::Client`] if the base URL cannot carry a path.
    pub fn search_url(&self, query: &SearchQuery) -> Result<Url, LookupError> {
        let mut url = self.base_url.join("search").map_err(|e| LookupError::Client {
            message: e.to_string(),
        })?;
        url.query_pairs_mut()
            .append_pair("username", query.as_str());
        Ok(url)
    }
}

#[async_trait]
impl LookupBackend for HttpLookupBackend {
    fn name(&self) -> &'static str {
        "HTTP"
    }

    async fn health_check(&self) -> bool {
        self.http_client
            .get(self.base_url.clone())
            .timeout(HEALTH_CHECK_TIMEOUT)
            .send()
            .await
            .is_ok()
    }

    async fn fetch(&self, query: &SearchQuery) -> Result<RawResponse, LookupError> {
        let url = self.search_url(query)?;
        tracing::debug!(url = %url, "Sending lookup request");

        let response = self.http_client.get(url).send().await?;

        let status = response.status();
        let reason = status.canonical_reason().unwrap_or_default().to_string();
        let body = match response.text().await {
            Ok(text) => Some(text),
            Err(e) => {
                tracing::warn!(status = status.as_u16(), error = %e, "Failed to read response body");
                None
            }
        };

        Ok(RawResponse {
            status: status.as_u16(),
            reason,
            body,
        })
    }
}
