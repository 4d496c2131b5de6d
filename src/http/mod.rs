//! Common HTTP code

use std::time::Duration;

use anyhow::Context as _;
use const_format::formatcp;
use reqwest::{
    IntoUrl, StatusCode, Url,
    header::{HeaderMap, HeaderValue},
};

use crate::{cancel::CancelToken, cl::ApiOptions};

/// User agent sent with every request
pub(crate) const USER_AGENT: &str = formatcp!(
    "{}/{}",
    env!("CARGO_PKG_NAME"),
    env!("CARGO_PKG_VERSION")
);

/// Header carrying the API key
const API_KEY_HEADER: &str = "x-api-key";

/// Error returned when fetching and decoding an API response
#[derive(thiserror::Error, Debug)]
pub enum FetchError {
    /// Request could not be sent or response could not be read
    #[error("HTTP transport error: {0}")]
    Transport(#[source] reqwest::Error),
    /// Request did not complete in time
    #[error("HTTP request timed out: {0}")]
    Timeout(#[source] reqwest::Error),
    /// Server answered with a non success status
    #[error("Unexpected HTTP status {status} for URL {url}")]
    BadStatus {
        /// Requested URL
        url: Url,
        /// Response status
        status: StatusCode,
    },
    /// Response body does not have the expected shape
    #[error("Failed to decode JSON response from {url}: {source}")]
    Decode {
        /// Requested URL
        url: Url,
        /// Decoding error
        #[source]
        source: serde_json::Error,
    },
    /// Cancellation was requested before the response was received
    #[error("Request cancelled")]
    Cancelled,
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err)
        } else {
            Self::Transport(err)
        }
    }
}

/// HTTP interface to the cat API
pub struct ApiHttpClient {
    /// Client
    client: reqwest::Client,
    /// Base URL endpoints are relative to
    base_url: Url,
    /// Timeout for image download
    download_timeout: Duration,
}

impl ApiHttpClient {
    /// Create a new HTTP client
    pub fn new(opts: &ApiOptions) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        if let Some(api_key) = opts.api_key.as_deref().filter(|k| !k.is_empty()) {
            log::debug!("API key is set, using it in requests");
            let mut value = HeaderValue::from_str(api_key).context("Invalid API key")?;
            value.set_sensitive(true);
            headers.insert(API_KEY_HEADER, value);
        }

        let builder = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(opts.timeout())
            .default_headers(headers);
        #[cfg(test)]
        let builder = builder.no_proxy();
        let client = builder.build().context("Failed to create HTTP client")?;

        // Url::join drops the last path segment unless it ends with a slash
        let mut base_url = opts.api_url.clone();
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            client,
            base_url,
            download_timeout: opts.download_timeout(),
        })
    }

    /// Base URL endpoints are relative to
    pub(crate) fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve an endpoint path relative to the API base URL
    #[expect(clippy::unwrap_used)] // base URL is absolute and path is a static relative path
    pub(crate) fn endpoint(&self, path: &str) -> Url {
        self.base_url.join(path).unwrap()
    }

    /// Send a GET request to URL, parse response as JSON
    pub async fn get_json<R>(&self, url: Url, cancel: &CancelToken) -> Result<R, FetchError>
    where
        R: serde::de::DeserializeOwned,
    {
        log::debug!("Sending request for {url}");
        let response = cancel
            .run_until_cancelled(self.client.get(url.clone()).send())
            .await
            .ok_or(FetchError::Cancelled)??;
        log::debug!("Got API response");

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::BadStatus { url, status });
        }

        let data = cancel
            .run_until_cancelled(response.bytes())
            .await
            .ok_or(FetchError::Cancelled)??;
        log::trace!("{}", String::from_utf8_lossy(&data));

        log::debug!("Parsing JSON from response...");
        serde_json::from_slice(&data).map_err(|source| FetchError::Decode { url, source })
    }

    /// Send a GET request for a binary resource, with the download timeout
    ///
    /// The status is not checked, and the body is left unread for the caller to stream.
    pub(crate) async fn get_binary<U>(&self, url: U) -> reqwest::Result<reqwest::Response>
    where
        U: IntoUrl,
    {
        log::debug!("Downloading {}...", url.as_str());
        self.client
            .get(url)
            .timeout(self.download_timeout)
            .send()
            .await
    }
}
