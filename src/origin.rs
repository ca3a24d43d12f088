//! Origin HTTP client.
//!
//! [`OriginClient`] performs GET and POST against the single configured
//! upstream host. GETs feed the cache fill; POSTs are a pure pass-through
//! and never touch the store. One pooled `reqwest::Client` backs all
//! calls.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use metrics::counter;
use tracing::debug;

use crate::cache::CachePath;
use crate::{Error, Result, telemetry};

/// How the cache resolver sees the upstream: one fetch per path.
///
/// A trait seam so tests can count and gate fetches without a network.
#[async_trait]
pub trait Origin: Send + Sync {
    /// Fetch the full body for a path from the origin.
    async fn fetch(&self, path: &CachePath) -> Result<Bytes>;
}

/// HTTP client for the configured origin host.
#[derive(Clone)]
pub struct OriginClient {
    http: reqwest::Client,
    base_url: String,
}

impl OriginClient {
    /// Create a client for the given origin base URL.
    ///
    /// A trailing slash on the base URL is tolerated. The timeout covers
    /// each whole request, connect through body.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// The origin base URL, without trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET a cacheable resource; returns the full response body.
    ///
    /// Any non-2xx status, connect failure, or timeout surfaces as an
    /// upstream error carrying the status or transport reason.
    pub async fn get(&self, path: &CachePath) -> Result<Bytes> {
        let url = format!("{}/{}", self.base_url, path.as_str());
        debug!(%url, "origin GET");

        let response = match self.http.get(&url).send().await {
            Ok(response) => response,
            Err(e) => {
                counter!(telemetry::UPSTREAM_REQUESTS_TOTAL,
                    "method" => "GET", "status" => "error")
                .increment(1);
                return Err(Error::Upstream(format!("GET {url} failed: {e}")));
            }
        };

        let status = response.status();
        if !status.is_success() {
            counter!(telemetry::UPSTREAM_REQUESTS_TOTAL,
                "method" => "GET", "status" => "error")
            .increment(1);
            return Err(Error::UpstreamStatus {
                status: status.as_u16(),
                message: format!("GET {url}"),
            });
        }

        counter!(telemetry::UPSTREAM_REQUESTS_TOTAL,
            "method" => "GET", "status" => "ok")
        .increment(1);

        response
            .bytes()
            .await
            .map_err(|e| Error::Upstream(format!("GET {url} body read failed: {e}")))
    }

    /// POST decoded form parameters to the origin, returning the raw
    /// response body verbatim. `path_and_query` keeps its query string;
    /// POSTs are forwarded as received.
    pub async fn post_form(
        &self,
        path_and_query: &str,
        params: &[(String, String)],
    ) -> Result<Bytes> {
        let url = format!("{}{}", self.base_url, path_and_query);
        debug!(%url, params = params.len(), "origin POST");

        let response = match self.http.post(&url).form(params).send().await {
            Ok(response) => response,
            Err(e) => {
                counter!(telemetry::UPSTREAM_REQUESTS_TOTAL,
                    "method" => "POST", "status" => "error")
                .increment(1);
                return Err(Error::Upstream(format!("POST {url} failed: {e}")));
            }
        };

        let status = response.status();
        if !status.is_success() {
            counter!(telemetry::UPSTREAM_REQUESTS_TOTAL,
                "method" => "POST", "status" => "error")
            .increment(1);
            return Err(Error::UpstreamStatus {
                status: status.as_u16(),
                message: format!("POST {url}"),
            });
        }

        counter!(telemetry::UPSTREAM_REQUESTS_TOTAL,
            "method" => "POST", "status" => "ok")
        .increment(1);

        response
            .bytes()
            .await
            .map_err(|e| Error::Upstream(format!("POST {url} body read failed: {e}")))
    }
}

#[async_trait]
impl Origin for OriginClient {
    async fn fetch(&self, path: &CachePath) -> Result<Bytes> {
        self.get(path).await
    }
}
