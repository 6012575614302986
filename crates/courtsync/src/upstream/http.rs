//! HTTP transport for the upstream clubs/courts/slots provider.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use url::Url;

use courtsync_core::availability::{Club, Court, Slot};
use courtsync_core::upstream::{Result, UpstreamClient, UpstreamError};

/// Uncached `UpstreamClient` backed by `reqwest`.
///
/// Every failure (transport error, timeout, non-2xx status, undecodable
/// body) is reported as an `UpstreamError`; nothing is retried.
#[derive(Debug, Clone)]
pub struct HttpUpstreamClient {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpUpstreamClient {
    /// Creates a client for the provider at `base_url`.
    ///
    /// `timeout` bounds each request end to end, including reading the body.
    pub fn new(mut base_url: Url, timeout: Duration) -> reqwest::Result<Self> {
        // Without a trailing slash `Url::join` would replace the last segment.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base_url })
    }

    /// Returns the provider base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Issues a GET for `path` and decodes the JSON body.
    async fn fetch<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T> {
        let url = self
            .base_url
            .join(path)
            .map_err(|e| UpstreamError::Unavailable {
                resource: path.to_string(),
                reason: e.to_string(),
            })?;

        tracing::debug!(%url, "Fetching from upstream");

        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| UpstreamError::Unavailable {
                resource: path.to_string(),
                reason: e.to_string(),
            })?;

        self.handle_response(path, response).await
    }

    /// Maps a provider response to the decoded body or an `UpstreamError`.
    async fn handle_response<T: DeserializeOwned>(
        &self,
        path: &str,
        response: reqwest::Response,
    ) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::BadStatus {
                resource: path.to_string(),
                status: status.as_u16(),
            });
        }

        response
            .json()
            .await
            .map_err(|e| UpstreamError::InvalidResponse {
                resource: path.to_string(),
                reason: e.to_string(),
            })
    }
}

#[async_trait]
impl UpstreamClient for HttpUpstreamClient {
    async fn get_clubs(&self, place_id: &str) -> Result<Vec<Club>> {
        self.fetch("clubs", &[("placeId", place_id)]).await
    }

    async fn get_courts(&self, club_id: i64) -> Result<Vec<Court>> {
        self.fetch(&format!("clubs/{club_id}/courts"), &[]).await
    }

    async fn get_available_slots(
        &self,
        club_id: i64,
        court_id: i64,
        date: NaiveDate,
    ) -> Result<Vec<Slot>> {
        let date = date.format("%Y-%m-%d").to_string();
        self.fetch(
            &format!("clubs/{club_id}/courts/{court_id}/slots"),
            &[("date", date.as_str())],
        )
        .await
    }
}
