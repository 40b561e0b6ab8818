//! HTTP/REST client for tilescope
//!
//! Mirrors the RPC client for the search and stats calls.

use crate::backend::SearchBackend;
use crate::error::{ClientError, Result};
use tilescope_types::error::SearchError;
use tilescope_types::listing::Listing;
use tilescope_types::result::{SearchRequest, SearchResult};
use tilescope_types::stats::IndexStats;

#[derive(Clone, Debug)]
pub struct TilescopeHttpClient {
    base_url: String,
    http: reqwest::Client,
}

impl TilescopeHttpClient {
    /// Create a client for a server at `base_url` (e.g. `http://localhost:8080`).
    pub fn new(base_url: &str) -> Result<Self> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn search(&self, request: &SearchRequest) -> Result<SearchResult> {
        let response = self
            .http
            .post(self.url("/v1/search"))
            .json(request)
            .send()
            .await?;

        if response.status().is_success() {
            return Ok(response.json::<SearchResult>().await?);
        }
        let status = response.status();
        let body = response.bytes().await?;
        match serde_json::from_slice::<SearchError>(&body) {
            Ok(err) => Err(ClientError::Search(err)),
            Err(_) => Err(ClientError::Server(format!(
                "{}: {}",
                status,
                String::from_utf8_lossy(&body)
            ))),
        }
    }

    pub async fn upsert_listing(&self, listing: &Listing) -> Result<()> {
        let response = self
            .http
            .post(self.url("/v1/listings"))
            .json(listing)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ClientError::Server(response.text().await?));
        }
        Ok(())
    }

    pub async fn stats(&self) -> Result<IndexStats> {
        Ok(self
            .http
            .get(self.url("/v1/stats"))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?)
    }
}

impl SearchBackend for TilescopeHttpClient {
    async fn search(&self, request: SearchRequest) -> Result<SearchResult> {
        TilescopeHttpClient::search(self, &request).await
    }
}
