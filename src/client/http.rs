use crate::client::search_view::SearchClient;
use crate::domain::search::{BankSummary, BanksResponse, DonorSummary, DonorsResponse, SearchFilter, SearchRequest};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, instrument};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// [`SearchClient`] that talks to a running API over HTTP.
#[derive(Debug, Clone)]
pub struct HttpSearchClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpSearchClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self::with_client(http, base_url))
    }

    pub fn with_client(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post_search<T: DeserializeOwned>(&self, path: &str, filter: &SearchFilter) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "Sending search request");

        let response = self
            .http
            .post(&url)
            .header("Accept", "application/json")
            .json(&SearchRequest::from(filter))
            .send()
            .await
            .with_context(|| format!("Failed to reach {}", url))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Search request to {} failed with {}: {}", url, status, body);
        }

        response
            .json::<T>()
            .await
            .with_context(|| format!("Failed to parse response from {}", url))
    }
}

#[async_trait]
impl SearchClient for HttpSearchClient {
    #[instrument(skip(self))]
    async fn find_banks(&self, filter: &SearchFilter) -> Result<Vec<BankSummary>> {
        let response: BanksResponse = self.post_search("/bloodbank/find-banks", filter).await?;
        Ok(response.banks)
    }

    #[instrument(skip(self))]
    async fn find_donors(&self, filter: &SearchFilter) -> Result<Vec<DonorSummary>> {
        let response: DonorsResponse = self.post_search("/blooddonor/find-donors", filter).await?;
        Ok(response.donors)
    }
}
