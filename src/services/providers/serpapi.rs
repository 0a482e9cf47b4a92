use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client as HttpClient;

use crate::error::{AppError, AppResult};
use crate::models::{SerpResult, SerpSearchResponse};

use super::SearchProvider;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// SerpAPI organic-search client used for thread discovery
pub struct SerpApiProvider {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
}

impl SerpApiProvider {
    pub fn new(api_key: String, api_url: String) -> Self {
        let http_client = HttpClient::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            http_client,
            api_key,
            api_url,
        }
    }
}

#[async_trait]
impl SearchProvider for SerpApiProvider {
    async fn search(&self, query: &str, num: u32) -> AppResult<Vec<SerpResult>> {
        let url = format!("{}/search.json", self.api_url);
        let num_param = num.to_string();

        let response = self
            .http_client
            .get(&url)
            .query(&[
                ("q", query),
                ("api_key", self.api_key.as_str()),
                ("num", num_param.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "Search provider returned status {}: {}",
                status, body
            )));
        }

        let parsed: SerpSearchResponse = response.json().await?;

        tracing::info!(
            query = %query,
            results = parsed.organic_results.len(),
            provider = "serpapi",
            "Organic search completed"
        );

        Ok(parsed.organic_results)
    }
}
