use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use crate::errors::CoreError;
use super::traits::DataSource;

/// Serves the static documents over HTTP from `{base_url}/{endpoint}`.
///
/// Non-success statuses become [`CoreError::Fetch`] so the data service can
/// fall back to stale or hardcoded content.
pub struct HttpDataSource {
    client: Client,
    base_url: String,
}

impl HttpDataSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url_for(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'))
    }
}

#[async_trait]
impl DataSource for HttpDataSource {
    fn name(&self) -> &str {
        "HTTP"
    }

    async fn fetch(&self, endpoint: &str) -> Result<serde_json::Value, CoreError> {
        let resp = self.client.get(self.url_for(endpoint)).send().await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(CoreError::Fetch {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(resp.json().await?)
    }
}
