use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use super::{HealthStatus, QueryRequest, QueryResponse, WeatherBackend};
use crate::error::BackendError;

/// Client for the weather assistant HTTP API
#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    /// `timeout` bounds each request; `None` waits indefinitely.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, BackendError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn health(&self) -> Result<HealthStatus, BackendError> {
        let url = format!("{}/health", self.base_url);

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Status { status, body });
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl WeatherBackend for HttpBackend {
    async fn query(&self, query: &str) -> Result<QueryResponse, BackendError> {
        let url = format!("{}/query", self.base_url);

        let request = QueryRequest {
            query: query.to_string(),
        };

        let response = self.client.post(&url).json(&request).send().await?;

        // The API reports application failures in the body, so decode it
        // whatever the status; only an undecodable body is an error.
        let status = response.status();
        let body = response.text().await?;
        debug!(%status, bytes = body.len(), "weather backend responded");

        match serde_json::from_str::<QueryResponse>(&body) {
            Ok(parsed) => Ok(parsed),
            Err(_) if !status.is_success() => Err(BackendError::Status { status, body }),
            Err(err) => Err(BackendError::Decode(err)),
        }
    }
}
