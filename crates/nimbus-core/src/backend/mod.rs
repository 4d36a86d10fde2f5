pub mod http;

pub use http::HttpBackend;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::BackendError;
use crate::state::WeatherInsights;

/// Body of `POST /query`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QueryRequest {
    pub query: String,
}

/// Body returned by `POST /query`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct QueryResponse {
    pub success: bool,
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub weather_type: Option<String>,
    #[serde(default)]
    pub insights: Option<WeatherInsights>,
}

impl QueryResponse {
    pub fn answered(text: impl Into<String>) -> Self {
        Self {
            success: true,
            response: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Self::default()
        }
    }

    pub fn with_weather_type(mut self, weather_type: impl Into<String>) -> Self {
        self.weather_type = Some(weather_type.into());
        self
    }

    pub fn with_insights(mut self, insights: WeatherInsights) -> Self {
        self.insights = Some(insights);
        self
    }
}

/// Body returned by `GET /health`
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct HealthStatus {
    pub status: String,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        self.status.eq_ignore_ascii_case("healthy")
    }
}

/// The remote service that answers weather questions
#[async_trait]
pub trait WeatherBackend: Send + Sync {
    async fn query(&self, query: &str) -> Result<QueryResponse, BackendError>;
}
