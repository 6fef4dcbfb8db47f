//! `reqwest` client for the question-answering service

use super::{describe_http_error, endpoint, QueryApi, QueryRequest, QueryResponse, USER_AGENT};
use crate::config::ServicesConfig;
use crate::error::{Result, RagdeskError};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use url::Url;

/// HTTP implementation of [`QueryApi`]
#[derive(Debug, Clone)]
pub struct HttpQueryClient {
    client: Client,
    base_url: Url,
}

impl HttpQueryClient {
    /// Create a client for the service at `base_url`
    ///
    /// # Errors
    ///
    /// Returns error if the URL is invalid or the HTTP client cannot be built
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| RagdeskError::Config(format!("Invalid query URL {}: {}", base_url, e)))?;

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| RagdeskError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        tracing::debug!("Initialized query client: {}", base_url);
        Ok(Self { client, base_url })
    }

    /// Create a client from the services section of the configuration
    pub fn from_config(config: &ServicesConfig) -> Result<Self> {
        Self::new(&config.query_url, config.request_timeout())
    }
}

#[async_trait]
impl QueryApi for HttpQueryClient {
    async fn query(&self, question: &str, num_chunks: u32) -> Result<QueryResponse> {
        let url = endpoint(&self.base_url, &["query"])?;
        let request = QueryRequest {
            question: question.to_string(),
            num_chunks,
        };

        tracing::debug!(num_chunks, "POST {}", url);
        let response = self
            .client
            .post(url)
            .json(&request)
            .send()
            .await
            .map_err(|e| RagdeskError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = describe_http_error(status, &body);
            tracing::error!("Query failed with {}: {}", status, message);
            return Err(RagdeskError::Transport(message).into());
        }

        let answer = response.json::<QueryResponse>().await.map_err(|e| {
            RagdeskError::Parse(format!("Failed to parse query response: {}", e))
        })?;

        tracing::info!(
            sources = answer.sources.len(),
            runtime_ms = answer.runtime_ms.unwrap_or_default(),
            "Received answer"
        );
        Ok(answer)
    }
}
