//! `reqwest` client for the upload service

use super::{describe_http_error, endpoint, StatusResponse, UploadApi, UploadResponse, USER_AGENT};
use crate::config::ServicesConfig;
use crate::error::{Result, RagdeskError};
use crate::jobs::UploadFile;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use std::time::Duration;
use url::Url;

/// HTTP implementation of [`UploadApi`]
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use ragdesk::api::HttpUploadClient;
///
/// let client = HttpUploadClient::new("http://localhost:8004", Duration::from_secs(60));
/// assert!(client.is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct HttpUploadClient {
    client: Client,
    base_url: Url,
}

impl HttpUploadClient {
    /// Create a client for the service at `base_url`
    ///
    /// # Errors
    ///
    /// Returns error if the URL is invalid or the HTTP client cannot be built
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| RagdeskError::Config(format!("Invalid upload URL {}: {}", base_url, e)))?;

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| RagdeskError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        tracing::debug!("Initialized upload client: {}", base_url);
        Ok(Self { client, base_url })
    }

    /// Create a client from the services section of the configuration
    pub fn from_config(config: &ServicesConfig) -> Result<Self> {
        Self::new(&config.upload_url, config.request_timeout())
    }
}

#[async_trait]
impl UploadApi for HttpUploadClient {
    async fn upload(&self, file: &UploadFile) -> Result<UploadResponse> {
        let url = endpoint(&self.base_url, &["upload"])?;
        let contents = file.read_contents().await?;

        let part = Part::bytes(contents.to_vec())
            .file_name(file.name.clone())
            .mime_str(&file.content_type)
            .map_err(|e| {
                RagdeskError::Validation(format!(
                    "Invalid content type {}: {}",
                    file.content_type, e
                ))
            })?;
        let form = Form::new().part("file", part);

        tracing::debug!(file = %file.name, bytes = file.size, "POST {}", url);
        let response = self
            .client
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| RagdeskError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!("Upload of {} rejected with {}", file.name, status);
            return Err(RagdeskError::Transport(describe_http_error(status, &body)).into());
        }

        response.json::<UploadResponse>().await.map_err(|e| {
            RagdeskError::Parse(format!("Failed to parse upload response: {}", e)).into()
        })
    }

    async fn status(&self, task_id: &str) -> Result<StatusResponse> {
        let url = endpoint(&self.base_url, &["status", task_id])?;

        tracing::debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| RagdeskError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RagdeskError::Transport(describe_http_error(status, &body)).into());
        }

        response.json::<StatusResponse>().await.map_err(|e| {
            RagdeskError::Parse(format!("Failed to parse status response: {}", e)).into()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_invalid_url() {
        assert!(HttpUploadClient::new("not a url", Duration::from_secs(1)).is_err());
    }

    #[test]
    fn test_from_config_uses_upload_url() {
        let client = HttpUploadClient::from_config(&ServicesConfig::default()).unwrap();
        assert_eq!(client.base_url.as_str(), "http://localhost:8004/");
    }
}
