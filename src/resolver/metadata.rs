use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use tokio::sync::OnceCell;

use crate::config::EnvSnapshot;
use crate::constants::{
    METADATA_ENDPOINT, METADATA_TIMEOUT_SECS, METADATA_TOKEN_HEADER, METADATA_TOKEN_PATH,
    METADATA_TOKEN_TTL_HEADER, METADATA_TOKEN_TTL_SECS,
};
use crate::errors::{PipelineError, PipelineResult};

/// Read access to the instance metadata service.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MetadataClient: Send + Sync {
    /// Fetch a metadata document by path, e.g. `/latest/meta-data/placement/region`.
    async fn fetch(&self, path: &str) -> PipelineResult<String>;
}

/// HTTP client for the EC2 instance metadata service.
///
/// Tries an IMDSv2 session token first and falls back to plain IMDSv1
/// requests when the token endpoint is unavailable. The token outcome is
/// settled once per client. Each lookup, token request included, is bounded
/// by the client timeout as a whole.
pub struct ImdsClient {
    http: reqwest::Client,
    endpoint: String,
    timeout: Duration,
    token: OnceCell<Option<String>>,
}

impl ImdsClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> PipelineResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .no_proxy()
            .build()
            .map_err(|e| PipelineError::Resolution(format!("Failed to create metadata client: {}", e)))?;

        Ok(ImdsClient {
            http,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            timeout,
            token: OnceCell::new(),
        })
    }

    /// Client for the configured endpoint with the standard 2 second timeout.
    pub fn from_env(env: &EnvSnapshot) -> PipelineResult<Self> {
        ImdsClient::new(
            env.metadata_endpoint().unwrap_or(METADATA_ENDPOINT),
            Duration::from_secs(METADATA_TIMEOUT_SECS),
        )
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn session_token(&self) -> Option<&str> {
        self.token
            .get_or_init(|| self.request_token())
            .await
            .as_deref()
    }

    async fn request_token(&self) -> Option<String> {
        let url = format!("{}{}", self.endpoint, METADATA_TOKEN_PATH);
        let response = self
            .http
            .put(&url)
            .header(METADATA_TOKEN_TTL_HEADER, METADATA_TOKEN_TTL_SECS.to_string())
            .send()
            .await;

        match response {
            Ok(response) if response.status().is_success() => response.text().await.ok(),
            Ok(response) => {
                debug!("Metadata token request returned {}, using IMDSv1", response.status());
                None
            }
            Err(e) => {
                debug!("Metadata token request failed, using IMDSv1: {}", e);
                None
            }
        }
    }

    async fn lookup(&self, path: &str) -> PipelineResult<String> {
        let url = format!("{}{}", self.endpoint, path);
        let mut request = self.http.get(&url);
        if let Some(token) = self.session_token().await {
            request = request.header(METADATA_TOKEN_HEADER, token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| PipelineError::Resolution(format!("Error fetching {}: {}", path, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PipelineError::Resolution(format!(
                "Error fetching {}: metadata service returned {}",
                path, status
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| PipelineError::Resolution(format!("Error reading {}: {}", path, e)))?;

        debug!("Fetched {} from instance metadata", path);
        Ok(body.trim().to_string())
    }
}

#[async_trait]
impl MetadataClient for ImdsClient {
    async fn fetch(&self, path: &str) -> PipelineResult<String> {
        tokio::time::timeout(self.timeout, self.lookup(path))
            .await
            .map_err(|_| {
                PipelineError::Resolution(format!(
                    "Error fetching {}: no answer within {:?}",
                    path, self.timeout
                ))
            })?
    }
}
