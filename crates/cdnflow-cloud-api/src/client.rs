//! CDN distribution REST client
//!
//! Bearer-token client for the `/projects/{project}/distributions` API.
//! 404 responses on read and delete become [`CloudError::NotFound`]; every
//! other non-success status becomes [`CloudError::Api`] with the message the
//! service returned.

use crate::error::{ApiError, Result};
use async_trait::async_trait;
use cdnflow_cloud::{
    CloudError, CreatedDistribution, Distribution, DistributionClient, DistributionId,
    DistributionRequest,
};
use reqwest::{Response, StatusCode, Url};
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "https://api.cdn.example.com/v1";
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_ERROR_BODY: usize = 512;

/// Connection settings for [`CdnApiClient`]
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub api_token: String,
    pub base_url: String,
    /// Upper bound for a single HTTP request
    pub request_timeout: Duration,
}

impl ApiConfig {
    pub fn new(base_url: impl Into<String>, api_token: impl Into<String>) -> Self {
        Self {
            api_token: api_token.into(),
            base_url: base_url.into(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Create ApiConfig from `CDN_API_TOKEN` and optional `CDN_API_URL`
    pub fn from_env() -> Result<Self> {
        let api_token = std::env::var("CDN_API_TOKEN")
            .map_err(|_| ApiError::MissingEnvVar("CDN_API_TOKEN".to_string()))?;
        let base_url =
            std::env::var("CDN_API_URL").unwrap_or_else(|_| DEFAULT_API_BASE.to_string());

        Ok(Self::new(base_url, api_token))
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

/// [`DistributionClient`] over HTTP
pub struct CdnApiClient {
    client: reqwest::Client,
    api_token: String,
    base_url: Url,
}

impl CdnApiClient {
    pub fn new(config: ApiConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url).map_err(|e| ApiError::InvalidUrl {
            url: config.base_url.clone(),
            reason: e.to_string(),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl {
                url: config.base_url,
                reason: "URL cannot be used as a base".to_string(),
            });
        }

        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(concat!("cdnflow/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            api_token: config.api_token,
            base_url,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, segments: &[&str]) -> std::result::Result<Url, CloudError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| CloudError::InvalidConfig(format!("invalid API URL {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn distributions_url(&self, project: &str) -> std::result::Result<Url, CloudError> {
        self.url(&["projects", project, "distributions"])
    }

    fn distribution_url(&self, id: &DistributionId) -> std::result::Result<Url, CloudError> {
        self.url(&["projects", &id.project, "distributions", &id.distribution])
    }
}

#[async_trait]
impl DistributionClient for CdnApiClient {
    async fn create(
        &self,
        project: &str,
        request: &DistributionRequest,
    ) -> cdnflow_cloud::Result<CreatedDistribution> {
        let url = self.distributions_url(project)?;
        tracing::debug!("POST {}", url);

        let response = self
            .client
            .post(url)
            .bearer_auth(&self.api_token)
            .json(request)
            .send()
            .await
            .map_err(transport)?;

        let response = check(response, &format!("project {}", project)).await?;
        response
            .json::<CreatedDistribution>()
            .await
            .map_err(|e| CloudError::Transport(format!("invalid create response: {}", e)))
    }

    async fn get(&self, id: &DistributionId) -> cdnflow_cloud::Result<Distribution> {
        let url = self.distribution_url(id)?;
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .bearer_auth(&self.api_token)
            .send()
            .await
            .map_err(transport)?;

        let response = check(response, &id.combined()).await?;
        response
            .json::<Distribution>()
            .await
            .map_err(|e| CloudError::Transport(format!("invalid distribution response: {}", e)))
    }

    async fn update(
        &self,
        id: &DistributionId,
        request: &DistributionRequest,
    ) -> cdnflow_cloud::Result<()> {
        let url = self.distribution_url(id)?;
        tracing::debug!("PUT {}", url);

        let response = self
            .client
            .put(url)
            .bearer_auth(&self.api_token)
            .json(request)
            .send()
            .await
            .map_err(transport)?;

        check(response, &id.combined()).await?;
        Ok(())
    }

    async fn delete(&self, id: &DistributionId) -> cdnflow_cloud::Result<()> {
        let url = self.distribution_url(id)?;
        tracing::debug!("DELETE {}", url);

        let response = self
            .client
            .delete(url)
            .bearer_auth(&self.api_token)
            .send()
            .await
            .map_err(transport)?;

        check(response, &id.combined()).await?;
        Ok(())
    }
}

fn transport(e: reqwest::Error) -> CloudError {
    CloudError::Transport(e.to_string())
}

/// Pass 2xx responses through, classify everything else
async fn check(response: Response, what: &str) -> std::result::Result<Response, CloudError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    if status == StatusCode::NOT_FOUND {
        return Err(CloudError::NotFound(what.to_string()));
    }

    Err(CloudError::Api {
        status: status.as_u16(),
        message: error_message(status, &body),
    })
}

// ============ API Types ============

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ApiErrorBody>(body) {
        if let Some(detail) = parsed.error {
            return detail.message;
        }
        if let Some(message) = parsed.message {
            return message;
        }
    }

    let body = body.trim();
    if body.is_empty() {
        return status
            .canonical_reason()
            .unwrap_or("Unknown error")
            .to_string();
    }
    body.chars().take(MAX_ERROR_BODY).collect()
}
