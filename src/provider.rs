use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use std::time::Duration;
use thiserror::Error;
use tracing::error;

use crate::{models::{ArchitectureBlueprint, GenerateRequest}, schema::{validate_blueprint, SchemaError}};

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("request timed out")]
    Timeout,
    #[error("rate limited (429): {0}")]
    RateLimited(String),
    #[error("status={status} body={body}")]
    Status { status: StatusCode, body: String },
    #[error("provider returned no text")]
    EmptyResponse,
    #[error("invalid JSON in response: {0}")]
    InvalidJson(String),
    #[error("schema violation: {0}")]
    Schema(#[from] SchemaError),
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        // Gemini carries its key in the query string.
        if e.is_timeout() { ProviderError::Timeout } else { ProviderError::Http(e.without_url().to_string()) }
    }
}

/// One external generative-text service able to produce a blueprint.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Provenance tag recorded on blueprints this provider produced.
    fn name(&self) -> &'static str;

    /// Exactly one outbound request; no retries.
    async fn attempt(&self, request: &GenerateRequest) -> Result<ArchitectureBlueprint, ProviderError>;
}

pub fn http_client(timeout: Duration) -> Result<Client, ProviderError> {
    Ok(Client::builder().timeout(timeout).build()?)
}

/// Passes 2xx responses through and turns everything else into an error,
/// keeping 429 distinguishable.
pub async fn check_status(provider: &str, response: Response) -> Result<Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    error!(provider, %status, "❌ API error response: {}", body);
    if status == StatusCode::TOO_MANY_REQUESTS {
        Err(ProviderError::RateLimited(body))
    } else {
        Err(ProviderError::Status { status, body })
    }
}

/// Removes a leading ```` ```lang ```` marker and a trailing ```` ``` ````.
pub fn strip_code_fences(raw: &str) -> &str {
    let mut s = raw.trim();
    if let Some(rest) = s.strip_prefix("```") {
        s = rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric());
    }
    if let Some(rest) = s.trim_end().strip_suffix("```") {
        s = rest;
    }
    s.trim()
}

/// Free-form model text to validated blueprint.
pub fn parse_blueprint(raw: &str) -> Result<ArchitectureBlueprint, ProviderError> {
    let cleaned = strip_code_fences(raw);
    if cleaned.is_empty() {
        return Err(ProviderError::EmptyResponse);
    }
    let value: serde_json::Value =
        serde_json::from_str(cleaned).map_err(|e| ProviderError::InvalidJson(e.to_string()))?;
    Ok(validate_blueprint(value)?)
}
