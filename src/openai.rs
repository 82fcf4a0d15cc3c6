use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};

use crate::{
    config::ProviderSettings,
    models::{ArchitectureBlueprint, GenerateRequest},
    prompt::{build_prompt, system_instruction},
    provider::{check_status, http_client, parse_blueprint, Provider, ProviderError},
};

pub const SOURCE: &str = "openai";

/// Chat-completions adapter.
pub struct OpenAiProvider {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiProvider {
    pub fn new(settings: ProviderSettings) -> Result<Self, ProviderError> {
        Ok(Self {
            client: http_client(settings.timeout)?,
            api_key: settings.api_key,
            base_url: settings.base_url,
            model: settings.model,
        })
    }

    async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
        let url = format!("{}/chat/completions", self.base_url);
        info!("🔗 Making request to: {}", url);

        let body = json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": system_instruction()},
                {"role": "user", "content": prompt}
            ],
            "temperature": 0.7,
            "max_tokens": 4000
        });

        let response = self.client.post(&url).bearer_auth(&self.api_key).json(&body).send().await?;
        let response = check_status(SOURCE, response).await?;
        info!("📥 Response status: {}", response.status());

        let parsed: ChatCompletion = response.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or(ProviderError::EmptyResponse)
    }
}

#[async_trait]
impl Provider for OpenAiProvider {
    fn name(&self) -> &'static str { SOURCE }

    #[instrument(skip_all, fields(provider = SOURCE, model = %self.model))]
    async fn attempt(&self, request: &GenerateRequest) -> Result<ArchitectureBlueprint, ProviderError> {
        let text = self.complete(&build_prompt(request)).await?;
        info!("📥 Received {} chars of model output", text.len());
        parse_blueprint(&text)
    }
}

// --- Response Parsing Helpers ---

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice { message: Message }

#[derive(Debug, Deserialize)]
struct Message { #[serde(default)] content: Option<String> }

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Monetization, TenantType};
    use crate::provider::tests::{serve_stub, VALID_BLUEPRINT};
    use axum::{http::{HeaderMap, StatusCode}, routing::post, Json, Router};
    use serde_json::Value;
    use std::time::Duration;

    fn request() -> GenerateRequest {
        GenerateRequest {
            idea: "Shift scheduling for hospital nursing teams".into(),
            roles: vec!["Admin".into(), "Nurse".into()],
            monetization: Monetization::Subscription,
            tenant_type: TenantType::Multi,
            tech_stack: vec!["Rust".into()],
        }
    }

    async fn provider_for(router: Router) -> OpenAiProvider {
        let base_url = serve_stub(router).await;
        OpenAiProvider::new(ProviderSettings {
            api_key: "sk-test".into(),
            base_url,
            model: "gpt-test".into(),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    fn completion(content: Value) -> Json<Value> {
        Json(serde_json::json!({"choices": [{"message": {"role": "assistant", "content": content}}]}))
    }

    #[tokio::test]
    async fn sends_schema_and_prompt_and_parses_fenced_reply() {
        let router = Router::new().route(
            "/chat/completions",
            post(|headers: HeaderMap, Json(body): Json<Value>| async move {
                assert_eq!(headers["authorization"], "Bearer sk-test");
                assert_eq!(body["model"], "gpt-test");
                assert!(body["messages"][0]["content"].as_str().unwrap().contains("project_summary"));
                assert!(body["messages"][1]["content"].as_str().unwrap().contains("Admin, Nurse"));
                completion(Value::String(format!("```json\n{VALID_BLUEPRINT}\n```")))
            }),
        );
        let bp = provider_for(router).await.attempt(&request()).await.unwrap();
        assert_eq!(bp.project_summary, "Fleet maintenance tracker");
    }

    #[tokio::test]
    async fn rate_limit_is_reported_as_such() {
        let router = Router::new().route(
            "/chat/completions",
            post(|| async { (StatusCode::TOO_MANY_REQUESTS, "slow down") }),
        );
        let err = provider_for(router).await.attempt(&request()).await.unwrap_err();
        assert!(matches!(err, ProviderError::RateLimited(body) if body == "slow down"));
    }

    #[tokio::test]
    async fn server_error_keeps_status() {
        let router = Router::new().route("/chat/completions", post(|| async { StatusCode::BAD_GATEWAY }));
        let err = provider_for(router).await.attempt(&request()).await.unwrap_err();
        assert!(matches!(err, ProviderError::Status { status, .. } if status == StatusCode::BAD_GATEWAY));
    }

    #[tokio::test]
    async fn slow_provider_times_out() {
        let router = Router::new().route(
            "/chat/completions",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(2)).await;
                completion(Value::String(VALID_BLUEPRINT.into()))
            }),
        );
        let base_url = serve_stub(router).await;
        let provider = OpenAiProvider::new(ProviderSettings {
            api_key: "sk-test".into(),
            base_url,
            model: "gpt-test".into(),
            timeout: Duration::from_millis(100),
        })
        .unwrap();
        let err = provider.attempt(&request()).await.unwrap_err();
        assert!(matches!(err, ProviderError::Timeout), "{err:?}");
    }

    #[tokio::test]
    async fn missing_content_is_empty_response() {
        let router = Router::new().route("/chat/completions", post(|| async { completion(Value::Null) }));
        let err = provider_for(router).await.attempt(&request()).await.unwrap_err();
        assert!(matches!(err, ProviderError::EmptyResponse));
    }

    #[tokio::test]
    async fn prose_reply_is_invalid_json() {
        let router = Router::new().route(
            "/chat/completions",
            post(|| async { completion(Value::String("I cannot help with that.".into())) }),
        );
        let err = provider_for(router).await.attempt(&request()).await.unwrap_err();
        assert!(matches!(err, ProviderError::InvalidJson(_)));
    }
}
