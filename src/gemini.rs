use async_trait::async_trait;
use reqwest::Client;
use serde::{de::IgnoredAny, Deserialize};
use serde_json::json;
use tracing::{info, instrument, warn};

use crate::{
    config::ProviderSettings,
    models::{ArchitectureBlueprint, GenerateRequest},
    prompt::{build_prompt, system_instruction},
    provider::{check_status, http_client, parse_blueprint, Provider, ProviderError},
};

pub const SOURCE: &str = "gemini";

pub struct GeminiProvider {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl GeminiProvider {
    pub fn new(settings: ProviderSettings) -> Result<Self, ProviderError> {
        Ok(Self {
            client: http_client(settings.timeout)?,
            api_key: settings.api_key,
            base_url: settings.base_url,
            model: settings.model,
        })
    }

    async fn generate_text(&self, prompt: &str) -> Result<String, ProviderError> {
        let url = format!("{}/models/{}:generateContent?key={}", self.base_url, self.model, self.api_key);

        info!("🔗 Making request to: {}", url.replace(&self.api_key, "***"));

        let payload = json!({
            "systemInstruction": {
                "parts": [{"text": system_instruction()}]
            },
            "contents": [{
                "role": "user",
                "parts": [{"text": prompt}]
            }],
            "generationConfig": {
                "temperature": 0.7,
                "topP": 0.95,
                "maxOutputTokens": 4000,
                "responseMimeType": "application/json"
            }
        });

        let response = self.client.post(&url).json(&payload).send().await?;
        let response = check_status(SOURCE, response).await?;
        info!("📥 Response status: {}", response.status());

        let parsed: GeminiResponse = response.json().await?;
        if let Some(reason) = parsed.prompt_feedback.as_ref().and_then(|f| f.block_reason.as_deref()) {
            warn!("⚠️ Prompt blocked by Gemini: {}", reason);
        }

        let text = extract_text(&parsed);
        if text.trim().is_empty() {
            return Err(ProviderError::EmptyResponse);
        }
        Ok(text)
    }
}

#[async_trait]
impl Provider for GeminiProvider {
    fn name(&self) -> &'static str { SOURCE }

    #[instrument(skip_all, fields(provider = SOURCE, model = %self.model))]
    async fn attempt(&self, request: &GenerateRequest) -> Result<ArchitectureBlueprint, ProviderError> {
        let prompt = build_prompt(request);
        info!("🎯 Generating blueprint with prompt (truncated): {}", &prompt[..prompt.char_indices().nth(120).map_or(prompt.len(), |(i, _)| i)]);
        let text = self.generate_text(&prompt).await?;
        info!("✅ Gemini returned {} chars", text.len());
        parse_blueprint(&text)
    }
}

// --- Response Parsing Helpers ---

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default, rename = "promptFeedback")]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct PromptFeedback {
    #[serde(default, rename = "blockReason")]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Candidate { #[serde(default)] content: Content }

#[derive(Debug, Deserialize, Default)]
struct Content { #[serde(default)] parts: Vec<Part> }

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
        #[serde(default)]
        thought: bool,
    },
    Other(IgnoredAny),
}

/// Answer text parts of the first candidate, concatenated. Thought
/// summaries are dropped.
fn extract_text(resp: &GeminiResponse) -> String {
    resp.candidates
        .first()
        .map(|c| {
            c.content
                .parts
                .iter()
                .filter_map(|p| match p {
                    Part::Text { text, thought: false } => Some(text.as_str()),
                    Part::Text { thought: true, .. } | Part::Other(_) => None,
                })
                .collect::<String>()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Monetization, TenantType};
    use crate::provider::tests::{serve_stub, VALID_BLUEPRINT};
    use axum::{extract::{Path, Query}, http::StatusCode, routing::post, Json, Router};
    use serde_json::Value;
    use std::{collections::HashMap, time::Duration};

    fn request() -> GenerateRequest {
        GenerateRequest {
            idea: "Recipe costing and menu planning for restaurants".into(),
            roles: vec!["Chef".into()],
            monetization: Monetization::Freemium,
            tenant_type: TenantType::Single,
            tech_stack: vec![],
        }
    }

    async fn provider_for(router: Router) -> GeminiProvider {
        let base_url = serve_stub(router).await;
        GeminiProvider::new(ProviderSettings {
            api_key: "g-test".into(),
            base_url,
            model: "gemini-test".into(),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn joins_text_parts_of_first_candidate() {
        let router = Router::new().route(
            "/models/:call",
            post(|Path(call): Path<String>, Query(q): Query<HashMap<String, String>>, Json(body): Json<Value>| async move {
                assert_eq!(call, "gemini-test:generateContent");
                assert_eq!(q["key"], "g-test");
                assert!(body["systemInstruction"]["parts"][0]["text"].as_str().unwrap().contains("folder_structure"));
                let (head, tail) = VALID_BLUEPRINT.split_at(40);
                Json(serde_json::json!({
                    "candidates": [{"content": {"parts": [
                        {"text": format!("```json\n{head}")},
                        {"text": format!("{tail}\n```")}
                    ]}}]
                }))
            }),
        );
        let bp = provider_for(router).await.attempt(&request()).await.unwrap();
        assert_eq!(bp.mvp_features, vec!["Vehicle registry".to_string(), "Service reminders".to_string()]);
    }

    #[tokio::test]
    async fn thought_parts_are_not_part_of_the_answer() {
        let router = Router::new().route(
            "/models/:call",
            post(|| async {
                Json(serde_json::json!({
                    "candidates": [{"content": {"parts": [
                        {"text": "Let me plan the tables first.", "thought": true},
                        {"inlineData": {"mimeType": "image/png", "data": "AAAA"}},
                        {"text": VALID_BLUEPRINT}
                    ]}}]
                }))
            }),
        );
        let bp = provider_for(router).await.attempt(&request()).await.unwrap();
        assert_eq!(bp.project_summary, "Fleet maintenance tracker");
    }

    #[tokio::test]
    async fn blocked_prompt_is_empty_response() {
        let router = Router::new().route(
            "/models/:call",
            post(|| async { Json(serde_json::json!({"promptFeedback": {"blockReason": "SAFETY"}})) }),
        );
        let err = provider_for(router).await.attempt(&request()).await.unwrap_err();
        assert!(matches!(err, ProviderError::EmptyResponse));
    }

    #[tokio::test]
    async fn quota_exhaustion_is_rate_limited() {
        let router = Router::new().route(
            "/models/:call",
            post(|| async { (StatusCode::TOO_MANY_REQUESTS, r#"{"error":{"status":"RESOURCE_EXHAUSTED"}}"#) }),
        );
        let err = provider_for(router).await.attempt(&request()).await.unwrap_err();
        assert!(matches!(err, ProviderError::RateLimited(_)));
    }

    #[tokio::test]
    async fn schema_violation_is_rejected_whole() {
        let router = Router::new().route(
            "/models/:call",
            post(|| async {
                Json(serde_json::json!({
                    "candidates": [{"content": {"parts": [{"text": "{\"project_summary\": \"x\", \"mvp_features\": []}"}]}}]
                }))
            }),
        );
        let err = provider_for(router).await.attempt(&request()).await.unwrap_err();
        assert!(matches!(err, ProviderError::Schema(_)));
    }
}
