use std::{path::PathBuf, time::Duration};

/// Values that mean "not configured" even though the variable is set.
const PLACEHOLDER_KEYS: [&str; 3] = ["your_openai_api_key_here", "your_gemini_api_key_here", "DEMO_KEY"];

const DEFAULT_PORT: u16 = 4000;
const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderSettings {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub port: u16,
    pub database_path: Option<PathBuf>,
    pub openai: Option<ProviderSettings>,
    pub gemini: Option<ProviderSettings>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let timeout = Duration::from_secs(
            get("PROVIDER_TIMEOUT_SECS").and_then(|v| v.parse().ok()).unwrap_or(DEFAULT_TIMEOUT_SECS),
        );

        let provider = |key_var: &str, base_var: &str, base: &str, model_var: &str, model: &str| {
            get(key_var)
                .filter(|k| !PLACEHOLDER_KEYS.contains(&k.as_str()))
                .map(|api_key| ProviderSettings {
                    api_key,
                    base_url: get(base_var).unwrap_or_else(|| base.to_string()).trim_end_matches('/').to_string(),
                    model: get(model_var).unwrap_or_else(|| model.to_string()),
                    timeout,
                })
        };

        Self {
            port: get("PORT").and_then(|v| v.parse().ok()).unwrap_or(DEFAULT_PORT),
            database_path: get("DATABASE_PATH").map(PathBuf::from),
            openai: provider(
                "OPENAI_API_KEY",
                "OPENAI_API_BASE",
                "https://api.openai.com/v1",
                "OPENAI_MODEL",
                "gpt-3.5-turbo",
            ),
            gemini: provider(
                "GEMINI_API_KEY",
                "GEMINI_API_BASE",
                "https://generativelanguage.googleapis.com/v1beta",
                "GEMINI_MODEL",
                "gemini-2.0-flash",
            ),
        }
    }
}
