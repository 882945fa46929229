use crate::types::Provider;
use std::env;

/// Runtime configuration, read once from the Lambda environment at startup.
///
/// Provider API keys are optional on purpose: a missing key only fails the
/// call that needs it (as `ProviderUnavailable`), so a deployment with a
/// single configured backend still works.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub table_name: String,
    pub default_provider: Provider,
    pub openai_api_key: Option<String>,
    pub gemini_api_key: Option<String>,
    pub replicate_api_token: Option<String>,
    /// Upper bound for any single provider call, in seconds.
    pub provider_timeout_secs: u64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let default_provider = env::var("IMAGE_PROVIDER")
            .ok()
            .and_then(|v| v.parse::<Provider>().ok())
            .unwrap_or(Provider::Gemini);

        AppConfig {
            table_name: env::var("TABLE_NAME").unwrap_or_else(|_| "mirage".to_string()),
            default_provider,
            openai_api_key: non_empty(env::var("OPENAI_API_KEY").ok()),
            gemini_api_key: non_empty(env::var("GEMINI_API_KEY").ok()),
            replicate_api_token: non_empty(env::var("REPLICATE_API_TOKEN").ok()),
            provider_timeout_secs: env::var("PROVIDER_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(120),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
