//! Provider selection — turns configuration into a ready provider.

use std::sync::Arc;
use tracebank_config::AppConfig;
use tracebank_core::error::ProviderError;
use tracebank_core::provider::Provider;
use tracebank_core::trajectory::RunMode;
use tracing::debug;

use crate::mock::MockProvider;
use crate::openai_compat::OpenAiCompatProvider;

/// Providers that run locally and accept any key.
const KEYLESS: &[&str] = &["ollama", "vllm", "llamacpp", "llama.cpp"];

/// Build the provider the agent should talk to.
///
/// `mock` (or a configured `default_provider` of `"mock"`) short-circuits to
/// [`MockProvider`]; otherwise the configured provider is built as an
/// OpenAI-compatible endpoint.
pub fn build_from_config(
    config: &AppConfig,
    mode: RunMode,
    mock: bool,
) -> Result<Arc<dyn Provider>, ProviderError> {
    if mock || config.default_provider == "mock" {
        debug!("Using mock provider");
        return Ok(Arc::new(MockProvider::new(mode)));
    }

    let name = config.default_provider.as_str();
    let api_key = config.api_key_for(name).unwrap_or_default();
    if api_key.is_empty() && !KEYLESS.contains(&name) {
        return Err(ProviderError::NotConfigured(format!(
            "no API key for provider '{name}' (set TRACEBANK_API_KEY or OPENAI_API_KEY)"
        )));
    }

    let base_url = config
        .providers
        .get(name)
        .and_then(|p| p.api_url.clone())
        .unwrap_or_else(|| default_base_url(name));

    debug!(provider = name, base_url = %base_url, "Using OpenAI-compatible provider");
    Ok(Arc::new(OpenAiCompatProvider::new(name, base_url, api_key)))
}

/// The model to request: the provider's own default, else the global one.
pub fn model_for(config: &AppConfig) -> String {
    config
        .providers
        .get(&config.default_provider)
        .and_then(|p| p.default_model.clone())
        .unwrap_or_else(|| config.default_model.clone())
}

/// Get the default base URL for well-known providers.
fn default_base_url(provider_name: &str) -> String {
    match provider_name {
        "openrouter" => "https://openrouter.ai/api/v1".into(),
        "openai" => "https://api.openai.com/v1".into(),
        "ollama" => "http://localhost:11434/v1".into(),
        "deepseek" => "https://api.deepseek.com/v1".into(),
        "groq" => "https://api.groq.com/openai/v1".into(),
        "together" => "https://api.together.xyz/v1".into(),
        "vllm" => "http://localhost:8000/v1".into(),
        "llamacpp" | "llama.cpp" => "http://localhost:8080/v1".into(),
        _ => format!("https://{provider_name}.api.example.com/v1"),
    }
}
