use crate::config::Config;
use crate::providers::{HuggingFaceProvider, OllamaProvider, OpenAIProvider};
use crate::traits::Provider;
use anyhow::{Result, anyhow};

/// Builds the configured backend. Credentials come from the environment
/// first, then the config file.
pub fn create_provider(config: &Config) -> Result<Box<dyn Provider>> {
    let provider_name = config.provider.as_deref().unwrap_or("huggingface");

    match provider_name.to_lowercase().as_str() {
        "huggingface" | "hf" => {
            let token = resolve_api_key_with_fallback(
                &["HF_TOKEN", "HUGGINGFACE_TOKEN"],
                &config.api_key,
            )?;
            let mut provider = HuggingFaceProvider::new(token)
                .with_temperature(config.temperature)
                .with_max_tokens(config.max_tokens);
            if !config.model.is_empty() {
                provider = provider.with_model(config.model.clone());
            }
            if let Some(base_url) = &config.base_url {
                provider = provider.with_base_url(base_url.clone());
            }
            Ok(Box::new(provider))
        }
        "openai" => {
            let api_key =
                resolve_api_key_with_fallback(&["OPENAI_API_KEY"], &config.api_key)?;
            let mut provider = OpenAIProvider::new(api_key)
                .with_temperature(config.temperature)
                .with_max_tokens(config.max_tokens);
            if !config.model.is_empty() {
                provider = provider.with_model(config.model.clone());
            }
            if let Some(base_url) = &config.base_url {
                provider = provider.with_base_url(base_url.clone());
            }
            Ok(Box::new(provider))
        }
        "ollama" => {
            let mut provider = OllamaProvider::new().with_temperature(config.temperature);
            if !config.model.is_empty() {
                provider = provider.with_model(config.model.clone());
            }
            if let Some(base_url) = &config.base_url {
                provider = provider.with_base_url(base_url.clone());
            }
            Ok(Box::new(provider))
        }
        _ => Err(anyhow!(
            "Unknown provider: {}. Available: huggingface, openai, ollama",
            provider_name
        )),
    }
}

fn resolve_api_key_with_fallback(env_vars: &[&str], config_key: &str) -> Result<String> {
    for var_name in env_vars {
        if let Ok(key) = std::env::var(var_name)
            && !key.is_empty()
        {
            return Ok(key);
        }
    }
    if !config_key.is_empty() {
        Ok(config_key.to_string())
    } else {
        Err(anyhow!(
            "No API key found. Set one of {} or add api_key to the config.",
            env_vars.join(", ")
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_provider_is_rejected() {
        let config = Config {
            provider: Some("carrier-pigeon".into()),
            ..Default::default()
        };
        let err = create_provider(&config).unwrap_err();
        assert!(err.to_string().contains("carrier-pigeon"));
    }

    #[test]
    fn ollama_needs_no_key() {
        let config = Config {
            provider: Some("ollama".into()),
            model: "mistral".into(),
            ..Default::default()
        };
        assert!(create_provider(&config).is_ok());
    }

    #[test]
    fn config_key_is_a_fallback() {
        let config = Config {
            provider: Some("openai".into()),
            api_key: "sk-from-config".into(),
            ..Default::default()
        };
        assert!(create_provider(&config).is_ok());
    }
}
