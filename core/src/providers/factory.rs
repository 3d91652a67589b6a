use crate::config::Config;
use crate::providers::{OllamaClient, OpenAIClient};
use crate::traits::ModelClient;
use anyhow::{Result, anyhow};
use std::sync::Arc;

pub fn create_client(config: &Config) -> Result<Arc<dyn ModelClient>> {
    let provider_name = config.provider.as_deref().unwrap_or("openai");

    match provider_name.to_lowercase().as_str() {
        "ollama" => {
            let mut client = OllamaClient::new()
                .with_model(config.model.clone())
                .with_temperature(config.temperature);
            if let Some(base_url) = &config.base_url {
                client = client.with_base_url(base_url.clone());
            }
            Ok(Arc::new(client))
        }
        "openai" => {
            let api_key = resolve_api_key_with_fallback(
                &["OPENAI_API_KEY", "PARLEY_OPENAI_API_KEY"],
                &config.api_key,
            )?;
            let mut client = OpenAIClient::new(api_key)
                .with_model(config.model.clone())
                .with_temperature(config.temperature);
            if let Some(base_url) = &config.base_url {
                client = client.with_base_url(base_url.clone());
            }
            Ok(Arc::new(client))
        }
        _ => Err(anyhow!(
            "Unknown provider: {}. Available: openai, ollama",
            provider_name
        )),
    }
}

fn resolve_api_key_with_fallback(env_vars: &[&str], config_key: &str) -> Result<String> {
    for var_name in env_vars {
        if let Ok(key) = std::env::var(var_name)
            && !key.trim().is_empty()
        {
            return Ok(key);
        }
    }
    if !config_key.is_empty() {
        Ok(config_key.to_string())
    } else {
        Err(anyhow!(
            "No API key found. Set OPENAI_API_KEY or run 'parley onboard'."
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selects_ollama_without_key() {
        let config = Config {
            provider: Some("Ollama".into()),
            ..Default::default()
        };
        assert_eq!(create_client(&config).unwrap().name(), "ollama");
    }

    #[test]
    fn rejects_unknown_provider() {
        let config = Config {
            provider: Some("carrier-pigeon".into()),
            ..Default::default()
        };
        let err = create_client(&config).err().unwrap();
        assert!(err.to_string().contains("Unknown provider"));
    }

    #[test]
    fn config_key_is_fallback() {
        let key = resolve_api_key_with_fallback(&["PARLEY_TEST_UNSET_KEY_VAR"], "sk-config")
            .unwrap();
        assert_eq!(key, "sk-config");
        assert!(resolve_api_key_with_fallback(&["PARLEY_TEST_UNSET_KEY_VAR"], "").is_err());
    }
}
