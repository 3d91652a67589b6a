use crate::error::ConfigError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

const PARLEY_DIR: &str = ".parley";

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful AI assistant with access to tools. \
Use the tools when appropriate to help answer questions. \
Always be friendly and explain what you're doing when using tools.";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum MemoryPolicy {
    #[default]
    Full,
    Summarized,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AgentConfig {
    pub memory_policy: MemoryPolicy,
    pub memory_window_tokens: usize,
    pub summarize_threshold: usize,
    pub retain_recent_turns: usize,
    pub max_tool_iterations: usize,
    pub model_retry_limit: usize,
    pub model_timeout_secs: u64,
    pub retry_backoff_ms: u64,
    pub system_prompt: String,
    pub require_system_prompt: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            memory_policy: MemoryPolicy::Full,
            memory_window_tokens: 1000,
            summarize_threshold: 20,
            retain_recent_turns: 4,
            max_tool_iterations: 5,
            model_retry_limit: 2,
            model_timeout_secs: 60,
            retry_backoff_ms: 250,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            require_system_prompt: true,
        }
    }
}

impl AgentConfig {
    pub fn model_timeout(&self) -> Duration {
        Duration::from_secs(self.model_timeout_secs)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.memory_window_tokens == 0 {
            return Err(ConfigError::new("memory_window_tokens", "must be greater than 0"));
        }
        if self.max_tool_iterations == 0 {
            return Err(ConfigError::new("max_tool_iterations", "must be at least 1"));
        }
        if self.model_timeout_secs == 0 {
            return Err(ConfigError::new("model_timeout_secs", "must be greater than 0"));
        }
        if self.memory_policy == MemoryPolicy::Summarized
            && self.summarize_threshold <= self.retain_recent_turns
        {
            return Err(ConfigError::new(
                "summarize_threshold",
                format!(
                    "must be greater than retain_recent_turns ({})",
                    self.retain_recent_turns
                ),
            ));
        }
        if self.require_system_prompt && self.system_prompt.trim().is_empty() {
            return Err(ConfigError::new("system_prompt", "must not be empty"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub provider: Option<String>,
    pub api_key: String,
    pub base_url: Option<String>,
    pub model: String,
    pub temperature: f64,
    pub agent: AgentConfig,
    #[serde(skip)]
    pub sessions_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            provider: None,
            api_key: String::new(),
            base_url: None,
            model: "gpt-3.5-turbo".to_string(),
            temperature: 0.7,
            agent: AgentConfig::default(),
            sessions_dir: get_parley_dir().join("sessions"),
        }
    }
}

pub fn get_parley_dir() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(PARLEY_DIR)
}

pub fn get_config_path() -> PathBuf {
    get_parley_dir().join("config.toml")
}

pub fn ensure_parley_dir() -> Result<PathBuf> {
    let parley_dir = get_parley_dir();

    if !parley_dir.exists() {
        std::fs::create_dir_all(&parley_dir).with_context(|| {
            format!(
                "Failed to create parley directory at {}",
                parley_dir.display()
            )
        })?;
    }

    Ok(parley_dir)
}

impl Config {
    pub fn load_or_init() -> Result<Self> {
        if config_exists() {
            load_config()
        } else {
            Ok(Config::default())
        }
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let mut config: Config = toml::from_str(content)?;
        config.agent.validate()?;
        config.sessions_dir = get_parley_dir().join("sessions");
        Ok(config)
    }
}

pub fn load_config() -> Result<Config> {
    let config_path = get_config_path();

    let content = std::fs::read_to_string(&config_path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            anyhow::anyhow!(
                "Config file not found. Run 'parley onboard' to set up your configuration."
            )
        } else {
            anyhow::anyhow!("Failed to read config from {}: {}", config_path.display(), e)
        }
    })?;

    Config::from_toml(&content)
        .with_context(|| format!("Failed to parse config from {}", config_path.display()))
}

pub fn save_config(config: &Config) -> Result<()> {
    ensure_parley_dir()?;

    let config_path = get_config_path();
    let content =
        toml::to_string_pretty(config).with_context(|| "Failed to serialize config to TOML")?;

    std::fs::write(&config_path, content)
        .with_context(|| format!("Failed to write config to {}", config_path.display()))?;

    Ok(())
}

pub fn config_exists() -> bool {
    get_config_path().exists()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(AgentConfig::default().validate().is_ok());
        let summarized = AgentConfig {
            memory_policy: MemoryPolicy::Summarized,
            ..Default::default()
        };
        assert!(summarized.validate().is_ok());
    }

    #[test]
    fn rejects_zero_iterations() {
        let config = AgentConfig {
            max_tool_iterations: 0,
            ..Default::default()
        };
        assert_eq!(config.validate().unwrap_err().option, "max_tool_iterations");
    }

    #[test]
    fn rejects_threshold_not_above_retained() {
        let config = AgentConfig {
            memory_policy: MemoryPolicy::Summarized,
            summarize_threshold: 4,
            retain_recent_turns: 4,
            ..Default::default()
        };
        assert_eq!(config.validate().unwrap_err().option, "summarize_threshold");

        let full = AgentConfig {
            summarize_threshold: 4,
            retain_recent_turns: 4,
            ..Default::default()
        };
        assert!(full.validate().is_ok());
    }

    #[test]
    fn rejects_empty_required_system_prompt() {
        let config = AgentConfig {
            system_prompt: "   ".into(),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let optional = AgentConfig {
            system_prompt: String::new(),
            require_system_prompt: false,
            ..Default::default()
        };
        assert!(optional.validate().is_ok());
    }

    #[test]
    fn parses_partial_toml() {
        let config = Config::from_toml(
            r#"
model = "gpt-4"

[agent]
memory_policy = "summarized"
summarize_threshold = 6
model_timeout_secs = 5
"#,
        )
        .unwrap();
        assert_eq!(config.model, "gpt-4");
        assert_eq!(config.agent.memory_policy, MemoryPolicy::Summarized);
        assert_eq!(config.agent.summarize_threshold, 6);
        assert_eq!(config.agent.retain_recent_turns, 4);
        assert_eq!(config.agent.model_timeout(), Duration::from_secs(5));
        assert_eq!(config.temperature, 0.7);
    }

    #[test]
    fn invalid_agent_section_fails_to_load() {
        let err = Config::from_toml("[agent]\nmax_tool_iterations = 0\n").unwrap_err();
        assert!(err.downcast_ref::<ConfigError>().is_some());
    }

    #[test]
    fn toml_round_trip() {
        let config = Config::default();
        let content = toml::to_string_pretty(&config).unwrap();
        let parsed = Config::from_toml(&content).unwrap();
        assert_eq!(parsed.agent, config.agent);
        assert_eq!(parsed.model, config.model);
    }
}
