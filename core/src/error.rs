use thiserror::Error;

/// Failures reported by a [`ModelClient`](crate::traits::ModelClient).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("model call timed out")]
    Timeout,

    #[error("model authentication failed: {0}")]
    Auth(String),

    #[error("model rate limited: {0}")]
    RateLimited(String),

    #[error("malformed model response: {0}")]
    MalformedResponse(String),

    #[error("transient network error: {0}")]
    TransientNetwork(String),
}

impl ModelError {
    /// Timeouts and transient network failures are retried by the agent loop.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout | Self::TransientNetwork(_))
    }
}

/// Invalid configuration option.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid configuration `{option}`: {reason}")]
pub struct ConfigError {
    pub option: String,
    pub reason: String,
}

impl ConfigError {
    pub fn new(option: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            option: option.into(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum AgentError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("tool '{0}' is already registered")]
    DuplicateTool(String),

    #[error("tool '{0}' not found")]
    ToolNotFound(String),

    #[error("tool '{tool}' failed: {message}")]
    ToolInvocation { tool: String, message: String },

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("tool iteration limit of {limit} exceeded")]
    MaxIterationsExceeded { limit: usize },

    #[error("conversation serialization failed: {0}")]
    Serialization(String),

    #[error("session '{0}' not found")]
    SessionNotFound(String),
}

impl From<serde_json::Error> for AgentError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

impl AgentError {
    /// Errors after which the conversation gets a system note before surfacing.
    pub fn is_noted(&self) -> bool {
        matches!(
            self,
            Self::ToolNotFound(_)
                | Self::ToolInvocation { .. }
                | Self::Model(_)
                | Self::MaxIterationsExceeded { .. }
        )
    }
}

pub type AgentResult<T> = std::result::Result<T, AgentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_model_errors() {
        assert!(ModelError::Timeout.is_retryable());
        assert!(ModelError::TransientNetwork("reset".into()).is_retryable());
        assert!(!ModelError::Auth("bad key".into()).is_retryable());
        assert!(!ModelError::RateLimited("slow down".into()).is_retryable());
        assert!(!ModelError::MalformedResponse("{".into()).is_retryable());
    }

    #[test]
    fn config_and_serialization_are_not_noted() {
        assert!(!AgentError::from(ConfigError::new("x", "y")).is_noted());
        assert!(!AgentError::Serialization("eof".into()).is_noted());
        assert!(AgentError::ToolNotFound("nope".into()).is_noted());
        assert!(AgentError::MaxIterationsExceeded { limit: 2 }.is_noted());
    }

    #[test]
    fn error_messages() {
        let err = AgentError::ToolInvocation {
            tool: "calculate_math".into(),
            message: "division by zero".into(),
        };
        assert_eq!(err.to_string(), "tool 'calculate_math' failed: division by zero");
        assert_eq!(
            ConfigError::new("max_tool_iterations", "must be at least 1").to_string(),
            "invalid configuration `max_tool_iterations`: must be at least 1"
        );
    }
}
