use crate::error::ModelError;
use crate::memory::Turn;
use crate::traits::ToolDescription;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToolCallRequest {
    pub tool_name: String,
    pub argument: String,
}

impl ToolCallRequest {
    pub fn new(tool_name: impl Into<String>, argument: impl Into<String>) -> Self {
        Self {
            tool_name: tool_name.into(),
            argument: argument.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentResponse {
    Text(String),
    ToolCall(ToolCallRequest),
}

/// A model-ready request: ordered messages plus the tools the model may call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Request {
    pub messages: Vec<Turn>,
    pub tools: Vec<ToolDescription>,
}

impl Request {
    /// Appends turns produced while the current exchange is in flight.
    pub fn with_scratchpad(mut self, scratchpad: &[Turn]) -> Self {
        self.messages.extend_from_slice(scratchpad);
        self
    }

    pub fn has_tools(&self) -> bool {
        !self.tools.is_empty()
    }
}

/// The model backend. Implementations may block for a long time; the agent
/// loop applies its own timeout around `complete`.
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn complete(&self, request: &Request) -> Result<AgentResponse, ModelError>;

    fn name(&self) -> &str {
        "model"
    }
}
