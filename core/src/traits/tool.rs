use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Prompt-facing view of a registered tool.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToolDescription {
    pub name: String,
    pub description: String,
}

#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// Runs the tool on the model-supplied argument text.
    async fn invoke(&self, argument: &str) -> anyhow::Result<String>;

    fn describe(&self) -> ToolDescription {
        ToolDescription {
            name: self.name().to_string(),
            description: self.description().to_string(),
        }
    }
}
