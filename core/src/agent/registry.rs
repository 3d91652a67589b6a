use crate::error::{AgentError, AgentResult};
use crate::traits::{Tool, ToolDescription};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

/// Tools keyed by unique name, kept in registration order.
///
/// Filled at startup through `&mut self`, then shared read-only behind an
/// `Arc` by every session.
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
    index: HashMap<String, usize>,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) -> AgentResult<()> {
        let name = tool.name().to_string();
        if self.index.contains_key(&name) {
            return Err(AgentError::DuplicateTool(name));
        }
        tracing::debug!("Registered tool: {}", name);
        self.index.insert(name, self.tools.len());
        self.tools.push(tool);
        Ok(())
    }

    /// Registers a plain function as a tool.
    pub fn register_fn<F>(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        invoke: F,
    ) -> AgentResult<()>
    where
        F: Fn(&str) -> anyhow::Result<String> + Send + Sync + 'static,
    {
        self.register(Arc::new(FnTool {
            name: name.into(),
            description: description.into(),
            invoke: Box::new(invoke),
        }))
    }

    pub fn lookup(&self, name: &str) -> AgentResult<Arc<dyn Tool>> {
        self.index
            .get(name)
            .map(|&idx| self.tools[idx].clone())
            .ok_or_else(|| AgentError::ToolNotFound(name.to_string()))
    }

    pub fn list_descriptions(&self) -> Vec<ToolDescription> {
        self.tools.iter().map(|t| t.describe()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub async fn invoke(&self, name: &str, argument: &str) -> AgentResult<String> {
        let tool = self.lookup(name)?;
        tool.invoke(argument)
            .await
            .map_err(|e| AgentError::ToolInvocation {
                tool: name.to_string(),
                message: e.to_string(),
            })
    }
}

type InvokeFn = Box<dyn Fn(&str) -> anyhow::Result<String> + Send + Sync>;

struct FnTool {
    name: String,
    description: String,
    invoke: InvokeFn,
}

#[async_trait]
impl Tool for FnTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    async fn invoke(&self, argument: &str) -> anyhow::Result<String> {
        (self.invoke)(argument)
    }
}
