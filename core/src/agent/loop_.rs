use crate::agent::{PromptAssembler, ToolRegistry};
use crate::config::AgentConfig;
use crate::error::{AgentError, AgentResult, ConfigError, ModelError};
use crate::memory::{Conversation, ERROR_NOTE_PREFIX, MemoryStore, Turn};
use crate::traits::{AgentResponse, ModelClient, Request, ToolDescription};
use std::sync::Arc;
use tracing::{debug, error, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoopState {
    AwaitingInput,
    Assembling,
    ModelCalling,
    Responding,
    Dispatching,
    MemoryUpdating,
}

/// Drives one session: prompt assembly, model call, optional tool dispatch
/// and memory update, until the model produces text.
pub struct AgentLoop {
    client: Arc<dyn ModelClient>,
    assembler: PromptAssembler,
    tool_registry: Arc<ToolRegistry>,
    memory: MemoryStore,
    config: AgentConfig,
}

impl AgentLoop {
    pub fn new(
        client: Arc<dyn ModelClient>,
        tool_registry: Arc<ToolRegistry>,
        memory: MemoryStore,
        config: AgentConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            client,
            assembler: PromptAssembler::new(config.require_system_prompt),
            tool_registry,
            memory,
            config,
        })
    }

    pub fn with_max_tool_iterations(mut self, max: usize) -> Result<Self, ConfigError> {
        self.config.max_tool_iterations = max;
        self.config.validate()?;
        Ok(self)
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = prompt.into();
        self
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn memory(&self) -> &MemoryStore {
        &self.memory
    }

    pub fn conversation(&self) -> &Conversation {
        self.memory.conversation()
    }

    pub fn tools(&self) -> Vec<ToolDescription> {
        self.tool_registry.list_descriptions()
    }

    pub fn clear(&mut self) {
        self.memory.clear();
    }

    /// Summary of the whole conversation for display.
    pub async fn summary(&self) -> String {
        let turns = self.memory.conversation().turns();
        if turns.is_empty() {
            return "No conversation yet.".to_string();
        }
        let Some(summarizer) = self.memory.summarizer() else {
            return "Unable to generate summary.".to_string();
        };
        match tokio::time::timeout(self.config.model_timeout(), summarizer.summarize(turns)).await
        {
            Ok(Ok(summary)) if !summary.trim().is_empty() => summary,
            Ok(Ok(_)) => "No conversation yet.".to_string(),
            Ok(Err(e)) => {
                warn!("Failed to summarize conversation: {}", e);
                "Unable to generate summary.".to_string()
            }
            Err(_) => {
                warn!("Conversation summary timed out");
                "Unable to generate summary.".to_string()
            }
        }
    }

    fn transition(&self, state: LoopState) {
        debug!(state = ?state, turns = self.memory.len(), "Agent loop transition");
    }

    /// Processes one user turn and returns the assistant's reply.
    ///
    /// Dropping the returned future cancels the turn. Tool invocations that
    /// already ran are not rolled back, and their result turns stay in memory.
    pub async fn submit(&mut self, user_text: &str) -> AgentResult<String> {
        self.transition(LoopState::AwaitingInput);
        if user_text.trim().is_empty() {
            return Err(ConfigError::new("user_input", "must not be empty").into());
        }

        self.memory.append(Turn::user(user_text));

        let outcome = self.run_exchange(user_text).await;

        let result = match outcome {
            Ok(text) => {
                self.memory.append(Turn::assistant(text.clone()));
                Ok(text)
            }
            Err(e) if e.is_noted() => {
                error!("Turn failed: {}", e);
                self.memory
                    .append(Turn::system(format!("{} {}", ERROR_NOTE_PREFIX, e)));
                Err(e)
            }
            Err(e) => Err(e),
        };

        self.transition(LoopState::MemoryUpdating);
        self.memory.compact().await;
        result
    }

    async fn run_exchange(&mut self, user_text: &str) -> AgentResult<String> {
        // Turns of this exchange: the user turn plus one per tool result.
        let mut exchange_len = 1;
        let mut dispatches = 0;

        loop {
            self.transition(LoopState::Assembling);
            let request = self.build_request(user_text, exchange_len)?;

            self.transition(LoopState::ModelCalling);
            match self.call_model(&request).await? {
                AgentResponse::Text(content) => {
                    self.transition(LoopState::Responding);
                    return Ok(content);
                }
                AgentResponse::ToolCall(call) => {
                    if dispatches >= self.config.max_tool_iterations {
                        return Err(AgentError::MaxIterationsExceeded {
                            limit: self.config.max_tool_iterations,
                        });
                    }

                    self.transition(LoopState::Dispatching);
                    debug!(tool = %call.tool_name, "Dispatching tool call");
                    let output = self
                        .tool_registry
                        .invoke(&call.tool_name, &call.argument)
                        .await?;

                    self.memory.append(Turn::tool_result(call.tool_name, output));
                    exchange_len += 1;
                    dispatches += 1;
                }
            }
        }
    }

    fn build_request(&self, user_text: &str, exchange_len: usize) -> AgentResult<Request> {
        let history = self.memory.window_before(exchange_len);
        let turns = self.memory.conversation().turns();
        let scratchpad = &turns[turns.len() + 1 - exchange_len..];

        let request = self.assembler.assemble(
            &self.config.system_prompt,
            &history,
            &self.tool_registry.list_descriptions(),
            user_text,
        )?;
        Ok(request.with_scratchpad(scratchpad))
    }

    async fn call_model(&self, request: &Request) -> AgentResult<AgentResponse> {
        let mut attempt: u32 = 0;

        loop {
            let result = match tokio::time::timeout(
                self.config.model_timeout(),
                self.client.complete(request),
            )
            .await
            {
                Ok(result) => result,
                Err(_) => Err(ModelError::Timeout),
            };

            match result {
                Ok(response) => return Ok(response),
                Err(e) if e.is_retryable() && (attempt as usize) < self.config.model_retry_limit => {
                    let delay = self
                        .config
                        .retry_backoff()
                        .saturating_mul(2u32.saturating_pow(attempt));
                    warn!(
                        "Model call to {} failed ({}), retrying in {:?}",
                        self.client.name(),
                        e,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}
