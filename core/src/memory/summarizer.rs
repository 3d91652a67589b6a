use crate::memory::{Role, Turn};
use crate::traits::{AgentResponse, ModelClient, Request, Summarizer};
use async_trait::async_trait;
use std::fmt::Write;
use std::sync::Arc;

const MAX_SOURCE_CHARS: usize = 12_000;

const SUMMARY_SYSTEM_PROMPT: &str = "You are a conversation summarizer. Summarize the following conversation into a concise context that preserves: user preferences, decisions, unresolved tasks, and key facts. Keep it under 2000 characters.";

/// Summarizer backed by the same model client the agent talks to.
pub struct ModelSummarizer {
    client: Arc<dyn ModelClient>,
}

impl ModelSummarizer {
    pub fn new(client: Arc<dyn ModelClient>) -> Self {
        Self { client }
    }
}

pub(crate) fn build_transcript(turns: &[Turn]) -> String {
    let mut transcript = String::new();
    for turn in turns {
        let role = match (&turn.role, &turn.tool_name) {
            (Role::Tool, Some(name)) => format!("TOOL({})", name),
            (role, _) => role.as_str().to_uppercase(),
        };
        let _ = writeln!(transcript, "{}: {}", role, turn.content.trim());
    }

    if transcript.chars().count() > MAX_SOURCE_CHARS {
        let truncated: String = transcript.chars().take(MAX_SOURCE_CHARS).collect();
        format!("{}...", truncated)
    } else {
        transcript
    }
}

#[async_trait]
impl Summarizer for ModelSummarizer {
    async fn summarize(&self, turns: &[Turn]) -> anyhow::Result<String> {
        let request = Request {
            messages: vec![
                Turn::system(SUMMARY_SYSTEM_PROMPT),
                Turn::user(format!(
                    "Summarize this conversation:\n\n{}",
                    build_transcript(turns)
                )),
            ],
            tools: vec![],
        };

        match self.client.complete(&request).await? {
            AgentResponse::Text(summary) => Ok(summary.trim().to_string()),
            AgentResponse::ToolCall(call) => Err(anyhow::anyhow!(
                "summarizer asked for tool '{}' instead of answering",
                call.tool_name
            )),
        }
    }
}
