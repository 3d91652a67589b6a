pub mod factory;
pub mod ollama;
pub mod openai;
pub mod tags;

pub use factory::create_client;
pub use ollama::OllamaClient;
pub use openai::OpenAIClient;

use crate::error::ModelError;
use crate::memory::{Role, Turn};
use crate::traits::ToolDescription;
use serde_json::json;

/// Maps a non-success HTTP status to the model error taxonomy.
pub(crate) fn classify_status(status: reqwest::StatusCode, body: String) -> ModelError {
    let detail = format!("{}: {}", status, body);
    match status.as_u16() {
        401 | 403 => ModelError::Auth(detail),
        429 => ModelError::RateLimited(detail),
        408 | 500..=599 => ModelError::TransientNetwork(detail),
        _ => ModelError::MalformedResponse(detail),
    }
}

pub(crate) fn classify_transport(e: reqwest::Error) -> ModelError {
    if e.is_timeout() {
        ModelError::Timeout
    } else if e.is_decode() {
        ModelError::MalformedResponse(e.to_string())
    } else {
        ModelError::TransientNetwork(e.to_string())
    }
}

/// Wire role and content for a turn. Tool results travel as user messages
/// wrapped in `<tool_result>` tags since no tool-call placeholder is stored.
pub(crate) fn render_turn(turn: &Turn) -> (&'static str, String) {
    match turn.role {
        Role::Tool => (
            "user",
            format!(
                "<tool_result name=\"{}\">\n{}\n</tool_result>",
                turn.tool_name.as_deref().unwrap_or("unknown"),
                turn.content
            ),
        ),
        role => (role.as_str(), turn.content.clone()),
    }
}

/// Every tool takes one free-text argument.
pub(crate) fn tool_parameters() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "input": {
                "type": "string",
                "description": "Input text for the tool"
            }
        },
        "required": ["input"]
    })
}

pub(crate) fn function_tools(tools: &[ToolDescription]) -> Vec<serde_json::Value> {
    tools
        .iter()
        .map(|t| {
            json!({
                "type": "function",
                "function": {
                    "name": t.name,
                    "description": t.description,
                    "parameters": tool_parameters(),
                }
            })
        })
        .collect()
}
