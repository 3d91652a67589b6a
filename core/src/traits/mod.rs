pub mod provider;
pub mod summarizer;
pub mod tool;

pub use provider::{AgentResponse, ModelClient, Request, ToolCallRequest};
pub use summarizer::Summarizer;
pub use tool::{Tool, ToolDescription};
