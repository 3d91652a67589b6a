use crate::error::{AgentResult, ConfigError};
use crate::memory::Turn;
use crate::traits::{Request, ToolDescription};
use std::fmt::Write;

/// Builds model requests. Pure: the same inputs always give the same request.
#[derive(Debug, Clone)]
pub struct PromptAssembler {
    require_system_instructions: bool,
}

impl Default for PromptAssembler {
    fn default() -> Self {
        Self::new(true)
    }
}

impl PromptAssembler {
    pub fn new(require_system_instructions: bool) -> Self {
        Self {
            require_system_instructions,
        }
    }

    /// Orders the request as: system instructions, memory window, tool
    /// catalogue (only when tools exist), then the new user turn.
    pub fn assemble(
        &self,
        system_instructions: &str,
        window: &[Turn],
        tool_descriptions: &[ToolDescription],
        user_input: &str,
    ) -> AgentResult<Request> {
        let instructions = system_instructions.trim();
        if instructions.is_empty() && self.require_system_instructions {
            return Err(ConfigError::new("system_prompt", "must not be empty").into());
        }
        if user_input.trim().is_empty() {
            return Err(ConfigError::new("user_input", "must not be empty").into());
        }

        let mut messages = Vec::with_capacity(window.len() + 3);
        if !instructions.is_empty() {
            messages.push(Turn::system(instructions));
        }
        messages.extend_from_slice(window);
        if !tool_descriptions.is_empty() {
            messages.push(Turn::system(tool_catalogue(tool_descriptions)));
        }
        messages.push(Turn::user(user_input));

        Ok(Request {
            messages,
            tools: tool_descriptions.to_vec(),
        })
    }
}

fn tool_catalogue(tools: &[ToolDescription]) -> String {
    let mut instructions = String::new();
    instructions.push_str("## Tool Use Protocol\n\n");
    instructions.push_str("Call a tool when it helps answer the user. ");
    instructions.push_str("If native function calling is unavailable, wrap a JSON object in <tool_call> tags:\n\n");
    instructions.push_str("```\n<tool_call>\n{\"name\": \"tool_name\", \"input\": \"argument text\"}\n</tool_call>\n```\n\n");
    instructions.push_str("Call one tool at a time. ");
    instructions.push_str("Tool output appears in <tool_result> tags. ");
    instructions.push_str("Continue reasoning with the results until you can give a final answer.\n\n");
    instructions.push_str("### Available Tools\n\n");

    for tool in tools {
        let _ = writeln!(instructions, "**{}**: {}", tool.name, tool.description);
    }

    instructions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AgentError;
    use crate::memory::Role;

    fn tools() -> Vec<ToolDescription> {
        vec![ToolDescription {
            name: "calculate_math".into(),
            description: "Calculate mathematical expressions".into(),
        }]
    }

    #[test]
    fn orders_system_window_tools_user() {
        let window = vec![Turn::user("hi"), Turn::assistant("hello")];
        let request = PromptAssembler::default()
            .assemble("be helpful", &window, &tools(), "2+2?")
            .unwrap();

        let roles: Vec<_> = request.messages.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![Role::System, Role::User, Role::Assistant, Role::System, Role::User]
        );
        assert_eq!(request.messages[0].content, "be helpful");
        assert!(request.messages[3].content.contains("**calculate_math**"));
        assert_eq!(request.messages[4].content, "2+2?");
        assert_eq!(request.tools, tools());
    }

    #[test]
    fn omits_catalogue_without_tools() {
        let request = PromptAssembler::default()
            .assemble("be helpful", &[], &[], "hello")
            .unwrap();
        assert_eq!(request.messages.len(), 2);
        assert!(!request.has_tools());
    }

    #[test]
    fn is_deterministic() {
        let assembler = PromptAssembler::default();
        let window = vec![Turn::tool_result("clock", "10:00")];
        let a = assembler.assemble("sys", &window, &tools(), "time?").unwrap();
        let b = assembler.assemble("sys", &window, &tools(), "time?").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn empty_instructions_rejected_when_required() {
        let err = PromptAssembler::new(true)
            .assemble("  ", &[], &[], "hello")
            .unwrap_err();
        assert!(matches!(err, AgentError::Config(_)));

        let request = PromptAssembler::new(false)
            .assemble("", &[], &[], "hello")
            .unwrap();
        assert_eq!(request.messages, vec![Turn::user("hello")]);
    }

    #[test]
    fn blank_user_input_rejected() {
        assert!(PromptAssembler::default().assemble("sys", &[], &[], "\n").is_err());
    }

    #[test]
    fn scratchpad_follows_user_turn() {
        let request = PromptAssembler::default()
            .assemble("sys", &[], &tools(), "2+2?")
            .unwrap()
            .with_scratchpad(&[Turn::tool_result("calculate_math", "Result: 4")]);
        let last = request.messages.last().unwrap();
        assert_eq!(last.role, Role::Tool);
        assert_eq!(request.messages[request.messages.len() - 2].content, "2+2?");
    }
}
