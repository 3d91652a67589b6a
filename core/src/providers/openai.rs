use crate::error::ModelError;
use crate::providers::{classify_status, classify_transport, function_tools, render_turn, tags};
use crate::traits::{AgentResponse, ModelClient, Request, ToolCallRequest};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<serde_json::Value>>,
    temperature: f64,
}

#[derive(Debug, Serialize)]
struct OpenAIMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponseMessage {
    content: Option<String>,
    tool_calls: Option<Vec<OpenAIToolCall>>,
}

#[derive(Debug, Deserialize)]
struct OpenAIToolCall {
    function: OpenAIFunction,
}

#[derive(Debug, Deserialize)]
struct OpenAIFunction {
    name: String,
    arguments: String,
}

pub struct OpenAIClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    temperature: f64,
}

impl OpenAIClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .connect_timeout(std::time::Duration::from_secs(30))
            .build()
            .unwrap_or_default();

        Self {
            client,
            api_key: api_key.into(),
            model: "gpt-3.5-turbo".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            temperature: 0.7,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    fn build_request(&self, request: &Request) -> OpenAIRequest {
        OpenAIRequest {
            model: self.model.clone(),
            messages: request
                .messages
                .iter()
                .map(|turn| {
                    let (role, content) = render_turn(turn);
                    OpenAIMessage { role, content }
                })
                .collect(),
            tools: request.has_tools().then(|| function_tools(&request.tools)),
            temperature: self.temperature,
        }
    }
}

/// The function argument is a JSON object carrying `input`; anything else is
/// passed through verbatim.
fn function_argument(arguments: &str) -> String {
    match serde_json::from_str::<serde_json::Value>(arguments) {
        Ok(serde_json::Value::Object(map)) => match map.get("input") {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => arguments.to_string(),
        },
        _ => arguments.to_string(),
    }
}

fn into_agent_response(response: OpenAIResponse) -> Result<AgentResponse, ModelError> {
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| ModelError::MalformedResponse("no choices in response".into()))?;

    let mut tool_calls = choice.message.tool_calls.unwrap_or_default();
    if !tool_calls.is_empty() {
        if tool_calls.len() > 1 {
            tracing::warn!(
                "Model requested {} tool calls, dispatching the first",
                tool_calls.len()
            );
        }
        let call = tool_calls.swap_remove(0);
        return Ok(AgentResponse::ToolCall(ToolCallRequest::new(
            call.function.name,
            function_argument(&call.function.arguments),
        )));
    }

    let content = choice.message.content.unwrap_or_default();
    if content.trim().is_empty() {
        return Err(ModelError::MalformedResponse(
            "empty response: no content or tool calls".into(),
        ));
    }

    match tags::parse_tool_call(&content) {
        (_, Some(call)) => Ok(AgentResponse::ToolCall(call)),
        (_, None) => Ok(AgentResponse::Text(content)),
    }
}

#[async_trait]
impl ModelClient for OpenAIClient {
    async fn complete(&self, request: &Request) -> Result<AgentResponse, ModelError> {
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&self.build_request(request))
            .send()
            .await
            .map_err(classify_transport)?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(classify_status(status, error_text));
        }

        let body = response.text().await.map_err(classify_transport)?;
        let parsed: OpenAIResponse = serde_json::from_str(&body)
            .map_err(|e| ModelError::MalformedResponse(e.to_string()))?;
        into_agent_response(parsed)
    }

    fn name(&self) -> &str {
        "openai"
    }
}
