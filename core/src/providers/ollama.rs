use crate::error::ModelError;
use crate::providers::{classify_status, classify_transport, function_tools, render_turn, tags};
use crate::traits::{AgentResponse, ModelClient, Request, ToolCallRequest};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    messages: Vec<OllamaMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<serde_json::Value>>,
    options: OllamaOptions,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct OllamaMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f64,
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    message: OllamaResponseMessage,
}

#[derive(Debug, Deserialize)]
struct OllamaResponseMessage {
    content: Option<String>,
    tool_calls: Option<Vec<OllamaToolCallResponse>>,
}

#[derive(Debug, Deserialize)]
struct OllamaToolCallResponse {
    function: OllamaFunctionResponse,
}

#[derive(Debug, Deserialize)]
struct OllamaFunctionResponse {
    name: String,
    #[serde(default)]
    arguments: serde_json::Value,
}

pub struct OllamaClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
    temperature: f64,
}

impl OllamaClient {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(300))
            .connect_timeout(std::time::Duration::from_secs(30))
            .build()
            .unwrap_or_default();

        Self {
            client,
            base_url: "http://localhost:11434".to_string(),
            model: "llama3.2".to_string(),
            temperature: 0.7,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let url = base_url.into();
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    fn build_request(&self, request: &Request) -> OllamaRequest {
        OllamaRequest {
            model: self.model.clone(),
            messages: request
                .messages
                .iter()
                .map(|turn| {
                    let (role, content) = render_turn(turn);
                    OllamaMessage { role, content }
                })
                .collect(),
            tools: request.has_tools().then(|| function_tools(&request.tools)),
            options: OllamaOptions {
                temperature: self.temperature,
            },
            stream: false,
        }
    }
}

impl Default for OllamaClient {
    fn default() -> Self {
        Self::new()
    }
}

fn into_agent_response(response: OllamaResponse) -> Result<AgentResponse, ModelError> {
    let message = response.message;

    if let Some(call) = message.tool_calls.and_then(|calls| calls.into_iter().next()) {
        let argument = match call.function.arguments {
            serde_json::Value::Object(map) => {
                let input = map.get("input").and_then(|v| v.as_str()).map(str::to_string);
                input.unwrap_or_else(|| serde_json::Value::Object(map).to_string())
            }
            serde_json::Value::String(s) => s,
            serde_json::Value::Null => String::new(),
            other => other.to_string(),
        };
        return Ok(AgentResponse::ToolCall(ToolCallRequest::new(
            call.function.name,
            argument,
        )));
    }

    let content = message.content.unwrap_or_default();
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
impl ModelClient for OllamaClient {
    async fn complete(&self, request: &Request) -> Result<AgentResponse, ModelError> {
        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
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
        let parsed: OllamaResponse = serde_json::from_str(&body)
            .map_err(|e| ModelError::MalformedResponse(e.to_string()))?;
        into_agent_response(parsed)
    }

    fn name(&self) -> &str {
        "ollama"
    }
}
