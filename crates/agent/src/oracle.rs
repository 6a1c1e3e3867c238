//! Completion oracle interface and its OpenAI-compatible HTTP client.
//!
//! The oracle is an opaque text-completion service with tool-calling: given
//! a system instruction, the conversation so far, and a declared tool
//! catalog, it returns text and/or correlated tool-call requests. Callers
//! own all retry and fallback semantics; this layer only reports failures.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use swapdesk_core::chat::{ChatEntry, ToolCall};
use swapdesk_core::config::LlmConfig;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OracleError {
    #[error("oracle request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("oracle returned status {status}: {body}")]
    Api { status: u16, body: String },
    #[error("oracle reply was malformed: {0}")]
    Decode(String),
}

/// Declared signature of one registry tool: zero or one string parameter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub parameter: Option<ToolParam>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToolParam {
    pub name: String,
    pub description: String,
}

impl ToolSpec {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self { name: name.into(), description: description.into(), parameter: None }
    }

    pub fn with_parameter(
        mut self,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        self.parameter = Some(ToolParam { name: name.into(), description: description.into() });
        self
    }
}

/// One completion call: system instruction, conversation, tool catalog.
#[derive(Clone, Debug, Default)]
pub struct OracleRequest {
    pub system: Option<String>,
    pub turns: Vec<ChatEntry>,
    pub tools: Vec<ToolSpec>,
}

impl OracleRequest {
    pub fn classification(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: Some(system.into()),
            turns: vec![ChatEntry::user(user)],
            tools: Vec::new(),
        }
    }
}

/// The oracle's reply: free text, tool-call requests, or both.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Completion {
    pub content: Option<String>,
    pub tool_calls: Vec<ToolCall>,
}

impl Completion {
    pub fn text(content: impl Into<String>) -> Self {
        Self { content: Some(content.into()), tool_calls: Vec::new() }
    }

    pub fn calls(tool_calls: Vec<ToolCall>) -> Self {
        Self { content: None, tool_calls }
    }

    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

#[async_trait]
pub trait CompletionOracle: Send + Sync {
    async fn complete(&self, request: OracleRequest) -> Result<Completion, OracleError>;
}

/// OpenAI-compatible `/chat/completions` client.
pub struct HttpOracle {
    http: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<SecretString>,
    temperature: f32,
    max_tokens: u32,
}

impl HttpOracle {
    pub fn from_config(config: &LlmConfig) -> Result<Self, OracleError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }
}

#[async_trait]
impl CompletionOracle for HttpOracle {
    async fn complete(&self, request: OracleRequest) -> Result<Completion, OracleError> {
        let body = WireRequest {
            model: &self.model,
            messages: wire_messages(&request),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            tools: wire_tools(&request.tools),
        };

        let mut http_request =
            self.http.post(format!("{}/chat/completions", self.base_url)).json(&body);
        if let Some(api_key) = &self.api_key {
            http_request = http_request.bearer_auth(api_key.expose_secret());
        }

        let response = http_request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OracleError::Api { status: status.as_u16(), body });
        }

        let reply: WireResponse = response.json().await?;
        let choice = reply
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| OracleError::Decode("reply carried no choices".to_string()))?;

        let mut tool_calls = Vec::new();
        for call in choice.message.tool_calls.unwrap_or_default() {
            tool_calls.push(decode_tool_call(call)?);
        }

        Ok(Completion { content: choice.message.content, tool_calls })
    }
}

fn decode_tool_call(call: WireToolCall) -> Result<ToolCall, OracleError> {
    let raw = call.function.arguments.trim();
    let arguments = if raw.is_empty() || raw == "{}" || raw == "null" {
        BTreeMap::new()
    } else {
        let parsed: BTreeMap<String, serde_json::Value> = serde_json::from_str(raw)
            .map_err(|err| OracleError::Decode(format!("tool-call arguments: {err}")))?;
        parsed
            .into_iter()
            .map(|(key, value)| match value {
                serde_json::Value::String(text) => (key, text),
                other => (key, other.to_string()),
            })
            .collect()
    };

    Ok(ToolCall { id: call.id, name: call.function.name, arguments })
}

fn wire_messages(request: &OracleRequest) -> Vec<WireMessage> {
    let mut messages = Vec::with_capacity(request.turns.len() + 1);

    if let Some(system) = &request.system {
        messages.push(WireMessage {
            role: "system",
            content: Some(system.clone()),
            tool_call_id: None,
            tool_calls: None,
        });
    }

    for entry in &request.turns {
        messages.push(match entry {
            ChatEntry::User { content } => WireMessage {
                role: "user",
                content: Some(content.clone()),
                tool_call_id: None,
                tool_calls: None,
            },
            ChatEntry::Assistant { content, tool_calls } => WireMessage {
                role: "assistant",
                content: (!content.is_empty()).then(|| content.clone()),
                tool_call_id: None,
                tool_calls: (!tool_calls.is_empty())
                    .then(|| tool_calls.iter().map(encode_tool_call).collect()),
            },
            ChatEntry::ToolResult { call_id, content, .. } => WireMessage {
                role: "tool",
                content: Some(content.clone()),
                tool_call_id: Some(call_id.clone()),
                tool_calls: None,
            },
        });
    }

    messages
}

fn encode_tool_call(call: &ToolCall) -> WireToolCall {
    let arguments: BTreeMap<&str, &str> =
        call.arguments.iter().map(|(key, value)| (key.as_str(), value.as_str())).collect();

    WireToolCall {
        id: call.id.clone(),
        kind: "function".to_string(),
        function: WireFunction {
            name: call.name.clone(),
            arguments: serde_json::to_string(&arguments).unwrap_or_else(|_| "{}".to_string()),
        },
    }
}

fn wire_tools(tools: &[ToolSpec]) -> Option<Vec<serde_json::Value>> {
    if tools.is_empty() {
        return None;
    }

    let declared = tools
        .iter()
        .map(|tool| {
            let (properties, required) = match &tool.parameter {
                Some(parameter) => (
                    serde_json::json!({
                        parameter.name.clone(): {
                            "type": "string",
                            "description": parameter.description,
                        }
                    }),
                    serde_json::json!([parameter.name]),
                ),
                None => (serde_json::json!({}), serde_json::json!([])),
            };

            serde_json::json!({
                "type": "function",
                "function": {
                    "name": tool.name,
                    "description": tool.description,
                    "parameters": {
                        "type": "object",
                        "properties": properties,
                        "required": required,
                    },
                },
            })
        })
        .collect();

    Some(declared)
}

#[derive(Serialize)]
struct WireRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage>,
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<serde_json::Value>>,
}

#[derive(Serialize)]
struct WireMessage {
    role: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<WireToolCall>>,
}

#[derive(Serialize, Deserialize)]
struct WireToolCall {
    id: String,
    #[serde(rename = "type")]
    kind: String,
    function: WireFunction,
}

#[derive(Serialize, Deserialize)]
struct WireFunction {
    name: String,
    arguments: String,
}

#[derive(Deserialize)]
struct WireResponse {
    choices: Vec<WireChoice>,
}

#[derive(Deserialize)]
struct WireChoice {
    message: WireReplyMessage,
}

#[derive(Deserialize)]
struct WireReplyMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<WireToolCall>>,
}
