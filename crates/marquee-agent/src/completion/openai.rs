//! OpenAI-compatible chat-completions provider.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use marquee_core::config::CompletionConfig;
use marquee_core::types::{ChatMessage, ChatRole};

use crate::completion::{
    cancellable, tool_output, CompletionProvider, CompletionRequest, ResponseFormat, ToolInvoker,
    ToolSpec,
};
use crate::error::CompletionError;

/// Provider for any endpoint speaking the OpenAI chat-completions dialect.
pub struct OpenAiCompletionProvider {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    max_tool_rounds: u32,
}

impl OpenAiCompletionProvider {
    /// Build from configuration. The API key is read from the environment
    /// variable named by `api_key_env`; local servers may run without one.
    pub fn from_config(config: &CompletionConfig) -> Result<Self, CompletionError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()?;
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());
        if api_key.is_none() {
            warn!(env = %config.api_key_env, "No API key set for completion provider");
        }
        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            model: config.model.clone(),
            api_key,
            max_tool_rounds: config.max_tool_rounds,
        })
    }

    async fn send(&self, payload: &Value) -> Result<WireMessage, CompletionError> {
        let mut builder = self.client.post(&self.endpoint).json(payload);
        if let Some(ref key) = self.api_key {
            builder = builder.bearer_auth(key);
        }
        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CompletionError::Status {
                status: status.as_u16(),
                body,
            });
        }
        let parsed: WireResponse = response
            .json()
            .await
            .map_err(|e| CompletionError::MalformedResponse(e.to_string()))?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message)
            .ok_or_else(|| CompletionError::MalformedResponse("no choices".to_string()))
    }
}

#[async_trait]
impl CompletionProvider for OpenAiCompletionProvider {
    async fn complete(
        &self,
        request: &CompletionRequest,
        tools: &dyn ToolInvoker,
        cancel: &CancellationToken,
    ) -> Result<String, CompletionError> {
        let specs = tools.specs();
        let mut transcript = initial_transcript(request);

        for round in 0..=self.max_tool_rounds {
            let payload = build_payload(&self.model, request, &specs, &transcript);
            let message = cancellable(cancel, self.send(&payload)).await??;

            let calls = message.tool_calls.clone().unwrap_or_default();
            if calls.is_empty() {
                return Ok(message.content.unwrap_or_default());
            }
            // Tools may import catalog records; never run calls whose
            // results could not be sent back.
            if round == self.max_tool_rounds {
                warn!(round, calls = calls.len(), "Tool-call budget spent, dropping calls");
                break;
            }

            debug!(round, calls = calls.len(), "Resolving tool calls");
            transcript.push(message);
            for call in calls {
                let result = match serde_json::from_str::<Value>(&call.function.arguments) {
                    Ok(arguments) => {
                        cancellable(cancel, tools.invoke(&call.function.name, arguments)).await?
                    }
                    Err(e) => Err(crate::error::ToolError::InvalidArguments(e.to_string())),
                };
                if let Err(ref e) = result {
                    warn!(tool = %call.function.name, error = %e, "Tool call failed");
                }
                transcript.push(WireMessage {
                    role: "tool".to_string(),
                    content: Some(tool_output(result).to_string()),
                    tool_calls: None,
                    tool_call_id: Some(call.id),
                });
            }
        }

        Err(CompletionError::ToolRoundsExceeded(self.max_tool_rounds))
    }
}

// =============================================================================
// Wire format
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<WireToolCall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

impl From<&ChatMessage> for WireMessage {
    /// History `tool` messages have no matching assistant `tool_calls` in the
    /// transcript, so they are replayed as assistant context instead.
    fn from(message: &ChatMessage) -> Self {
        let (role, content) = match message.role {
            ChatRole::Tool => (
                "assistant".to_string(),
                format!("Earlier tool output: {}", message.content),
            ),
            role => (role.to_string(), message.content.clone()),
        };
        Self {
            role,
            content: Some(content),
            tool_calls: None,
            tool_call_id: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireToolCall {
    id: String,
    #[serde(rename = "type", default = "function_type")]
    kind: String,
    function: WireFunctionCall,
}

fn function_type() -> String {
    "function".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireFunctionCall {
    name: String,
    #[serde(default)]
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    #[serde(default)]
    choices: Vec<WireChoice>,
}

#[derive(Debug, Deserialize)]
struct WireChoice {
    message: WireMessage,
}

fn initial_transcript(request: &CompletionRequest) -> Vec<WireMessage> {
    let mut transcript = Vec::with_capacity(request.messages.len() + 1);
    transcript.push(WireMessage {
        role: "system".to_string(),
        content: Some(request.instructions.clone()),
        tool_calls: None,
        tool_call_id: None,
    });
    transcript.extend(request.messages.iter().map(WireMessage::from));
    transcript
}

fn build_payload(
    model: &str,
    request: &CompletionRequest,
    specs: &[ToolSpec],
    transcript: &[WireMessage],
) -> Value {
    let mut payload = json!({
        "model": model,
        "messages": transcript,
        "temperature": request.temperature,
    });
    if !specs.is_empty() {
        payload["tools"] = specs
            .iter()
            .map(|s| {
                json!({
                    "type": "function",
                    "function": {
                        "name": s.name,
                        "description": s.description,
                        "parameters": s.parameters,
                    }
                })
            })
            .collect();
    }
    if request.response_format == ResponseFormat::JsonObject {
        payload["response_format"] = json!({ "type": "json_object" });
    }
    payload
}
