//! Completion provider contract.
//!
//! - `OpenAiCompletionProvider` talks to an OpenAI-compatible
//!   `/chat/completions` endpoint and resolves tool calls in a loop.
//! - `ScriptedCompletion` replays canned replies for tests.

pub mod openai;
pub mod scripted;

use std::future::Future;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use marquee_core::types::ChatMessage;

use crate::error::{CompletionError, ToolError};

pub use openai::OpenAiCompletionProvider;
pub use scripted::{RecordedToolCall, ScriptedCompletion, ScriptedToolCall, ScriptedTurn};

/// Shape the provider is asked to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseFormat {
    #[default]
    Text,
    /// A single JSON object.
    JsonObject,
}

/// One provider invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// System instructions, sent ahead of `messages`.
    pub instructions: String,
    /// Bounded conversation, oldest first.
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub response_format: ResponseFormat,
}

/// Declaration of a callable tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    /// JSON schema of the arguments object.
    pub parameters: serde_json::Value,
}

/// Dispatches tool calls requested by the provider.
#[async_trait]
pub trait ToolInvoker: Send + Sync {
    /// Tools exposed to the provider.
    fn specs(&self) -> Vec<ToolSpec>;

    /// Run one tool with its JSON arguments.
    async fn invoke(
        &self,
        name: &str,
        arguments: serde_json::Value,
    ) -> Result<serde_json::Value, ToolError>;
}

/// Tool set of a single-shot agent.
pub struct NoTools;

#[async_trait]
impl ToolInvoker for NoTools {
    fn specs(&self) -> Vec<ToolSpec> {
        Vec::new()
    }

    async fn invoke(
        &self,
        name: &str,
        _arguments: serde_json::Value,
    ) -> Result<serde_json::Value, ToolError> {
        Err(ToolError::UnknownTool(name.to_string()))
    }
}

/// Chat-completion capability with transparent tool resolution.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Run `request` to completion and return the accumulated assistant text.
    ///
    /// Tool calls are resolved through `tools` before text is returned.
    /// Must return `CompletionError::Cancelled` promptly once `cancel` fires.
    async fn complete(
        &self,
        request: &CompletionRequest,
        tools: &dyn ToolInvoker,
        cancel: &CancellationToken,
    ) -> Result<String, CompletionError>;
}

/// Race `fut` against `cancel`.
pub(crate) async fn cancellable<F>(
    cancel: &CancellationToken,
    fut: F,
) -> Result<F::Output, CompletionError>
where
    F: Future,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(CompletionError::Cancelled),
        out = fut => Ok(out),
    }
}

/// Tool output fed back to the model; failures become `{"error": ...}`.
pub(crate) fn tool_output(result: Result<serde_json::Value, ToolError>) -> serde_json::Value {
    match result {
        Ok(value) => value,
        Err(e) => serde_json::json!({ "error": e.to_string() }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_no_tools_rejects_every_call() {
        assert!(NoTools.specs().is_empty());
        let err = NoTools
            .invoke("search_people", serde_json::json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::UnknownTool(_)));
    }

    #[tokio::test]
    async fn test_cancellable_returns_cancelled() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let out = cancellable(&cancel, std::future::pending::<()>()).await;
        assert!(matches!(out, Err(CompletionError::Cancelled)));
    }

    #[tokio::test]
    async fn test_cancellable_passes_output() {
        let cancel = CancellationToken::new();
        let out = cancellable(&cancel, async { 7 }).await.unwrap();
        assert_eq!(out, 7);
    }

    #[test]
    fn test_tool_output_wraps_errors() {
        let out = tool_output(Err(ToolError::InvalidArguments("query".into())));
        assert_eq!(out["error"], "invalid tool arguments: query");
        let out = tool_output(Ok(serde_json::json!({"total": 0})));
        assert_eq!(out["total"], 0);
    }
}
