//! Deterministic completion provider.
//!
//! Replays queued turns in order. Each turn may first request tool calls,
//! which are resolved through the real `ToolInvoker`, then finishes with a
//! reply or a failure. An exhausted queue answers with empty text.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::completion::{cancellable, tool_output, CompletionProvider, CompletionRequest, ToolInvoker};
use crate::error::CompletionError;

/// A tool call the scripted model issues before answering.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptedToolCall {
    pub name: String,
    pub arguments: Value,
}

/// A resolved tool call as observed by the provider.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedToolCall {
    pub name: String,
    pub arguments: Value,
    /// Output fed back to the model (`{"error": ...}` on failure).
    pub output: Value,
}

#[derive(Debug, Clone, PartialEq)]
enum Outcome {
    Reply(String),
    Fail(String),
}

/// One queued provider response.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptedTurn {
    tool_calls: Vec<ScriptedToolCall>,
    outcome: Outcome,
    delay: Option<Duration>,
}

impl ScriptedTurn {
    pub fn reply(text: impl Into<String>) -> Self {
        Self {
            tool_calls: Vec::new(),
            outcome: Outcome::Reply(text.into()),
            delay: None,
        }
    }

    pub fn fail(reason: impl Into<String>) -> Self {
        Self {
            tool_calls: Vec::new(),
            outcome: Outcome::Fail(reason.into()),
            delay: None,
        }
    }

    /// Issue a tool call before the reply.
    pub fn with_tool_call(mut self, name: impl Into<String>, arguments: Value) -> Self {
        self.tool_calls.push(ScriptedToolCall {
            name: name.into(),
            arguments,
        });
        self
    }

    /// Sleep before answering; the sleep races the cancellation token.
    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

/// Completion provider that replays a fixed script.
#[derive(Default)]
pub struct ScriptedCompletion {
    turns: Mutex<VecDeque<ScriptedTurn>>,
    requests: Mutex<Vec<CompletionRequest>>,
    tool_calls: Mutex<Vec<RecordedToolCall>>,
    calls: AtomicUsize,
}

impl ScriptedCompletion {
    pub fn new(turns: impl IntoIterator<Item = ScriptedTurn>) -> Self {
        Self {
            turns: Mutex::new(turns.into_iter().collect()),
            ..Self::default()
        }
    }

    pub fn push(&self, turn: ScriptedTurn) {
        relock(&self.turns).push_back(turn);
    }

    /// Number of `complete` invocations so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Requests received, in order.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        relock(&self.requests).clone()
    }

    /// Tool calls resolved, in order.
    pub fn tool_calls(&self) -> Vec<RecordedToolCall> {
        relock(&self.tool_calls).clone()
    }

    pub fn remaining(&self) -> usize {
        relock(&self.turns).len()
    }
}

// A panicking test must not cascade into every later assertion.
fn relock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

#[async_trait]
impl CompletionProvider for ScriptedCompletion {
    async fn complete(
        &self,
        request: &CompletionRequest,
        tools: &dyn ToolInvoker,
        cancel: &CancellationToken,
    ) -> Result<String, CompletionError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        relock(&self.requests).push(request.clone());

        let Some(turn) = relock(&self.turns).pop_front() else {
            debug!(call, "Script exhausted, replying with empty text");
            return Ok(String::new());
        };

        if let Some(delay) = turn.delay {
            cancellable(cancel, tokio::time::sleep(delay)).await?;
        }

        for tool_call in turn.tool_calls {
            let result =
                cancellable(cancel, tools.invoke(&tool_call.name, tool_call.arguments.clone()))
                    .await?;
            relock(&self.tool_calls).push(RecordedToolCall {
                name: tool_call.name,
                arguments: tool_call.arguments,
                output: tool_output(result),
            });
        }

        if cancel.is_cancelled() {
            return Err(CompletionError::Cancelled);
        }

        match turn.outcome {
            Outcome::Reply(text) => Ok(text),
            Outcome::Fail(reason) => Err(CompletionError::Scripted(reason)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::{NoTools, ResponseFormat, ToolSpec};
    use crate::error::ToolError;
    use marquee_core::types::ChatMessage;

    fn request() -> CompletionRequest {
        CompletionRequest {
            instructions: "test".into(),
            messages: vec![ChatMessage::user("hello")],
            temperature: 0.0,
            response_format: ResponseFormat::Text,
        }
    }

    struct EchoTools;

    #[async_trait]
    impl ToolInvoker for EchoTools {
        fn specs(&self) -> Vec<ToolSpec> {
            Vec::new()
        }

        async fn invoke(&self, name: &str, arguments: Value) -> Result<Value, ToolError> {
            if name == "echo" {
                Ok(arguments)
            } else {
                Err(ToolError::UnknownTool(name.to_string()))
            }
        }
    }

    #[tokio::test]
    async fn test_replays_in_order() {
        let provider = ScriptedCompletion::new([ScriptedTurn::reply("one"), ScriptedTurn::reply("two")]);
        let cancel = CancellationToken::new();

        assert_eq!(provider.complete(&request(), &NoTools, &cancel).await.unwrap(), "one");
        assert_eq!(provider.complete(&request(), &NoTools, &cancel).await.unwrap(), "two");
        assert_eq!(provider.complete(&request(), &NoTools, &cancel).await.unwrap(), "");
        assert_eq!(provider.call_count(), 3);
        assert_eq!(provider.requests().len(), 3);
    }

    #[tokio::test]
    async fn test_failure_is_reported() {
        let provider = ScriptedCompletion::new([ScriptedTurn::fail("boom")]);
        let err = provider
            .complete(&request(), &NoTools, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, CompletionError::Scripted(ref r) if r == "boom"));
    }

    #[tokio::test]
    async fn test_tool_calls_are_resolved_and_recorded() {
        let provider = ScriptedCompletion::new([ScriptedTurn::reply("done")
            .with_tool_call("echo", serde_json::json!({"q": 1}))
            .with_tool_call("missing", serde_json::json!({}))]);

        let out = provider
            .complete(&request(), &EchoTools, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(out, "done");

        let calls = provider.tool_calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].output["q"], 1);
        assert_eq!(calls[1].output["error"], "unknown tool: missing");
    }

    #[tokio::test]
    async fn test_delay_races_cancellation() {
        let provider = ScriptedCompletion::new([ScriptedTurn::reply("late").delayed(Duration::from_secs(60))]);
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            trigger.cancel();
        });

        let err = provider.complete(&request(), &NoTools, &cancel).await.unwrap_err();
        assert!(matches!(err, CompletionError::Cancelled));
    }

    #[test]
    fn test_push_extends_script() {
        let provider = ScriptedCompletion::default();
        assert_eq!(provider.remaining(), 0);
        provider.push(ScriptedTurn::reply("x"));
        assert_eq!(provider.remaining(), 1);
    }
}
