//! Rewrites free text into a constrained markup subset.
//!
//! Single-shot: the redactor never calls tools. It also serves the optional
//! merge pass that folds several step results into one message.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use marquee_core::types::{ChatMessage, Conversation};

use crate::agent::{AgentCall, AgentRuntime};
use crate::completion::NoTools;
use crate::context::TurnContext;
use crate::error::ChatError;
use crate::intent::IntentStep;

pub const NAME: &str = "Redactor";

/// Output format when the turn carries no hint.
pub const DEFAULT_FORMAT: &str = "html";

const ALLOWED_TAGS: &str = "<p>, <br>, <strong>, <em>, <ul>, <ol>, <li>, <blockquote>";

pub struct RedactorAgent {
    runtime: Arc<AgentRuntime>,
    temperature: f32,
}

impl RedactorAgent {
    pub fn new(runtime: Arc<AgentRuntime>, temperature: f32) -> Self {
        Self {
            runtime,
            temperature: temperature.clamp(0.0, 1.0),
        }
    }

    fn instructions(ctx: &TurnContext) -> String {
        let format = ctx.format.as_deref().unwrap_or(DEFAULT_FORMAT);
        let markup = if format.eq_ignore_ascii_case("html") {
            format!("Use only these HTML tags: {}. No attributes, no other markup.", ALLOWED_TAGS)
        } else {
            format!("Write the result as {} using only paragraphs, emphasis and lists.", format)
        };
        format!(
            "You edit movie reviews written by users.\n\
             Rewrite the review from the latest user message: fix spelling and grammar, \
             improve structure and readability.\n\
             Keep the author's opinion, tone and sentiment exactly. Do not add facts, \
             ratings or spoilers that are not in the original text.\n\
             {}\n\
             Reply with the rewritten review only.",
            markup
        )
    }

    pub async fn process(
        &self,
        conversation: &Conversation,
        ctx: &mut TurnContext,
        step: Option<&IntentStep>,
        cancel: &CancellationToken,
    ) -> Result<(), ChatError> {
        let messages = self.runtime.bounded_messages(conversation, ctx, step);
        let call = AgentCall {
            agent: NAME,
            instructions: Self::instructions(ctx),
            temperature: self.temperature,
            tools: &NoTools,
        };
        self.runtime.run(call, messages, ctx, cancel).await?;
        Ok(())
    }

    /// Fold the results of several steps into one message.
    ///
    /// Returns `None` when the provider gave no usable answer; `ctx.result`
    /// then holds the fallback sentence.
    pub async fn merge(
        &self,
        results: &[String],
        ctx: &mut TurnContext,
        cancel: &CancellationToken,
    ) -> Result<Option<String>, ChatError> {
        let format = ctx.format.as_deref().unwrap_or(DEFAULT_FORMAT).to_string();
        let call = AgentCall {
            agent: NAME,
            instructions: format!(
                "You combine several partial answers of a movie assistant into one reply.\n\
                 Keep every fact, drop repetitions, do not add anything new.\n\
                 Write the reply as {}. Reply with the combined answer only.",
                format
            ),
            temperature: self.temperature,
            tools: &NoTools,
        };
        let messages = vec![ChatMessage::user(results.join("\n\n"))];
        ctx.begin_step();
        let answered = self.runtime.run(call, messages, ctx, cancel).await?;
        Ok(answered.then(|| ctx.result.clone()))
    }
}
