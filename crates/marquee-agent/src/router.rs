//! Turn router: classify, then dispatch each intent step in order.
//!
//! Steps run strictly one after another because a later step may rely on
//! the answer or context left by an earlier one. Failures inside a step
//! degrade to an apology; only cancellation and an empty conversation are
//! returned to the caller.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use marquee_catalog::CatalogGateway;
use marquee_core::config::{MarqueeConfig, RouterConfig};
use marquee_core::types::{ChatRole, Conversation};

use crate::agent::{AgentRegistry, AgentRuntime};
use crate::completion::CompletionProvider;
use crate::context::TurnContext;
use crate::error::ChatError;
use crate::intent::{IntentClassifier, IntentStep, IntentType, LlmIntentExtractor};

/// Outcome of one turn, for logging and debugging.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnReport {
    /// Steps produced by the classifier.
    pub intents: Vec<IntentStep>,
    /// Per-step answers labelled `"[IntentType] result"`, in dispatch order.
    pub responses: Vec<String>,
    /// Set when an unregistered intent stopped the turn.
    pub halted: bool,
    /// Set when the steps' answers were folded into one message.
    pub merged: bool,
}

pub struct Router {
    classifier: Arc<dyn IntentClassifier>,
    registry: AgentRegistry,
    config: RouterConfig,
}

impl Router {
    pub fn new(
        classifier: Arc<dyn IntentClassifier>,
        registry: AgentRegistry,
        config: RouterConfig,
    ) -> Self {
        Self {
            classifier,
            registry,
            config,
        }
    }

    /// Wire the LLM classifier and the standard agents onto one provider.
    pub fn from_config(
        config: &MarqueeConfig,
        provider: Arc<dyn CompletionProvider>,
        gateway: Arc<dyn CatalogGateway>,
    ) -> Self {
        let classifier = LlmIntentExtractor::new(
            provider.clone(),
            config.router.history_window,
            Duration::from_secs(config.completion.timeout_secs.max(1)),
            config.agents.intent_temperature,
        );
        let runtime = Arc::new(AgentRuntime::from_config(provider, config));
        let registry = AgentRegistry::standard(runtime, gateway, &config.agents);
        Self::new(Arc::new(classifier), registry, config.router.clone())
    }

    pub fn registry(&self) -> &AgentRegistry {
        &self.registry
    }

    /// Process one turn. Assistant messages are appended to `conversation`;
    /// the reply is its last message.
    pub async fn handle(
        &self,
        conversation: &mut Conversation,
        ctx: &mut TurnContext,
        cancel: &CancellationToken,
    ) -> Result<TurnReport, ChatError> {
        if !conversation
            .messages()
            .iter()
            .any(|m| m.role == ChatRole::User)
        {
            return Err(ChatError::EmptyConversation);
        }

        let classification = self.classifier.classify(conversation, cancel).await?;
        let mut report = TurnReport {
            intents: classification.steps.clone(),
            ..TurnReport::default()
        };

        if !classification.is_actionable() {
            let fallback = match classification.fallback_message.trim() {
                "" => self.config.fallback_message.clone(),
                text => text.to_string(),
            };
            info!(turn_id = %ctx.turn_id, "No actionable intent, replying with fallback");
            conversation.push_assistant(fallback);
            ctx.additional_context = None;
            return Ok(report);
        }

        let mut results = Vec::new();
        for step in &classification.steps {
            if step.intent_type == IntentType::None {
                debug!(turn_id = %ctx.turn_id, "None step ends the turn");
                break;
            }

            ctx.begin_step();
            if let Some(hint) = step.hint() {
                ctx.additional_context = Some(hint.to_string());
            }

            let Some(agent) = self.registry.get(step.intent_type) else {
                warn!(
                    turn_id = %ctx.turn_id,
                    intent = %step.intent_type,
                    "No agent registered for intent, stopping turn"
                );
                conversation.push_assistant(self.config.unregistered_message.clone());
                report.halted = true;
                break;
            };

            debug!(turn_id = %ctx.turn_id, agent = agent.name(), "Dispatching step");
            agent.process(conversation, ctx, Some(step), cancel).await?;

            if ctx.has_result() {
                conversation.push_assistant(ctx.result.clone());
                report
                    .responses
                    .push(format!("[{}] {}", step.intent_type, ctx.result));
                results.push(ctx.result.clone());
            }
        }

        if self.config.merge_results && results.len() > 1 {
            report.merged = self.merge(&results, conversation, ctx, cancel).await?;
        }

        info!(
            turn_id = %ctx.turn_id,
            steps = report.intents.len(),
            answered = report.responses.len(),
            halted = report.halted,
            "Turn complete"
        );
        Ok(report)
    }

    async fn merge(
        &self,
        results: &[String],
        conversation: &mut Conversation,
        ctx: &mut TurnContext,
        cancel: &CancellationToken,
    ) -> Result<bool, ChatError> {
        let Some(redactor) = self.registry.redactor() else {
            warn!(turn_id = %ctx.turn_id, "Merge requested but no redactor is registered");
            return Ok(false);
        };
        match redactor.merge(results, ctx, cancel).await? {
            Some(merged) => {
                conversation.push_assistant(merged);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
