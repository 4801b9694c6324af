//! Specialized agents, one per implemented intent.
//!
//! Agents form a closed set dispatched through the [`Agent`] enum. Every
//! agent runs through the shared [`AgentRuntime`], which bounds the history,
//! injects context notes, applies the provider timeout and guarantees that
//! `TurnContext::result` ends up either with the answer or the fallback
//! sentence.

pub mod discover;
pub mod person;
pub mod redactor;
pub mod similar;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use marquee_catalog::CatalogGateway;
use marquee_core::config::{AgentsConfig, MarqueeConfig};
use marquee_core::types::{ChatMessage, Conversation};

use crate::completion::{CompletionProvider, CompletionRequest, ResponseFormat, ToolInvoker};
use crate::context::TurnContext;
use crate::error::{ChatError, CompletionError};
use crate::intent::{IntentStep, IntentType};

pub use discover::DiscoverAgent;
pub use person::PersonAgent;
pub use redactor::RedactorAgent;
pub use similar::SimilarAgent;

/// Execution settings shared by every agent.
pub struct AgentRuntime {
    provider: Arc<dyn CompletionProvider>,
    history_window: usize,
    timeout: Duration,
    fallback: String,
}

/// One provider run as configured by an agent.
pub struct AgentCall<'a> {
    pub agent: &'static str,
    pub instructions: String,
    pub temperature: f32,
    pub tools: &'a dyn ToolInvoker,
}

impl AgentRuntime {
    pub fn new(
        provider: Arc<dyn CompletionProvider>,
        history_window: usize,
        timeout: Duration,
        fallback: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            history_window,
            timeout,
            fallback: fallback.into(),
        }
    }

    pub fn from_config(provider: Arc<dyn CompletionProvider>, config: &MarqueeConfig) -> Self {
        Self::new(
            provider,
            config.router.history_window,
            Duration::from_secs(config.completion.timeout_secs.max(1)),
            config.router.agent_fallback_message.clone(),
        )
    }

    pub fn fallback(&self) -> &str {
        &self.fallback
    }

    /// Messages sent to the provider: context notes, then the last
    /// `history_window` non-system messages.
    pub fn bounded_messages(
        &self,
        conversation: &Conversation,
        ctx: &TurnContext,
        step: Option<&IntentStep>,
    ) -> Vec<ChatMessage> {
        let step_hint = step.and_then(IntentStep::hint);
        let mut messages = Vec::with_capacity(self.history_window + 2);

        if let Some(carried) = ctx.carried_context() {
            if step_hint != Some(carried) {
                messages.push(ChatMessage::system(format!(
                    "Context from earlier in this turn: {}",
                    carried
                )));
            }
        }
        if let Some(hint) = step_hint {
            messages.push(ChatMessage::system(format!(
                "Authoritative context for this request: {}. \
                 Use it as given and do not guess or override it.",
                hint
            )));
        }
        messages.extend(conversation.recent_non_system(self.history_window));
        messages
    }

    /// Run one agent call and write its outcome into `ctx.result`.
    ///
    /// Empty output, provider errors and timeouts all leave the fallback
    /// sentence; only cancellation is returned as an error. Returns whether
    /// the provider produced the answer.
    pub async fn run(
        &self,
        call: AgentCall<'_>,
        messages: Vec<ChatMessage>,
        ctx: &mut TurnContext,
        cancel: &CancellationToken,
    ) -> Result<bool, ChatError> {
        let request = CompletionRequest {
            instructions: call.instructions,
            messages,
            temperature: call.temperature,
            response_format: ResponseFormat::Text,
        };

        let outcome = tokio::time::timeout(
            self.timeout,
            self.provider.complete(&request, call.tools, cancel),
        )
        .await;

        let text = match outcome {
            Ok(Ok(text)) => text.trim().to_string(),
            Ok(Err(CompletionError::Cancelled)) => return Err(ChatError::Cancelled),
            Ok(Err(e)) => {
                warn!(turn_id = %ctx.turn_id, agent = call.agent, error = %e, "Agent completion failed");
                String::new()
            }
            Err(_) => {
                warn!(
                    turn_id = %ctx.turn_id,
                    agent = call.agent,
                    timeout_secs = self.timeout.as_secs(),
                    "Agent completion timed out"
                );
                String::new()
            }
        };

        if text.is_empty() {
            ctx.result = self.fallback.clone();
            return Ok(false);
        }
        debug!(turn_id = %ctx.turn_id, agent = call.agent, chars = text.len(), "Agent answered");
        ctx.result = text;
        Ok(true)
    }
}

/// Instruction suffix honouring `TurnContext::format`.
pub(crate) fn format_clause(ctx: &TurnContext) -> String {
    match ctx.format.as_deref() {
        Some(format) => format!("\nFormat the answer as {}.", format),
        None => String::new(),
    }
}

/// Closed set of implemented agents.
pub enum Agent {
    DiscoverMovies(DiscoverAgent),
    PersonSeeker(PersonAgent),
    SimilarMovieSeeker(SimilarAgent),
    Redactor(RedactorAgent),
}

impl Agent {
    pub fn name(&self) -> &'static str {
        match self {
            Agent::DiscoverMovies(_) => discover::NAME,
            Agent::PersonSeeker(_) => person::NAME,
            Agent::SimilarMovieSeeker(_) => similar::NAME,
            Agent::Redactor(_) => redactor::NAME,
        }
    }

    /// Handle one step, leaving the outcome in `ctx.result`.
    pub async fn process(
        &self,
        conversation: &Conversation,
        ctx: &mut TurnContext,
        step: Option<&IntentStep>,
        cancel: &CancellationToken,
    ) -> Result<(), ChatError> {
        match self {
            Agent::DiscoverMovies(agent) => agent.process(conversation, ctx, step, cancel).await,
            Agent::PersonSeeker(agent) => agent.process(conversation, ctx, step, cancel).await,
            Agent::SimilarMovieSeeker(agent) => {
                agent.process(conversation, ctx, step, cancel).await
            }
            Agent::Redactor(agent) => agent.process(conversation, ctx, step, cancel).await,
        }
    }
}

/// Maps intents to the agents that serve them.
#[derive(Default)]
pub struct AgentRegistry {
    agents: HashMap<IntentType, Agent>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the four implemented agents.
    pub fn standard(
        runtime: Arc<AgentRuntime>,
        gateway: Arc<dyn CatalogGateway>,
        agents: &AgentsConfig,
    ) -> Self {
        let mut registry = Self::new();
        registry.register(
            IntentType::DiscoverMovies,
            Agent::DiscoverMovies(DiscoverAgent::new(
                runtime.clone(),
                gateway.clone(),
                agents.discover_temperature,
            )),
        );
        registry.register(
            IntentType::PersonSeeker,
            Agent::PersonSeeker(PersonAgent::new(
                runtime.clone(),
                gateway.clone(),
                agents.person_temperature,
            )),
        );
        registry.register(
            IntentType::SimilarMovieSeeker,
            Agent::SimilarMovieSeeker(SimilarAgent::new(
                runtime.clone(),
                gateway,
                agents.similar_temperature,
            )),
        );
        registry.register(
            IntentType::ReviewRedactor,
            Agent::Redactor(RedactorAgent::new(runtime, agents.redactor_temperature)),
        );
        info!(agents = registry.len(), "Agent registry ready");
        registry
    }

    /// Register an agent, replacing any previous one for `intent`.
    /// `IntentType::None` is a sentinel and is never registered.
    pub fn register(&mut self, intent: IntentType, agent: Agent) {
        if intent == IntentType::None {
            warn!(agent = agent.name(), "Refusing to register an agent for the None intent");
            return;
        }
        self.agents.insert(intent, agent);
    }

    pub fn get(&self, intent: IntentType) -> Option<&Agent> {
        self.agents.get(&intent)
    }

    /// The redactor, used for the optional merge pass.
    pub fn redactor(&self) -> Option<&RedactorAgent> {
        self.agents.values().find_map(|agent| match agent {
            Agent::Redactor(r) => Some(r),
            _ => None,
        })
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}
