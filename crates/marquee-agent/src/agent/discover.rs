//! Catalog discovery by release year and genre.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use marquee_catalog::CatalogGateway;
use marquee_core::types::Conversation;

use crate::agent::{format_clause, AgentCall, AgentRuntime};
use crate::context::TurnContext;
use crate::error::ChatError;
use crate::intent::IntentStep;
use crate::plugin::DiscoverPlugin;

pub const NAME: &str = "DiscoverMovies";

const INSTRUCTIONS: &str = "You help users discover movies in the catalog.
Use discover_movies to browse by release year and genre. Call list_genres first when unsure how a genre is named.
Only mention movies returned by the tools; never invent titles, years or ratings.
When nothing matches, say so and suggest a broader search.
Keep the answer short and reply in the user's language.";

pub struct DiscoverAgent {
    runtime: Arc<AgentRuntime>,
    plugin: DiscoverPlugin,
    temperature: f32,
}

impl DiscoverAgent {
    pub fn new(
        runtime: Arc<AgentRuntime>,
        gateway: Arc<dyn CatalogGateway>,
        temperature: f32,
    ) -> Self {
        Self {
            runtime,
            plugin: DiscoverPlugin::new(gateway),
            temperature: temperature.clamp(0.0, 1.0),
        }
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
            instructions: format!("{}{}", INSTRUCTIONS, format_clause(ctx)),
            temperature: self.temperature,
            tools: &self.plugin,
        };
        self.runtime.run(call, messages, ctx, cancel).await?;
        Ok(())
    }
}
