//! Finds titles and movies similar to them.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use marquee_catalog::CatalogGateway;
use marquee_core::types::Conversation;

use crate::agent::{format_clause, AgentCall, AgentRuntime};
use crate::context::TurnContext;
use crate::error::ChatError;
use crate::intent::IntentStep;
use crate::plugin::SimilarPlugin;

pub const NAME: &str = "SimilarMovieSeeker";

const INSTRUCTIONS: &str = "You recommend movies similar to one the user names.
Find the movie with search_movies, then call similar_movies with its externalId. Use get_movie for details.
Only recommend movies returned by the tools and say briefly what they share with the original.
Keep the answer short and reply in the user's language.";

pub struct SimilarAgent {
    runtime: Arc<AgentRuntime>,
    plugin: SimilarPlugin,
    temperature: f32,
}

impl SimilarAgent {
    pub fn new(
        runtime: Arc<AgentRuntime>,
        gateway: Arc<dyn CatalogGateway>,
        temperature: f32,
    ) -> Self {
        Self {
            runtime,
            plugin: SimilarPlugin::new(gateway),
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

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use serde_json::json;

    use crate::completion::{ScriptedCompletion, ScriptedTurn};
    use crate::plugin::testing;

    #[tokio::test]
    async fn test_similar_agent_chains_tools() {
        let provider = Arc::new(ScriptedCompletion::new([ScriptedTurn::reply(
            "Try Interstellar and The Prestige.",
        )
        .with_tool_call("search_movies", json!({"query": "Inception"}))
        .with_tool_call("similar_movies", json!({"externalId": 27205, "pageSize": 2}))]));
        let runtime = Arc::new(AgentRuntime::new(
            provider.clone(),
            6,
            Duration::from_secs(5),
            "fallback",
        ));
        let agent = SimilarAgent::new(runtime, testing::catalog(), 0.3);

        let mut conversation = Conversation::new();
        conversation.push_user("movies like Inception");
        let mut ctx = TurnContext::new();
        agent
            .process(&conversation, &mut ctx, None, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(ctx.result, "Try Interstellar and The Prestige.");
        let calls = provider.tool_calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].output["items"][0]["externalId"], 27205);
        assert_eq!(calls[1].output["items"].as_array().unwrap().len(), 2);
    }
}
