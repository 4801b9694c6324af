//! Answers questions about actors, directors and crew.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use marquee_catalog::CatalogGateway;
use marquee_core::types::Conversation;

use crate::agent::{format_clause, AgentCall, AgentRuntime};
use crate::context::TurnContext;
use crate::error::ChatError;
use crate::intent::IntentStep;
use crate::plugin::PersonPlugin;

pub const NAME: &str = "PersonSeeker";

const INSTRUCTIONS: &str = "You answer questions about people in film: actors, directors and crew.
Find people with search_people, then call get_person with the id or externalId from the results for details.
Base every fact on tool output. If the person cannot be found, say so plainly.
Keep the answer short and reply in the user's language.";

pub struct PersonAgent {
    runtime: Arc<AgentRuntime>,
    plugin: PersonPlugin,
    temperature: f32,
}

impl PersonAgent {
    pub fn new(
        runtime: Arc<AgentRuntime>,
        gateway: Arc<dyn CatalogGateway>,
        temperature: f32,
    ) -> Self {
        Self {
            runtime,
            plugin: PersonPlugin::new(gateway),
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
    use crate::intent::IntentType;
    use crate::plugin::testing;

    #[tokio::test]
    async fn test_person_agent_resolves_external_person() {
        let catalog = testing::catalog();
        let provider = Arc::new(ScriptedCompletion::new([ScriptedTurn::reply(
            "Keanu Reeves is a Canadian actor born in 1964.",
        )
        .with_tool_call("get_person", json!({"externalId": 6384}))]));
        let runtime = Arc::new(AgentRuntime::new(
            provider.clone(),
            6,
            Duration::from_secs(5),
            "fallback",
        ));
        let agent = PersonAgent::new(runtime, catalog.clone(), 0.2);

        let mut conversation = Conversation::new();
        conversation.push_user("tell me about Keanu");
        let step = IntentStep::with_context(IntentType::PersonSeeker, "name=Keanu Reeves");
        let mut ctx = TurnContext::new();
        agent
            .process(&conversation, &mut ctx, Some(&step), &CancellationToken::new())
            .await
            .unwrap();

        assert!(ctx.result.starts_with("Keanu Reeves"));
        assert_eq!(catalog.import_count(), 1);
        let request = &provider.requests()[0];
        assert!(request.messages[0].content.contains("name=Keanu Reeves"));
    }

    #[tokio::test]
    async fn test_person_agent_tool_error_still_answers() {
        let provider = Arc::new(ScriptedCompletion::new([ScriptedTurn::reply(
            "I could not find that person.",
        )
        .with_tool_call("get_person", json!({}))]));
        let runtime = Arc::new(AgentRuntime::new(
            provider.clone(),
            6,
            Duration::from_secs(5),
            "fallback",
        ));
        let agent = PersonAgent::new(runtime, testing::catalog(), 0.2);

        let mut conversation = Conversation::new();
        conversation.push_user("who is that?");
        let mut ctx = TurnContext::new();
        agent
            .process(&conversation, &mut ctx, None, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(ctx.result, "I could not find that person.");
        assert!(provider.tool_calls()[0].output["error"]
            .as_str()
            .unwrap()
            .contains("requires either id or externalId"));
    }
}
