//! Intent classification.
//!
//! Turns the running conversation into an ordered list of intent steps.
//! Classification never fails a turn: anything short of a well-formed
//! reply degrades to [`IntentResponse::not_understood`]. Only cancellation
//! escapes.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use marquee_core::types::Conversation;

use crate::completion::{CompletionProvider, CompletionRequest, NoTools, ResponseFormat};
use crate::error::{ChatError, CompletionError};

/// Reply used when the classifier output is unusable.
pub const NOT_UNDERSTOOD: &str = "I didn't understand your request";

/// Closed intent taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IntentType {
    #[serde(alias = "discoverMovies", alias = "discover_movies")]
    DiscoverMovies,
    #[serde(alias = "personSeeker", alias = "person_seeker")]
    PersonSeeker,
    #[serde(alias = "similarMovieSeeker", alias = "similar_movie_seeker")]
    SimilarMovieSeeker,
    #[serde(alias = "reviewRedactor", alias = "review_redactor")]
    ReviewRedactor,
    /// Recognized by the classifier but served by no agent.
    #[serde(alias = "movieSeeker", alias = "movie_seeker")]
    MovieSeeker,
    /// Terminal sentinel; also absorbs unknown values.
    #[serde(other)]
    None,
}

impl IntentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntentType::DiscoverMovies => "DiscoverMovies",
            IntentType::PersonSeeker => "PersonSeeker",
            IntentType::SimilarMovieSeeker => "SimilarMovieSeeker",
            IntentType::ReviewRedactor => "ReviewRedactor",
            IntentType::MovieSeeker => "MovieSeeker",
            IntentType::None => "None",
        }
    }
}

impl fmt::Display for IntentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentStep {
    pub intent_type: IntentType,
    /// Hint for the agent handling this step, e.g. "name=Keanu Reeves".
    #[serde(default)]
    pub additional_context: Option<String>,
}

impl IntentStep {
    pub fn new(intent_type: IntentType) -> Self {
        Self {
            intent_type,
            additional_context: None,
        }
    }

    pub fn with_context(intent_type: IntentType, context: impl Into<String>) -> Self {
        Self {
            intent_type,
            additional_context: Some(context.into()),
        }
    }

    /// The step hint, if present and non-blank.
    pub fn hint(&self) -> Option<&str> {
        self.additional_context
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IntentResponse {
    pub steps: Vec<IntentStep>,
    pub fallback_message: String,
}

impl IntentResponse {
    pub fn new(steps: Vec<IntentStep>, fallback_message: impl Into<String>) -> Self {
        Self {
            steps,
            fallback_message: fallback_message.into(),
        }
    }

    pub fn not_understood() -> Self {
        Self::new(Vec::new(), NOT_UNDERSTOOD)
    }

    /// False when there is nothing to dispatch: no steps, or a leading `None`.
    pub fn is_actionable(&self) -> bool {
        self.steps
            .first()
            .map_or(false, |s| s.intent_type != IntentType::None)
    }
}

/// Classifies a conversation into intent steps.
#[async_trait]
pub trait IntentClassifier: Send + Sync {
    async fn classify(
        &self,
        conversation: &Conversation,
        cancel: &CancellationToken,
    ) -> Result<IntentResponse, ChatError>;
}

const INSTRUCTIONS: &str = r#"You classify requests sent to a movie catalog assistant.
Read the conversation and decide which of these intents the latest user message needs, in the order they must run:
- DiscoverMovies: browse movies by release year and/or genre.
- PersonSeeker: find an actor, director or crew member, or facts about them.
- SimilarMovieSeeker: find movies similar to a given title, or look up a title.
- ReviewRedactor: rewrite, correct or format a review the user wrote.
- MovieSeeker: detailed questions about one specific movie.
- None: anything outside the movie catalog.
A single message may need several intents, e.g. "find this actor, then movies like their best film".
For each step, put in additionalContext any entity the agent must not guess, e.g. "name=Keanu Reeves".
When the request cannot be served, return no steps and a short, polite fallbackMessage in the user's language.
Reply with one JSON object only:
{"steps":[{"intentType":"PersonSeeker","additionalContext":null}],"fallbackMessage":""}"#;

/// Classifier backed by a completion provider in JSON mode.
pub struct LlmIntentExtractor {
    provider: Arc<dyn CompletionProvider>,
    history_window: usize,
    timeout: Duration,
    temperature: f32,
}

impl LlmIntentExtractor {
    pub fn new(
        provider: Arc<dyn CompletionProvider>,
        history_window: usize,
        timeout: Duration,
        temperature: f32,
    ) -> Self {
        Self {
            provider,
            history_window,
            timeout,
            temperature: temperature.clamp(0.0, 1.0),
        }
    }

    fn request(&self, conversation: &Conversation) -> CompletionRequest {
        CompletionRequest {
            instructions: INSTRUCTIONS.to_string(),
            messages: conversation.recent_non_system(self.history_window),
            temperature: self.temperature,
            response_format: ResponseFormat::JsonObject,
        }
    }
}

#[async_trait]
impl IntentClassifier for LlmIntentExtractor {
    async fn classify(
        &self,
        conversation: &Conversation,
        cancel: &CancellationToken,
    ) -> Result<IntentResponse, ChatError> {
        let request = self.request(conversation);
        let reply = tokio::time::timeout(
            self.timeout,
            self.provider.complete(&request, &NoTools, cancel),
        )
        .await;

        let text = match reply {
            Ok(Ok(text)) => text,
            Ok(Err(CompletionError::Cancelled)) => return Err(ChatError::Cancelled),
            Ok(Err(e)) => {
                warn!(error = %e, "Intent classification failed");
                return Ok(IntentResponse::not_understood());
            }
            Err(_) => {
                warn!(timeout_secs = self.timeout.as_secs(), "Intent classification timed out");
                return Ok(IntentResponse::not_understood());
            }
        };

        let response = parse_intent_response(&text);
        debug!(
            steps = response.steps.len(),
            actionable = response.is_actionable(),
            "Intent classified"
        );
        Ok(response)
    }
}

/// Parse a classifier reply, tolerating a fenced ```json block.
pub fn parse_intent_response(text: &str) -> IntentResponse {
    let body = strip_fences(text);
    if body.is_empty() {
        return IntentResponse::not_understood();
    }
    match serde_json::from_str::<IntentResponse>(body) {
        Ok(parsed) if parsed.steps.is_empty() && parsed.fallback_message.trim().is_empty() => {
            IntentResponse::not_understood()
        }
        Ok(parsed) => parsed,
        Err(e) => {
            warn!(error = %e, "Unparseable intent response");
            IntentResponse::not_understood()
        }
    }
}

fn strip_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}
