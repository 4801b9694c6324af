//! Conversational core of marquee.
//!
//! Classifies each user turn into intent steps, dispatches them in order to
//! specialized agents backed by a completion provider, and exposes a slice
//! of the catalog gateway to those agents as callable tools.

pub mod agent;
pub mod completion;
pub mod context;
pub mod error;
pub mod intent;
pub mod plugin;
pub mod router;

pub use agent::{Agent, AgentRegistry, AgentRuntime};
pub use completion::{
    CompletionProvider, CompletionRequest, OpenAiCompletionProvider, ResponseFormat,
    ScriptedCompletion, ScriptedTurn, ToolInvoker, ToolSpec,
};
pub use context::TurnContext;
pub use error::{ChatError, CompletionError, ToolError};
pub use intent::{IntentClassifier, IntentResponse, IntentStep, IntentType, LlmIntentExtractor};
pub use router::{Router, TurnReport};
