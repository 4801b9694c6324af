//! Per-turn scratchpad shared between the router and the running agent.
//!
//! A `TurnContext` is created by the request handler, owned exclusively by
//! one in-flight turn, and threaded by `&mut` through each sequential step.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnContext {
    /// Identifier used to correlate log lines of one turn.
    pub turn_id: Uuid,
    /// Textual output of the step currently executing.
    pub result: String,
    /// Hint threaded to the next step and echoed back to the caller.
    pub additional_context: Option<String>,
    /// Optional output-shaping hint (e.g. "html", "markdown").
    pub format: Option<String>,
    pub web_search: bool,
    pub web_sources: Vec<String>,
}

impl TurnContext {
    pub fn new() -> Self {
        Self {
            turn_id: Uuid::new_v4(),
            result: String::new(),
            additional_context: None,
            format: None,
            web_search: false,
            web_sources: Vec::new(),
        }
    }

    /// Seed the threading hint supplied by the caller.
    pub fn with_additional_context(mut self, additional_context: Option<String>) -> Self {
        self.additional_context = additional_context.filter(|c| !c.trim().is_empty());
        self
    }

    pub fn with_format(mut self, format: Option<String>) -> Self {
        self.format = format.filter(|f| !f.trim().is_empty());
        self
    }

    /// Reset per-step state. Called by the router before every dispatch.
    pub fn begin_step(&mut self) {
        self.result.clear();
    }

    pub fn has_result(&self) -> bool {
        !self.result.trim().is_empty()
    }

    /// The threading hint, if present and non-blank.
    pub fn carried_context(&self) -> Option<&str> {
        self.additional_context
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }
}

impl Default for TurnContext {
    fn default() -> Self {
        Self::new()
    }
}
