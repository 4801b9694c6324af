//! Error types for the assistant core.

use marquee_catalog::CatalogError;

/// Errors from a completion provider invocation.
#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("provider returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed provider response: {0}")]
    MalformedResponse(String),
    #[error("tool-call rounds exceeded ({0})")]
    ToolRoundsExceeded(u32),
    #[error("scripted failure: {0}")]
    Scripted(String),
    #[error("completion cancelled")]
    Cancelled,
}

impl From<reqwest::Error> for CompletionError {
    fn from(err: reqwest::Error) -> Self {
        CompletionError::Http(err.to_string())
    }
}

/// Errors from a tool invocation.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("unknown tool: {0}")]
    UnknownTool(String),
    #[error("invalid tool arguments: {0}")]
    InvalidArguments(String),
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),
    #[error("tool output serialization failed: {0}")]
    Output(String),
}

impl From<serde_json::Error> for ToolError {
    fn from(err: serde_json::Error) -> Self {
        ToolError::Output(err.to_string())
    }
}

/// Errors that escape a conversational turn.
///
/// Provider, tool and classification failures degrade inside the turn;
/// only these reach the caller.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("conversation has no user message")]
    EmptyConversation,
    #[error("turn cancelled")]
    Cancelled,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completion_error_display() {
        let err = CompletionError::Status {
            status: 429,
            body: "rate limited".to_string(),
        };
        assert_eq!(err.to_string(), "provider returned status 429: rate limited");

        let err = CompletionError::ToolRoundsExceeded(5);
        assert_eq!(err.to_string(), "tool-call rounds exceeded (5)");

        assert_eq!(CompletionError::Cancelled.to_string(), "completion cancelled");
    }

    #[test]
    fn test_tool_error_from_catalog_error() {
        let err: ToolError = CatalogError::not_found("person", 7).into();
        assert!(matches!(err, ToolError::Catalog(_)));
        assert_eq!(err.to_string(), "catalog error: person not found: 7");
    }

    #[test]
    fn test_chat_error_display() {
        assert_eq!(ChatError::Cancelled.to_string(), "turn cancelled");
        assert_eq!(
            ChatError::EmptyConversation.to_string(),
            "conversation has no user message"
        );
    }
}
