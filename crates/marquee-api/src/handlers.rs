//! Route handlers.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use marquee_agent::TurnContext;
use marquee_core::types::{ChatRole, Conversation, PersistedMessage};

use crate::error::ApiError;
use crate::state::AppState;

// =============================================================================
// Health
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub started_at: DateTime<Utc>,
}

/// GET /health - health check.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        started_at: state.started_at,
    })
}

// =============================================================================
// Chat
// =============================================================================

/// Caller-supplied threading state.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AgentContext {
    pub additional_context: Option<String>,
    /// Output-shaping hint, e.g. "markdown".
    pub format: Option<String>,
}

/// Request body for POST /chat.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    /// Full history, oldest first, including the new user message.
    pub messages: Vec<PersistedMessage>,
    #[serde(default)]
    pub agent_context: Option<AgentContext>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub message: String,
    pub author_role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_context: Option<String>,
}

/// POST /chat - run one conversational turn.
///
/// The turn is cancelled if the client disconnects: dropping the handler
/// future drops the guard, which cancels every in-flight provider and
/// gateway call.
pub async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Json(request) = payload?;
    if request.messages.is_empty() {
        return Err(ApiError::BadRequest("messages must not be empty".to_string()));
    }

    let mut conversation = Conversation::from_persisted(request.messages)?;
    let agent_context = request.agent_context.unwrap_or_default();
    let mut ctx = TurnContext::new()
        .with_additional_context(agent_context.additional_context)
        .with_format(agent_context.format);

    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();

    info!(turn_id = %ctx.turn_id, messages = conversation.len(), "Chat turn started");
    let report = state
        .router
        .handle(&mut conversation, &mut ctx, &cancel)
        .await?;
    debug!(turn_id = %ctx.turn_id, responses = ?report.responses, halted = report.halted, "Chat turn report");

    let reply = conversation
        .last()
        .filter(|m| m.role == ChatRole::Assistant)
        .ok_or_else(|| ApiError::Internal("turn produced no assistant reply".to_string()))?;

    Ok(Json(ChatResponse {
        message: reply.content.clone(),
        author_role: reply.role.to_string(),
        additional_context: ctx.additional_context.clone(),
    }))
}
