//! Application state shared across route handlers.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};

use marquee_agent::Router;
use marquee_core::config::MarqueeConfig;

/// Shared application state. Every field is cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<MarqueeConfig>,
    /// Turn router; stateless across requests.
    pub router: Arc<Router>,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(config: MarqueeConfig, router: Router) -> Self {
        Self {
            config: Arc::new(config),
            router: Arc::new(router),
            start_time: Instant::now(),
            started_at: Utc::now(),
        }
    }
}
