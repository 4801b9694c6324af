//! Marquee application binary - composition root.
//!
//! 1. Resolve and load configuration
//! 2. Build the catalog gateway (in-memory, optionally seeded)
//! 3. Build the completion provider and the turn router
//! 4. Start the axum API server

mod cli;

use std::path::Path;
use std::sync::Arc;

use clap::Parser;

use marquee_agent::{OpenAiCompletionProvider, Router};
use marquee_api::routes;
use marquee_api::state::AppState;
use marquee_catalog::InMemoryCatalog;
use marquee_core::config::MarqueeConfig;

use crate::cli::CliArgs;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();
    let config_file = args.resolve_config_path();

    if args.init_config {
        MarqueeConfig::default().save(&config_file)?;
        println!("Wrote default configuration to {}", config_file.display());
        return Ok(());
    }

    let mut config = MarqueeConfig::load_or_default(&config_file);

    // Tracing.
    let filter = args.resolve_log_filter(&config.general.log_level);
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_new(&filter)
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Starting Marquee v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(path = %config_file.display(), "Configuration loaded");

    config.general.port = args.resolve_port(config.general.port);
    if let Some(seed) = args.resolve_seed_path() {
        config.catalog.seed_path = Some(seed);
    }

    // Catalog.
    let catalog = InMemoryCatalog::from_seed_path(config.catalog.seed_path.as_deref().map(Path::new))?;
    if config.catalog.seed_path.is_none() {
        tracing::warn!("No catalog seed configured, starting with an empty catalog");
    }

    // Completion provider and router.
    let provider = OpenAiCompletionProvider::from_config(&config.completion)?;
    tracing::info!(
        base_url = %config.completion.base_url,
        model = %config.completion.model,
        "Completion provider ready"
    );
    let router = Router::from_config(&config, Arc::new(provider), Arc::new(catalog));

    let state = AppState::new(config.clone(), router);
    routes::start_server(&config, state).await?;

    Ok(())
}
