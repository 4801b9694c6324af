use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{MarqueeError, Result};

/// Top-level configuration for the marquee assistant.
///
/// Loaded from `~/.marquee/config.toml` by default. Each section corresponds
/// to one collaborator of the conversational turn.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarqueeConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub completion: CompletionConfig,
    #[serde(default)]
    pub router: RouterConfig,
    #[serde(default)]
    pub agents: AgentsConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
}

impl MarqueeConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: MarqueeConfig = toml::from_str(&content)?;
        config.validate()?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Reject values the turn router cannot work with.
    ///
    /// Every reply sentence must be non-blank so a turn always ends with an
    /// assistant message.
    pub fn validate(&self) -> Result<()> {
        let sentences = [
            ("router.fallback_message", &self.router.fallback_message),
            ("router.unregistered_message", &self.router.unregistered_message),
            ("router.agent_fallback_message", &self.router.agent_fallback_message),
        ];
        for (key, value) in sentences {
            if value.trim().is_empty() {
                return Err(MarqueeError::Config(format!("{key} must not be blank")));
            }
        }
        Ok(())
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| MarqueeError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// HTTP port for the chat API.
    pub port: u16,
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            port: 3040,
            log_level: "info".to_string(),
        }
    }
}

/// Completion provider settings (OpenAI-compatible chat completions).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletionConfig {
    /// Base URL of the chat-completions API, without the `/chat/completions` suffix.
    pub base_url: String,
    /// Model identifier sent with every request.
    pub model: String,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
    /// Upper bound for a single provider invocation, tool rounds included.
    pub timeout_secs: u64,
    /// Maximum number of tool-call round trips per invocation.
    pub max_tool_rounds: u32,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            timeout_secs: 30,
            max_tool_rounds: 5,
        }
    }
}

/// Router and turn-level settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Number of most recent non-system messages sent to the provider.
    pub history_window: usize,
    /// Merge multi-step results into a single redacted message.
    pub merge_results: bool,
    /// Reply used when classification yields no actionable step and no fallback text.
    pub fallback_message: String,
    /// Reply used when a classified intent has no registered agent.
    pub unregistered_message: String,
    /// Sentence an agent writes when the provider returns nothing usable.
    pub agent_fallback_message: String,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            history_window: 6,
            merge_results: false,
            fallback_message: "Sorry, I can't help with that request.".to_string(),
            unregistered_message: "Sorry, something went wrong while handling your request."
                .to_string(),
            agent_fallback_message: "Sorry, I couldn't find an answer to that.".to_string(),
        }
    }
}

/// Sampling temperatures per agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentsConfig {
    pub intent_temperature: f32,
    pub discover_temperature: f32,
    pub person_temperature: f32,
    pub similar_temperature: f32,
    pub redactor_temperature: f32,
}

impl Default for AgentsConfig {
    fn default() -> Self {
        Self {
            intent_temperature: 0.0,
            discover_temperature: 0.3,
            person_temperature: 0.2,
            similar_temperature: 0.3,
            redactor_temperature: 0.5,
        }
    }
}

/// Catalog gateway settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Optional JSON seed file for the in-memory catalog.
    pub seed_path: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_config() {
        let config = MarqueeConfig::default();
        assert_eq!(config.general.port, 3040);
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.completion.timeout_secs, 30);
        assert_eq!(config.completion.api_key_env, "OPENAI_API_KEY");
        assert_eq!(config.router.history_window, 6);
        assert!(!config.router.merge_results);
        assert!(config.catalog.seed_path.is_none());
    }

    #[test]
    fn test_load_valid_config() {
        let content = r#"
[general]
port = 8080
log_level = "debug"

[completion]
base_url = "http://localhost:11434/v1"
model = "llama3"
timeout_secs = 10

[router]
history_window = 4
merge_results = true

[catalog]
seed_path = "/srv/marquee/catalog.json"
"#;
        let file = create_temp_config(content);
        let config = MarqueeConfig::load(file.path()).unwrap();
        assert_eq!(config.general.port, 8080);
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.completion.base_url, "http://localhost:11434/v1");
        assert_eq!(config.completion.model, "llama3");
        assert_eq!(config.completion.timeout_secs, 10);
        // Unspecified fields in a present section still default
        assert_eq!(config.completion.max_tool_rounds, 5);
        assert_eq!(config.router.history_window, 4);
        assert!(config.router.merge_results);
        assert_eq!(
            config.catalog.seed_path.as_deref(),
            Some("/srv/marquee/catalog.json")
        );
    }

    #[test]
    fn test_load_partial_config_uses_defaults() {
        let content = r#"
[general]
log_level = "warn"
"#;
        let file = create_temp_config(content);
        let config = MarqueeConfig::load(file.path()).unwrap();
        assert_eq!(config.general.log_level, "warn");
        assert_eq!(config.general.port, 3040);
        assert_eq!(config.router.history_window, 6);
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = MarqueeConfig::load_or_default(Path::new("/nonexistent/config.toml"));
        assert_eq!(config.general.port, 3040);
    }

    #[test]
    fn test_config_load_invalid_toml() {
        let file = create_temp_config("this is {{ not valid TOML");
        assert!(MarqueeConfig::load(file.path()).is_err());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sub").join("config.toml");

        let mut config = MarqueeConfig::default();
        config.router.merge_results = true;
        config.catalog.seed_path = Some("seed.json".to_string());
        config.save(&path).unwrap();

        assert!(path.exists());
        let reloaded = MarqueeConfig::load(&path).unwrap();
        assert!(reloaded.router.merge_results);
        assert_eq!(reloaded.catalog.seed_path.as_deref(), Some("seed.json"));
        assert!(
            (reloaded.agents.redactor_temperature - config.agents.redactor_temperature).abs()
                < 1e-6
        );
    }

    #[test]
    fn test_empty_toml_uses_all_defaults() {
        let file = create_temp_config("");
        let config = MarqueeConfig::load(file.path()).unwrap();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.completion.model, "gpt-4o-mini");
        assert_eq!(config.router.agent_fallback_message, RouterConfig::default().agent_fallback_message);
    }

    #[test]
    fn test_load_rejects_blank_fallback_sentences() {
        let file = create_temp_config("[router]\nagent_fallback_message = \"  \"\n");
        let err = MarqueeConfig::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("router.agent_fallback_message"));

        let file = create_temp_config("[router]\nfallback_message = \"\"\n");
        assert!(MarqueeConfig::load(file.path()).is_err());

        // load_or_default falls back to the stock sentences
        let config = MarqueeConfig::load_or_default(file.path());
        assert!(!config.router.fallback_message.is_empty());
        assert!(MarqueeConfig::default().validate().is_ok());
    }
}
