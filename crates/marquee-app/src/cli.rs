//! CLI argument definitions.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::Parser;
use std::path::PathBuf;

/// Marquee - a conversational assistant over a movie catalog.
#[derive(Parser, Debug)]
#[command(name = "marquee", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// API server port.
    #[arg(short = 'p', long = "port")]
    pub port: Option<u16>,

    /// Log level or filter directive (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,

    /// JSON seed file for the in-memory catalog.
    #[arg(short = 's', long = "seed")]
    pub seed: Option<PathBuf>,

    /// Write a default configuration file to the resolved path and exit.
    #[arg(long = "init-config")]
    pub init_config: bool,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > MARQUEE_CONFIG env var > ~/.marquee/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("MARQUEE_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Resolve the API server port.
    ///
    /// Priority: --port flag > MARQUEE_PORT env var > config file value.
    pub fn resolve_port(&self, config_port: u16) -> u16 {
        if let Some(p) = self.port {
            return p;
        }
        if let Ok(val) = std::env::var("MARQUEE_PORT") {
            if let Ok(p) = val.parse::<u16>() {
                return p;
            }
        }
        config_port
    }

    /// Resolve the log filter.
    ///
    /// Priority: --log-level flag > RUST_LOG env var > config file value.
    pub fn resolve_log_filter(&self, config_level: &str) -> String {
        if let Some(ref level) = self.log_level {
            return level.clone();
        }
        if let Ok(filter) = std::env::var("RUST_LOG") {
            if !filter.trim().is_empty() {
                return filter;
            }
        }
        config_level.to_string()
    }

    /// Catalog seed path override, if given.
    pub fn resolve_seed_path(&self) -> Option<String> {
        self.seed
            .as_ref()
            .map(|p| p.to_string_lossy().to_string())
    }
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".marquee").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".marquee").join("config.toml");
    }
    PathBuf::from("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_take_priority() {
        let args = CliArgs::parse_from([
            "marquee",
            "--config",
            "/tmp/marquee.toml",
            "--port",
            "4000",
            "--log-level",
            "debug",
            "--seed",
            "data/catalog.json",
        ]);
        assert_eq!(args.resolve_config_path(), PathBuf::from("/tmp/marquee.toml"));
        assert_eq!(args.resolve_port(3040), 4000);
        assert_eq!(args.resolve_log_filter("info"), "debug");
        assert_eq!(args.resolve_seed_path().as_deref(), Some("data/catalog.json"));
        assert!(!args.init_config);
    }

    #[test]
    fn test_no_seed_override() {
        let args = CliArgs::parse_from(["marquee", "--init-config"]);
        assert!(args.init_config);
        assert!(args.resolve_seed_path().is_none());
    }
}
