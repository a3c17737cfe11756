//! TOML configuration.
//!
//! Layered like so: explicit `--config` path, then `BLASTRADIUS_CONFIG`, then
//! `/etc/blastradius/blastradius.toml`, then compiled-in defaults.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::catalog::AssetMetadata;

pub const CONFIG_ENV: &str = "BLASTRADIUS_CONFIG";
pub const SYSTEM_CONFIG_PATH: &str = "/etc/blastradius/blastradius.toml";

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Static per-asset metadata (ip, location, type).
    #[serde(default)]
    pub assets: Vec<AssetMetadata>,
}

impl AppConfig {
    /// Load configuration from a TOML file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("failed to parse config file: {}", path.display()))?;
        info!(path = %path.display(), assets = config.assets.len(), "loaded configuration");
        Ok(config)
    }

    /// Try the env override, then the system path, then defaults.
    pub fn load_or_default() -> Self {
        if let Ok(env_path) = std::env::var(CONFIG_ENV) {
            let path = Path::new(&env_path);
            match Self::load(path) {
                Ok(cfg) => return cfg,
                Err(e) => {
                    warn!(
                        path = %path.display(),
                        error = %e,
                        "BLASTRADIUS_CONFIG set but file could not be loaded, trying fallback"
                    );
                }
            }
        }

        let system_path = Path::new(SYSTEM_CONFIG_PATH);
        if system_path.exists() {
            match Self::load(system_path) {
                Ok(cfg) => return cfg,
                Err(e) => {
                    warn!(
                        path = %system_path.display(),
                        error = %e,
                        "system config file exists but could not be loaded, using defaults"
                    );
                }
            }
        }

        debug!("no config file found, using compiled-in defaults");
        Self::default()
    }

    /// An explicit path must load; otherwise fall back through the layers.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::load(path),
            None => Ok(Self::load_or_default()),
        }
    }
}

/// Where the upstream graph service and the narrative generator live.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Base URL of the impact REST API (`/servers`, `/impact/..`, ...).
    pub base_url: String,
    /// Base URL hosting `/incident-summary`.
    pub narrative_base_url: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000/api".to_string(),
            narrative_base_url: "http://localhost:8000/ai".to_string(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    /// Allow any origin to call the JSON API.
    pub cors_allow_any: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8080".to_string(),
            cors_allow_any: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Minimum tracing level when `RUST_LOG` is not set.
    pub level: String,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_sane() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.upstream.base_url, "http://localhost:8000/api");
        assert_eq!(cfg.upstream.narrative_base_url, "http://localhost:8000/ai");
        assert_eq!(cfg.upstream.timeout_secs, 10);
        assert_eq!(cfg.server.bind, "127.0.0.1:8080");
        assert!(cfg.server.cors_allow_any);
        assert_eq!(cfg.logging.level, "info");
        assert!(!cfg.logging.json);
        assert!(cfg.assets.is_empty());
    }

    #[test]
    fn test_parse_full_toml() {
        let toml_str = r#"
[upstream]
base_url = "http://graph.internal:9000/api"
narrative_base_url = "http://llm.internal/ai"
timeout_secs = 3

[server]
bind = "0.0.0.0:9090"
cors_allow_any = false

[logging]
level = "debug"
json = true

[[assets]]
name = "Core Banking Cluster"
ip = "10.0.1.10"
location = "London DC1"
kind = "Database Cluster"

[[assets]]
name = "Payments Gateway Node"
ip = "10.0.2.20"
location = "Manchester DC2"
kind = "Gateway"
"#;
        let cfg: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.upstream.base_url, "http://graph.internal:9000/api");
        assert_eq!(cfg.upstream.timeout_secs, 3);
        assert_eq!(cfg.server.bind, "0.0.0.0:9090");
        assert!(!cfg.server.cors_allow_any);
        assert!(cfg.logging.json);
        assert_eq!(cfg.assets.len(), 2);
        assert_eq!(cfg.assets[1].kind, "Gateway");
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let cfg: AppConfig = toml::from_str("[server]\nbind = \"10.0.0.1:80\"\n").unwrap();
        assert_eq!(cfg.server.bind, "10.0.0.1:80");
        assert!(cfg.server.cors_allow_any);
        assert_eq!(cfg.upstream.timeout_secs, 10);
        assert_eq!(cfg.logging.level, "info");
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("blastradius.toml");
        std::fs::write(&path, "[upstream]\ntimeout_secs = 42\n").unwrap();

        let cfg = AppConfig::load(&path).unwrap();
        assert_eq!(cfg.upstream.timeout_secs, 42);

        let cfg = AppConfig::resolve(Some(&path)).unwrap();
        assert_eq!(cfg.upstream.timeout_secs, 42);
    }

    #[test]
    fn test_shipped_example_parses() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("blastradius.example.toml");
        let cfg = AppConfig::load(&path).unwrap();
        assert_eq!(cfg.assets.len(), 4);
        assert_eq!(cfg.upstream.base_url, AppConfig::default().upstream.base_url);
    }

    #[test]
    fn test_explicit_missing_file_errors() {
        assert!(AppConfig::resolve(Some(Path::new("/nonexistent/blastradius.toml"))).is_err());
    }

    #[test]
    fn test_serialization_roundtrip() {
        let mut cfg = AppConfig::default();
        cfg.assets.push(AssetMetadata {
            name: "Risk Management Server".into(),
            ip: "10.0.4.40".into(),
            location: "Edinburgh DC3".into(),
            kind: "Application Server".into(),
        });
        let s = toml::to_string_pretty(&cfg).unwrap();
        let back: AppConfig = toml::from_str(&s).unwrap();
        assert_eq!(back.assets, cfg.assets);
        assert_eq!(back.server.bind, cfg.server.bind);
    }
}
