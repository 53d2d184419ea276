use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{FinchError, Result};

/// Top-level configuration for the Finch client and proxy.
///
/// Loaded from `~/.finch/config.toml` by default. Every section is optional
/// in the file; missing sections and fields fall back to their defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FinchConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub proxy: ProxyConfig,
    #[serde(default)]
    pub chat: ChatConfig,
}

impl FinchConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: FinchConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
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
            toml::to_string_pretty(self).map_err(|e| FinchError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Backend service the agent and query endpoints live on.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Origin used to absolutize chart locators for direct rendering.
    pub api_base: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            api_base: "http://localhost:8000".to_string(),
        }
    }
}

/// Forwarding proxy settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// Interface the proxy binds to.
    pub host: String,
    /// Port the proxy listens on.
    pub port: u16,
    /// Backend origin every `/api/*` request is forwarded to.
    pub upstream: String,
    /// Upstream request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            upstream: "http://localhost:8000".to_string(),
            timeout_secs: 120,
        }
    }
}

/// Conversational client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Origin of the forwarding proxy all agent and export calls go through.
    pub proxy_base: String,
    /// Agent endpoint path, relative to `proxy_base`.
    pub agent_path: String,
    /// Agent request timeout in seconds.
    pub timeout_secs: u64,
    /// Tenant identifier sent with every dispatch.
    pub company_id: i64,
    /// Exact (case-insensitive) text that resets the conversation.
    pub reset_command: String,
    /// Message shown when the agent response carries none.
    pub placeholder_message: String,
    /// Filename used when an export response names none.
    pub default_export_filename: String,
    /// Directory exported files are written to.
    pub download_dir: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            proxy_base: "http://127.0.0.1:3000".to_string(),
            agent_path: "/api/agent/ask".to_string(),
            timeout_secs: 120,
            company_id: 1,
            reset_command: "reset".to_string(),
            placeholder_message: "(no message)".to_string(),
            default_export_filename: "export.csv".to_string(),
            download_dir: ".".to_string(),
        }
    }
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
        let config = FinchConfig::default();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.backend.api_base, "http://localhost:8000");
        assert_eq!(config.proxy.port, 3000);
        assert_eq!(config.proxy.upstream, "http://localhost:8000");
        assert_eq!(config.chat.agent_path, "/api/agent/ask");
        assert_eq!(config.chat.company_id, 1);
        assert_eq!(config.chat.reset_command, "reset");
        assert_eq!(config.chat.placeholder_message, "(no message)");
        assert_eq!(config.chat.default_export_filename, "export.csv");
    }

    #[test]
    fn test_load_valid_config() {
        let content = r#"
[general]
log_level = "debug"

[backend]
api_base = "https://api.example.com"

[proxy]
host = "0.0.0.0"
port = 8080
upstream = "http://django:8000"
timeout_secs = 30

[chat]
proxy_base = "http://localhost:8080"
company_id = 42
reset_command = "start over"
"#;
        let file = create_temp_config(content);
        let config = FinchConfig::load(file.path()).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.backend.api_base, "https://api.example.com");
        assert_eq!(config.proxy.host, "0.0.0.0");
        assert_eq!(config.proxy.port, 8080);
        assert_eq!(config.proxy.upstream, "http://django:8000");
        assert_eq!(config.proxy.timeout_secs, 30);
        assert_eq!(config.chat.proxy_base, "http://localhost:8080");
        assert_eq!(config.chat.company_id, 42);
        assert_eq!(config.chat.reset_command, "start over");
        // Unset chat fields keep their defaults
        assert_eq!(config.chat.agent_path, "/api/agent/ask");
    }

    #[test]
    fn test_load_partial_config_uses_defaults() {
        let content = r#"
[general]
log_level = "warn"
"#;
        let file = create_temp_config(content);
        let config = FinchConfig::load(file.path()).unwrap();
        assert_eq!(config.general.log_level, "warn");
        assert_eq!(config.proxy.port, 3000);
        assert_eq!(config.chat.timeout_secs, 120);
    }

    #[test]
    fn test_empty_toml_uses_all_defaults() {
        let file = create_temp_config("");
        let config = FinchConfig::load(file.path()).unwrap();
        assert_eq!(config.backend.api_base, "http://localhost:8000");
        assert_eq!(config.chat.download_dir, ".");
    }

    #[test]
    fn test_load_invalid_toml() {
        let file = create_temp_config("[proxy\nport = ");
        let err = FinchConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, FinchError::Config(_)));
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = FinchConfig::load_or_default(Path::new("/nonexistent/finch.toml"));
        assert_eq!(config.proxy.port, 3000);
    }

    #[test]
    fn test_save_creates_parent_dirs_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = FinchConfig::default();
        config.chat.company_id = 7;
        config.proxy.upstream = "http://10.0.0.5:8000".to_string();
        config.save(&path).unwrap();

        let reloaded = FinchConfig::load(&path).unwrap();
        assert_eq!(reloaded.chat.company_id, 7);
        assert_eq!(reloaded.proxy.upstream, "http://10.0.0.5:8000");
        assert_eq!(reloaded.general.log_level, config.general.log_level);
    }
}
