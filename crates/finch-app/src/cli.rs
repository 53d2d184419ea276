//! CLI argument definitions for the Finch binary.
//!
//! Uses `clap` with derive macros for ergonomic argument parsing.
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use finch_core::FinchConfig;

/// Finch - a conversational client for the finance agent backend.
#[derive(Parser, Debug)]
#[command(name = "finch", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level", global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the forwarding proxy in front of the backend.
    Serve {
        /// Port the proxy listens on.
        #[arg(short = 'p', long = "port")]
        port: Option<u16>,

        /// Backend origin every /api/* request is forwarded to.
        #[arg(short = 'u', long = "upstream")]
        upstream: Option<String>,
    },
    /// Start an interactive conversation with the agent.
    Chat {
        /// Tenant identifier sent with every message.
        #[arg(long = "company-id")]
        company_id: Option<i64>,

        /// Origin of the forwarding proxy.
        #[arg(long = "proxy-base")]
        proxy_base: Option<String>,
    },
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > FINCH_CONFIG env var > platform default (~/.finch/config.toml).
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("FINCH_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Apply flag and environment overrides on top of the loaded file.
    pub fn apply_overrides(&self, config: &mut FinchConfig) {
        self.apply_overrides_with(config, |key| std::env::var(key).ok());
    }

    /// Same as [`apply_overrides`](Self::apply_overrides) with an explicit
    /// environment lookup.
    pub fn apply_overrides_with<F>(&self, config: &mut FinchConfig, env: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        // Environment first, so flags win.
        if let Some(port) = env("FINCH_PORT").and_then(|v| v.parse::<u16>().ok()) {
            config.proxy.port = port;
        }
        if let Some(upstream) = env("FINCH_UPSTREAM").filter(|v| !v.is_empty()) {
            config.proxy.upstream = upstream;
        }
        if let Some(base) = env("FINCH_AGENT_BASE").filter(|v| !v.is_empty()) {
            config.backend.api_base = base;
        }

        if let Some(ref level) = self.log_level {
            config.general.log_level = level.clone();
        }

        match &self.command {
            Command::Serve { port, upstream } => {
                if let Some(p) = port {
                    config.proxy.port = *p;
                }
                if let Some(u) = upstream {
                    config.proxy.upstream = u.clone();
                }
            }
            Command::Chat {
                company_id,
                proxy_base,
            } => {
                if let Some(id) = company_id {
                    config.chat.company_id = *id;
                }
                if let Some(base) = proxy_base {
                    config.chat.proxy_base = base.clone();
                }
            }
        }
    }
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".finch").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".finch").join("config.toml");
    }
    PathBuf::from("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_parse_serve_flags() {
        let args =
            CliArgs::try_parse_from(["finch", "serve", "-p", "8080", "-u", "http://django:8000"])
                .unwrap();
        match args.command {
            Command::Serve { port, upstream } => {
                assert_eq!(port, Some(8080));
                assert_eq!(upstream.as_deref(), Some("http://django:8000"));
            }
            _ => panic!("expected serve"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let args =
            CliArgs::try_parse_from(["finch", "chat", "--config", "/tmp/f.toml", "-l", "debug"])
                .unwrap();
        assert_eq!(args.config, Some(PathBuf::from("/tmp/f.toml")));
        assert_eq!(args.log_level.as_deref(), Some("debug"));
        assert_eq!(args.resolve_config_path(), PathBuf::from("/tmp/f.toml"));
    }

    #[test]
    fn test_subcommand_required() {
        assert!(CliArgs::try_parse_from(["finch"]).is_err());
    }

    #[test]
    fn test_env_overrides_file_values() {
        let args = CliArgs::try_parse_from(["finch", "serve"]).unwrap();
        let mut config = FinchConfig::default();
        args.apply_overrides_with(&mut config, |key| match key {
            "FINCH_PORT" => Some("4000".to_string()),
            "FINCH_UPSTREAM" => Some("http://backend:9000".to_string()),
            "FINCH_AGENT_BASE" => Some("https://api.example.com".to_string()),
            _ => None,
        });
        assert_eq!(config.proxy.port, 4000);
        assert_eq!(config.proxy.upstream, "http://backend:9000");
        assert_eq!(config.backend.api_base, "https://api.example.com");
    }

    #[test]
    fn test_flags_override_env() {
        let args = CliArgs::try_parse_from(["finch", "serve", "--port", "5000"]).unwrap();
        let mut config = FinchConfig::default();
        args.apply_overrides_with(&mut config, |key| {
            (key == "FINCH_PORT").then(|| "4000".to_string())
        });
        assert_eq!(config.proxy.port, 5000);
    }

    #[test]
    fn test_invalid_env_port_ignored() {
        let args = CliArgs::try_parse_from(["finch", "serve"]).unwrap();
        let mut config = FinchConfig::default();
        args.apply_overrides_with(&mut config, |key| {
            (key == "FINCH_PORT").then(|| "not-a-port".to_string())
        });
        assert_eq!(config.proxy.port, 3000);
    }

    #[test]
    fn test_chat_overrides() {
        let args = CliArgs::try_parse_from([
            "finch",
            "chat",
            "--company-id",
            "42",
            "--proxy-base",
            "http://localhost:9999",
        ])
        .unwrap();
        let mut config = FinchConfig::default();
        args.apply_overrides_with(&mut config, no_env);
        assert_eq!(config.chat.company_id, 42);
        assert_eq!(config.chat.proxy_base, "http://localhost:9999");
        assert_eq!(config.proxy.port, 3000);
    }

    #[test]
    fn test_log_level_flag_overrides_config() {
        let args = CliArgs::try_parse_from(["finch", "serve", "--log-level", "trace"]).unwrap();
        let mut config = FinchConfig::default();
        args.apply_overrides_with(&mut config, no_env);
        assert_eq!(config.general.log_level, "trace");
    }
}
