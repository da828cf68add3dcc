//! Configuration management.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Configuration structure that matches the TOML file format.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    server: ServerConfig,
    #[serde(default)]
    auth: AuthSection,
    #[serde(default)]
    backend: BackendSection,
    #[serde(default)]
    session: SessionSection,
    #[serde(default)]
    logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ServerConfig {
    #[serde(default = "default_host")]
    host: String,
    #[serde(default = "default_port")]
    port: u16,
    #[serde(default)]
    base_path: String,
    #[serde(default)]
    cors_allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            base_path: String::new(),
            cors_allowed_origins: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct AuthSection {
    api_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct BackendSection {
    #[serde(default = "default_backend_url")]
    url: String,
    token: Option<String>,
    #[serde(default = "default_backend_timeout")]
    timeout_secs: u64,
}

impl Default for BackendSection {
    fn default() -> Self {
        Self {
            url: default_backend_url(),
            token: None,
            timeout_secs: default_backend_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SessionSection {
    /// Per-session event log cap, 0 = unbounded
    #[serde(default = "default_max_events")]
    max_events: usize,
    /// 0 = never expire idle sessions
    #[serde(default)]
    idle_timeout_secs: u64,
    #[serde(default = "default_shutdown_timeout")]
    shutdown_timeout_secs: u64,
}

impl Default for SessionSection {
    fn default() -> Self {
        Self {
            max_events: default_max_events(),
            idle_timeout_secs: 0,
            shutdown_timeout_secs: default_shutdown_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct LoggingConfig {
    /// Path to log file (if set, logs will be written to file in addition to stdout)
    log_file: Option<PathBuf>,
    /// Log level (trace, debug, info, warn, error)
    /// If not set, uses RUST_LOG environment variable or defaults to "info"
    log_level: Option<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    podgate_types::DEFAULT_PORT
}

fn default_backend_url() -> String {
    podgate_types::DEFAULT_BACKEND_URL.to_string()
}

fn default_backend_timeout() -> u64 {
    30
}

fn default_max_events() -> usize {
    1000
}

fn default_shutdown_timeout() -> u64 {
    5
}

/// Values given on the command line. `None` leaves the lower layers alone.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub base_path: Option<String>,
    pub api_key: Option<String>,
    pub backend_url: Option<String>,
    pub backend_token: Option<String>,
    pub log_level: Option<String>,
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Address to bind
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Mount point of all routes, `""` or `/segment...` without trailing slash
    pub base_path: String,
    /// Allowed CORS origins, empty = any
    pub cors_allowed_origins: Vec<String>,
    /// Shared API key, `None` disables authentication
    pub api_key: Option<String>,
    /// Base URL of the backend REST API
    pub backend_url: String,
    /// Bearer token for the backend
    pub backend_token: Option<String>,
    /// Upper bound for every backend call
    pub backend_timeout: Duration,
    /// Per-session event log cap, `None` = unbounded
    pub max_events: Option<usize>,
    /// Sessions idle for longer are closed, `None` = never
    pub idle_timeout: Option<Duration>,
    /// Upper bound for closing all sessions at shutdown
    pub shutdown_timeout: Duration,
    /// Path to log file (if set, logs will be written to file in addition to stdout)
    pub log_file: Option<PathBuf>,
    /// Log level (if set, overrides RUST_LOG environment variable)
    pub log_level: Option<String>,
}

impl Config {
    /// Load configuration with full priority chain: CLI args > env vars > config files > defaults.
    ///
    /// Config files are searched in this order:
    /// 1. `.podgate.toml` in current directory
    /// 2. `config.toml` in user config directory (~/.config/podgate/ on Linux)
    pub fn from_figment(cli: &CliOverrides) -> anyhow::Result<Self> {
        // Find config file paths
        let local_config = std::env::current_dir()
            .ok()
            .map(|d| d.join(".podgate.toml"));
        let user_config = directories::ProjectDirs::from("", "", "podgate")
            .map(|dirs| dirs.config_dir().join("config.toml"));

        // Build figment with priority: defaults < user config < local config < env vars < CLI args
        let mut figment = Figment::new().merge(Serialized::defaults(ConfigFile::default()));

        if let Some(ref path) = user_config {
            if path.exists() {
                figment = figment.merge(Toml::file(path));
            }
        }

        if let Some(ref path) = local_config {
            if path.exists() {
                figment = figment.merge(Toml::file(path));
            }
        }

        // PODGATE_SERVER__PORT -> server.port
        figment = figment.merge(Env::prefixed("PODGATE_").split("__"));

        if let Some(ref host) = cli.host {
            figment = figment.merge(Serialized::default("server.host", host));
        }
        if let Some(port) = cli.port {
            figment = figment.merge(Serialized::default("server.port", port));
        }
        if let Some(ref base_path) = cli.base_path {
            figment = figment.merge(Serialized::default("server.base_path", base_path));
        }
        if let Some(ref key) = cli.api_key {
            figment = figment.merge(Serialized::default("auth.api_key", key));
        }
        if let Some(ref url) = cli.backend_url {
            figment = figment.merge(Serialized::default("backend.url", url));
        }
        if let Some(ref token) = cli.backend_token {
            figment = figment.merge(Serialized::default("backend.token", token));
        }
        if let Some(ref level) = cli.log_level {
            figment = figment.merge(Serialized::default("logging.log_level", level));
        }

        let file: ConfigFile = figment.extract()?;
        Ok(Self::from_file(file))
    }

    fn from_file(file: ConfigFile) -> Self {
        Self {
            host: file.server.host,
            port: file.server.port,
            base_path: normalize_base_path(&file.server.base_path),
            cors_allowed_origins: file.server.cors_allowed_origins,
            api_key: file.auth.api_key.filter(|k| !k.is_empty()),
            backend_url: file.backend.url,
            backend_token: file.backend.token.filter(|t| !t.is_empty()),
            backend_timeout: Duration::from_secs(file.backend.timeout_secs),
            max_events: (file.session.max_events > 0).then_some(file.session.max_events),
            idle_timeout: (file.session.idle_timeout_secs > 0)
                .then(|| Duration::from_secs(file.session.idle_timeout_secs)),
            shutdown_timeout: Duration::from_secs(file.session.shutdown_timeout_secs),
            log_file: file.logging.log_file,
            log_level: file.logging.log_level,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_file(ConfigFile::default())
    }
}

/// Normalize a mount point to `""` or `/a/b` (leading slash, no trailing slash).
pub fn normalize_base_path(path: &str) -> String {
    let trimmed = path.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{}", trimmed)
    }
}
