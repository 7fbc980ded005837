//! Configuration module for DavSync.
//!
//! Provides typed configuration structs that map to the YAML configuration file,
//! with loading, validation, defaults, and a builder pattern for programmatic use.
//!
//! Only the daemon reads configuration files. The sync orchestrator receives
//! immutable values derived from a validated [`Config`].

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::domain::{DomainError, RemotePath, WatchedRoot};

// ---------------------------------------------------------------------------
// Config struct with sub-sections
// ---------------------------------------------------------------------------

/// Top-level configuration for DavSync.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub sync: SyncConfig,
    pub remote: RemoteConfig,
    pub retry: RetryConfig,
    pub logging: LoggingConfig,
}

/// Local watching and dispatch settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Local directory mirrored to the remote endpoint.
    pub root: PathBuf,
    /// Milliseconds a path must stay quiet before its intent is dispatched.
    pub debounce_ms: u64,
    /// Maximum number of remote operations in flight at once.
    pub max_concurrent: usize,
    /// Seconds in-flight operations may take to finish after a shutdown signal.
    pub shutdown_grace_secs: u64,
    /// Capacity of the watcher -> scheduler event channel.
    pub channel_capacity: usize,
}

/// Remote WebDAV endpoint settings.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Endpoint URL, e.g. `https://dav.example.com/remote.php/webdav`.
    pub url: String,
    /// Remote directory that mirrors the local root.
    pub base_path: String,
    /// Basic-auth user name.
    pub username: Option<String>,
    /// Basic-auth password.
    pub password: Option<String>,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

/// Retry policy for transient remote failures.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts per intent, including the first one.
    pub max_attempts: u32,
    /// Backoff before the second attempt; doubles afterwards.
    pub base_delay_ms: u64,
    /// Upper bound for a single backoff.
    pub max_delay_ms: u64,
}

/// Logging / tracing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: `trace`, `debug`, `info`, `warn`, or `error`.
    pub level: String,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

impl Config {
    /// Load configuration from a YAML file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::parse(&content, path)
    }

    /// Load from `path`, or use [`Config::default`] if the file does not exist.
    ///
    /// A file that exists but cannot be read or parsed is still an error.
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::parse(&content, path),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(err)
                .with_context(|| format!("Failed to read config file {}", path.display())),
        }
    }

    fn parse(content: &str, path: &Path) -> anyhow::Result<Self> {
        serde_yaml::from_str(content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Platform-appropriate default path for the configuration file.
    ///
    /// Typically `$XDG_CONFIG_HOME/davsync/config.yaml` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("davsync")
            .join("config.yaml")
    }

    /// Builds the immutable local/remote root pairing.
    pub fn watched_root(&self) -> Result<WatchedRoot, DomainError> {
        let remote: RemotePath = self.remote.base_path.parse()?;
        WatchedRoot::new(self.sync.root.clone(), remote)
    }
}

impl SyncConfig {
    /// The debounce window as a [`Duration`].
    pub fn debounce_window(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// The shutdown grace period as a [`Duration`].
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }
}

impl RemoteConfig {
    /// The per-request timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl RetryConfig {
    /// Backoff before the second attempt.
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    /// Upper bound for a single backoff.
    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }
}

// Keep credentials out of logs.
impl fmt::Debug for RemoteConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteConfig")
            .field("url", &self.url)
            .field("base_path", &self.base_path)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            root: dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("~"))
                .join("Sync"),
            debounce_ms: 500,
            max_concurrent: 8,
            shutdown_grace_secs: 10,
            channel_capacity: 1024,
        }
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            base_path: "/".to_string(),
            username: None,
            password: None,
            timeout_secs: 30,
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1000,
            max_delay_ms: 30_000,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// A single validation error found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path to the offending field, e.g. `"sync.debounce_ms"`.
    pub field: String,
    /// Human-readable explanation.
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Valid values for `logging.level`.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Upper bound for `sync.max_concurrent`.
const MAX_CONCURRENCY: usize = 64;

impl Config {
    /// Validate the configuration and return all errors found.
    ///
    /// An empty vector means the configuration is valid.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        let mut push = |field: &str, message: String| {
            errors.push(ValidationError {
                field: field.into(),
                message,
            })
        };

        // --- sync ---
        if !self.sync.root.is_absolute() {
            push(
                "sync.root",
                format!("must be an absolute path: {}", self.sync.root.display()),
            );
        } else if !self.sync.root.is_dir() {
            push(
                "sync.root",
                format!("directory does not exist: {}", self.sync.root.display()),
            );
        }
        if self.sync.debounce_ms == 0 {
            push("sync.debounce_ms", "must be greater than 0".into());
        }
        if self.sync.max_concurrent == 0 || self.sync.max_concurrent > MAX_CONCURRENCY {
            push(
                "sync.max_concurrent",
                format!("must be in range 1..={MAX_CONCURRENCY}"),
            );
        }
        if self.sync.channel_capacity == 0 {
            push("sync.channel_capacity", "must be greater than 0".into());
        }

        // --- remote ---
        if self.remote.url.is_empty() {
            push("remote.url", "must be set".into());
        } else if !(self.remote.url.starts_with("http://") || self.remote.url.starts_with("https://"))
        {
            push(
                "remote.url",
                format!("must be an http(s) URL: {}", self.remote.url),
            );
        }
        if let Err(e) = self.remote.base_path.parse::<RemotePath>() {
            push("remote.base_path", e.to_string());
        }
        if self.remote.password.is_some() && self.remote.username.is_none() {
            push("remote.password", "requires remote.username".into());
        }
        if self.remote.timeout_secs == 0 {
            push("remote.timeout_secs", "must be greater than 0".into());
        }

        // --- retry ---
        if self.retry.max_attempts == 0 {
            push("retry.max_attempts", "must be at least 1".into());
        }
        if self.retry.base_delay_ms == 0 {
            push("retry.base_delay_ms", "must be greater than 0".into());
        }
        if self.retry.max_delay_ms < self.retry.base_delay_ms {
            push(
                "retry.max_delay_ms",
                format!(
                    "max_delay_ms ({}) must not be below base_delay_ms ({})",
                    self.retry.max_delay_ms, self.retry.base_delay_ms
                ),
            );
        }

        // --- logging ---
        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            push(
                "logging.level",
                format!(
                    "invalid level '{}'; valid options: {}",
                    self.logging.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            );
        }

        errors
    }
}

// ---------------------------------------------------------------------------
// ConfigBuilder
// ---------------------------------------------------------------------------

/// Builder for constructing a [`Config`] programmatically.
///
/// Starts from [`Config::default`] and allows selective overrides.
///
/// # Example
///
/// ```rust,no_run
/// use davsync_core::config::ConfigBuilder;
/// use std::path::PathBuf;
///
/// let config = ConfigBuilder::new()
///     .sync_root(PathBuf::from("/home/user/Sync"))
///     .remote_url("https://dav.example.com/webdav")
///     .remote_base_path("/backup")
///     .logging_level("debug")
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder initialised with [`Config::default`] values.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    /// Start from an existing configuration, e.g. one loaded from disk.
    pub fn from_config(config: Config) -> Self {
        Self { config }
    }

    // --- sync ---

    pub fn sync_root(mut self, root: PathBuf) -> Self {
        self.config.sync.root = root;
        self
    }

    pub fn sync_debounce_ms(mut self, ms: u64) -> Self {
        self.config.sync.debounce_ms = ms;
        self
    }

    pub fn sync_max_concurrent(mut self, n: usize) -> Self {
        self.config.sync.max_concurrent = n;
        self
    }

    pub fn sync_shutdown_grace_secs(mut self, seconds: u64) -> Self {
        self.config.sync.shutdown_grace_secs = seconds;
        self
    }

    // --- remote ---

    pub fn remote_url(mut self, url: impl Into<String>) -> Self {
        self.config.remote.url = url.into();
        self
    }

    pub fn remote_base_path(mut self, base_path: impl Into<String>) -> Self {
        self.config.remote.base_path = base_path.into();
        self
    }

    pub fn remote_username(mut self, username: impl Into<String>) -> Self {
        self.config.remote.username = Some(username.into());
        self
    }

    pub fn remote_password(mut self, password: impl Into<String>) -> Self {
        self.config.remote.password = Some(password.into());
        self
    }

    pub fn remote_timeout_secs(mut self, seconds: u64) -> Self {
        self.config.remote.timeout_secs = seconds;
        self
    }

    // --- retry ---

    pub fn retry_max_attempts(mut self, n: u32) -> Self {
        self.config.retry.max_attempts = n;
        self
    }

    pub fn retry_base_delay_ms(mut self, ms: u64) -> Self {
        self.config.retry.base_delay_ms = ms;
        self
    }

    pub fn retry_max_delay_ms(mut self, ms: u64) -> Self {
        self.config.retry.max_delay_ms = ms;
        self
    }

    // --- logging ---

    pub fn logging_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    pub fn logging_json(mut self, json: bool) -> Self {
        self.config.logging.json = json;
        self
    }

    // --- build ---

    /// Consume the builder and return the finished [`Config`].
    pub fn build(self) -> Config {
        self.config
    }

    /// Build and validate in one step. Returns `Err` with the list of
    /// validation errors if the configuration is invalid.
    pub fn build_validated(self) -> Result<Config, Vec<ValidationError>> {
        let config = self.build();
        let errors = config.validate();
        if errors.is_empty() {
            Ok(config)
        } else {
            Err(errors)
        }
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
