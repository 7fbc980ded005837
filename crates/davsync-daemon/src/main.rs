//! DavSync Daemon - Background one-way mirror service
//!
//! This binary runs as a long-lived user service and handles:
//! - Watching the local root recursively
//! - Mirroring settled changes to the WebDAV endpoint
//! - Graceful shutdown on SIGTERM/SIGINT
//!
//! # Architecture
//!
//! The daemon wires the WebDAV transport, the orchestrator, the file watcher
//! and the scheduler together, then runs the scheduler until a shutdown
//! signal cancels the shared `CancellationToken`. In-flight operations are
//! drained within the configured grace period before exiting.
//!
//! A watcher failure ends the daemon with an error so a supervisor
//! (e.g. systemd with `Restart=on-failure`) can restart it.

use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::Parser;
use davsync_core::{
    config::{Config, ConfigBuilder},
    ports::IRemoteStorage,
};
use davsync_sync::{
    orchestrator::{OrchestratorSettings, SyncOrchestrator},
    reporter::TracingReporter,
    retry::RetryPolicy,
    scheduler::SyncScheduler,
    watcher::FileWatcher,
};
use davsync_webdav::{WebDavClient, WebDavConfig, WebDavStorage};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

// ============================================================================
// Command line
// ============================================================================

#[derive(Debug, Parser)]
#[command(
    name = "davsyncd",
    version,
    about = "Mirror a local directory onto a WebDAV server"
)]
struct Args {
    /// Use alternate config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Local directory to watch (overrides sync.root)
    #[arg(long)]
    root: Option<PathBuf>,

    /// WebDAV endpoint URL (overrides remote.url)
    #[arg(long)]
    remote_url: Option<String>,

    /// Remote directory mirroring the root (overrides remote.base_path)
    #[arg(long)]
    remote_base: Option<String>,

    /// WebDAV user name (overrides remote.username)
    #[arg(long)]
    username: Option<String>,

    /// WebDAV password
    #[arg(long, env = "DAVSYNC_PASSWORD", hide = true, hide_env_values = true)]
    password: Option<String>,

    /// Debounce window in milliseconds (overrides sync.debounce_ms)
    #[arg(long)]
    debounce_ms: Option<u64>,

    /// Maximum concurrent transfers (overrides sync.max_concurrent)
    #[arg(long)]
    max_concurrent: Option<usize>,

    /// Verbose output (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,
}

impl Args {
    /// Loads the config file and layers the command line on top
    fn load_config(&self) -> Result<Config> {
        let config = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::load_or_default(&Config::default_path())?,
        };

        let mut builder = ConfigBuilder::from_config(config);
        if let Some(root) = &self.root {
            builder = builder.sync_root(root.clone());
        }
        if let Some(url) = &self.remote_url {
            builder = builder.remote_url(url.as_str());
        }
        if let Some(base) = &self.remote_base {
            builder = builder.remote_base_path(base.as_str());
        }
        if let Some(username) = &self.username {
            builder = builder.remote_username(username.as_str());
        }
        if let Some(password) = &self.password {
            builder = builder.remote_password(password.as_str());
        }
        if let Some(ms) = self.debounce_ms {
            builder = builder.sync_debounce_ms(ms);
        }
        if let Some(n) = self.max_concurrent {
            builder = builder.sync_max_concurrent(n);
        }
        if self.json_logs {
            builder = builder.logging_json(true);
        }
        match self.verbose {
            0 => {}
            1 => builder = builder.logging_level("debug"),
            _ => builder = builder.logging_level("trace"),
        }

        Ok(builder.build())
    }
}

// ============================================================================
// Tracing
// ============================================================================

/// Installs the global subscriber; `RUST_LOG` wins over the configured level
fn init_tracing(config: &Config) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    if config.logging.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}

// ============================================================================
// Daemon
// ============================================================================

/// Wires the mirror together and runs it until shutdown
struct Daemon {
    /// Validated configuration
    config: Config,
    /// Token for signalling graceful shutdown to all async tasks
    shutdown: CancellationToken,
}

impl Daemon {
    fn new(config: Config, shutdown: CancellationToken) -> Self {
        Self { config, shutdown }
    }

    /// Runs the mirror
    ///
    /// 1. Builds the WebDAV transport and the orchestrator
    /// 2. Starts the recursive watch on the root
    /// 3. Runs the scheduler until shutdown or watcher failure
    /// 4. Stops the watcher and drains in-flight operations
    async fn run(&self) -> Result<()> {
        let root = self
            .config
            .watched_root()
            .context("Invalid watched root")?;

        let client = WebDavClient::new(WebDavConfig::from(&self.config.remote))
            .context("Failed to create WebDAV client")?;
        info!(endpoint = %client.endpoint(), "WebDAV client ready");
        let storage: Arc<dyn IRemoteStorage> = Arc::new(WebDavStorage::new(client));

        let orchestrator = Arc::new(SyncOrchestrator::new(
            OrchestratorSettings {
                root: root.clone(),
                max_concurrent: self.config.sync.max_concurrent,
                retry: RetryPolicy::from(&self.config.retry),
            },
            storage,
            Arc::new(TracingReporter),
        ));

        let (mut watcher, events) = FileWatcher::new(self.config.sync.channel_capacity)?;
        watcher.watch(root.local())?;
        info!(root = %root, "Mirroring started");

        let scheduler = SyncScheduler::new(
            events,
            self.config.sync.debounce_window(),
            Arc::clone(&orchestrator),
            self.shutdown.clone(),
        );
        let result = scheduler.run().await;

        // No new events from here on
        drop(watcher);

        let grace = self.config.sync.shutdown_grace();
        if !orchestrator.shutdown(grace).await {
            warn!(
                grace_secs = grace.as_secs(),
                "Some operations were aborted at shutdown"
            );
        }

        result.context("Sync scheduler failed")
    }
}

// ============================================================================
// Graceful shutdown signal handler
// ============================================================================

/// Waits for SIGTERM or SIGINT and triggers the cancellation token
async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C)");
        }
        _ = terminate => {
            info!("Received SIGTERM");
        }
        _ = token.cancelled() => {}
    }

    token.cancel();
}

// ============================================================================
// Main entry point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let mut config = args.load_config()?;

    init_tracing(&config);
    info!("DavSync daemon starting (davsyncd)");

    let errors = config.validate();
    if !errors.is_empty() {
        for err in &errors {
            error!(field = %err.field, "Invalid configuration: {}", err.message);
        }
        anyhow::bail!("Configuration has {} error(s)", errors.len());
    }

    // Watcher events carry resolved paths, so the root must too
    config.sync.root = config
        .sync
        .root
        .canonicalize()
        .with_context(|| format!("Failed to resolve {}", config.sync.root.display()))?;
    info!(config = ?config.remote, root = %config.sync.root.display(), "Loaded configuration");

    let shutdown_token = CancellationToken::new();

    let signal_token = shutdown_token.clone();
    tokio::spawn(async move {
        shutdown_signal(signal_token).await;
    });

    let daemon = Daemon::new(config, shutdown_token.clone());
    let result = daemon.run().await;
    shutdown_token.cancel();

    match &result {
        Ok(()) => info!("Daemon shut down"),
        Err(e) => error!(error = %format!("{e:#}"), "Daemon exiting with error"),
    }

    result
}

// ============================================================================
// Tests
// ============================================================================
