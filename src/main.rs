//! Live Signal CLI server
//!
//! ```sh
//! # Run with default config (~/.config/live-signal/config.toml)
//! live-signal
//!
//! # Custom config path and port
//! live-signal --config /etc/live-signal/config.toml --port 9000
//!
//! # Validate config without starting
//! live-signal --check
//! ```

use std::path::PathBuf;

use clap::Parser;
use tracing::{error, info};

use live_signal::shared::errors::AppError;
use live_signal::{default_config_path, init_tracing, AppConfig, ServerHandle};

/// Signaling relay for peer-to-peer live audio/video sessions.
#[derive(Parser, Debug)]
#[command(name = "live-signal", version, about)]
struct Cli {
    /// Path to the configuration file (TOML).
    #[arg(short, long, env = "LIVE_SIGNAL_CONFIG")]
    config: Option<PathBuf>,

    /// Override the listen host.
    #[arg(long)]
    host: Option<String>,

    /// Override the listen port (HTTP + signaling socket).
    #[arg(short, long)]
    port: Option<u16>,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(short, long)]
    log_level: Option<String>,

    /// Validate the configuration file and exit without starting the server.
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let cli = Cli::parse();

    // ── Load configuration ─────────────────────────────────────
    let config_path = cli.config.unwrap_or_else(default_config_path);

    let (mut config, load_error) = match AppConfig::load(&config_path) {
        Ok(cfg) => (cfg, None),
        Err(e) => (AppConfig::default(), Some(e)),
    };

    // ── Apply CLI overrides ────────────────────────────────────
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }

    // ── Config validation mode ─────────────────────────────────
    if cli.check {
        if let Some(e) = load_error {
            eprintln!("Invalid configuration in {}: {}", config_path.display(), e);
            return Err(e.into());
        }
        println!("Configuration is valid");
        println!("   Config file : {}", config_path.display());
        println!("   Address     : {}", config.server.address());
        println!("   Log level   : {}", config.logging.level);
        println!("   Log format  : {}", config.logging.format);
        return Ok(());
    }

    init_tracing(&config);
    match load_error {
        None => info!("Configuration loaded from {}", config_path.display()),
        Some(e) => {
            error!("Failed to load config from {}: {}", config_path.display(), e);
            error!("Using default configuration.");
        }
    }

    // ── Start server ───────────────────────────────────────────
    let handle = ServerHandle::start(config).await?;
    handle.install_signal_handler();

    info!("Press Ctrl+C to shutdown gracefully.");
    handle.wait().await;

    Ok(())
}
