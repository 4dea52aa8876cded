//! HyprLink daemon entry point.
//!
//! This binary starts the TCP server that paired devices connect to, along
//! with the module poller, watchers and discovery responder.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use hyprlink_core::Directories;
use hyprlink_daemon::{
    DEFAULT_DISCOVERY_PORT, DEFAULT_PORT, DiscoveryMode, ServerOptions, SystemHost,
};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// HyprLink daemon - LAN bridge between paired devices and this desktop
#[derive(Parser, Debug)]
#[command(name = "hyprlink-daemon")]
#[command(version, about, long_about = None)]
struct Args {
    /// TCP port devices connect to
    #[arg(long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Config directory (defaults to `~/.config/hyprlink`)
    #[arg(long, value_name = "PATH")]
    config_dir: Option<PathBuf>,

    /// UDP discovery role
    #[arg(long, value_enum, default_value_t = DiscoveryMode::Listen)]
    discovery: DiscoveryMode,

    /// UDP discovery port
    #[arg(long, default_value_t = DEFAULT_DISCOVERY_PORT)]
    discovery_port: u16,
}

/// Set up logging with file output for debugging.
/// In debug builds, defaults to debug level and logs to timestamped file.
/// In release builds, defaults to info level and logs to stderr.
fn setup_logging() {
    let default_level = if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("hyprlink={default_level}")));

    if cfg!(debug_assertions) {
        let temp_dir = std::env::temp_dir();
        let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        let log_filename = format!("hyprlink-daemon-{timestamp}.log");
        let log_path = temp_dir.join(&log_filename);

        #[cfg(unix)]
        {
            let symlink_path = temp_dir.join("hyprlink-daemon.log");
            let _ = std::fs::remove_file(&symlink_path);
            let _ = std::os::unix::fs::symlink(&log_path, &symlink_path);
        }

        let file_appender = tracing_appender::rolling::never(&temp_dir, &log_filename);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        std::mem::forget(guard);

        let file_layer = fmt::layer()
            .with_writer(non_blocking)
            .with_ansi(false)
            .with_target(true)
            .with_line_number(true);

        let stderr_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(true)
            .with_target(true)
            .with_line_number(true);

        tracing_subscriber::registry()
            .with(file_layer)
            .with(stderr_layer)
            .with(filter)
            .init();

        eprintln!("Logging to: {} (and stderr)", log_path.display());
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer())
            .with(filter)
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    setup_logging();

    let dirs = match args.config_dir {
        Some(base) => Directories::with_base(base),
        None => Directories::new()?,
    };

    let mut options = ServerOptions::new(dirs);
    options.port = args.port;
    options.discovery = args.discovery;
    options.discovery_port = args.discovery_port;

    info!("Starting hyprlink daemon...");

    hyprlink_daemon::run(options, Arc::new(SystemHost::new())).await?;

    info!("HyprLink daemon stopped");
    Ok(())
}
