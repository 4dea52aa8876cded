//! HyprLink CLI
//!
//! Operator entry point for the HyprLink daemon. Provides:
//! - `daemon`: run the daemon in the foreground
//! - `get`: fetch live data from a connected device
//! - `build`: print the description built from the config directory
//! - `status`: check whether the daemon accepts connections

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use hyprlink_core::{Directories, build_config};
use hyprlink_rpc::{ClientError, DEFAULT_PORT, QUERY_TIMEOUT, is_listening, local_addr, query};
use std::path::PathBuf;
use std::process::Command;
use std::time::Duration;

const STATUS_TIMEOUT: Duration = Duration::from_secs(2);

/// Find a binary, preferring the dev build next to this executable
fn find_binary(name: &str) -> PathBuf {
    if let Ok(exe) = std::env::current_exe()
        && let Some(dir) = exe.parent()
    {
        let dev_binary = dir.join(name);
        if dev_binary.exists() {
            return dev_binary;
        }
    }
    PathBuf::from(name)
}

/// Run a binary in the foreground, bailing on failure
fn run_foreground(name: &str, args: &[String]) -> Result<()> {
    let binary = find_binary(name);
    let status = Command::new(&binary)
        .args(args)
        .status()
        .with_context(|| format!("Failed to start {}. Is it installed?", binary.display()))?;
    if !status.success() {
        bail!("{name} exited with status: {status}");
    }
    Ok(())
}

/// HyprLink CLI
#[derive(Parser, Debug)]
#[command(name = "hyprlink")]
#[command(about = "HyprLink - drive this desktop from a paired device")]
#[command(version)]
#[command(after_help = "\
Examples:
  hyprlink daemon                 Run daemon in foreground (for systemd)
  hyprlink daemon --port 9090     Pass options through to the daemon
  hyprlink get                    Ask the connected device for its status
  hyprlink build                  Print the built UI description and hash
  hyprlink status                 Check whether the daemon is listening
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the daemon in foreground (for systemd or manual use)
    Daemon {
        /// Arguments passed to hyprlink-daemon
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Fetch live data from a connected device through the daemon
    Get {
        /// What to ask the device for
        #[arg(long, default_value = "all")]
        target: String,

        /// Daemon TCP port
        #[arg(long, default_value_t = DEFAULT_PORT)]
        port: u16,
    },

    /// Build the UI description from the config directory and print it
    Build {
        /// Config directory (defaults to `~/.config/hyprlink`)
        #[arg(long, value_name = "PATH")]
        config_dir: Option<PathBuf>,
    },

    /// Check whether the daemon accepts connections
    Status {
        /// Daemon TCP port
        #[arg(long, default_value_t = DEFAULT_PORT)]
        port: u16,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Daemon { args } => run_foreground("hyprlink-daemon", &args),
        Commands::Get { target, port } => run_get(&target, port).await,
        Commands::Build { config_dir } => run_build(config_dir),
        Commands::Status { port } => run_status(port).await,
    }
}

async fn run_get(target: &str, port: u16) -> Result<()> {
    let reply = match query(local_addr(port), target, QUERY_TIMEOUT).await {
        Ok(reply) => reply,
        Err(ClientError::Remote(message)) => bail!("Daemon replied with error: {message}"),
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to query daemon on port {port}"));
        }
    };
    println!("{}", serde_json::to_string_pretty(&reply)?);
    Ok(())
}

fn run_build(config_dir: Option<PathBuf>) -> Result<()> {
    let dirs = match config_dir {
        Some(base) => Directories::with_base(base),
        None => Directories::new()?,
    };
    let built = build_config(&dirs)
        .with_context(|| format!("Failed to build config from {}", dirs.config.display()))?;

    println!("Hash: {}", built.ui.hash);
    println!("Modules: {}", built.ui.module_count());
    println!("Actions: {}", built.actions.len());
    println!("{}", serde_json::to_string_pretty(&built.ui)?);
    Ok(())
}

async fn run_status(port: u16) -> Result<()> {
    let addr = local_addr(port);
    if is_listening(addr, STATUS_TIMEOUT).await {
        println!("Status: Running");
        println!("Address: {addr}");
    } else {
        println!("Status: Not running");
        println!("Address: {addr} (no listener)");
    }
    Ok(())
}
