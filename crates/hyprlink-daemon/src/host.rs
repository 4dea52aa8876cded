//! Side effects on the desktop host.
//!
//! Everything the daemon does outside its own process goes through [`Host`]:
//! shell commands, media transport, clipboard, notifications. [`SystemHost`]
//! shells out to the usual Wayland/MPRIS tools.

use std::io;
use std::process::Stdio;

use async_trait::async_trait;
use hyprlink_rpc::MediaStatus;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::trace;

const SHELL: &str = "/bin/bash";

/// Built-in media transport operations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MediaCommand {
    Play,
    Pause,
    Next,
    Previous,
    /// Absolute position in seconds
    Seek(f64),
}

impl MediaCommand {
    /// Map a reserved action id to its media operation.
    #[must_use]
    pub fn from_action(id: &str, value: f64) -> Option<Self> {
        match id {
            "media_play" => Some(Self::Play),
            "media_pause" => Some(Self::Pause),
            "media_next" => Some(Self::Next),
            "media_prev" => Some(Self::Previous),
            "media_seek" => Some(Self::Seek(value)),
            _ => None,
        }
    }

    /// Arguments for `playerctl`.
    #[must_use]
    pub fn playerctl_args(&self) -> Vec<String> {
        match self {
            Self::Play => vec!["play".to_string()],
            Self::Pause => vec!["pause".to_string()],
            Self::Next => vec!["next".to_string()],
            Self::Previous => vec!["previous".to_string()],
            Self::Seek(secs) => vec!["position".to_string(), format!("{secs:.6}")],
        }
    }
}

#[async_trait]
pub trait Host: Send + Sync {
    /// Run a shell command to completion, discarding its output.
    async fn run_shell(&self, command: &str) -> io::Result<()>;

    /// Run a shell command and return its standard output.
    ///
    /// Dropping the returned future must terminate the child.
    async fn capture_shell(&self, command: &str) -> io::Result<String>;

    async fn media(&self, command: MediaCommand) -> io::Result<()>;

    /// Current player state; "nothing playing" when no player answers.
    async fn media_status(&self) -> MediaStatus;

    async fn read_clipboard(&self) -> io::Result<String>;

    async fn write_clipboard(&self, text: &str) -> io::Result<()>;

    async fn notify(&self, app: &str, title: &str, body: &str) -> io::Result<()>;
}

/// Host backed by real processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemHost;

impl SystemHost {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

fn check_status(program: &str, status: std::process::ExitStatus) -> io::Result<()> {
    if status.success() {
        Ok(())
    } else {
        Err(io::Error::other(format!("{program} exited with {status}")))
    }
}

async fn output_of(program: &str, args: &[&str]) -> io::Result<String> {
    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .output()
        .await?;
    check_status(program, output.status)?;
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

async fn status_of(program: &str, args: &[&str]) -> io::Result<()> {
    let status = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .status()
        .await?;
    check_status(program, status)
}

#[async_trait]
impl Host for SystemHost {
    async fn run_shell(&self, command: &str) -> io::Result<()> {
        trace!("Running: {command}");
        status_of(SHELL, &["-c", command]).await
    }

    async fn capture_shell(&self, command: &str) -> io::Result<String> {
        output_of(SHELL, &["-c", command]).await
    }

    async fn media(&self, command: MediaCommand) -> io::Result<()> {
        let args = command.playerctl_args();
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        status_of("playerctl", &args).await
    }

    async fn media_status(&self) -> MediaStatus {
        let (title, artist, status, position, length) = tokio::join!(
            output_of("playerctl", &["metadata", "title"]),
            output_of("playerctl", &["metadata", "artist"]),
            output_of("playerctl", &["status"]),
            output_of("playerctl", &["position"]),
            output_of("playerctl", &["metadata", "mpris:length"]),
        );

        media_status_from(
            &title.unwrap_or_default(),
            &artist.unwrap_or_default(),
            &status.unwrap_or_default(),
            &position.unwrap_or_default(),
            &length.unwrap_or_default(),
        )
    }

    async fn read_clipboard(&self) -> io::Result<String> {
        output_of("wl-paste", &["--no-newline"]).await
    }

    async fn write_clipboard(&self, text: &str) -> io::Result<()> {
        let mut child = Command::new("wl-copy")
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(text.as_bytes()).await?;
        }

        let status = child.wait().await?;
        check_status("wl-copy", status)
    }

    async fn notify(&self, app: &str, title: &str, body: &str) -> io::Result<()> {
        status_of("notify-send", &["-a", app, title, body]).await
    }
}

/// Normalize raw `playerctl` output.
///
/// Position arrives in seconds, length in microseconds; both become
/// milliseconds. Without a title the player is treated as idle.
#[must_use]
pub fn media_status_from(
    title: &str,
    artist: &str,
    status: &str,
    position_secs: &str,
    length_us: &str,
) -> MediaStatus {
    let status = status.trim().to_lowercase();
    let title = title.trim();

    if title.is_empty() {
        return MediaStatus::nothing_playing(status);
    }

    let position: f64 = position_secs.trim().parse().unwrap_or(0.0);
    let length: i64 = length_us.trim().parse().unwrap_or(0);

    #[allow(clippy::cast_possible_truncation)] // Millisecond positions fit in i64
    let position_ms = if position.is_finite() {
        (position * 1000.0) as i64
    } else {
        0
    };

    MediaStatus {
        title: title.to_string(),
        artist: artist.trim().to_string(),
        status,
        position_ms,
        duration_ms: length / 1000,
    }
}
