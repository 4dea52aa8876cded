//! Recording host and state builders shared by unit tests.

use std::collections::{HashMap, VecDeque};
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use hyprlink_core::TrustedDeviceStore;
use hyprlink_rpc::MediaStatus;

use crate::host::{Host, MediaCommand};
use crate::options::Timings;
use crate::state::DaemonState;

#[derive(Default)]
pub struct FakeHost {
    calls: Mutex<Vec<String>>,
    outputs: Mutex<HashMap<String, String>>,
    clipboard: Mutex<VecDeque<String>>,
    hanging: Mutex<Vec<String>>,
}

impl FakeHost {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_output(&self, command: &str, stdout: &str) {
        self.outputs
            .lock()
            .unwrap()
            .insert(command.to_string(), stdout.to_string());
    }

    pub fn hang_on(&self, command: &str) {
        self.hanging.lock().unwrap().push(command.to_string());
    }

    pub fn queue_clipboard(&self, text: &str) {
        self.clipboard.lock().unwrap().push_back(text.to_string());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl Host for FakeHost {
    async fn run_shell(&self, command: &str) -> io::Result<()> {
        self.record(format!("shell:{command}"));
        Ok(())
    }

    async fn capture_shell(&self, command: &str) -> io::Result<String> {
        self.record(format!("capture:{command}"));
        let hangs = self.hanging.lock().unwrap().iter().any(|c| c == command);
        if hangs {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        self.outputs
            .lock()
            .unwrap()
            .get(command)
            .cloned()
            .ok_or_else(|| io::Error::other("exit status 1"))
    }

    async fn media(&self, command: MediaCommand) -> io::Result<()> {
        self.record(format!("media:{command:?}"));
        Ok(())
    }

    async fn media_status(&self) -> MediaStatus {
        MediaStatus {
            title: "Song".to_string(),
            artist: "Band".to_string(),
            status: "playing".to_string(),
            position_ms: 1_000,
            duration_ms: 180_000,
        }
    }

    async fn read_clipboard(&self) -> io::Result<String> {
        self.clipboard
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| io::Error::other("clipboard empty"))
    }

    async fn write_clipboard(&self, text: &str) -> io::Result<()> {
        self.record(format!("clipboard:{text}"));
        Ok(())
    }

    async fn notify(&self, app: &str, title: &str, body: &str) -> io::Result<()> {
        self.record(format!("notify:{app}|{title}|{body}"));
        Ok(())
    }
}

pub fn state_with(host: Arc<FakeHost>, dir: &std::path::Path) -> Arc<DaemonState> {
    Arc::new(DaemonState::new(
        TrustedDeviceStore::new(dir.join("trusted_devices.json")),
        host,
        Timings::default(),
    ))
}

/// Wait until spawned effects have recorded at least `n` calls.
pub async fn wait_for_calls(host: &FakeHost, n: usize) -> Vec<String> {
    for _ in 0..200 {
        let calls = host.calls();
        if calls.len() >= n {
            return calls;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    host.calls()
}
