//! Module poller.
//!
//! Every tick walks the current description depth-first and runs each data
//! source, one after another. Output that parses as a number is sent as a
//! value update, anything else as a content update.

use std::sync::Arc;

use hyprlink_rpc::Response;
use tokio::time::{MissedTickBehavior, interval, timeout};
use tracing::{debug, trace, warn};

use crate::state::DaemonState;

/// Poll forever on the configured tick.
pub async fn run(state: Arc<DaemonState>) {
    let mut ticker = interval(state.timings.poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        poll_once(&state).await;
    }
}

/// Run one scan over the current description. Returns how many modules
/// produced an update.
pub async fn poll_once(state: &DaemonState) -> usize {
    let config = state.config.snapshot().await;

    let mut sources = Vec::new();
    config.ui.walk(&mut |module| {
        if let Some(command) = module.poll_command() {
            sources.push((module.id.as_str(), command));
        }
    });

    let mut updated = 0;
    for (id, command) in sources {
        match timeout(state.timings.poll_command, state.host.capture_shell(command)).await {
            Ok(Ok(output)) => {
                state.registry.broadcast(module_update(id, &output)).await;
                updated += 1;
            }
            Ok(Err(e)) => debug!("[{id}] Data source failed: {e}"),
            Err(_) => warn!(
                "[{id}] Data source timed out after {:?}",
                state.timings.poll_command
            ),
        }
    }

    trace!("Poll tick updated {updated} modules");
    updated
}

/// Parse command output as a number, accepting a decimal comma.
#[must_use]
pub fn parse_value(output: &str) -> Option<f64> {
    output
        .trim()
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

/// Build the update for one module from its raw command output.
#[must_use]
pub fn module_update(id: &str, output: &str) -> Response {
    let trimmed = output.trim();
    match parse_value(trimmed) {
        Some(value) => Response::module_value(id, value),
        None => Response::module_content(id, trimmed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Timings;
    use crate::registry::ConnectionId;
    use crate::test_support::FakeHost;
    use hyprlink_core::TrustedDeviceStore;
    use hyprlink_rpc::Outbound;
    use hyprlink_types::{ActionMap, Capabilities, Module, Tab, UiDescription};
    use std::time::Duration;
    use tempfile::TempDir;
    use tokio::sync::mpsc;

    fn module(id: &str, source: Option<&str>, children: Vec<Module>) -> Module {
        Module {
            id: id.to_string(),
            kind: "text".to_string(),
            capabilities: Capabilities {
                source: source.map(str::to_string),
                action: None,
            },
            children,
            ..Default::default()
        }
    }

    fn description(modules: Vec<Module>) -> UiDescription {
        UiDescription {
            hostname: "desk".to_string(),
            profiles: vec![Tab {
                name: "main".to_string(),
                modules,
            }],
            ..Default::default()
        }
    }

    fn updates(rx: &mut mpsc::UnboundedReceiver<Outbound>) -> Vec<Response> {
        let mut out = Vec::new();
        while let Ok(Outbound::Response(r)) = rx.try_recv() {
            out.push(*r);
        }
        out
    }

    #[test]
    fn test_parse_value() {
        assert_eq!(parse_value("42"), Some(42.0));
        assert_eq!(parse_value(" 12,5\n"), Some(12.5));
        assert_eq!(parse_value("-3.25"), Some(-3.25));
        assert_eq!(parse_value("NaN"), None);
        assert_eq!(parse_value("inf"), None);
        assert_eq!(parse_value("Song - Band"), None);
        assert_eq!(parse_value(""), None);
    }

    #[test]
    fn test_module_update_value_or_content() {
        let value = module_update("cpu", "37\n");
        assert_eq!(value.value, Some(37.0));
        assert!(value.content.is_none());

        let content = module_update("song", "  Song - Band \n");
        assert_eq!(content.content.as_deref(), Some("Song - Band"));
        assert!(content.value.is_none());
    }

    #[tokio::test]
    async fn test_poll_once_visits_nested_sources_in_order() {
        let temp = TempDir::new().unwrap();
        let host = FakeHost::new();
        host.set_output("cpu", "10");
        host.set_output("title", "hello");
        host.set_output("deep", "0,5");
        let state = crate::test_support::state_with(host.clone(), temp.path());

        let ui = description(vec![
            module("cpu", Some("cpu"), vec![]),
            module(
                "group",
                None,
                vec![
                    module("title", Some("title"), vec![]),
                    module("deep", Some("deep"), vec![]),
                ],
            ),
        ]);
        state.update_config(ui, ActionMap::new()).await;
        let (tx, mut rx) = mpsc::unbounded_channel();
        state.registry.register(ConnectionId::new(), tx).await;

        assert_eq!(poll_once(&state).await, 3);

        let updates = updates(&mut rx);
        let ids: Vec<_> = updates.iter().filter_map(|u| u.id.as_deref()).collect();
        assert_eq!(ids, vec!["cpu", "title", "deep"]);
        assert_eq!(updates[1].content.as_deref(), Some("hello"));
        assert_eq!(updates[2].value, Some(0.5));
    }

    #[tokio::test]
    async fn test_failed_source_is_skipped() {
        let temp = TempDir::new().unwrap();
        let host = FakeHost::new();
        host.set_output("ok", "1");
        let state = crate::test_support::state_with(host.clone(), temp.path());
        let ui = description(vec![
            module("broken", Some("missing-command"), vec![]),
            module("ok", Some("ok"), vec![]),
        ]);
        state.update_config(ui, ActionMap::new()).await;
        let (tx, mut rx) = mpsc::unbounded_channel();
        state.registry.register(ConnectionId::new(), tx).await;

        assert_eq!(poll_once(&state).await, 1);
        let updates = updates(&mut rx);
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].id.as_deref(), Some("ok"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_hung_source_does_not_stall_later_modules() {
        let temp = TempDir::new().unwrap();
        let host = FakeHost::new();
        host.hang_on("hang");
        host.set_output("after", "7");
        let timings = Timings {
            poll_command: Duration::from_secs(2),
            ..Timings::default()
        };
        let state = Arc::new(DaemonState::new(
            TrustedDeviceStore::new(temp.path().join("trusted_devices.json")),
            host.clone(),
            timings,
        ));
        let ui = description(vec![
            module("hang", Some("hang"), vec![]),
            module("after", Some("after"), vec![]),
        ]);
        state.update_config(ui, ActionMap::new()).await;

        assert_eq!(poll_once(&state).await, 1);
        assert_eq!(host.calls(), vec!["capture:hang", "capture:after"]);
    }

    #[tokio::test]
    async fn test_identical_output_gives_identical_updates() {
        let temp = TempDir::new().unwrap();
        let host = FakeHost::new();
        host.set_output("uptime", "3 days");
        let state = crate::test_support::state_with(host, temp.path());
        state
            .update_config(
                description(vec![module("up", Some("uptime"), vec![])]),
                ActionMap::new(),
            )
            .await;
        let (tx, mut rx) = mpsc::unbounded_channel();
        state.registry.register(ConnectionId::new(), tx).await;

        poll_once(&state).await;
        poll_once(&state).await;

        let updates = updates(&mut rx);
        assert_eq!(updates.len(), 2);
        assert_eq!(updates[0], updates[1]);
    }
}
