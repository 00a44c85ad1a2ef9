//! Fixture worker and event collection helpers.

use dk_core::config::WorkerConfig;
use dk_core::state::ProcessSupervisor;
use dk_protocol::Event;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;

/// Upper bound for any single wait in these tests.
pub const EVENT_TIMEOUT: Duration = Duration::from_secs(5);

pub fn mock_worker_script() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("common")
        .join("mock_worker.sh")
}

/// Launch the fixture script through `sh`, optionally in a `MOCK_MODE`.
pub fn mock_worker_config(mode: Option<&str>) -> WorkerConfig {
    let mut config = WorkerConfig {
        program: "sh".to_string(),
        args: vec![mock_worker_script().display().to_string()],
        ..WorkerConfig::default()
    };
    if let Some(mode) = mode {
        config.env.insert("MOCK_MODE".to_string(), mode.to_string());
    }
    config
}

pub fn mock_supervisor(mode: Option<&str>) -> (ProcessSupervisor, mpsc::UnboundedReceiver<Event>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ProcessSupervisor::new(mock_worker_config(mode), tx), rx)
}

/// Receive events until one named `kind` arrives. Returns every event seen,
/// the matching one last. Panics on timeout or channel close.
pub async fn collect_until(rx: &mut mpsc::UnboundedReceiver<Event>, kind: &str) -> Vec<Event> {
    let mut seen = Vec::new();
    loop {
        let event = tokio::time::timeout(EVENT_TIMEOUT, rx.recv())
            .await
            .unwrap_or_else(|_| panic!("timed out waiting for '{kind}', saw: {seen:?}"))
            .unwrap_or_else(|| panic!("channel closed waiting for '{kind}', saw: {seen:?}"));
        let done = event.name() == Some(kind);
        seen.push(event);
        if done {
            return seen;
        }
    }
}

/// Receive events until one named `kind` arrives and return it.
pub async fn wait_for(rx: &mut mpsc::UnboundedReceiver<Event>, kind: &str) -> Event {
    let mut seen = collect_until(rx, kind).await;
    seen.pop().unwrap_or_else(|| panic!("no '{kind}' event"))
}
