//! Supervisor for the single long-lived worker process.
//!
//! The supervisor owns the worker's process handle and its three standard
//! streams. Three listeners run per worker:
//!
//! - the output reader decodes each stdout line into an event,
//! - the diagnostic reader scrapes stderr chunks for progress,
//! - the exit watcher reports termination.
//!
//! All of them forward events, in arrival order per stream, to the channel
//! given at construction. Nothing here panics or returns early on bad worker
//! output; failures become `error` events plus a returned error.

use crate::config::models::WorkerConfig;
use crate::state::lifecycle::{exit_info, Lifecycle};
use crate::state::run_state::{LastProgress, RunState};
use crate::worker::dispatcher::dispatch;
use crate::worker::error::{DispatchError, SupervisorError};
use crate::worker::preflight::{check_worker, Availability};
use crate::worker::{streams, CommandDispatcher, EventProtocolCodec, ProgressScraper};
use dk_protocol::{
    Command, ErrorSource, Event, EventKind, ExitInfo, SupervisorState, SupervisorStatus,
};
use parking_lot::Mutex;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_stream::StreamExt;
use tracing::{debug, trace, warn};

/// How long the exit watcher waits for the stream readers to drain.
const READER_DRAIN: Duration = Duration::from_millis(500);

/// The worker's input stream, tagged with the generation it belongs to.
type WorkerInput = tokio::sync::Mutex<Option<(u64, CommandDispatcher<ChildStdin>)>>;

/// State shared with the listener tasks.
struct Shared {
    lifecycle: Mutex<Lifecycle>,
    run_state: RunState,
    scraper: ProgressScraper,
    events_tx: mpsc::UnboundedSender<Event>,
}

impl Shared {
    fn emit(&self, event: Event) {
        // The presentation layer may already be gone during teardown
        let _ = self.events_tx.send(event);
    }

    /// Track run state from a decoded output event.
    fn observe(&self, generation: u64, event: &Event) {
        let running = match event.kind() {
            Some(EventKind::Started) => true,
            Some(EventKind::Stopped) => false,
            _ => return,
        };

        let mut lifecycle = self.lifecycle.lock();
        if !lifecycle.is_current(generation) || !lifecycle.state().is_live() {
            return;
        }
        if running && lifecycle.mark_running(generation) {
            debug!(generation, "worker reported its first session");
        }
        self.run_state.set(running);
        debug!(generation, running, "run state updated");
    }

    /// Turn a diagnostic chunk into an event.
    ///
    /// Only the current generation records progress. A previous worker that
    /// is still draining after a restart is forwarded as plain `stderr`.
    fn scrape(&self, generation: u64, chunk: &str) -> Event {
        let lifecycle = self.lifecycle.lock();
        if lifecycle.is_current(generation) {
            self.scraper.scrape(chunk)
        } else {
            trace!(generation, "diagnostics from a previous worker");
            Event::stderr(chunk)
        }
    }
}

/// Owns the worker process and translates its streams into events.
///
/// # Example
///
/// ```rust,no_run
/// use dk_core::config::WorkerConfig;
/// use dk_core::state::ProcessSupervisor;
/// use dk_protocol::Command;
/// use tokio::sync::mpsc;
///
/// # async fn example() {
/// let (events_tx, mut events_rx) = mpsc::unbounded_channel();
/// let supervisor = ProcessSupervisor::new(WorkerConfig::default(), events_tx);
///
/// if supervisor.start().await.is_ok() {
///     let _ = supervisor.send(&Command::load("small.en")).await;
/// }
/// while let Some(event) = events_rx.recv().await {
///     println!("{event}");
/// }
/// # }
/// ```
pub struct ProcessSupervisor {
    config: WorkerConfig,
    shared: Arc<Shared>,
    input: Arc<WorkerInput>,
    /// Serializes `start` calls so only one worker can ever be spawned.
    start_lock: tokio::sync::Mutex<()>,
}

impl ProcessSupervisor {
    /// Create a supervisor in the `NotStarted` state.
    ///
    /// # Arguments
    ///
    /// * `config` - How to launch the worker
    /// * `events_tx` - Channel receiving every event, host- or worker-originated
    pub fn new(config: WorkerConfig, events_tx: mpsc::UnboundedSender<Event>) -> Self {
        let last_progress = LastProgress::default();
        Self {
            config,
            shared: Arc::new(Shared {
                lifecycle: Mutex::new(Lifecycle::default()),
                run_state: RunState::default(),
                scraper: ProgressScraper::new(last_progress),
                events_tx,
            }),
            input: Arc::new(tokio::sync::Mutex::new(None)),
            start_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Spawn the worker and attach its stream listeners.
    ///
    /// The worker program is checked before anything is spawned. On success
    /// the supervisor is `Starting`; it becomes `Running` once the worker
    /// reports `started`.
    ///
    /// # Errors
    ///
    /// - `SupervisorError::AlreadyRunning` if a worker is live (nothing is emitted)
    /// - `SupervisorError::Unavailable` if the program cannot be found; the
    ///   state does not change
    /// - `SupervisorError::Spawn` if the OS refuses to create the process; the
    ///   state becomes `SpawnFailed`
    ///
    /// The last two are also emitted as `error` events.
    pub async fn start(&self) -> Result<(), SupervisorError> {
        let _guard = self.start_lock.lock().await;

        let live = self.shared.lifecycle.lock().state().is_live();
        if live {
            return Err(SupervisorError::AlreadyRunning);
        }

        let program = match check_worker(&self.config) {
            Availability::Available { program } => program,
            Availability::Unavailable { reason } => {
                warn!(program = %self.config.program, %reason, "worker program unavailable");
                let error = SupervisorError::Unavailable {
                    program: self.config.program.clone(),
                    reason,
                };
                self.shared
                    .emit(Event::error(ErrorSource::Environment, error.to_string()));
                return Err(error);
            }
        };

        let mut command = tokio::process::Command::new(&program);
        command
            .args(&self.config.args)
            .envs(&self.config.env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &self.config.working_dir {
            command.current_dir(dir);
        }

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(e) => return Err(self.spawn_failed(e.to_string())),
        };

        let (Some(stdin), Some(stdout), Some(stderr)) =
            (child.stdin.take(), child.stdout.take(), child.stderr.take())
        else {
            let _ = child.start_kill();
            return Err(self.spawn_failed("worker streams were not captured".to_string()));
        };

        let pid = child.id();
        let (kill_tx, kill_rx) = oneshot::channel();

        // Hold the input slot while entering `Starting` so a concurrent
        // `send` never sees a live state without a dispatcher.
        let mut input = self.input.lock().await;
        let generation = self.shared.lifecycle.lock().begin(pid, kill_tx);
        *input = Some((generation, CommandDispatcher::new(stdin)));
        drop(input);

        let readers = [
            tokio::spawn(read_output(Arc::clone(&self.shared), generation, stdout)),
            tokio::spawn(read_diagnostics(Arc::clone(&self.shared), generation, stderr)),
        ];
        tokio::spawn(watch_exit(
            Arc::clone(&self.shared),
            Arc::clone(&self.input),
            generation,
            child,
            kill_rx,
            readers,
        ));

        debug!(?pid, generation, program = %program.display(), "worker spawned");
        Ok(())
    }

    fn spawn_failed(&self, reason: String) -> SupervisorError {
        self.shared.lifecycle.lock().mark_spawn_failed();
        warn!(program = %self.config.program, %reason, "worker spawn failed");

        let error = SupervisorError::Spawn {
            program: self.config.program.clone(),
            reason,
        };
        self.shared.emit(Event::error(ErrorSource::Spawn, error.to_string()));
        error
    }

    /// Write a command to the worker.
    ///
    /// Fire-and-forget: success means the record reached the pipe, not that
    /// the worker acted on it. Watch the event stream for the effect.
    ///
    /// # Errors
    ///
    /// `DispatchError::NoWorker` when no worker is `Starting` or `Running`
    /// (nothing is written), or `DispatchError::Write` when the pipe is
    /// broken. Either is also emitted as an `error` event. The supervisor
    /// state is left as it was.
    pub async fn send(&self, command: &Command) -> Result<(), DispatchError> {
        let result = self.try_send(command).await;
        if let Err(e) = &result {
            warn!(cmd = %command.cmd, error = %e, "command dispatch failed");
            self.shared
                .emit(Event::error(ErrorSource::Dispatch, e.to_string()));
        }
        result
    }

    async fn try_send(&self, command: &Command) -> Result<(), DispatchError> {
        let live = self.shared.lifecycle.lock().state().is_live();
        if !live {
            return Err(DispatchError::NoWorker);
        }

        let mut input = self.input.lock().await;
        let worker = input.as_mut().map(|(_, dispatcher)| dispatcher);
        dispatch(worker, command.cmd, command.args.clone()).await
    }

    /// Kill the worker, if one is live.
    ///
    /// Forceful, with no grace period. The exit watcher still reports the
    /// `exit` event. Returns whether there was a worker to kill.
    pub fn shutdown(&self) -> bool {
        let kill = self.shared.lifecycle.lock().take_kill();
        match kill {
            Some(kill) => {
                debug!("killing worker");
                let _ = kill.send(());
                true
            }
            None => false,
        }
    }

    pub fn state(&self) -> SupervisorState {
        self.shared.lifecycle.lock().state()
    }

    /// Handle to the run-state cell, for readers such as the hotkey toggle.
    pub fn run_state(&self) -> RunState {
        self.shared.run_state.clone()
    }

    pub fn last_progress(&self) -> LastProgress {
        self.shared.scraper.last_progress().clone()
    }

    /// Snapshot of everything the supervisor knows.
    pub fn status(&self) -> SupervisorStatus {
        let lifecycle = self.shared.lifecycle.lock();
        SupervisorStatus {
            state: lifecycle.state(),
            running: self.shared.run_state.is_running(),
            pid: lifecycle.pid(),
            last_progress: self.shared.scraper.last_progress().get(),
            last_exit: lifecycle.last_exit(),
        }
    }
}

impl Drop for ProcessSupervisor {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn read_output(shared: Arc<Shared>, generation: u64, stdout: ChildStdout) {
    let mut lines = streams::lines(stdout);

    while let Some(line) = lines.next().await {
        let Some(event) = EventProtocolCodec::decode(&line) else {
            continue;
        };
        trace!(generation, event = ?event.name(), "worker output");

        // Record run state before forwarding, so a consumer reacting to
        // `started` already reads `running == true`.
        shared.observe(generation, &event);
        shared.emit(event);
    }

    debug!(generation, "worker output stream closed");
}

async fn read_diagnostics(shared: Arc<Shared>, generation: u64, stderr: ChildStderr) {
    let mut chunks = streams::chunks(stderr);

    while let Some(chunk) = chunks.next().await {
        if chunk.is_empty() {
            continue;
        }
        let event = shared.scrape(generation, &chunk);
        shared.emit(event);
    }

    debug!(generation, "worker diagnostic stream closed");
}

async fn watch_exit(
    shared: Arc<Shared>,
    input: Arc<WorkerInput>,
    generation: u64,
    mut child: Child,
    kill_rx: oneshot::Receiver<()>,
    readers: [JoinHandle<()>; 2],
) {
    let status = tokio::select! {
        status = child.wait() => status,
        // Resolves on `shutdown()` and when the supervisor is dropped
        _ = kill_rx => {
            if let Err(e) = child.start_kill() {
                warn!(generation, error = %e, "failed to kill worker");
            }
            child.wait().await
        }
    };

    let exit = match &status {
        Ok(status) => exit_info(status),
        Err(e) => {
            warn!(generation, error = %e, "failed to wait for worker");
            ExitInfo {
                code: None,
                signal: None,
            }
        }
    };

    // Forward whatever the worker wrote before it died
    let [stdout_task, stderr_task] = readers;
    let drained = tokio::time::timeout(READER_DRAIN, async {
        let _ = stdout_task.await;
        let _ = stderr_task.await;
    })
    .await;
    if drained.is_err() {
        debug!(generation, "worker streams still open after exit");
    }

    {
        let mut input = input.lock().await;
        if matches!(input.as_ref(), Some((current, _)) if *current == generation) {
            *input = None;
        }
    }

    let exited = {
        let mut lifecycle = shared.lifecycle.lock();
        let exited = lifecycle.mark_exited(generation, exit.clone());
        if exited {
            shared.run_state.set(false);
        }
        exited
    };

    debug!(generation, exited, code = ?exit.code, signal = ?exit.signal, "worker exited");
    shared.emit(Event::exit(exit.code, exit.signal.as_deref()));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn supervisor(program: &str) -> (ProcessSupervisor, mpsc::UnboundedReceiver<Event>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let config = WorkerConfig {
            program: program.to_string(),
            args: Vec::new(),
            ..WorkerConfig::default()
        };
        (ProcessSupervisor::new(config, tx), rx)
    }

    #[tokio::test]
    async fn test_new_supervisor_is_not_started() {
        let (supervisor, _rx) = supervisor("sh");
        let status = supervisor.status();

        assert_eq!(status.state, SupervisorState::NotStarted);
        assert!(!status.running);
        assert_eq!(status.pid, None);
        assert!(status.last_progress.is_none());
    }

    #[tokio::test]
    async fn test_send_without_worker_reports_no_worker() {
        let (supervisor, mut rx) = supervisor("sh");

        let result = supervisor.send(&Command::status()).await;
        assert_eq!(result, Err(DispatchError::NoWorker));

        let event = rx.recv().await.unwrap();
        assert_eq!(event.kind(), Some(EventKind::Error));
        assert_eq!(event.get_str("source"), Some("dispatch"));
        assert_eq!(supervisor.state(), SupervisorState::NotStarted);
    }

    #[tokio::test]
    async fn test_shutdown_without_worker_is_noop() {
        let (supervisor, _rx) = supervisor("sh");
        assert!(!supervisor.shutdown());
    }

    #[tokio::test]
    async fn test_missing_program_is_environment_error() {
        let (supervisor, mut rx) = supervisor("nonexistent-interpreter-xyz123");

        let result = supervisor.start().await;
        assert!(matches!(result, Err(SupervisorError::Unavailable { .. })));
        assert_eq!(supervisor.state(), SupervisorState::NotStarted);

        let event = rx.recv().await.unwrap();
        assert_eq!(event.get_str("source"), Some("environment"));
    }

    #[test]
    fn test_previous_worker_diagnostics_do_not_record_progress() {
        let (supervisor, _rx) = supervisor("sh");
        let (old_kill, _old_rx) = oneshot::channel();
        let (new_kill, _new_rx) = oneshot::channel();
        let old = supervisor.shared.lifecycle.lock().begin(Some(1), old_kill);
        let current = supervisor.shared.lifecycle.lock().begin(Some(2), new_kill);

        let stale = supervisor.shared.scrape(old, "Downloading model… (90%)");
        assert_eq!(stale.kind(), Some(EventKind::Stderr));
        assert_eq!(stale.get_str("data"), Some("Downloading model… (90%)"));
        assert_eq!(supervisor.last_progress().percent(), None);

        let fresh = supervisor.shared.scrape(current, "Downloading model… (10%)");
        assert_eq!(fresh.kind(), Some(EventKind::Progress));
        assert_eq!(supervisor.last_progress().percent(), Some(10));
    }

    #[test]
    fn test_observe_ignores_events_before_spawn() {
        let (supervisor, _rx) = supervisor("sh");
        supervisor
            .shared
            .observe(0, &Event::named("started"));

        assert!(!supervisor.run_state().is_running());
        assert_eq!(supervisor.state(), SupervisorState::NotStarted);
    }
}
