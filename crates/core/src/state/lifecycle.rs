//! Lifecycle bookkeeping for the worker process.
//!
//! Each successful spawn starts a new generation. Transitions that come
//! from a listener carry the generation they were spawned for, and a
//! listener from an older generation never changes current state.

use dk_protocol::{ExitInfo, SupervisorState};
use std::process::ExitStatus;
use tokio::sync::oneshot;

#[derive(Debug, Default)]
pub(crate) struct Lifecycle {
    state: SupervisorState,
    pid: Option<u32>,
    generation: u64,
    kill: Option<oneshot::Sender<()>>,
    last_exit: Option<ExitInfo>,
}

impl Lifecycle {
    pub(crate) fn state(&self) -> SupervisorState {
        self.state
    }

    pub(crate) fn pid(&self) -> Option<u32> {
        self.pid
    }

    pub(crate) fn last_exit(&self) -> Option<ExitInfo> {
        self.last_exit.clone()
    }

    pub(crate) fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }

    /// A process was created: enter `Starting` under a new generation.
    pub(crate) fn begin(&mut self, pid: Option<u32>, kill: oneshot::Sender<()>) -> u64 {
        self.generation += 1;
        self.state = SupervisorState::Starting;
        self.pid = pid;
        self.kill = Some(kill);
        self.last_exit = None;
        self.generation
    }

    /// First `started` seen: `Starting` -> `Running`. Returns whether it moved.
    pub(crate) fn mark_running(&mut self, generation: u64) -> bool {
        if self.is_current(generation) && self.state == SupervisorState::Starting {
            self.state = SupervisorState::Running;
            return true;
        }
        false
    }

    /// The process of `generation` terminated.
    pub(crate) fn mark_exited(&mut self, generation: u64, exit: ExitInfo) -> bool {
        if !self.is_current(generation) || !self.state.is_live() {
            return false;
        }
        self.state = SupervisorState::Exited;
        self.pid = None;
        self.kill = None;
        self.last_exit = Some(exit);
        true
    }

    pub(crate) fn mark_spawn_failed(&mut self) {
        self.state = SupervisorState::SpawnFailed;
        self.pid = None;
        self.kill = None;
    }

    /// Take the kill switch of the live process, if any.
    pub(crate) fn take_kill(&mut self) -> Option<oneshot::Sender<()>> {
        self.kill.take()
    }
}

/// Translate an OS exit status into protocol form.
pub(crate) fn exit_info(status: &ExitStatus) -> ExitInfo {
    #[cfg(unix)]
    let signal = {
        use std::os::unix::process::ExitStatusExt;
        status.signal().map(signal_name)
    };
    #[cfg(not(unix))]
    let signal = None;

    ExitInfo {
        code: status.code(),
        signal,
    }
}

/// Conventional name for the signals a worker is likely to die from.
#[cfg_attr(not(unix), allow(dead_code))]
fn signal_name(signal: i32) -> String {
    match signal {
        1 => "SIGHUP".to_string(),
        2 => "SIGINT".to_string(),
        3 => "SIGQUIT".to_string(),
        4 => "SIGILL".to_string(),
        6 => "SIGABRT".to_string(),
        8 => "SIGFPE".to_string(),
        9 => "SIGKILL".to_string(),
        11 => "SIGSEGV".to_string(),
        13 => "SIGPIPE".to_string(),
        14 => "SIGALRM".to_string(),
        15 => "SIGTERM".to_string(),
        other => format!("SIG{other}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn begun() -> (Lifecycle, u64) {
        let mut lifecycle = Lifecycle::default();
        let (tx, _rx) = oneshot::channel();
        let generation = lifecycle.begin(Some(42), tx);
        (lifecycle, generation)
    }

    #[test]
    fn test_default_is_not_started() {
        let lifecycle = Lifecycle::default();
        assert_eq!(lifecycle.state(), SupervisorState::NotStarted);
        assert_eq!(lifecycle.pid(), None);
    }

    #[test]
    fn test_begin_enters_starting() {
        let (lifecycle, generation) = begun();
        assert_eq!(generation, 1);
        assert_eq!(lifecycle.state(), SupervisorState::Starting);
        assert_eq!(lifecycle.pid(), Some(42));
    }

    #[test]
    fn test_mark_running_only_once() {
        let (mut lifecycle, generation) = begun();
        assert!(lifecycle.mark_running(generation));
        assert!(!lifecycle.mark_running(generation));
        assert_eq!(lifecycle.state(), SupervisorState::Running);
    }

    #[test]
    fn test_mark_exited_clears_process() {
        let (mut lifecycle, generation) = begun();
        let exit = ExitInfo {
            code: Some(1),
            signal: None,
        };

        assert!(lifecycle.mark_exited(generation, exit.clone()));
        assert_eq!(lifecycle.state(), SupervisorState::Exited);
        assert_eq!(lifecycle.pid(), None);
        assert!(lifecycle.take_kill().is_none());
        assert_eq!(lifecycle.last_exit(), Some(exit));
    }

    #[test]
    fn test_stale_generation_is_ignored() {
        let (mut lifecycle, first) = begun();
        lifecycle.mark_exited(first, ExitInfo { code: Some(0), signal: None });

        let (tx, _rx) = oneshot::channel();
        let second = lifecycle.begin(Some(43), tx);
        assert_ne!(first, second);

        assert!(!lifecycle.mark_running(first));
        assert!(!lifecycle.mark_exited(first, ExitInfo { code: None, signal: None }));
        assert_eq!(lifecycle.state(), SupervisorState::Starting);
        assert_eq!(lifecycle.pid(), Some(43));
    }

    #[test]
    fn test_spawn_failed() {
        let mut lifecycle = Lifecycle::default();
        lifecycle.mark_spawn_failed();
        assert_eq!(lifecycle.state(), SupervisorState::SpawnFailed);
        assert!(!lifecycle.state().is_live());
    }

    #[test]
    fn test_signal_names() {
        assert_eq!(signal_name(9), "SIGKILL");
        assert_eq!(signal_name(15), "SIGTERM");
        assert_eq!(signal_name(64), "SIG64");
    }
}
