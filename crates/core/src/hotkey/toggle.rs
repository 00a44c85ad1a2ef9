//! A single global hotkey that starts or stops dictation.

use crate::hotkey::accelerator::Accelerator;
use crate::hotkey::registrar::{HotkeyHandler, HotkeyRegistrar};
use crate::state::RunState;
use dk_protocol::Command;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// The command a toggle press issues for a given run state.
pub fn toggle_command(running: bool, language: Option<&str>) -> Command {
    if running {
        Command::stop()
    } else {
        Command::start(language)
    }
}

/// Owns at most one active accelerator binding.
///
/// The handler never sends to the worker itself. It reads [`RunState`] at
/// the moment of the keypress and pushes the chosen command into the request
/// channel, whose receiver dispatches it through the supervisor. Issuing a
/// command does not change `RunState`; only the worker's `started` and
/// `stopped` events do, so two presses before the acknowledgement both send
/// `start`.
pub struct HotkeyToggleController {
    registrar: Arc<dyn HotkeyRegistrar>,
    run_state: RunState,
    requests: mpsc::UnboundedSender<Command>,
    binding: Mutex<Option<Accelerator>>,
}

impl HotkeyToggleController {
    pub fn new(
        registrar: Arc<dyn HotkeyRegistrar>,
        run_state: RunState,
        requests: mpsc::UnboundedSender<Command>,
    ) -> Self {
        Self {
            registrar,
            run_state,
            requests,
            binding: Mutex::new(None),
        }
    }

    /// Bind `accelerator` to the toggle, replacing any previous binding.
    ///
    /// The previous accelerator is unregistered before the new one is
    /// registered. On failure (unparseable or refused accelerator) no binding
    /// is active and false is returned.
    pub fn bind(&self, accelerator: &str, language: Option<&str>) -> bool {
        let mut binding = self.binding.lock();

        if let Some(previous) = binding.take() {
            self.registrar.unregister(&previous);
            debug!(%previous, "hotkey unbound");
        }

        let accelerator = match accelerator.parse::<Accelerator>() {
            Ok(accelerator) => accelerator,
            Err(e) => {
                warn!(%accelerator, error = %e, "invalid hotkey");
                return false;
            }
        };

        let handler = self.handler(language.map(str::to_string));
        if !self.registrar.register(&accelerator, handler) {
            warn!(%accelerator, "hotkey registration refused");
            return false;
        }

        debug!(%accelerator, ?language, "hotkey bound");
        *binding = Some(accelerator);
        true
    }

    /// Remove the active binding. Safe to call when nothing is bound.
    pub fn clear(&self) {
        if let Some(previous) = self.binding.lock().take() {
            self.registrar.unregister(&previous);
            debug!(%previous, "hotkey cleared");
        }
    }

    pub fn current(&self) -> Option<Accelerator> {
        self.binding.lock().clone()
    }

    fn handler(&self, language: Option<String>) -> HotkeyHandler {
        let run_state = self.run_state.clone();
        let requests = self.requests.clone();

        Arc::new(move || {
            let command = toggle_command(run_state.is_running(), language.as_deref());
            debug!(cmd = %command.cmd, "hotkey toggle");
            if requests.send(command).is_err() {
                warn!("toggle request dropped, receiver closed");
            }
        })
    }
}

impl Drop for HotkeyToggleController {
    fn drop(&mut self) {
        self.clear();
    }
}
