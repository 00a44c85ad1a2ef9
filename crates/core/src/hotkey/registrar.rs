//! Global hotkey registration seam.

use crate::hotkey::accelerator::Accelerator;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::trace;

/// Action run when a registered accelerator is pressed.
pub type HotkeyHandler = Arc<dyn Fn() + Send + Sync>;

/// Minimal OS hotkey capability used by the toggle controller.
pub trait HotkeyRegistrar: Send + Sync {
    /// Register `handler` for `accelerator`. Returns false if the OS refused,
    /// e.g. because another application already owns the chord.
    fn register(&self, accelerator: &Accelerator, handler: HotkeyHandler) -> bool;

    fn unregister(&self, accelerator: &Accelerator);

    /// Run the handler bound to `accelerator` as if the chord had been
    /// pressed. Returns false if none is bound.
    fn press(&self, accelerator: &Accelerator) -> bool;
}

/// Process-local registrar with no OS backing.
///
/// Chords are "pressed" with [`InMemoryHotkeys::press`]. Chords marked with
/// [`InMemoryHotkeys::refuse`] behave as if owned by another application.
#[derive(Default)]
pub struct InMemoryHotkeys {
    handlers: Mutex<HashMap<Accelerator, HotkeyHandler>>,
    refused: Mutex<HashSet<Accelerator>>,
}

impl InMemoryHotkeys {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make future registrations of `accelerator` fail.
    pub fn refuse(&self, accelerator: Accelerator) {
        self.refused.lock().insert(accelerator);
    }

    /// Run the handler bound to `accelerator`. Returns false if none is bound.
    pub fn press(&self, accelerator: &Accelerator) -> bool {
        // Clone out so the handler can re-enter the registrar
        let handler = self.handlers.lock().get(accelerator).cloned();
        match handler {
            Some(handler) => {
                trace!(%accelerator, "hotkey pressed");
                handler();
                true
            }
            None => false,
        }
    }

    pub fn is_registered(&self, accelerator: &Accelerator) -> bool {
        self.handlers.lock().contains_key(accelerator)
    }

    pub fn registered(&self) -> Vec<Accelerator> {
        self.handlers.lock().keys().cloned().collect()
    }
}

impl HotkeyRegistrar for InMemoryHotkeys {
    fn register(&self, accelerator: &Accelerator, handler: HotkeyHandler) -> bool {
        if self.refused.lock().contains(accelerator) {
            return false;
        }
        let mut handlers = self.handlers.lock();
        if handlers.contains_key(accelerator) {
            return false;
        }
        handlers.insert(accelerator.clone(), handler);
        true
    }

    fn unregister(&self, accelerator: &Accelerator) {
        self.handlers.lock().remove(accelerator);
    }

    fn press(&self, accelerator: &Accelerator) -> bool {
        InMemoryHotkeys::press(self, accelerator)
    }
}
