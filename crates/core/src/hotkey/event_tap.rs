//! System-wide hotkeys on macOS through a CoreGraphics event tap.
//!
//! A dedicated thread owns the tap and runs its run loop. Key-downs matching
//! a registered chord run the handler and are swallowed, along with the
//! matching key-up, so the focused application never sees them. Needs the
//! Input Monitoring permission; without it the tap cannot be created.

use crate::hotkey::accelerator::Accelerator;
use crate::hotkey::keymap::MacChord;
use crate::hotkey::registrar::{HotkeyHandler, HotkeyRegistrar};
use core_foundation::base::TCFType;
use core_foundation::mach_port::CFMachPortRef;
use core_foundation::runloop::{kCFRunLoopCommonModes, CFRunLoop};
use core_graphics::event::{
    CGEventTap, CGEventTapLocation, CGEventTapOptions, CGEventTapPlacement, CGEventType,
    CallbackResult,
};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::ffi::c_void;
use std::sync::atomic::{AtomicPtr, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use thiserror::Error;
use tracing::{debug, trace, warn};

#[link(name = "CoreGraphics", kind = "framework")]
extern "C" {
    fn CGEventTapEnable(tap: CFMachPortRef, enable: bool);
}

const FIELD_KEYBOARD_EVENT_AUTOREPEAT: u32 = 8;
const FIELD_KEYBOARD_EVENT_KEYCODE: u32 = 9;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EventTapError {
    #[error("Failed to create the keyboard event tap (is Input Monitoring allowed?)")]
    TapCreate,

    #[error("Failed to attach the event tap to its run loop")]
    RunLoopSource,

    #[error("Event tap thread failed: {0}")]
    Thread(String),
}

#[derive(Default)]
struct Bindings {
    handlers: HashMap<MacChord, (Accelerator, HotkeyHandler)>,
    /// Keycodes whose key-down was swallowed; their key-up is swallowed too.
    swallowed: HashSet<u16>,
}

/// Registrar backed by a CoreGraphics event tap.
///
/// Dropping it stops the tap thread and releases every chord.
pub struct EventTapHotkeys {
    bindings: Arc<Mutex<Bindings>>,
    run_loop: Arc<Mutex<Option<CFRunLoop>>>,
    thread: Option<JoinHandle<()>>,
}

impl EventTapHotkeys {
    /// Create the tap and wait until its run loop is live.
    pub fn start() -> Result<Self, EventTapError> {
        let bindings = Arc::new(Mutex::new(Bindings::default()));
        let run_loop = Arc::new(Mutex::new(None));
        let (ready_tx, ready_rx) = crossbeam_channel::bounded(1);

        let thread = {
            let bindings = Arc::clone(&bindings);
            let run_loop = Arc::clone(&run_loop);
            std::thread::Builder::new()
                .name("hotkey-event-tap".to_string())
                .spawn(move || run_tap(bindings, run_loop, ready_tx))
                .map_err(|e| EventTapError::Thread(e.to_string()))?
        };

        match ready_rx.recv() {
            Ok(Ok(())) => Ok(Self {
                bindings,
                run_loop,
                thread: Some(thread),
            }),
            Ok(Err(e)) => {
                let _ = thread.join();
                Err(e)
            }
            Err(e) => Err(EventTapError::Thread(e.to_string())),
        }
    }
}

impl HotkeyRegistrar for EventTapHotkeys {
    fn register(&self, accelerator: &Accelerator, handler: HotkeyHandler) -> bool {
        let Some(chord) = MacChord::from_accelerator(accelerator) else {
            warn!(%accelerator, "no macOS key for accelerator");
            return false;
        };
        let mut bindings = self.bindings.lock();
        if bindings.handlers.contains_key(&chord) {
            return false;
        }
        bindings
            .handlers
            .insert(chord, (accelerator.clone(), handler));
        true
    }

    fn unregister(&self, accelerator: &Accelerator) {
        if let Some(chord) = MacChord::from_accelerator(accelerator) {
            self.bindings.lock().handlers.remove(&chord);
        }
    }

    fn press(&self, accelerator: &Accelerator) -> bool {
        let handler = MacChord::from_accelerator(accelerator).and_then(|chord| {
            self.bindings
                .lock()
                .handlers
                .get(&chord)
                .map(|(_, handler)| Arc::clone(handler))
        });
        match handler {
            Some(handler) => {
                handler();
                true
            }
            None => false,
        }
    }
}

impl Drop for EventTapHotkeys {
    fn drop(&mut self) {
        if let Some(run_loop) = self.run_loop.lock().take() {
            run_loop.stop();
        }
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

fn run_tap(
    bindings: Arc<Mutex<Bindings>>,
    run_loop: Arc<Mutex<Option<CFRunLoop>>>,
    ready: crossbeam_channel::Sender<Result<(), EventTapError>>,
) {
    // Set once the tap exists, so the callback can re-enable it
    let port: Arc<AtomicPtr<c_void>> = Arc::new(AtomicPtr::new(std::ptr::null_mut()));
    let callback_port = Arc::clone(&port);

    let tap = CGEventTap::new(
        CGEventTapLocation::HID,
        CGEventTapPlacement::HeadInsertEventTap,
        CGEventTapOptions::Default,
        vec![CGEventType::KeyDown, CGEventType::KeyUp],
        move |_proxy, event_type, event| match event_type {
            CGEventType::KeyDown | CGEventType::KeyUp => {
                let keycode = event.get_integer_value_field(FIELD_KEYBOARD_EVENT_KEYCODE) as u16;
                let down = matches!(event_type, CGEventType::KeyDown);
                let repeat =
                    down && event.get_integer_value_field(FIELD_KEYBOARD_EVENT_AUTOREPEAT) != 0;
                let chord = MacChord::from_event(keycode, event.get_flags().bits());

                let handler = {
                    let mut bindings = bindings.lock();
                    if !down {
                        return if bindings.swallowed.remove(&keycode) {
                            CallbackResult::Drop
                        } else {
                            CallbackResult::Keep
                        };
                    }
                    let Some((accelerator, handler)) = bindings.handlers.get(&chord) else {
                        return CallbackResult::Keep;
                    };
                    trace!(%accelerator, repeat, "hotkey matched");
                    let handler = Arc::clone(handler);
                    bindings.swallowed.insert(keycode);
                    handler
                };

                if !repeat {
                    handler();
                }
                CallbackResult::Drop
            }
            CGEventType::TapDisabledByTimeout | CGEventType::TapDisabledByUserInput => {
                let port = callback_port.load(Ordering::SeqCst) as CFMachPortRef;
                if !port.is_null() {
                    warn!("event tap disabled by the system, re-enabling");
                    unsafe { CGEventTapEnable(port, true) };
                }
                CallbackResult::Keep
            }
            _ => CallbackResult::Keep,
        },
    );
    let tap = match tap {
        Ok(tap) => tap,
        Err(()) => {
            let _ = ready.send(Err(EventTapError::TapCreate));
            return;
        }
    };
    port.store(
        tap.mach_port().as_concrete_TypeRef() as *mut c_void,
        Ordering::SeqCst,
    );

    let source = match tap.mach_port().create_runloop_source(0) {
        Ok(source) => source,
        Err(()) => {
            let _ = ready.send(Err(EventTapError::RunLoopSource));
            return;
        }
    };

    let current = CFRunLoop::get_current();
    *run_loop.lock() = Some(current.clone());
    current.add_source(&source, unsafe { kCFRunLoopCommonModes });
    tap.enable();

    let _ = ready.send(Ok(()));
    debug!("event tap running");
    CFRunLoop::run_current();
    debug!("event tap stopped");
}
