//! Global hotkey toggle.
//!
//! - [`accelerator`]: parsing of accelerator strings
//! - [`registrar`]: the OS registration seam and an in-process implementation
//! - [`toggle`]: the controller binding one accelerator to start/stop
//! - `event_tap`: system-wide registration on macOS, behind the
//!   `macos-hotkeys` feature

pub mod accelerator;
#[cfg(all(target_os = "macos", feature = "macos-hotkeys"))]
pub mod event_tap;
#[cfg(any(all(target_os = "macos", feature = "macos-hotkeys"), test))]
mod keymap;
pub mod registrar;
pub mod toggle;

pub use accelerator::{Accelerator, AcceleratorError, Modifier};
#[cfg(all(target_os = "macos", feature = "macos-hotkeys"))]
pub use event_tap::{EventTapError, EventTapHotkeys};
pub use registrar::{HotkeyHandler, HotkeyRegistrar, InMemoryHotkeys};
pub use toggle::{toggle_command, HotkeyToggleController};
