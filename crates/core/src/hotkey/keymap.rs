//! Translation between accelerators and macOS keyboard events.
//!
//! Keycodes are the layout-independent `kVK_*` virtual keycodes from
//! `HIToolbox/Events.h`, the same value CoreGraphics reports in the
//! keyboard-event keycode field.

use crate::hotkey::accelerator::{Accelerator, Modifier};

/// `kCGEventFlagMask*` bits for the four chord modifiers.
pub(crate) const FLAG_SHIFT: u64 = 1 << 17;
pub(crate) const FLAG_CONTROL: u64 = 1 << 18;
pub(crate) const FLAG_OPTION: u64 = 1 << 19;
pub(crate) const FLAG_COMMAND: u64 = 1 << 20;

const CHORD_FLAGS: u64 = FLAG_SHIFT | FLAG_CONTROL | FLAG_OPTION | FLAG_COMMAND;

/// A physical key plus the exact modifier flags that must be held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct MacChord {
    pub keycode: u16,
    pub flags: u64,
}

impl MacChord {
    /// The chord `accelerator` names on macOS, or `None` when a key or
    /// modifier has no macOS equivalent (F21-F24, `Plus`, `AltGr`).
    pub fn from_accelerator(accelerator: &Accelerator) -> Option<Self> {
        let keycode = keycode(accelerator.key())?;
        let mut flags = 0;
        for modifier in accelerator.modifiers() {
            flags |= match modifier {
                Modifier::CommandOrControl | Modifier::Command | Modifier::Super => FLAG_COMMAND,
                Modifier::Control => FLAG_CONTROL,
                Modifier::Alt => FLAG_OPTION,
                Modifier::Shift => FLAG_SHIFT,
                Modifier::AltGr => return None,
            };
        }
        Some(Self { keycode, flags })
    }

    /// The chord a keyboard event represents. Caps lock, fn and device bits
    /// in `flags` are ignored.
    pub fn from_event(keycode: u16, flags: u64) -> Self {
        Self {
            keycode,
            flags: flags & CHORD_FLAGS,
        }
    }
}

/// Virtual keycode for a canonical accelerator key name.
fn keycode(key: &str) -> Option<u16> {
    let code = match key {
        "A" => 0x00,
        "S" => 0x01,
        "D" => 0x02,
        "F" => 0x03,
        "H" => 0x04,
        "G" => 0x05,
        "Z" => 0x06,
        "X" => 0x07,
        "C" => 0x08,
        "V" => 0x09,
        "B" => 0x0B,
        "Q" => 0x0C,
        "W" => 0x0D,
        "E" => 0x0E,
        "R" => 0x0F,
        "Y" => 0x10,
        "T" => 0x11,
        "1" => 0x12,
        "2" => 0x13,
        "3" => 0x14,
        "4" => 0x15,
        "6" => 0x16,
        "5" => 0x17,
        "=" => 0x18,
        "9" => 0x19,
        "7" => 0x1A,
        "-" => 0x1B,
        "8" => 0x1C,
        "0" => 0x1D,
        "]" => 0x1E,
        "O" => 0x1F,
        "U" => 0x20,
        "[" => 0x21,
        "I" => 0x22,
        "P" => 0x23,
        "Enter" => 0x24,
        "L" => 0x25,
        "J" => 0x26,
        "'" => 0x27,
        "K" => 0x28,
        ";" => 0x29,
        "\\" => 0x2A,
        "," => 0x2B,
        "/" => 0x2C,
        "N" => 0x2D,
        "M" => 0x2E,
        "." => 0x2F,
        "Tab" => 0x30,
        "Space" => 0x31,
        "`" => 0x32,
        "Backspace" => 0x33,
        "Escape" => 0x35,
        "F17" => 0x40,
        "F18" => 0x4F,
        "F19" => 0x50,
        "F20" => 0x5A,
        "F5" => 0x60,
        "F6" => 0x61,
        "F7" => 0x62,
        "F3" => 0x63,
        "F8" => 0x64,
        "F9" => 0x65,
        "F11" => 0x67,
        "F13" => 0x69,
        "F16" => 0x6A,
        "F14" => 0x6B,
        "F10" => 0x6D,
        "F12" => 0x6F,
        "F15" => 0x71,
        // The Help key sits where Insert is on PC keyboards
        "Insert" => 0x72,
        "Home" => 0x73,
        "PageUp" => 0x74,
        "Delete" => 0x75,
        "F4" => 0x76,
        "End" => 0x77,
        "F2" => 0x78,
        "PageDown" => 0x79,
        "F1" => 0x7A,
        "Left" => 0x7B,
        "Right" => 0x7C,
        "Down" => 0x7D,
        "Up" => 0x7E,
        _ => return None,
    };
    Some(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chord(s: &str) -> Option<MacChord> {
        MacChord::from_accelerator(&s.parse().unwrap())
    }

    #[test]
    fn test_command_or_control_is_command() {
        assert_eq!(
            chord("CommandOrControl+Alt+Space"),
            Some(MacChord {
                keycode: 0x31,
                flags: FLAG_COMMAND | FLAG_OPTION,
            })
        );
        assert_eq!(chord("Super+K"), chord("Cmd+K"));
    }

    #[test]
    fn test_keys_without_mac_equivalent() {
        assert_eq!(chord("F24"), None);
        assert_eq!(chord("Ctrl+Plus"), None);
        assert_eq!(chord("AltGr+E"), None);
    }

    #[test]
    fn test_event_matches_ignoring_lock_and_device_bits() {
        const CAPS_LOCK: u64 = 1 << 16;
        const DEVICE_LEFT_CONTROL: u64 = 0x01;

        let event = MacChord::from_event(0x65, FLAG_CONTROL | CAPS_LOCK | DEVICE_LEFT_CONTROL);
        assert_eq!(Some(event), chord("Ctrl+F9"));
        assert_ne!(Some(event), chord("F9"));
        assert_ne!(Some(event), chord("Ctrl+Shift+F9"));
    }
}
