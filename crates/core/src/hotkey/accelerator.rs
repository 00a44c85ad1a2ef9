//! Electron-style accelerator strings such as `CommandOrControl+Shift+Space`.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AcceleratorError {
    #[error("accelerator is empty")]
    Empty,

    #[error("accelerator '{0}' has an empty segment")]
    EmptyToken(String),

    #[error("unknown key or modifier '{0}'")]
    UnknownToken(String),

    #[error("accelerator '{0}' has no key")]
    MissingKey(String),

    #[error("accelerator '{0}' has more than one key")]
    MultipleKeys(String),

    #[error("modifier '{0}' appears more than once")]
    DuplicateModifier(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Modifier {
    /// Command on macOS, Control elsewhere.
    CommandOrControl,
    Command,
    Control,
    Alt,
    AltGr,
    Shift,
    Super,
}

impl Modifier {
    fn parse(token: &str) -> Option<Self> {
        let modifier = match token.to_ascii_lowercase().as_str() {
            "commandorcontrol" | "cmdorctrl" => Self::CommandOrControl,
            "command" | "cmd" => Self::Command,
            "control" | "ctrl" => Self::Control,
            "alt" | "option" => Self::Alt,
            "altgr" => Self::AltGr,
            "shift" => Self::Shift,
            "super" | "meta" => Self::Super,
            _ => return None,
        };
        Some(modifier)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CommandOrControl => "CommandOrControl",
            Self::Command => "Command",
            Self::Control => "Control",
            Self::Alt => "Alt",
            Self::AltGr => "AltGr",
            Self::Shift => "Shift",
            Self::Super => "Super",
        }
    }
}

const NAMED_KEYS: &[(&[&str], &str)] = &[
    (&["space"], "Space"),
    (&["tab"], "Tab"),
    (&["enter", "return"], "Enter"),
    (&["escape", "esc"], "Escape"),
    (&["backspace"], "Backspace"),
    (&["delete", "del"], "Delete"),
    (&["insert"], "Insert"),
    (&["home"], "Home"),
    (&["end"], "End"),
    (&["pageup"], "PageUp"),
    (&["pagedown"], "PageDown"),
    (&["up"], "Up"),
    (&["down"], "Down"),
    (&["left"], "Left"),
    (&["right"], "Right"),
    (&["plus"], "Plus"),
];

/// Canonical key name for `token`, if it names a key.
fn parse_key(token: &str) -> Option<String> {
    let mut chars = token.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        if c.is_ascii_alphanumeric() {
            return Some(c.to_ascii_uppercase().to_string());
        }
        if c.is_ascii_punctuation() {
            return Some(c.to_string());
        }
        return None;
    }

    let lower = token.to_ascii_lowercase();
    if let Some(number) = lower.strip_prefix('f').and_then(|n| n.parse::<u8>().ok()) {
        if (1..=24).contains(&number) && !lower[1..].starts_with('0') {
            return Some(format!("F{number}"));
        }
    }

    NAMED_KEYS
        .iter()
        .find(|(aliases, _)| aliases.contains(&lower.as_str()))
        .map(|(_, name)| (*name).to_string())
}

/// A parsed accelerator: a set of modifiers plus exactly one key.
///
/// Parsing is case-insensitive and accepts the common aliases (`Ctrl`,
/// `Cmd`, `CmdOrCtrl`, `Option`, `Meta`). `Display` renders the canonical
/// spelling, so two strings naming the same chord compare equal once parsed.
///
/// ```rust
/// use dk_core::hotkey::Accelerator;
///
/// let accel: Accelerator = "cmdorctrl+shift+space".parse().unwrap();
/// assert_eq!(accel.to_string(), "CommandOrControl+Shift+Space");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Accelerator {
    modifiers: BTreeSet<Modifier>,
    key: String,
}

impl Accelerator {
    pub fn modifiers(&self) -> impl Iterator<Item = Modifier> + '_ {
        self.modifiers.iter().copied()
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl FromStr for Accelerator {
    type Err = AcceleratorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(AcceleratorError::Empty);
        }

        // A trailing "+" is the plus key itself ("Ctrl++")
        let (body, plus_key) = match s.strip_suffix("++") {
            Some(body) => (body, true),
            None if s == "+" => ("", true),
            None => (s, false),
        };

        let mut modifiers = BTreeSet::new();
        let mut key = plus_key.then(|| "Plus".to_string());

        let tokens = if body.is_empty() { Vec::new() } else { body.split('+').collect() };
        for token in tokens {
            let token = token.trim();
            if token.is_empty() {
                return Err(AcceleratorError::EmptyToken(s.to_string()));
            }

            if let Some(modifier) = Modifier::parse(token) {
                if !modifiers.insert(modifier) {
                    return Err(AcceleratorError::DuplicateModifier(modifier.as_str().to_string()));
                }
                continue;
            }

            let parsed = parse_key(token).ok_or_else(|| AcceleratorError::UnknownToken(token.to_string()))?;
            if key.replace(parsed).is_some() {
                return Err(AcceleratorError::MultipleKeys(s.to_string()));
            }
        }

        let key = key.ok_or_else(|| AcceleratorError::MissingKey(s.to_string()))?;
        Ok(Self { modifiers, key })
    }
}

impl fmt::Display for Accelerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for modifier in &self.modifiers {
            write!(f, "{}+", modifier.as_str())?;
        }
        f.write_str(&self.key)
    }
}
