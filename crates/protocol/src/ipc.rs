//! Host-to-worker command protocol.
//!
//! Every command is written to the worker's standard input as a single
//! JSON record terminated by a newline:
//!
//! ```json
//! {"cmd":"start","args":{"language":"en"}}
//! ```
//!
//! Commands are fire-and-forget. The worker acknowledges them (if at all)
//! through events on its output stream, never through a reply to the write.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

/// Name of an operation the worker understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
pub enum CommandName {
    /// Load (or reload) a speech model.
    Load,
    /// Begin a recording session.
    Start,
    /// End the current recording session and transcribe it.
    Stop,
    /// Ask the worker to report its status as an event.
    Status,
    /// Flush any buffered audio.
    Flush,
    /// Ask the worker to exit on its own.
    Quit,
}

impl CommandName {
    /// All command names, in protocol order.
    pub const ALL: [CommandName; 6] = [
        Self::Load,
        Self::Start,
        Self::Stop,
        Self::Status,
        Self::Flush,
        Self::Quit,
    ];

    /// The wire spelling of this command.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Load => "load",
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Status => "status",
            Self::Flush => "flush",
            Self::Quit => "quit",
        }
    }
}

impl fmt::Display for CommandName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommandName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| format!("unknown command: {s}"))
    }
}

/// A named operation plus its argument mapping.
///
/// Built by callers, serialized by the dispatcher, never parsed back by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct Command {
    /// Which operation to run.
    pub cmd: CommandName,

    /// Free-form arguments. Keys are strings, values any JSON.
    #[serde(default)]
    #[ts(type = "Record<string, unknown>")]
    pub args: Map<String, Value>,
}

impl Command {
    /// Create a command with the given arguments.
    pub fn new(cmd: CommandName, args: Map<String, Value>) -> Self {
        Self { cmd, args }
    }

    /// Create a command with no arguments.
    pub fn bare(cmd: CommandName) -> Self {
        Self::new(cmd, Map::new())
    }

    /// Add one argument.
    pub fn with_arg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.args.insert(key.into(), value.into());
        self
    }

    /// `load` with the model to load.
    pub fn load(model_name: impl Into<String>) -> Self {
        Self::bare(CommandName::Load).with_arg("model_name", model_name.into())
    }

    /// `start`, carrying the language only when one is given.
    pub fn start(language: Option<&str>) -> Self {
        let command = Self::bare(CommandName::Start);
        match language {
            Some(language) => command.with_arg("language", language),
            None => command,
        }
    }

    pub fn stop() -> Self {
        Self::bare(CommandName::Stop)
    }

    pub fn status() -> Self {
        Self::bare(CommandName::Status)
    }

    pub fn flush() -> Self {
        Self::bare(CommandName::Flush)
    }

    pub fn quit() -> Self {
        Self::bare(CommandName::Quit)
    }
}
