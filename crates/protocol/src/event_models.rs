//! Worker-to-host events.
//!
//! An [`Event`] is an open JSON mapping with an `event` field naming its kind.
//! The host never assumes a fixed schema: events decoded from the worker are
//! forwarded with every field intact, including kinds the host does not know.
//!
//! Events the host originates itself:
//!
//! ```json
//! {"event":"log","data":"Loaded model tiny"}
//! {"event":"stderr","data":"UserWarning: ..."}
//! {"event":"progress","percent":45,"message":"Downloading model (45%)"}
//! {"event":"exit","code":0,"signal":null}
//! {"event":"error","source":"spawn","error":"..."}
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use ts_rs::TS;

/// Field carrying the event kind.
pub const EVENT_FIELD: &str = "event";

/// Classification of an event by its `event` field.
///
/// Used by the host for its own bookkeeping; forwarding never depends on it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Worker finished booting.
    Ready,
    /// Model load in progress.
    Loading,
    /// Model load finished.
    Loaded,
    /// A recording session began.
    Started,
    /// A recording session ended.
    Stopped,
    /// Transcribed text.
    Transcript,
    /// Transcription of the last session finished.
    Transcribed,
    /// Reply to a `status` command.
    Status,
    Noop,
    /// Worker acknowledged `quit`.
    Bye,
    Error,
    /// Non-protocol line from the output stream.
    Log,
    /// Diagnostic text without progress information.
    Stderr,
    Progress,
    /// The worker process terminated.
    Exit,
    /// Echo of the host's preferences.
    Prefs,
    /// Any other kind, forwarded as-is.
    Other(String),
}

impl EventKind {
    pub fn from_name(name: &str) -> Self {
        match name {
            "ready" => Self::Ready,
            "loading" => Self::Loading,
            "loaded" => Self::Loaded,
            "started" => Self::Started,
            "stopped" => Self::Stopped,
            "transcript" => Self::Transcript,
            "transcribed" => Self::Transcribed,
            "status" => Self::Status,
            "noop" => Self::Noop,
            "bye" => Self::Bye,
            "error" => Self::Error,
            "log" => Self::Log,
            "stderr" => Self::Stderr,
            "progress" => Self::Progress,
            "exit" => Self::Exit,
            "prefs" => Self::Prefs,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Ready => "ready",
            Self::Loading => "loading",
            Self::Loaded => "loaded",
            Self::Started => "started",
            Self::Stopped => "stopped",
            Self::Transcript => "transcript",
            Self::Transcribed => "transcribed",
            Self::Status => "status",
            Self::Noop => "noop",
            Self::Bye => "bye",
            Self::Error => "error",
            Self::Log => "log",
            Self::Stderr => "stderr",
            Self::Progress => "progress",
            Self::Exit => "exit",
            Self::Prefs => "prefs",
            Self::Other(name) => name,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a host-reported failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
pub enum ErrorSource {
    /// The worker binary or interpreter could not be located.
    Environment,
    /// The OS refused to create the worker process.
    Spawn,
    /// A command could not be written to the worker.
    Dispatch,
}

impl ErrorSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Environment => "environment",
            Self::Spawn => "spawn",
            Self::Dispatch => "dispatch",
        }
    }
}

/// A single event, kept as the raw JSON mapping.
///
/// Events decoded from a worker line also keep that line, so printing one
/// reproduces exactly what the worker wrote: field order, number formatting
/// and whitespace included. Any edit through [`Event::with`] drops the line.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[serde(transparent)]
#[ts(type = "{ event?: string } & Record<string, unknown>")]
pub struct Event {
    fields: Map<String, Value>,
    #[serde(skip)]
    raw: Option<String>,
}

impl Event {
    /// Wrap an already-decoded mapping without touching any field.
    pub fn from_fields(fields: Map<String, Value>) -> Self {
        Self { fields, raw: None }
    }

    /// Wrap a mapping decoded from `line`. Display prints `line` verbatim.
    pub fn from_line(fields: Map<String, Value>, line: impl Into<String>) -> Self {
        Self {
            fields,
            raw: Some(line.into()),
        }
    }

    /// An event of the given kind with no payload.
    pub fn named(kind: &str) -> Self {
        let mut fields = Map::new();
        fields.insert(EVENT_FIELD.to_string(), Value::from(kind));
        Self::from_fields(fields)
    }

    /// Add one field.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self.raw = None;
        self
    }

    /// A non-protocol output line, wrapped verbatim.
    pub fn log(line: impl Into<String>) -> Self {
        Self::named("log").with("data", line.into())
    }

    /// Unstructured diagnostic text.
    pub fn stderr(text: impl Into<String>) -> Self {
        Self::named("stderr").with("data", text.into())
    }

    pub fn progress(percent: u8, message: impl Into<String>) -> Self {
        Self::named("progress")
            .with("percent", percent)
            .with("message", message.into())
    }

    /// Process termination. Both fields are always present, `null` when unknown.
    pub fn exit(code: Option<i32>, signal: Option<&str>) -> Self {
        Self::named("exit")
            .with("code", code.map_or(Value::Null, Value::from))
            .with("signal", signal.map_or(Value::Null, Value::from))
    }

    /// A failure the host reports on the worker's behalf.
    pub fn error(source: ErrorSource, message: impl Into<String>) -> Self {
        Self::named("error")
            .with("source", source.as_str())
            .with("error", message.into())
    }

    /// Preference echo for the presentation layer.
    pub fn prefs(model: Option<&str>, language: Option<&str>, hotkey: Option<&str>) -> Self {
        let opt = |v: Option<&str>| v.map_or(Value::Null, Value::from);
        Self::named("prefs")
            .with("model", opt(model))
            .with("language", opt(language))
            .with("hotkey", opt(hotkey))
    }

    /// The raw `event` field, if it is a string.
    pub fn name(&self) -> Option<&str> {
        self.fields.get(EVENT_FIELD).and_then(Value::as_str)
    }

    /// The classified kind. `None` when the mapping has no string `event` field.
    pub fn kind(&self) -> Option<EventKind> {
        self.name().map(EventKind::from_name)
    }

    pub fn is(&self, kind: &EventKind) -> bool {
        self.name() == Some(kind.as_str())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// String payload stored under `key`.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn into_fields(self) -> Map<String, Value> {
        self.fields
    }

    /// The worker line this event was decoded from, if any.
    pub fn raw_line(&self) -> Option<&str> {
        self.raw.as_deref()
    }
}

/// Equality is by content; the source line is formatting only.
impl PartialEq for Event {
    fn eq(&self, other: &Self) -> bool {
        self.fields == other.fields
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(raw) = &self.raw {
            return f.write_str(raw);
        }
        // A Map<String, Value> always serializes.
        match serde_json::to_string(&self.fields) {
            Ok(json) => f.write_str(&json),
            Err(_) => Err(fmt::Error),
        }
    }
}
