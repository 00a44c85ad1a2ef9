//! Operator commands read from the host's own stdin, one per line.

use std::str::FromStr;
use thiserror::Error;

pub const HELP: &str = "commands: load [model] | start [lang] | stop | status | flush | quit | toggle | \
hotkey <accel> | hotkey clear | language <code> | model <name> | restart | exit";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OperatorError {
    #[error("unknown command '{0}'")]
    Unknown(String),

    #[error("'{0}' needs an argument")]
    MissingArgument(&'static str),

    #[error("'{0}' takes no arguments")]
    UnexpectedArgument(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperatorCommand {
    /// Load a model, the effective one when none is named.
    Load(Option<String>),
    /// Start a session, in the effective language when none is named.
    Start(Option<String>),
    Stop,
    Status,
    Flush,
    Quit,
    /// Simulated press of the bound hotkey.
    Toggle,
    Hotkey(String),
    ClearHotkey,
    Language(String),
    Model(String),
    Restart,
    Exit,
}

impl FromStr for OperatorCommand {
    type Err = OperatorError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut parts = line.split_whitespace();
        let name = parts.next().unwrap_or_default();
        let rest: Vec<&str> = parts.collect();
        let arg = rest.first().map(|s| s.to_string());

        let bare = |command: OperatorCommand, name: &'static str| {
            if rest.is_empty() {
                Ok(command)
            } else {
                Err(OperatorError::UnexpectedArgument(name))
            }
        };

        match name.to_ascii_lowercase().as_str() {
            "load" => Ok(Self::Load(arg)),
            "start" => Ok(Self::Start(arg)),
            "stop" => bare(Self::Stop, "stop"),
            "status" => bare(Self::Status, "status"),
            "flush" => bare(Self::Flush, "flush"),
            "quit" => bare(Self::Quit, "quit"),
            "toggle" => bare(Self::Toggle, "toggle"),
            "restart" => bare(Self::Restart, "restart"),
            "exit" => bare(Self::Exit, "exit"),
            "hotkey" => match rest.as_slice() {
                [] => Err(OperatorError::MissingArgument("hotkey")),
                ["clear"] => Ok(Self::ClearHotkey),
                // Accelerators may be written with spaces around '+'
                parts => Ok(Self::Hotkey(parts.concat())),
            },
            "language" => arg.map(Self::Language).ok_or(OperatorError::MissingArgument("language")),
            "model" => arg.map(Self::Model).ok_or(OperatorError::MissingArgument("model")),
            other => Err(OperatorError::Unknown(other.to_string())),
        }
    }
}

impl OperatorCommand {
    /// Parse one input line. Blank lines are `Ok(None)`.
    pub fn parse(line: &str) -> Result<Option<Self>, OperatorError> {
        if line.trim().is_empty() {
            return Ok(None);
        }
        line.parse().map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> Result<Option<OperatorCommand>, OperatorError> {
        OperatorCommand::parse(line)
    }

    #[test]
    fn test_parse_commands() {
        let cases = [
            ("load", OperatorCommand::Load(None)),
            ("load base.en", OperatorCommand::Load(Some("base.en".to_string()))),
            ("start", OperatorCommand::Start(None)),
            ("  START de ", OperatorCommand::Start(Some("de".to_string()))),
            ("stop", OperatorCommand::Stop),
            ("status", OperatorCommand::Status),
            ("flush", OperatorCommand::Flush),
            ("quit", OperatorCommand::Quit),
            ("toggle", OperatorCommand::Toggle),
            ("hotkey Alt+Space", OperatorCommand::Hotkey("Alt+Space".to_string())),
            ("hotkey Ctrl + F9", OperatorCommand::Hotkey("Ctrl+F9".to_string())),
            ("hotkey clear", OperatorCommand::ClearHotkey),
            ("language fr", OperatorCommand::Language("fr".to_string())),
            ("model tiny", OperatorCommand::Model("tiny".to_string())),
            ("restart", OperatorCommand::Restart),
            ("exit", OperatorCommand::Exit),
        ];

        for (line, expected) in cases {
            assert_eq!(parse(line), Ok(Some(expected)), "line: {line}");
        }
    }

    #[test]
    fn test_blank_line() {
        assert_eq!(parse(""), Ok(None));
        assert_eq!(parse("   \t"), Ok(None));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(parse("dance"), Err(OperatorError::Unknown("dance".to_string())));
        assert_eq!(parse("hotkey"), Err(OperatorError::MissingArgument("hotkey")));
        assert_eq!(parse("model"), Err(OperatorError::MissingArgument("model")));
        assert_eq!(parse("stop now"), Err(OperatorError::UnexpectedArgument("stop")));
    }
}
