//! Line codec for the worker protocol.
//!
//! Commands go out as one JSON record per line. Worker output comes back as
//! JSON Lines too, except when it doesn't: third-party libraries inside the
//! worker print banners and warnings straight to stdout, so decoding has to
//! accept arbitrary text.

use crate::worker::error::CodecError;
use dk_protocol::{Command, Event};
use serde_json::Value;

/// Encoder/decoder for the worker's line protocol.
pub struct EventProtocolCodec;

impl EventProtocolCodec {
    /// Serialize a command as a single newline-terminated JSON record.
    ///
    /// # Example
    ///
    /// ```
    /// use dk_core::worker::EventProtocolCodec;
    /// use dk_protocol::Command;
    ///
    /// let bytes = EventProtocolCodec::encode(&Command::stop()).unwrap();
    /// assert_eq!(bytes, b"{\"cmd\":\"stop\",\"args\":{}}\n");
    /// ```
    pub fn encode(command: &Command) -> Result<Vec<u8>, CodecError> {
        let mut bytes =
            serde_json::to_vec(command).map_err(|e| CodecError::Encode(e.to_string()))?;
        bytes.push(b'\n');
        Ok(bytes)
    }

    /// Decode one line of worker output.
    ///
    /// # Returns
    ///
    /// - `None` for empty or whitespace-only lines
    /// - The decoded mapping, untouched, when the line is a JSON object;
    ///   the event prints back as the exact line
    /// - A `log` event carrying the raw line verbatim otherwise
    ///
    /// This never fails: a line that isn't protocol is still output.
    pub fn decode(line: &str) -> Option<Event> {
        if line.trim().is_empty() {
            return None;
        }

        match serde_json::from_str::<Value>(line) {
            Ok(Value::Object(fields)) => Some(Event::from_line(fields, line)),
            // Scalars and arrays parse as JSON but aren't records
            Ok(_) | Err(_) => Some(Event::log(line)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dk_protocol::{CommandName, EventKind};
    use serde_json::{json, Map};

    #[test]
    fn test_encode_is_single_terminated_line() {
        let bytes = EventProtocolCodec::encode(&Command::start(Some("en"))).unwrap();
        let text = String::from_utf8(bytes).unwrap();

        assert!(text.ends_with('\n'));
        assert_eq!(text.matches('\n').count(), 1);
    }

    #[test]
    fn test_encode_escapes_newlines_in_args() {
        let command = Command::load("multi\nline");
        let text = String::from_utf8(EventProtocolCodec::encode(&command).unwrap()).unwrap();

        assert_eq!(text.matches('\n').count(), 1);
    }

    #[test]
    fn test_encode_then_decode_keeps_cmd_and_args() {
        let mut args = Map::new();
        args.insert("model_name".to_string(), json!("base.en"));
        args.insert("options".to_string(), json!({"beam": 5, "vad": true, "tags": ["a", null]}));

        for name in CommandName::ALL {
            let bytes = EventProtocolCodec::encode(&Command::new(name, args.clone())).unwrap();
            let line = String::from_utf8(bytes).unwrap();

            let decoded = EventProtocolCodec::decode(&line).unwrap();
            assert_eq!(decoded.get("cmd"), Some(&json!(name.as_str())));
            assert_eq!(decoded.get("args"), Some(&Value::Object(args.clone())));
        }
    }

    #[test]
    fn test_decode_passes_unknown_fields_through() {
        let line = r#"{"event":"pref_language","value":"fr","nested":{"a":[1,2]}}"#;
        let event = EventProtocolCodec::decode(line).unwrap();

        assert_eq!(event.kind(), Some(EventKind::Other("pref_language".to_string())));
        assert_eq!(
            Value::Object(event.into_fields()),
            serde_json::from_str::<Value>(line).unwrap()
        );
    }

    #[test]
    fn test_decoded_object_prints_as_written() {
        for line in [
            r#"{"event":"transcript","text":"hi","language":"en"}"#,
            r#"{"event":"pref_model","id":123456789012345678901234}"#,
            r#"{"z":1, "event" : "ready",  "a":0.10}"#,
        ] {
            let event = EventProtocolCodec::decode(line).unwrap();
            assert_eq!(event.to_string(), line);
        }
    }

    #[test]
    fn test_decode_started() {
        let event = EventProtocolCodec::decode(r#"{"event":"started","language":"en"}"#).unwrap();
        assert_eq!(event.kind(), Some(EventKind::Started));
        assert_eq!(event.get_str("language"), Some("en"));
    }

    #[test]
    fn test_decode_non_json_becomes_log() {
        let event = EventProtocolCodec::decode("Loaded model tiny").unwrap();
        assert_eq!(event.kind(), Some(EventKind::Log));
        assert_eq!(event.get_str("data"), Some("Loaded model tiny"));
    }

    #[test]
    fn test_decode_keeps_raw_line_exactly() {
        for line in [
            "  leading and trailing  ",
            "{\"event\": \"started\"",
            "{not json}",
            "[1, 2, 3]",
            "42",
            "\"just a string\"",
            "null",
            "ünïcödé ✓ 100%",
        ] {
            let event = EventProtocolCodec::decode(line).unwrap();
            assert_eq!(event.kind(), Some(EventKind::Log), "line: {line}");
            assert_eq!(event.get_str("data"), Some(line));
        }
    }

    #[test]
    fn test_decode_discards_empty_lines() {
        assert!(EventProtocolCodec::decode("").is_none());
        assert!(EventProtocolCodec::decode("   ").is_none());
        assert!(EventProtocolCodec::decode("\t\r").is_none());
    }

    #[test]
    fn test_decode_object_without_event_field_is_passed_through() {
        let event = EventProtocolCodec::decode(r#"{"hello":"world"}"#).unwrap();
        assert_eq!(event.kind(), None);
        assert_eq!(event.get_str("hello"), Some("world"));
    }
}
