//! Custom assertion helpers over event sequences.

use dk_protocol::Event;

/// Whether any event in `events` is named `kind`.
pub fn has_event(events: &[Event], kind: &str) -> bool {
    events.iter().any(|e| e.name() == Some(kind))
}

/// Position of the first event named `kind`.
pub fn position_of(events: &[Event], kind: &str) -> Option<usize> {
    events.iter().position(|e| e.name() == Some(kind))
}

/// Assert that `first` appears before `second` in `events`.
pub fn assert_ordered(events: &[Event], first: &str, second: &str) {
    let a = position_of(events, first).unwrap_or_else(|| panic!("no '{first}' in {events:?}"));
    let b = position_of(events, second).unwrap_or_else(|| panic!("no '{second}' in {events:?}"));
    assert!(a < b, "expected '{first}' before '{second}', got: {events:?}");
}

/// Assert that the last event is the process exit.
pub fn assert_ends_with_exit(events: &[Event]) {
    let last = events.last().unwrap_or_else(|| panic!("Event sequence is empty"));
    assert_eq!(last.name(), Some("exit"), "Last event should be exit, got: {last:?}");
}
