//! Process-wide cells shared between stream listeners and readers.
//!
//! Only the supervisor's stream listeners write to these; the hotkey handler
//! and the presentation layer read them. Cloning shares the same cell.

use chrono::Utc;
use dk_protocol::ProgressSnapshot;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Last-known belief about whether the worker's session is running.
///
/// Set only by observing `started` / `stopped` events or process exit, never
/// by sending a command.
#[derive(Debug, Clone, Default)]
pub struct RunState(Arc<AtomicBool>);

impl RunState {
    pub fn is_running(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub(crate) fn set(&self, running: bool) {
        self.0.store(running, Ordering::SeqCst);
    }
}

/// Most recent scraped progress. A readback value only.
#[derive(Debug, Clone, Default)]
pub struct LastProgress(Arc<Mutex<Option<ProgressSnapshot>>>);

impl LastProgress {
    pub fn get(&self) -> Option<ProgressSnapshot> {
        self.0.lock().clone()
    }

    pub fn percent(&self) -> Option<u8> {
        self.0.lock().as_ref().map(|snapshot| snapshot.percent)
    }

    pub(crate) fn record(&self, percent: u8, message: &str) {
        *self.0.lock() = Some(ProgressSnapshot {
            percent,
            message: message.to_string(),
            observed_at: Utc::now(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_state_clones_share_cell() {
        let state = RunState::default();
        let reader = state.clone();
        assert!(!reader.is_running());

        state.set(true);
        assert!(reader.is_running());

        state.set(false);
        assert!(!reader.is_running());
    }

    #[test]
    fn test_last_progress_overwrites() {
        let progress = LastProgress::default();
        assert_eq!(progress.percent(), None);

        progress.record(90, "90%");
        progress.record(5, "5%");

        assert_eq!(progress.percent(), Some(5));
        assert_eq!(progress.get().map(|p| p.message), Some("5%".to_string()));
    }
}
