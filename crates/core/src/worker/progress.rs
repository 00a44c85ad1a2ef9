//! Progress scraping for the worker's diagnostic stream.
//!
//! The worker's stderr is not a protocol. Model downloads print tqdm bars,
//! libraries print warnings, and reads arrive in arbitrary chunks. We look
//! for something that looks like a percentage and otherwise pass the text on.

use crate::state::LastProgress;
use dk_protocol::Event;
use once_cell::sync::Lazy;
use regex::Regex;

/// One to three digits followed by `%`, at a word boundary or after `(`.
#[allow(clippy::expect_used)] // literal pattern
static PERCENT_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:\b|\()(\d{1,3})%").expect("percent pattern is valid"));

/// Find the first percentage in `text` whose value lies in `0..=100`.
///
/// Matches above 100 are skipped rather than clamped.
///
/// # Examples
///
/// ```
/// use dk_core::worker::scrape_percent;
///
/// assert_eq!(scrape_percent("Downloading model… (45%)"), Some(45));
/// assert_eq!(scrape_percent(" 80%|████████  | 1.2G/1.5G"), Some(80));
/// assert_eq!(scrape_percent("no progress here"), None);
/// assert_eq!(scrape_percent("250% done"), None);
/// ```
pub fn scrape_percent(text: &str) -> Option<u8> {
    PERCENT_PATTERN.captures_iter(text).find_map(|caps| {
        let value: u16 = caps.get(1)?.as_str().parse().ok()?;
        if value <= 100 {
            u8::try_from(value).ok()
        } else {
            None
        }
    })
}

/// Turns diagnostic-stream chunks into `progress` or `stderr` events.
///
/// Applied to the error stream only. A chunk may hold several lines; it is
/// treated as one unit.
#[derive(Clone, Default)]
pub struct ProgressScraper {
    last: LastProgress,
}

impl ProgressScraper {
    /// Create a scraper that records into the given progress cell.
    pub fn new(last: LastProgress) -> Self {
        Self { last }
    }

    /// Classify one chunk.
    ///
    /// With a percentage: a `progress` event whose message is the trimmed
    /// chunk, and the cell is updated. Without: a `stderr` event carrying the
    /// chunk unchanged.
    pub fn scrape(&self, chunk: &str) -> Event {
        match scrape_percent(chunk) {
            Some(percent) => {
                let message = chunk.trim();
                self.last.record(percent, message);
                Event::progress(percent, message)
            }
            None => Event::stderr(chunk),
        }
    }

    pub fn last_progress(&self) -> &LastProgress {
        &self.last
    }
}
