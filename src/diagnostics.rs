//! Bounded history of device diagnostics.

use std::collections::VecDeque;
use std::time::Duration;

use chrono::{DateTime, Local, Utc};

/// Default number of entries kept.
pub const DEFAULT_LOG_CAPACITY: usize = 50;

/// Default window for recent-log queries.
pub const DEFAULT_LOG_WINDOW: Duration = Duration::from_secs(30);

/// Maximum rendered size, in characters. Older content is cut first.
pub const RENDER_BUDGET: usize = 4000;

/// A diagnostic line captured from the device.
///
/// Entries are only created by the listener as lines arrive.
///
/// ```compile_fail
/// let entry = ledgate::LogEntry::now("LOG: forged");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct LogEntry {
    /// When the line was received.
    pub timestamp: DateTime<Utc>,
    /// The line as the device sent it, marker included.
    pub text: String,
}

impl LogEntry {
    /// Creates an entry stamped with the current time.
    #[must_use]
    pub(crate) fn now(text: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            text: text.into(),
        }
    }

    #[cfg(test)]
    pub(crate) fn at(timestamp: DateTime<Utc>, text: impl Into<String>) -> Self {
        Self {
            timestamp,
            text: text.into(),
        }
    }
}

/// Fixed-capacity ring buffer of [`LogEntry`] in arrival order.
///
/// When full, appending evicts the oldest entry.
#[derive(Debug, Clone)]
pub struct LogBuffer {
    entries: VecDeque<LogEntry>,
    capacity: usize,
}

impl Default for LogBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_CAPACITY)
    }
}

impl LogBuffer {
    /// Creates an empty buffer. A capacity of zero is raised to one.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends an entry, evicting the oldest one if the buffer is full.
    pub fn append(&mut self, entry: LogEntry) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    /// Returns entries received within `window` of now, oldest first.
    #[must_use]
    pub fn query(&self, window: Duration) -> Vec<LogEntry> {
        self.query_at(window, Utc::now())
    }

    /// Returns entries with `timestamp >= now - window`, oldest first.
    #[must_use]
    pub fn query_at(&self, window: Duration, now: DateTime<Utc>) -> Vec<LogEntry> {
        let cutoff = chrono::Duration::from_std(window)
            .ok()
            .and_then(|window| now.checked_sub_signed(window));

        self.entries
            .iter()
            .filter(|entry| cutoff.is_none_or(|cutoff| entry.timestamp >= cutoff))
            .cloned()
            .collect()
    }

    /// Returns all entries, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    /// Returns the number of entries held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no entries are held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the maximum number of entries held.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Renders entries as `HH:MM:SS - text` lines in local time.
///
/// Returns `None` when there is nothing to show. Output longer than
/// [`RENDER_BUDGET`] characters keeps only the trailing part.
#[must_use]
pub fn render_entries(entries: &[LogEntry]) -> Option<String> {
    if entries.is_empty() {
        return None;
    }

    let text = entries
        .iter()
        .map(|entry| {
            format!(
                "{} - {}",
                entry.timestamp.with_timezone(&Local).format("%H:%M:%S"),
                entry.text
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    Some(keep_tail(text, RENDER_BUDGET))
}

fn keep_tail(text: String, budget: usize) -> String {
    let total = text.chars().count();
    if total <= budget {
        return text;
    }
    text.chars().skip(total - budget).collect()
}
