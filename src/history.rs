//! Submission history
//!
//! A bounded, deduplicated list of past submissions, oldest first, with a
//! browse cursor for Up/Down navigation. Re-submitting an entry moves it to
//! the newest position. In-memory only.

use std::collections::VecDeque;

/// Default number of entries kept
pub const DEFAULT_CAPACITY: usize = 69;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Entry {
    text: String,
    /// Submitted as a script block (recorded without its marker)
    script: bool,
}

/// Submission history with a browse cursor
#[derive(Debug, Clone)]
pub struct History {
    /// Entries, oldest at the front
    entries: VecDeque<Entry>,
    /// Maximum number of entries
    capacity: usize,
    /// Browse position (None = not browsing)
    cursor: Option<usize>,
    /// Returned when not browsing
    empty_value: String,
}

impl History {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity.min(DEFAULT_CAPACITY)),
            capacity,
            cursor: None,
            empty_value: String::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Change the capacity, evicting the oldest entries on overflow.
    ///
    /// Negative sizes are ignored, as is the current size.
    pub fn set_capacity(&mut self, capacity: i64) {
        let Ok(capacity) = usize::try_from(capacity) else {
            return;
        };
        if capacity == self.capacity {
            return;
        }
        self.cursor = None;
        self.capacity = capacity;
        self.evict_overflow();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries, oldest first
    pub fn entries(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.text.as_str())
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    /// Entry under the cursor, or the empty value when not browsing
    pub fn current(&self) -> &str {
        self.cursor
            .and_then(|idx| self.entries.get(idx))
            .map_or(self.empty_value.as_str(), |e| e.text.as_str())
    }

    /// Whether the entry under the cursor was a script submission
    pub fn current_is_script(&self) -> bool {
        self.cursor
            .and_then(|idx| self.entries.get(idx))
            .is_some_and(|e| e.script)
    }

    /// Step toward the oldest entry (clamped); from "not browsing" jump to the newest.
    pub fn prev_entry(&mut self) -> String {
        match self.cursor {
            None if !self.entries.is_empty() => self.cursor = Some(self.entries.len() - 1),
            Some(idx) if idx > 0 => self.cursor = Some(idx - 1),
            _ => {}
        }
        self.current().to_string()
    }

    /// Step toward the newest entry; past the newest stop browsing.
    pub fn next_entry(&mut self) -> String {
        if let Some(idx) = self.cursor {
            let idx = idx + 1;
            self.cursor = if idx >= self.entries.len() { None } else { Some(idx) };
        }
        self.current().to_string()
    }

    /// Record a submission as the newest entry. Empty values are ignored.
    pub fn record(&mut self, value: &str) {
        self.push(value, false);
    }

    /// Record the body of a script submission
    pub fn record_script(&mut self, body: &str) {
        self.push(body, true);
    }

    fn push(&mut self, text: &str, script: bool) {
        if text.is_empty() {
            return;
        }
        self.cursor = None;
        self.entries.retain(|e| e.text != text);
        self.entries.push_back(Entry { text: text.to_string(), script });
        self.evict_overflow();
    }

    pub fn clear(&mut self) {
        self.cursor = None;
        self.entries.clear();
    }

    /// Empty the history and start over with new settings
    pub fn reset(&mut self, capacity: usize, empty_value: impl Into<String>) {
        self.clear();
        self.capacity = capacity;
        self.empty_value = empty_value.into();
    }

    fn evict_overflow(&mut self) {
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled(values: &[&str]) -> History {
        let mut h = History::default();
        for v in values {
            h.record(v);
        }
        h
    }

    #[test]
    fn test_record_dedupes_most_recent_wins() {
        let h = filled(&["a", "b", "a"]);
        assert_eq!(h.entries().collect::<Vec<_>>(), vec!["b", "a"]);
    }

    #[test]
    fn test_record_ignores_empty() {
        let h = filled(&["", "x", ""]);
        assert_eq!(h.len(), 1);
    }

    #[test]
    fn test_capacity_never_exceeded() {
        for cap in 0..5 {
            let mut h = History::new(cap);
            for i in 0..10 {
                h.record(&format!("cmd{}", i % 7));
                assert!(h.len() <= cap);
            }
        }
        let mut h = History::new(2);
        h.record("a");
        h.record("b");
        h.record("c");
        assert_eq!(h.entries().collect::<Vec<_>>(), vec!["b", "c"]);
    }

    #[test]
    fn test_previous_clamps_at_oldest() {
        let mut h = filled(&["a", "b", "c"]);
        assert_eq!(h.prev_entry(), "c");
        assert_eq!(h.prev_entry(), "b");
        assert_eq!(h.prev_entry(), "a");
        assert_eq!(h.prev_entry(), "a");
        assert_eq!(h.cursor(), Some(0));
    }

    #[test]
    fn test_next_past_newest_returns_empty() {
        let mut h = filled(&["a", "b"]);
        assert_eq!(h.next_entry(), "");
        h.prev_entry();
        h.prev_entry();
        assert_eq!(h.next_entry(), "b");
        assert_eq!(h.next_entry(), "");
        assert_eq!(h.cursor(), None);
    }

    #[test]
    fn test_previous_next_round_trip() {
        let mut h = filled(&["a", "b", "c"]);
        h.prev_entry();
        h.prev_entry();
        let before = h.current().to_string();
        h.prev_entry();
        assert_eq!(h.next_entry(), before);

        let mut fresh = filled(&["a"]);
        fresh.prev_entry();
        assert_eq!(fresh.next_entry(), "");
    }

    #[test]
    fn test_empty_history_navigation() {
        let mut h = History::default();
        assert_eq!(h.prev_entry(), "");
        assert_eq!(h.next_entry(), "");
        assert_eq!(h.cursor(), None);
    }

    #[test]
    fn test_set_capacity_resets_cursor_and_evicts() {
        let mut h = filled(&["a", "b", "c"]);
        h.prev_entry();
        h.set_capacity(2);
        assert_eq!(h.cursor(), None);
        assert_eq!(h.entries().collect::<Vec<_>>(), vec!["b", "c"]);

        h.prev_entry();
        h.set_capacity(-1);
        assert_eq!(h.cursor(), Some(1));
        h.set_capacity(2);
        assert_eq!(h.cursor(), Some(1));
    }

    #[test]
    fn test_record_resets_cursor() {
        let mut h = filled(&["a", "b"]);
        h.prev_entry();
        h.record("c");
        assert_eq!(h.cursor(), None);
    }

    #[test]
    fn test_clear_and_reset() {
        let mut h = filled(&["a", "b"]);
        h.prev_entry();
        h.clear();
        assert!(h.is_empty());
        assert_eq!(h.cursor(), None);

        h.reset(1, "<none>");
        assert_eq!(h.next_entry(), "<none>");
        h.record("x");
        h.record("y");
        assert_eq!(h.entries().collect::<Vec<_>>(), vec!["y"]);
    }

    #[test]
    fn test_script_flag_follows_cursor() {
        let mut h = History::default();
        h.record_script("1+1");
        h.record("hello");
        assert!(!h.current_is_script());
        assert_eq!(h.prev_entry(), "hello");
        assert!(!h.current_is_script());
        assert_eq!(h.prev_entry(), "1+1");
        assert!(h.current_is_script());

        // Re-recording as text drops the flag
        h.record("1+1");
        assert_eq!(h.prev_entry(), "1+1");
        assert!(!h.current_is_script());
    }
}
