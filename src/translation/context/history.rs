/*!
 * Rolling history of recent translations.
 *
 * The most recent translated lines are handed to the model as a context
 * hint. The window is bounded and evicts its oldest entry first.
 */

use std::collections::VecDeque;

/// Label placed before the joined history in the context hint
pub const CONTEXT_LABEL: &str = "Previous Text for Context: ";

/// Bounded, oldest-evicted list of translated lines.
#[derive(Debug, Clone)]
pub struct RollingHistory {
    entries: VecDeque<String>,
    capacity: usize,
}

impl RollingHistory {
    /// Create an empty history holding at most `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Append a raw entry, evicting the oldest once over capacity.
    pub fn push(&mut self, entry: impl Into<String>) {
        self.entries.push_back(entry.into());
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    /// Record a translated dialogue line as `Speaker: text` or `"text"`.
    pub fn record(&mut self, speaker: Option<&str>, translated: &str) {
        match speaker {
            Some(speaker) => self.push(format!("{}: {}", speaker, translated)),
            None => self.push(format!("\"{}\"", translated)),
        }
    }

    /// Context hint for the next translation call.
    pub fn context_hint(&self) -> String {
        format!("{}{}", CONTEXT_LABEL, self.joined())
    }

    /// Entries joined with single spaces, oldest first.
    pub fn joined(&self) -> String {
        self.entries.iter().map(String::as_str).collect::<Vec<_>>().join(" ")
    }

    pub fn entries(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
