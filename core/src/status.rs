//! Incremental view of the appliance's test log.
//!
//! # Design
//! `readlog` returns the whole log every time. `StatusBuffer` remembers what
//! it has already shown and appends only the tail that is new. The overlap is
//! found by a prefix match against everything seen so far, not by a diff: if
//! the appliance rotates, truncates or reorders its log, text can show up
//! twice or go missing.

use tracing::trace;

/// Marker the appliance inserts where it elides log lines.
pub const ELISION_MARKER: &str = "\n...\n";

/// Line break as it appears in raw log text.
pub const LINE_BREAK: &str = "<br>";

/// Append-only record of all log text observed so far.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StatusBuffer {
    text: String,
}

impl StatusBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Fold one poll result into the buffer.
    ///
    /// Returns the whole accumulated buffer when `raw` carried something new,
    /// `None` when it was empty or already seen.
    pub fn absorb(&mut self, raw: &str) -> Option<&str> {
        let incoming = raw.replace(LINE_BREAK, "\n");
        if self.text.contains(incoming.as_str()) {
            return None;
        }

        let seen = self.text.replace(ELISION_MARKER, "");
        let delta = incoming.strip_prefix(seen.as_str()).unwrap_or(incoming.as_str());
        trace!(delta_len = delta.len(), "new status output");

        self.text.push_str(delta);
        self.text.push('\n');
        Some(&self.text)
    }
}
