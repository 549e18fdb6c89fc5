//! Trailing-window duplicate suppression
//!
//! Expiry is tracked with a min-heap keyed by expiry time and swept lazily
//! on every query, so a comment storm costs one heap entry per shown text
//! instead of one timer each.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use ahash::AHashMap;

/// Set of recently shown texts with per-entry expiry
#[derive(Debug, Clone)]
pub struct DedupWindow {
    window_ms: u64,
    expires_at: AHashMap<String, u64>,
    queue: BinaryHeap<Reverse<(u64, String)>>,
}

impl DedupWindow {
    /// Create a window that remembers texts for `window_seconds`
    #[must_use]
    pub fn new(window_seconds: u64) -> Self {
        Self {
            window_ms: window_seconds.saturating_mul(1000),
            expires_at: AHashMap::new(),
            queue: BinaryHeap::new(),
        }
    }

    /// Window length in milliseconds
    #[must_use]
    pub const fn window_ms(&self) -> u64 {
        self.window_ms
    }

    /// Change the window length; existing entries keep their expiry
    pub fn set_window_seconds(&mut self, window_seconds: u64) {
        self.window_ms = window_seconds.saturating_mul(1000);
    }

    /// Check and record in one step
    ///
    /// Blank text is always rejected. An admitted text is suppressed until
    /// the window has elapsed.
    pub fn admit(&mut self, text: &str, now_ms: u64) -> bool {
        if !self.is_admissible(text, now_ms) {
            return false;
        }
        self.record(text, now_ms);
        true
    }

    /// Whether `text` may be shown at `now_ms`, without recording it
    pub fn is_admissible(&mut self, text: &str, now_ms: u64) -> bool {
        self.sweep(now_ms);
        !text.trim().is_empty() && !self.expires_at.contains_key(text)
    }

    /// Start (or restart) the window for `text`
    pub fn record(&mut self, text: &str, now_ms: u64) {
        let expiry = now_ms.saturating_add(self.window_ms);
        self.expires_at.insert(text.to_owned(), expiry);
        self.queue.push(Reverse((expiry, text.to_owned())));
    }

    /// Drop every entry whose expiry is at or before `now_ms`
    ///
    /// Returns how many texts left the window.
    pub fn sweep(&mut self, now_ms: u64) -> usize {
        let mut expired = 0;
        while let Some(Reverse((expiry, _))) = self.queue.peek() {
            if *expiry > now_ms {
                break;
            }
            let Some(Reverse((expiry, text))) = self.queue.pop() else {
                break;
            };
            // A re-recorded text has a newer expiry; the old heap entry is stale.
            if self.expires_at.get(&text) == Some(&expiry) {
                self.expires_at.remove(&text);
                expired += 1;
            }
        }
        expired
    }

    /// Whether `text` is currently suppressed (no sweep)
    #[must_use]
    pub fn contains(&self, text: &str) -> bool {
        self.expires_at.contains_key(text)
    }

    /// Number of suppressed texts (including not yet swept ones)
    #[must_use]
    pub fn len(&self) -> usize {
        self.expires_at.len()
    }

    /// Whether nothing is suppressed
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.expires_at.is_empty()
    }

    /// Forget every entry
    pub fn clear(&mut self) {
        self.expires_at.clear();
        self.queue.clear();
    }
}
