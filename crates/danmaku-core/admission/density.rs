//! One-second spawn budget
//!
//! A fixed bucket per clock second rather than a sliding window. Any change
//! of bucket, forwards or backwards, resets the count; nothing else does.

/// Caps spawns within one clock second
#[derive(Debug, Clone)]
pub struct DensityLimiter {
    max_per_second: u32,
    current_bucket: Option<u64>,
    count: u32,
}

impl DensityLimiter {
    /// Create a limiter admitting `max_per_second` spawns per second
    #[must_use]
    pub const fn new(max_per_second: u32) -> Self {
        Self {
            max_per_second,
            current_bucket: None,
            count: 0,
        }
    }

    /// Configured budget
    #[must_use]
    pub const fn max_per_second(&self) -> u32 {
        self.max_per_second
    }

    /// Change the budget; takes effect immediately
    pub fn set_max_per_second(&mut self, max_per_second: u32) {
        self.max_per_second = max_per_second;
    }

    /// Take one slot from the current second's budget
    pub fn try_acquire(&mut self, now_ms: u64) -> bool {
        self.roll(now_ms);
        if self.count >= self.max_per_second {
            return false;
        }
        self.count += 1;
        true
    }

    /// Slots left in the second containing `now_ms`
    pub fn remaining(&mut self, now_ms: u64) -> u32 {
        self.roll(now_ms);
        self.max_per_second.saturating_sub(self.count)
    }

    fn roll(&mut self, now_ms: u64) {
        let bucket = now_ms / 1000;
        if self.current_bucket != Some(bucket) {
            self.current_bucket = Some(bucket);
            self.count = 0;
        }
    }
}
