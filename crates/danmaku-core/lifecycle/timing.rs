//! Traversal timing for overlay entities

/// Texts up to this many characters travel at the base duration
pub const SHORT_TEXT_MAX_CHARS: usize = 10;

/// Texts up to this many characters use [`MEDIUM_TEXT_FACTOR`]
pub const MEDIUM_TEXT_MAX_CHARS: usize = 20;

/// Duration multiplier for medium texts
pub const MEDIUM_TEXT_FACTOR: f64 = 1.3;

/// Duration multiplier for long texts
pub const LONG_TEXT_FACTOR: f64 = 1.6;

/// On-screen duration for `text`
///
/// Longer texts travel slower so they stay readable at a constant apparent
/// reading speed. Length is counted in characters.
///
/// ```rust
/// use danmaku_core::lifecycle::traversal_duration_ms;
///
/// assert_eq!(traversal_duration_ms("hello", 8_000), 8_000);
/// assert_eq!(traversal_duration_ms("fifteen chars!!", 8_000), 10_400);
/// assert_eq!(traversal_duration_ms(&"x".repeat(25), 8_000), 12_800);
/// ```
#[must_use]
pub fn traversal_duration_ms(text: &str, base_ms: u64) -> u64 {
    let factor = match text.chars().count() {
        0..=SHORT_TEXT_MAX_CHARS => return base_ms,
        len if len <= MEDIUM_TEXT_MAX_CHARS => MEDIUM_TEXT_FACTOR,
        _ => LONG_TEXT_FACTOR,
    };
    (base_ms as f64 * factor).round() as u64
}

/// Start time and duration of one traversal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Traversal {
    /// Clock time the entity was spawned
    pub start_ms: u64,
    /// Total on-screen time
    pub duration_ms: u64,
}

impl Traversal {
    /// Create a traversal
    #[must_use]
    pub const fn new(start_ms: u64, duration_ms: u64) -> Self {
        Self {
            start_ms,
            duration_ms,
        }
    }

    /// Milliseconds since spawn
    #[must_use]
    pub const fn elapsed(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.start_ms)
    }

    /// Linear progress in `0.0..=1.0`
    #[must_use]
    pub fn progress(&self, now_ms: u64) -> f32 {
        if self.duration_ms == 0 {
            return 1.0;
        }
        (self.elapsed(now_ms) as f64 / self.duration_ms as f64).clamp(0.0, 1.0) as f32
    }

    /// Whether the full duration has elapsed
    #[must_use]
    pub const fn is_complete(&self, now_ms: u64) -> bool {
        self.elapsed(now_ms) >= self.duration_ms
    }

    /// Move the start forward, e.g. after a pause
    pub fn shift(&mut self, delta_ms: u64) {
        self.start_ms = self.start_ms.saturating_add(delta_ms);
    }
}

/// Horizontal path of a scrolling entity
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollPath {
    /// Left edge at spawn
    pub start_x: f32,
    /// Left edge at completion, fully past the left side of the surface
    pub end_x: f32,
}

impl ScrollPath {
    /// Path for an entity `width` wide entering at `start_x`
    #[must_use]
    pub fn new(start_x: f32, width: f32) -> Self {
        Self {
            start_x,
            end_x: -width.max(0.0),
        }
    }

    /// Left edge at `progress`
    #[must_use]
    pub fn offset_at(&self, progress: f32) -> f32 {
        let t = progress.clamp(0.0, 1.0);
        self.start_x + (self.end_x - self.start_x) * t
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_scales_with_length() {
        assert_eq!(traversal_duration_ms("", 8_000), 8_000);
        assert_eq!(traversal_duration_ms("0123456789", 8_000), 8_000);
        assert_eq!(traversal_duration_ms("01234567890", 8_000), 10_400);
        assert_eq!(traversal_duration_ms(&"a".repeat(20), 8_000), 10_400);
        assert_eq!(traversal_duration_ms(&"a".repeat(21), 8_000), 12_800);
        assert_eq!(traversal_duration_ms("一二三四五六七八九十", 1_000), 1_000);
    }

    #[test]
    fn progress_is_clamped() {
        let traversal = Traversal::new(1_000, 4_000);
        assert!((traversal.progress(0) - 0.0).abs() < f32::EPSILON);
        assert!((traversal.progress(3_000) - 0.5).abs() < f32::EPSILON);
        assert!((traversal.progress(9_000) - 1.0).abs() < f32::EPSILON);
        assert!(!traversal.is_complete(4_999));
        assert!(traversal.is_complete(5_000));
    }

    #[test]
    fn shift_delays_completion() {
        let mut traversal = Traversal::new(0, 1_000);
        traversal.shift(500);
        assert!(!traversal.is_complete(1_000));
        assert!(traversal.is_complete(1_500));
    }

    #[test]
    fn scroll_path_ends_off_screen() {
        let path = ScrollPath::new(1_920.0, 120.0);
        assert!((path.offset_at(0.0) - 1_920.0).abs() < f32::EPSILON);
        assert!((path.offset_at(1.0) + 120.0).abs() < f32::EPSILON);
        assert!((path.offset_at(0.5) - 900.0).abs() < f32::EPSILON);
    }
}
