//! Scheduler configuration
//!
//! All tunables live in one plain struct. Missing fields fall back to the
//! defaults below when deserialized, so a config file only needs the keys
//! it changes.

use crate::tracks::LaneLayout;
use crate::utils::{DanmakuError, Result};

/// Default number of lanes
pub const DEFAULT_TRACK_COUNT: usize = 3;
/// Default traversal duration for short texts
pub const DEFAULT_BASE_DURATION_MS: u64 = 8_000;
/// Default spawn cap per clock second
pub const DEFAULT_MAX_PER_SECOND: u32 = 20;
/// Default dedup window
pub const DEFAULT_DEDUP_WINDOW_SECONDS: u64 = 30;
/// Default gap between a lane's last entity and a new arrival
pub const DEFAULT_MIN_SPACING_PX: f32 = 200.0;
/// Default lane occupancy timeout
pub const DEFAULT_CHANNEL_TIMEOUT_MS: u64 = 10_000;

/// Tunable scheduler parameters
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct SchedulerConfig {
    /// Number of horizontal lanes
    pub track_count: usize,
    /// Traversal duration for texts of up to ten characters
    pub base_duration_ms: u64,
    /// Spawn cap per clock second
    pub max_per_second: u32,
    /// How long a shown text suppresses repeats
    pub dedup_window_seconds: u64,
    /// Required clearance before a lane is shared
    pub min_spacing_px: f32,
    /// Lane occupancy timeout
    pub channel_timeout_ms: u64,
    /// Distance left of the right edge where scroll entities enter
    pub spawn_inset_px: f32,
    /// Font size hint for scroll comments
    pub base_font_size: f32,
    /// Added to the font size for top and bottom comments
    pub fixed_font_size_delta: f32,
    /// Opacity hint
    pub opacity: f32,
    /// Height of one lane
    pub line_height_px: f32,
    /// Gap above the first lane
    pub lane_margin_px: f32,
    /// Forward position jumps larger than this are treated as seeks
    pub seek_jump_threshold_ms: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            track_count: DEFAULT_TRACK_COUNT,
            base_duration_ms: DEFAULT_BASE_DURATION_MS,
            max_per_second: DEFAULT_MAX_PER_SECOND,
            dedup_window_seconds: DEFAULT_DEDUP_WINDOW_SECONDS,
            min_spacing_px: DEFAULT_MIN_SPACING_PX,
            channel_timeout_ms: DEFAULT_CHANNEL_TIMEOUT_MS,
            spawn_inset_px: 0.0,
            base_font_size: 18.0,
            fixed_font_size_delta: 2.0,
            opacity: 0.85,
            line_height_px: 28.0,
            lane_margin_px: 4.0,
            seek_jump_threshold_ms: 3_000,
        }
    }
}

impl SchedulerConfig {
    /// Set the number of lanes
    #[must_use]
    pub fn with_track_count(mut self, track_count: usize) -> Self {
        self.track_count = track_count;
        self
    }

    /// Set the base traversal duration
    #[must_use]
    pub fn with_base_duration_ms(mut self, base_duration_ms: u64) -> Self {
        self.base_duration_ms = base_duration_ms;
        self
    }

    /// Set the spawn cap per second
    #[must_use]
    pub fn with_max_per_second(mut self, max_per_second: u32) -> Self {
        self.max_per_second = max_per_second;
        self
    }

    /// Set the dedup window
    #[must_use]
    pub fn with_dedup_window_seconds(mut self, dedup_window_seconds: u64) -> Self {
        self.dedup_window_seconds = dedup_window_seconds;
        self
    }

    /// Set the lane sharing clearance
    #[must_use]
    pub fn with_min_spacing_px(mut self, min_spacing_px: f32) -> Self {
        self.min_spacing_px = min_spacing_px;
        self
    }

    /// Set the lane occupancy timeout
    #[must_use]
    pub fn with_channel_timeout_ms(mut self, channel_timeout_ms: u64) -> Self {
        self.channel_timeout_ms = channel_timeout_ms;
        self
    }

    /// Set the scroll entry inset
    #[must_use]
    pub fn with_spawn_inset_px(mut self, spawn_inset_px: f32) -> Self {
        self.spawn_inset_px = spawn_inset_px;
        self
    }

    /// Set the implicit seek threshold
    #[must_use]
    pub fn with_seek_jump_threshold_ms(mut self, seek_jump_threshold_ms: u64) -> Self {
        self.seek_jump_threshold_ms = seek_jump_threshold_ms;
        self
    }

    /// Vertical lane layout
    #[must_use]
    pub fn layout(&self) -> LaneLayout {
        LaneLayout {
            line_height_px: self.line_height_px,
            margin_px: self.lane_margin_px,
        }
    }

    /// Check every option against its accepted range
    ///
    /// # Errors
    ///
    /// Returns [`DanmakuError::InvalidConfig`] naming the first bad field.
    pub fn validate(&self) -> Result<()> {
        if self.track_count == 0 {
            return Err(DanmakuError::invalid_config(
                "track_count",
                "must be at least 1",
            ));
        }
        if self.base_duration_ms == 0 {
            return Err(DanmakuError::invalid_config(
                "base_duration_ms",
                "must be positive",
            ));
        }
        if self.max_per_second == 0 {
            return Err(DanmakuError::invalid_config(
                "max_per_second",
                "must be at least 1",
            ));
        }
        if self.channel_timeout_ms == 0 {
            return Err(DanmakuError::invalid_config(
                "channel_timeout_ms",
                "must be positive",
            ));
        }
        if self.min_spacing_px.is_nan() || self.min_spacing_px < 0.0 {
            return Err(DanmakuError::invalid_config(
                "min_spacing_px",
                format!("{} must be zero or positive", self.min_spacing_px),
            ));
        }
        if !(0.0..=1.0).contains(&self.opacity) {
            return Err(DanmakuError::invalid_config(
                "opacity",
                format!("{} is outside 0.0..=1.0", self.opacity),
            ));
        }
        if self.line_height_px.is_nan() || self.line_height_px <= 0.0 {
            return Err(DanmakuError::invalid_config(
                "line_height_px",
                "must be positive",
            ));
        }
        if self.base_font_size.is_nan() || self.base_font_size <= 0.0 {
            return Err(DanmakuError::invalid_config(
                "base_font_size",
                "must be positive",
            ));
        }
        Ok(())
    }
}
