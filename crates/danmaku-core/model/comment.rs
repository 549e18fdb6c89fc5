//! Comment records handed to the scheduler by the loader

use core::fmt;

use super::Rgb;
use crate::utils::{DanmakuError, Result};

/// How a comment is presented
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Mode {
    /// Travels right to left across its lane
    #[default]
    Scroll,
    /// Held in place near the top of the surface
    Top,
    /// Held in place near the bottom of the surface
    Bottom,
}

impl Mode {
    /// Map the server's integer mode; unknown values scroll
    #[must_use]
    pub const fn from_wire(value: i64) -> Self {
        match value {
            1 => Self::Top,
            2 => Self::Bottom,
            _ => Self::Scroll,
        }
    }

    /// Integer mode as sent by the server
    #[must_use]
    pub const fn to_wire(self) -> i64 {
        match self {
            Self::Scroll => 0,
            Self::Top => 1,
            Self::Bottom => 2,
        }
    }

    /// Whether the comment is held in place instead of scrolling
    #[must_use]
    pub const fn is_fixed(self) -> bool {
        matches!(self, Self::Top | Self::Bottom)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Scroll => "scroll",
            Self::Top => "top",
            Self::Bottom => "bottom",
        };
        f.write_str(name)
    }
}

/// One time-stamped comment for the current media item
///
/// Read-only for the scheduler; replaced wholesale when a new media item
/// is loaded.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CommentRecord {
    /// Comment text
    pub text: String,
    /// Playback-relative appearance time in seconds
    pub appear_second: f64,
    /// Text color
    pub color: Rgb,
    /// Presentation mode
    pub mode: Mode,
    /// Whether the host should draw a border around the text
    pub has_border: bool,
}

impl CommentRecord {
    /// Create a white scrolling comment
    pub fn new(text: impl Into<String>, appear_second: f64) -> Self {
        Self {
            text: text.into(),
            appear_second,
            color: Rgb::WHITE,
            mode: Mode::Scroll,
            has_border: false,
        }
    }

    /// Set the color
    #[must_use]
    pub fn with_color(mut self, color: Rgb) -> Self {
        self.color = color;
        self
    }

    /// Set the mode
    #[must_use]
    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the border flag
    #[must_use]
    pub fn with_border(mut self, has_border: bool) -> Self {
        self.has_border = has_border;
        self
    }

    /// Appearance time truncated to a whole second
    #[must_use]
    pub fn whole_second(&self) -> u64 {
        if self.appear_second.is_finite() && self.appear_second > 0.0 {
            self.appear_second.trunc() as u64
        } else {
            0
        }
    }

    /// Text length in characters
    #[must_use]
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// Check the record can be scheduled
    ///
    /// # Errors
    ///
    /// Returns [`DanmakuError::InvalidRecord`] for blank text or a negative
    /// or non-finite appearance time.
    pub fn validate(&self) -> Result<()> {
        if self.text.trim().is_empty() {
            return Err(DanmakuError::InvalidRecord("empty text".to_string()));
        }
        if !self.appear_second.is_finite() || self.appear_second < 0.0 {
            return Err(DanmakuError::InvalidRecord(format!(
                "appearance time {} for {:?}",
                self.appear_second, self.text
            )));
        }
        Ok(())
    }
}
