//! Error types for the danmaku scheduler
//!
//! Provides the main `DanmakuError` enum returned by configuration and
//! decoding entry points. Playback-path operations never return these:
//! a comment that cannot be shown is logged and dropped instead.
//!
//! # Error Philosophy
//!
//! - Use `thiserror` for structured error handling (no `anyhow` in the library)
//! - Keep every failure local to the comment that caused it
//! - Categorize errors so hosts can route them to the right handler
//!
//! # Examples
//!
//! ```rust
//! use danmaku_core::utils::{DanmakuError, ErrorCategory};
//!
//! let err = DanmakuError::invalid_config("track_count", "must be at least 1");
//! assert_eq!(err.category(), ErrorCategory::Config);
//! assert!(!err.is_recoverable());
//! ```

use core::fmt;

use thiserror::Error;

use crate::surface::SurfaceError;

/// Main error type for danmaku scheduler operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DanmakuError {
    /// A configuration value is out of its accepted range
    #[error("Invalid configuration for `{field}`: {reason}")]
    InvalidConfig {
        /// Name of the offending option
        field: &'static str,
        /// Why the value was rejected
        reason: String,
    },

    /// No render surface is attached
    #[error("No render surface available")]
    SurfaceUnavailable,

    /// The render surface refused an overlay
    #[error("Render surface error: {0}")]
    Surface(String),

    /// Comment payload could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),

    /// A single comment record failed validation
    #[error("Invalid comment record: {0}")]
    InvalidRecord(String),

    /// Internal consistency error (should not happen)
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error category for filtering and routing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Rejected configuration
    Config,
    /// Render surface missing or failing
    Surface,
    /// Malformed input data
    Input,
    /// Scheduler bug
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Config => "config",
            Self::Surface => "surface",
            Self::Input => "input",
            Self::Internal => "internal",
        };
        f.write_str(name)
    }
}

impl DanmakuError {
    /// Create a configuration error for `field`
    pub fn invalid_config<T: fmt::Display>(field: &'static str, reason: T) -> Self {
        Self::InvalidConfig {
            field,
            reason: reason.to_string(),
        }
    }

    /// Create a decode error from any displayable cause
    pub fn decode<T: fmt::Display>(cause: T) -> Self {
        Self::Decode(cause.to_string())
    }

    /// Create an internal error (indicates a bug)
    pub fn internal<T: fmt::Display>(message: T) -> Self {
        Self::Internal(message.to_string())
    }

    /// Get the category of this error
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidConfig { .. } => ErrorCategory::Config,
            Self::SurfaceUnavailable | Self::Surface(_) => ErrorCategory::Surface,
            Self::Decode(_) | Self::InvalidRecord(_) => ErrorCategory::Input,
            Self::Internal(_) => ErrorCategory::Internal,
        }
    }

    /// Check if the caller can carry on after this error
    ///
    /// Surface and input errors only cost the affected comment; a rejected
    /// configuration or an internal error needs the host's attention.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::SurfaceUnavailable | Self::Surface(_) | Self::Decode(_) | Self::InvalidRecord(_)
        )
    }
}

impl From<SurfaceError> for DanmakuError {
    fn from(err: SurfaceError) -> Self {
        match err {
            SurfaceError::Detached => Self::SurfaceUnavailable,
            SurfaceError::Rejected(reason) => Self::Surface(reason),
        }
    }
}

#[cfg(feature = "serde")]
impl From<serde_json::Error> for DanmakuError {
    fn from(err: serde_json::Error) -> Self {
        Self::decode(err)
    }
}

/// Result type for scheduler operations
pub type Result<T> = core::result::Result<T, DanmakuError>;
