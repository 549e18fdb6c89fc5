//! Utility types shared across the scheduler

mod errors;

pub use errors::{DanmakuError, ErrorCategory, Result};
