//! Admission gates applied before a comment may claim a lane
//!
//! Every comment pulled from the store passes the [`DedupWindow`] and the
//! [`DensityLimiter`] in that order. A rejected comment is dropped, never
//! queued, and the reason is tallied in [`DropCounters`].

mod dedup;
mod density;

use core::fmt;

pub use dedup::DedupWindow;
pub use density::DensityLimiter;

/// Why a comment did not reach the screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DropReason {
    /// Overlay switched off
    Disabled,
    /// Blank text
    EmptyText,
    /// Same text shown within the dedup window
    Duplicate,
    /// Per-second budget exhausted
    DensityCap,
    /// No render surface attached
    NoSurface,
    /// Render surface refused the overlay
    SpawnFailed,
    /// No lane could be assigned
    NoLane,
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Disabled => "disabled",
            Self::EmptyText => "empty text",
            Self::Duplicate => "duplicate",
            Self::DensityCap => "density cap",
            Self::NoSurface => "no surface",
            Self::SpawnFailed => "spawn failed",
            Self::NoLane => "no lane",
        };
        f.write_str(name)
    }
}

/// Per-reason drop tallies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DropCounters {
    /// See [`DropReason::Disabled`]
    pub disabled: u64,
    /// See [`DropReason::EmptyText`]
    pub empty_text: u64,
    /// See [`DropReason::Duplicate`]
    pub duplicate: u64,
    /// See [`DropReason::DensityCap`]
    pub density_cap: u64,
    /// See [`DropReason::NoSurface`]
    pub no_surface: u64,
    /// See [`DropReason::SpawnFailed`]
    pub spawn_failed: u64,
    /// See [`DropReason::NoLane`]
    pub no_lane: u64,
}

impl DropCounters {
    /// Count one drop
    pub fn record(&mut self, reason: DropReason) {
        let slot = match reason {
            DropReason::Disabled => &mut self.disabled,
            DropReason::EmptyText => &mut self.empty_text,
            DropReason::Duplicate => &mut self.duplicate,
            DropReason::DensityCap => &mut self.density_cap,
            DropReason::NoSurface => &mut self.no_surface,
            DropReason::SpawnFailed => &mut self.spawn_failed,
            DropReason::NoLane => &mut self.no_lane,
        };
        *slot += 1;
    }

    /// Drops for one reason
    #[must_use]
    pub const fn get(&self, reason: DropReason) -> u64 {
        match reason {
            DropReason::Disabled => self.disabled,
            DropReason::EmptyText => self.empty_text,
            DropReason::Duplicate => self.duplicate,
            DropReason::DensityCap => self.density_cap,
            DropReason::NoSurface => self.no_surface,
            DropReason::SpawnFailed => self.spawn_failed,
            DropReason::NoLane => self.no_lane,
        }
    }

    /// Drops across all reasons
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.disabled
            + self.empty_text
            + self.duplicate
            + self.density_cap
            + self.no_surface
            + self.spawn_failed
            + self.no_lane
    }
}
