//! Scheduler statistics snapshot

use core::fmt;

use crate::admission::DropCounters;

/// Point-in-time counters for monitoring and tests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SchedulerStats {
    /// Comments in the store
    pub loaded_comments: usize,
    /// Entities currently on screen
    pub active_entities: usize,
    /// Lanes currently occupied
    pub occupied_lanes: usize,
    /// Entities spawned since the scheduler was created
    pub spawned: u64,
    /// Spawns that took over a busy lane
    pub forced_assignments: u64,
    /// Lanes force-released after the occupancy timeout
    pub timeout_reclaims: u64,
    /// Completions for entities that were no longer live
    pub stale_completions: u64,
    /// Retirements that left the lane alone because a newer entity or the
    /// timeout sweep had taken it over
    pub displaced_retirements: u64,
    /// Comments that never reached the screen
    pub dropped: DropCounters,
}

impl fmt::Display for SchedulerStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Scheduler Statistics:")?;
        writeln!(f, "  Loaded comments: {}", self.loaded_comments)?;
        writeln!(f, "  Active entities: {}", self.active_entities)?;
        writeln!(f, "  Occupied lanes: {}", self.occupied_lanes)?;
        writeln!(f, "  Spawned: {}", self.spawned)?;
        writeln!(f, "  Forced assignments: {}", self.forced_assignments)?;
        writeln!(f, "  Timeout reclaims: {}", self.timeout_reclaims)?;
        writeln!(f, "  Stale completions: {}", self.stale_completions)?;
        writeln!(f, "  Displaced retirements: {}", self.displaced_retirements)?;
        writeln!(f, "  Dropped: {}", self.dropped.total())?;
        writeln!(f, "    disabled: {}", self.dropped.disabled)?;
        writeln!(f, "    empty text: {}", self.dropped.empty_text)?;
        writeln!(f, "    duplicate: {}", self.dropped.duplicate)?;
        writeln!(f, "    density cap: {}", self.dropped.density_cap)?;
        writeln!(f, "    no surface: {}", self.dropped.no_surface)?;
        writeln!(f, "    spawn failed: {}", self.dropped.spawn_failed)?;
        write!(f, "    no lane: {}", self.dropped.no_lane)
    }
}
