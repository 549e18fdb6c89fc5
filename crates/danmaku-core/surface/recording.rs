//! In-memory surface that records every instruction
//!
//! Used by tests, benches and the replay tool. Text width is estimated as
//! one font-size per character, which is close enough for CJK text and
//! generous for Latin text.

use ahash::AHashSet;

use super::{OverlayMetrics, OverlaySpawn, RenderSurface, SurfaceError, SurfaceSize};
use crate::lifecycle::EntityId;

/// One recorded surface instruction
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceEvent {
    /// An overlay was created
    Spawned(OverlaySpawn),
    /// A scrolling overlay moved
    Moved {
        /// Entity id
        id: EntityId,
        /// New left edge
        x: f32,
    },
    /// An overlay was removed
    Retired(EntityId),
}

/// Recording render surface
#[derive(Debug, Clone)]
pub struct RecordingSurface {
    size: SurfaceSize,
    attached: bool,
    fail_next: usize,
    record_moves: bool,
    live: AHashSet<EntityId>,
    events: Vec<SurfaceEvent>,
}

impl RecordingSurface {
    /// Attached surface of the given size; moves are not recorded
    #[must_use]
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            size: SurfaceSize::new(width, height),
            attached: true,
            fail_next: 0,
            record_moves: false,
            live: AHashSet::new(),
            events: Vec::new(),
        }
    }

    /// Also record [`SurfaceEvent::Moved`]
    #[must_use]
    pub fn with_moves(mut self) -> Self {
        self.record_moves = true;
        self
    }

    /// Simulate the overlay view being torn down
    pub fn detach(&mut self) {
        self.attached = false;
    }

    /// Reattach after [`RecordingSurface::detach`]
    pub fn attach(&mut self) {
        self.attached = true;
    }

    /// Reject the next `count` spawn requests
    pub fn fail_next_spawns(&mut self, count: usize) {
        self.fail_next = count;
    }

    /// Every recorded event in order
    #[must_use]
    pub fn events(&self) -> &[SurfaceEvent] {
        &self.events
    }

    /// Drain the recorded events
    pub fn take_events(&mut self) -> Vec<SurfaceEvent> {
        std::mem::take(&mut self.events)
    }

    /// Spawn instructions recorded so far
    pub fn spawned(&self) -> impl Iterator<Item = &OverlaySpawn> {
        self.events.iter().filter_map(|event| match event {
            SurfaceEvent::Spawned(spawn) => Some(spawn),
            _ => None,
        })
    }

    /// Ids retired so far
    pub fn retired(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.events.iter().filter_map(|event| match event {
            SurfaceEvent::Retired(id) => Some(*id),
            _ => None,
        })
    }

    /// Number of elements currently on the surface
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Whether `id` is currently on the surface
    #[must_use]
    pub fn is_live(&self, id: EntityId) -> bool {
        self.live.contains(&id)
    }
}

impl RenderSurface for RecordingSurface {
    fn size(&self) -> Option<SurfaceSize> {
        self.attached.then_some(self.size)
    }

    fn spawn_overlay(&mut self, spawn: &OverlaySpawn) -> Result<OverlayMetrics, SurfaceError> {
        if !self.attached {
            return Err(SurfaceError::Detached);
        }
        if self.fail_next > 0 {
            self.fail_next -= 1;
            return Err(SurfaceError::Rejected("injected failure".to_string()));
        }
        self.live.insert(spawn.id());
        self.events.push(SurfaceEvent::Spawned(spawn.clone()));
        Ok(OverlayMetrics {
            width: spawn.text.chars().count() as f32 * spawn.font_size,
        })
    }

    fn move_overlay(&mut self, id: EntityId, x: f32) {
        if self.record_moves {
            self.events.push(SurfaceEvent::Moved { id, x });
        }
    }

    fn retire_overlay(&mut self, id: EntityId) {
        if self.live.remove(&id) {
            self.events.push(SurfaceEvent::Retired(id));
        }
    }
}
