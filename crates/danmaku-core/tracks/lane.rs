//! Lane state

use crate::lifecycle::EntityId;

/// Proof of a lane assignment, checked on release
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LaneTicket {
    /// Lane index
    pub lane: usize,
    /// Generation the lane had after the assignment
    pub generation: u64,
}

/// One horizontal display row
///
/// Holds a weak reference to its most recent entity: the id is looked up
/// in the entity registry and never owns the entity. Every occupy and
/// every release bumps the generation, so a ticket from before either is
/// recognisably stale.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Lane {
    occupied: bool,
    occupied_at_ms: u64,
    last_entity: Option<EntityId>,
    generation: u64,
}

impl Lane {
    /// Whether an entity currently holds the lane
    #[must_use]
    pub const fn is_occupied(&self) -> bool {
        self.occupied
    }

    /// Clock time of the latest assignment
    #[must_use]
    pub const fn occupied_at_ms(&self) -> u64 {
        self.occupied_at_ms
    }

    /// Most recently assigned entity
    #[must_use]
    pub const fn last_entity(&self) -> Option<EntityId> {
        self.last_entity
    }

    /// Current generation
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Time the lane has been held at `now_ms`
    #[must_use]
    pub const fn age_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.occupied_at_ms)
    }

    /// Released lane whose generation continues from `generation`
    pub(crate) const fn starting_at(generation: u64) -> Self {
        Self {
            occupied: false,
            occupied_at_ms: 0,
            last_entity: None,
            generation,
        }
    }

    /// Generation the next assignment will carry
    #[must_use]
    pub const fn next_generation(&self) -> u64 {
        self.generation + 1
    }

    pub(crate) fn occupy(&mut self, entity: EntityId, now_ms: u64) -> u64 {
        self.generation += 1;
        self.occupied = true;
        self.occupied_at_ms = now_ms;
        self.last_entity = Some(entity);
        self.generation
    }

    pub(crate) fn release(&mut self) {
        self.generation += 1;
        self.occupied = false;
        self.occupied_at_ms = 0;
        self.last_entity = None;
    }

    pub(crate) fn shift(&mut self, delta_ms: u64) {
        if self.occupied {
            self.occupied_at_ms = self.occupied_at_ms.saturating_add(delta_ms);
        }
    }
}
