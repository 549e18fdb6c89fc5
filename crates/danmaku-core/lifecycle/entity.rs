//! Spawned overlay entities and the handles that name them

use core::fmt;

use super::timing::{ScrollPath, Traversal};
use crate::model::{Mode, Rgb};
use crate::tracks::{EntityGeometry, LaneTicket};

/// Identifier of a spawned overlay, unique for the scheduler's lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EntityId(u64);

impl EntityId {
    /// Wrap a raw id
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw id
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What a host holds on to for a spawned overlay
///
/// Carries the lane generation the entity was spawned under. A completion
/// reported with a handle whose generation no longer matches the lane
/// retires the entity but leaves the lane alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EntityHandle {
    /// Entity id
    pub id: EntityId,
    /// Lane index
    pub lane: usize,
    /// Lane generation at spawn time
    pub generation: u64,
}

impl EntityHandle {
    /// Lane ticket carried by this handle
    #[must_use]
    pub const fn ticket(self) -> LaneTicket {
        LaneTicket {
            lane: self.lane,
            generation: self.generation,
        }
    }
}

/// A live, animating instance of a comment
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayEntity {
    handle: EntityHandle,
    text: String,
    color: Rgb,
    mode: Mode,
    traversal: Traversal,
    width: f32,
    y: f32,
    path: Option<ScrollPath>,
    current_offset: f32,
}

impl OverlayEntity {
    /// Create an entity at the start of its traversal
    ///
    /// `path` is `None` for fixed-position modes; `x` is then the held
    /// horizontal position.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        handle: EntityHandle,
        text: String,
        color: Rgb,
        mode: Mode,
        traversal: Traversal,
        width: f32,
        x: f32,
        y: f32,
    ) -> Self {
        let path = (!mode.is_fixed()).then(|| ScrollPath::new(x, width));
        Self {
            handle,
            text,
            color,
            mode,
            traversal,
            width,
            y,
            path,
            current_offset: x,
        }
    }

    /// Handle naming this entity
    #[must_use]
    pub const fn handle(&self) -> EntityHandle {
        self.handle
    }

    /// Entity id
    #[must_use]
    pub const fn id(&self) -> EntityId {
        self.handle.id
    }

    /// Lane index
    #[must_use]
    pub const fn lane(&self) -> usize {
        self.handle.lane
    }

    /// Comment text
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Text color
    #[must_use]
    pub const fn color(&self) -> Rgb {
        self.color
    }

    /// Presentation mode
    #[must_use]
    pub const fn mode(&self) -> Mode {
        self.mode
    }

    /// On-screen duration
    #[must_use]
    pub const fn traversal_duration_ms(&self) -> u64 {
        self.traversal.duration_ms
    }

    /// Clock time of spawn (shifted by pauses)
    #[must_use]
    pub const fn spawn_time_ms(&self) -> u64 {
        self.traversal.start_ms
    }

    /// Measured width reported by the surface
    #[must_use]
    pub const fn width(&self) -> f32 {
        self.width
    }

    /// Vertical position of the entity's lane
    #[must_use]
    pub const fn y(&self) -> f32 {
        self.y
    }

    /// Left edge as of the last update
    #[must_use]
    pub const fn current_offset(&self) -> f32 {
        self.current_offset
    }

    /// Right edge for scrolling entities
    #[must_use]
    pub fn right_edge(&self) -> Option<f32> {
        self.path.map(|_| self.current_offset + self.width)
    }

    /// Collision geometry as seen by the track allocator
    #[must_use]
    pub fn geometry(&self) -> EntityGeometry {
        match self.right_edge() {
            Some(right_edge) => EntityGeometry::Scrolling { right_edge },
            None => EntityGeometry::Fixed,
        }
    }

    /// Whether the traversal has run its full duration
    #[must_use]
    pub const fn is_complete(&self, now_ms: u64) -> bool {
        self.traversal.is_complete(now_ms)
    }

    /// Recompute the offset for `now_ms`
    ///
    /// Returns the new offset if the entity moved.
    pub(crate) fn update_offset(&mut self, now_ms: u64) -> Option<f32> {
        let path = self.path?;
        let offset = path.offset_at(self.traversal.progress(now_ms));
        if (offset - self.current_offset).abs() < f32::EPSILON {
            return None;
        }
        self.current_offset = offset;
        Some(offset)
    }

    pub(crate) fn shift(&mut self, delta_ms: u64) {
        self.traversal.shift(delta_ms);
    }
}
