//! Collision geometry and vertical lane layout

use crate::lifecycle::EntityId;

/// What the allocator can see of a lane's last entity
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EntityGeometry {
    /// The entity no longer exists
    Gone,
    /// Top or bottom comment held in place for its duration
    Fixed,
    /// Scrolling comment with its current trailing edge
    Scrolling {
        /// Current right edge in surface pixels
        right_edge: f32,
    },
}

impl EntityGeometry {
    /// Whether a new scrolling entity entering at `spawn_x` can share the lane
    ///
    /// The trailing edge must have cleared the entry point by `min_spacing`,
    /// or the entity must have left the surface entirely. Fixed entities
    /// block their lane until they retire.
    #[must_use]
    pub fn clears(&self, spawn_x: f32, min_spacing: f32) -> bool {
        match *self {
            Self::Gone => true,
            Self::Fixed => false,
            Self::Scrolling { right_edge } => {
                right_edge < spawn_x - min_spacing || right_edge < 0.0
            }
        }
    }
}

/// Read-only view of entity geometry for the allocator
pub trait GeometrySource {
    /// Geometry of `id`, or [`EntityGeometry::Gone`] if unknown
    fn geometry(&self, id: EntityId) -> EntityGeometry;
}

/// Vertical placement of lanes on the surface
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LaneLayout {
    /// Height of one lane
    pub line_height_px: f32,
    /// Gap above the first lane
    pub margin_px: f32,
}

impl LaneLayout {
    /// Top of `lane`, clamped so the lane stays inside `surface_height`
    #[must_use]
    pub fn lane_top(&self, lane: usize, surface_height: f32) -> f32 {
        let top = self.margin_px + lane as f32 * self.line_height_px;
        let max_top = (surface_height - self.line_height_px).max(0.0);
        top.min(max_top)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scrolling_geometry_needs_spacing() {
        let spawn_x = 1_920.0;
        let near = EntityGeometry::Scrolling { right_edge: 1_800.0 };
        let far = EntityGeometry::Scrolling { right_edge: 1_700.0 };
        let gone_left = EntityGeometry::Scrolling { right_edge: -5.0 };
        assert!(!near.clears(spawn_x, 200.0));
        assert!(far.clears(spawn_x, 200.0));
        assert!(gone_left.clears(spawn_x, 200.0));
    }

    #[test]
    fn fixed_blocks_and_gone_clears() {
        assert!(!EntityGeometry::Fixed.clears(1_920.0, 0.0));
        assert!(EntityGeometry::Gone.clears(1_920.0, 200.0));
    }

    #[test]
    fn lanes_stack_and_clamp() {
        let layout = LaneLayout {
            line_height_px: 28.0,
            margin_px: 4.0,
        };
        assert!((layout.lane_top(0, 1_080.0) - 4.0).abs() < f32::EPSILON);
        assert!((layout.lane_top(2, 1_080.0) - 60.0).abs() < f32::EPSILON);
        assert!((layout.lane_top(5, 100.0) - 72.0).abs() < f32::EPSILON);
        assert!(layout.lane_top(3, 10.0).abs() < f32::EPSILON);
    }
}
