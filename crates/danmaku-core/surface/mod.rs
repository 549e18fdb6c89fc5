//! Render surface contract
//!
//! The scheduler never touches a concrete view object. Hosts implement
//! [`RenderSurface`] on top of whatever draws the overlay (a UI toolkit,
//! a GPU compositor, a terminal) and receive one [`OverlaySpawn`] per
//! comment plus move/retire instructions keyed by [`EntityId`].

mod recording;

use thiserror::Error;

use crate::lifecycle::{EntityHandle, EntityId};
use crate::model::{Mode, Rgb};

pub use recording::{RecordingSurface, SurfaceEvent};

/// Size of the overlay area in logical pixels
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SurfaceSize {
    /// Width
    pub width: f32,
    /// Height
    pub height: f32,
}

impl SurfaceSize {
    /// Create a surface size
    #[must_use]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Instruction to create and animate one overlay element
///
/// `duration_ms` is authoritative. Position and style fields are hints a
/// host may ignore when it animates elements itself.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlaySpawn {
    /// Handle to report back on completion
    pub handle: EntityHandle,
    /// Comment text
    pub text: String,
    /// Text color
    pub color: Rgb,
    /// Presentation mode
    pub mode: Mode,
    /// Lane index
    pub lane: usize,
    /// Time on screen
    pub duration_ms: u64,
    /// Suggested font size
    pub font_size: f32,
    /// Suggested opacity in `0.0..=1.0`
    pub opacity: f32,
    /// Draw a highlight border (usually the viewer's own comment)
    pub has_border: bool,
    /// Initial left edge; for fixed modes, the horizontal centre
    pub x: f32,
    /// Top of the lane
    pub y: f32,
}

impl OverlaySpawn {
    /// Id of the entity being spawned
    #[must_use]
    pub const fn id(&self) -> EntityId {
        self.handle.id
    }
}

/// What the surface reports back about a created element
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayMetrics {
    /// Measured width in logical pixels
    pub width: f32,
}

/// Render surface failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SurfaceError {
    /// The surface was torn down or never attached
    #[error("surface is detached")]
    Detached,
    /// The surface could not create the element
    #[error("overlay rejected: {0}")]
    Rejected(String),
}

/// Host-side drawing target for overlay entities
pub trait RenderSurface {
    /// Current size, or `None` when nothing is attached
    fn size(&self) -> Option<SurfaceSize>;

    /// Create an element and report its measured width
    ///
    /// # Errors
    ///
    /// Returns [`SurfaceError`] when the element cannot be created; the
    /// comment is then dropped.
    fn spawn_overlay(&mut self, spawn: &OverlaySpawn) -> Result<OverlayMetrics, SurfaceError>;

    /// Move a scrolling element to a new left edge
    fn move_overlay(&mut self, id: EntityId, x: f32) {
        let _ = (id, x);
    }

    /// Remove an element
    fn retire_overlay(&mut self, id: EntityId);
}

impl<S: RenderSurface + ?Sized> RenderSurface for &mut S {
    fn size(&self) -> Option<SurfaceSize> {
        (**self).size()
    }

    fn spawn_overlay(&mut self, spawn: &OverlaySpawn) -> Result<OverlayMetrics, SurfaceError> {
        (**self).spawn_overlay(spawn)
    }

    fn move_overlay(&mut self, id: EntityId, x: f32) {
        (**self).move_overlay(id, x);
    }

    fn retire_overlay(&mut self, id: EntityId) {
        (**self).retire_overlay(id);
    }
}

impl<S: RenderSurface + ?Sized> RenderSurface for Box<S> {
    fn size(&self) -> Option<SurfaceSize> {
        (**self).size()
    }

    fn spawn_overlay(&mut self, spawn: &OverlaySpawn) -> Result<OverlayMetrics, SurfaceError> {
        (**self).spawn_overlay(spawn)
    }

    fn move_overlay(&mut self, id: EntityId, x: f32) {
        (**self).move_overlay(id, x);
    }

    fn retire_overlay(&mut self, id: EntityId) {
        (**self).retire_overlay(id);
    }
}
