//! Entity lifecycle: spawn, animate, retire
//!
//! [`EntityManager`] is the registry of live overlay entities and the only
//! place their horizontal offset is mutated. Lanes refer to entities by
//! [`EntityId`] only; the allocator reads geometry through
//! [`GeometrySource`] and never touches an entity.
//!
//! Retirement always removes the element from the surface. The lane is
//! released only when the entity's handle still matches the lane's
//! generation, so an entity that lost its lane to a timeout reclaim or a
//! forced assignment cannot free a lane that now belongs to someone else.

mod entity;
mod timing;

use std::collections::BTreeMap;

use log::{debug, trace};
use smallvec::SmallVec;

pub use entity::{EntityHandle, EntityId, OverlayEntity};
pub use timing::{
    traversal_duration_ms, ScrollPath, Traversal, LONG_TEXT_FACTOR, MEDIUM_TEXT_FACTOR,
    MEDIUM_TEXT_MAX_CHARS, SHORT_TEXT_MAX_CHARS,
};

use crate::config::SchedulerConfig;
use crate::model::CommentRecord;
use crate::surface::{OverlaySpawn, RenderSurface};
use crate::tracks::{EntityGeometry, GeometrySource, TrackAllocator};
use crate::utils::{DanmakuError, Result};

/// What happened to the lane when an entity was retired
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RetireOutcome {
    /// The entity still held its lane and released it
    Released,
    /// The lane had been reclaimed or reassigned; it was left alone
    LaneReassigned,
    /// No live entity with that id
    Unknown,
}

/// Registry of live overlay entities
#[derive(Debug, Default)]
pub struct EntityManager {
    entities: BTreeMap<EntityId, OverlayEntity>,
    next_id: u64,
}

impl EntityManager {
    /// Empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live entities
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether nothing is on screen
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Look up a live entity
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&OverlayEntity> {
        self.entities.get(&id)
    }

    /// Live entities in spawn order
    pub fn iter(&self) -> impl Iterator<Item = &OverlayEntity> {
        self.entities.values()
    }

    /// Create an entity for `comment` in `lane` and hand it to the surface
    ///
    /// The lane is only occupied once the surface has accepted the
    /// overlay, so a failed spawn leaves the lane untouched.
    ///
    /// # Errors
    ///
    /// [`DanmakuError::SurfaceUnavailable`] when no surface is attached,
    /// [`DanmakuError::Surface`] when it rejects the overlay, and
    /// [`DanmakuError::Internal`] for an out-of-range lane.
    pub fn spawn<S>(
        &mut self,
        comment: &CommentRecord,
        lane: usize,
        tracks: &mut TrackAllocator,
        surface: &mut S,
        config: &SchedulerConfig,
        now_ms: u64,
    ) -> Result<EntityHandle>
    where
        S: RenderSurface + ?Sized,
    {
        let size = surface.size().ok_or(DanmakuError::SurfaceUnavailable)?;
        let ticket = tracks
            .next_ticket(lane)
            .ok_or_else(|| DanmakuError::internal(format!("lane {lane} out of range")))?;

        let id = EntityId::new(self.next_id);
        self.next_id += 1;
        let handle = EntityHandle {
            id,
            lane,
            generation: ticket.generation,
        };

        let duration_ms = traversal_duration_ms(&comment.text, config.base_duration_ms);
        let (x, font_size) = if comment.mode.is_fixed() {
            (
                size.width / 2.0,
                config.base_font_size + config.fixed_font_size_delta,
            )
        } else {
            (size.width - config.spawn_inset_px, config.base_font_size)
        };
        let y = config.layout().lane_top(lane, size.height);

        let request = OverlaySpawn {
            handle,
            text: comment.text.clone(),
            color: comment.color,
            mode: comment.mode,
            lane,
            duration_ms,
            font_size,
            opacity: config.opacity,
            has_border: comment.has_border,
            x,
            y,
        };
        let metrics = surface.spawn_overlay(&request)?;
        tracks.occupy(lane, id, now_ms);

        debug!(
            "Spawned {id} in lane {lane} ({} {duration_ms}ms): {:?}",
            comment.mode, comment.text
        );
        self.entities.insert(
            id,
            OverlayEntity::new(
                handle,
                request.text,
                comment.color,
                comment.mode,
                Traversal::new(now_ms, duration_ms),
                metrics.width,
                x,
                y,
            ),
        );
        Ok(handle)
    }

    /// Remove the entity named by `handle` and release its lane if it
    /// still owns it
    pub fn retire<S>(
        &mut self,
        handle: EntityHandle,
        tracks: &mut TrackAllocator,
        surface: &mut S,
    ) -> RetireOutcome
    where
        S: RenderSurface + ?Sized,
    {
        let Some(entity) = self.entities.remove(&handle.id) else {
            debug!("Completion for unknown entity {}", handle.id);
            return RetireOutcome::Unknown;
        };
        surface.retire_overlay(entity.id());
        if tracks.release(entity.handle().ticket()) {
            RetireOutcome::Released
        } else {
            debug!(
                "Retired {} without releasing lane {} (reassigned)",
                entity.id(),
                entity.lane()
            );
            RetireOutcome::LaneReassigned
        }
    }

    /// Bring every offset up to `now_ms` and retire finished entities
    ///
    /// Moves are pushed to the surface. Returns each retired handle with
    /// what happened to its lane.
    pub fn advance<S>(
        &mut self,
        now_ms: u64,
        tracks: &mut TrackAllocator,
        surface: &mut S,
    ) -> SmallVec<[(EntityHandle, RetireOutcome); 4]>
    where
        S: RenderSurface + ?Sized,
    {
        let mut finished: SmallVec<[EntityHandle; 4]> = SmallVec::new();
        for entity in self.entities.values_mut() {
            if let Some(x) = entity.update_offset(now_ms) {
                trace!("Moving {} to x={x:.1}", entity.id());
                surface.move_overlay(entity.id(), x);
            }
            if entity.is_complete(now_ms) {
                finished.push(entity.handle());
            }
        }
        finished
            .into_iter()
            .map(|handle| (handle, self.retire(handle, tracks, surface)))
            .collect()
    }

    /// Retire every entity and release every lane
    ///
    /// Safe to call repeatedly. Returns how many entities were removed.
    pub fn cancel_all<S>(&mut self, tracks: &mut TrackAllocator, surface: &mut S) -> usize
    where
        S: RenderSurface + ?Sized,
    {
        let cancelled = self.entities.len();
        for id in self.entities.keys() {
            surface.retire_overlay(*id);
        }
        self.entities.clear();
        tracks.release_all();
        cancelled
    }

    /// Push every spawn time forward, e.g. after a pause
    pub fn shift(&mut self, delta_ms: u64) {
        for entity in self.entities.values_mut() {
            entity.shift(delta_ms);
        }
    }
}

impl GeometrySource for EntityManager {
    fn geometry(&self, id: EntityId) -> EntityGeometry {
        self.entities
            .get(&id)
            .map_or(EntityGeometry::Gone, OverlayEntity::geometry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Mode;
    use crate::surface::{RecordingSurface, SurfaceEvent};

    struct Fixture {
        entities: EntityManager,
        tracks: TrackAllocator,
        surface: RecordingSurface,
        config: SchedulerConfig,
    }

    impl Fixture {
        fn new() -> Self {
            let config = SchedulerConfig::default();
            Self {
                entities: EntityManager::new(),
                tracks: TrackAllocator::new(
                    config.track_count,
                    config.channel_timeout_ms,
                    config.min_spacing_px,
                ),
                surface: RecordingSurface::new(1_000.0, 600.0),
                config,
            }
        }

        fn spawn(&mut self, comment: &CommentRecord, lane: usize, now: u64) -> Result<EntityHandle> {
            self.entities.spawn(
                comment,
                lane,
                &mut self.tracks,
                &mut self.surface,
                &self.config,
                now,
            )
        }
    }

    #[test]
    fn spawn_occupies_lane_and_reports_hints() {
        let mut fx = Fixture::new();
        let handle = fx.spawn(&CommentRecord::new("hello", 1.0), 1, 0).unwrap();

        assert!(fx.tracks.lane(1).unwrap().is_occupied());
        assert_eq!(fx.tracks.lane(1).unwrap().last_entity(), Some(handle.id));
        let spawn = fx.surface.spawned().next().unwrap();
        assert_eq!(spawn.duration_ms, 8_000);
        assert!((spawn.x - 1_000.0).abs() < f32::EPSILON);
        assert!((spawn.y - 32.0).abs() < f32::EPSILON);
        assert!((spawn.font_size - 18.0).abs() < f32::EPSILON);
        assert_eq!(fx.entities.len(), 1);
    }

    #[test]
    fn fixed_modes_are_centered_and_larger() {
        let mut fx = Fixture::new();
        fx.spawn(&CommentRecord::new("top", 1.0).with_mode(Mode::Top), 0, 0)
            .unwrap();
        let spawn = fx.surface.spawned().next().unwrap();
        assert!((spawn.x - 500.0).abs() < f32::EPSILON);
        assert!((spawn.font_size - 20.0).abs() < f32::EPSILON);
    }

    #[test]
    fn failed_spawn_leaves_lane_untouched() {
        let mut fx = Fixture::new();
        let first = fx.spawn(&CommentRecord::new("first", 1.0), 0, 0).unwrap();
        let before = fx.tracks.lane(0).cloned().unwrap();

        fx.surface.fail_next_spawns(1);
        let err = fx.spawn(&CommentRecord::new("second", 1.0), 0, 100);
        assert!(matches!(err, Err(DanmakuError::Surface(_))));
        assert_eq!(fx.tracks.lane(0), Some(&before));
        assert!(fx.tracks.is_current(first.ticket()));

        let next = fx.spawn(&CommentRecord::new("replacement", 1.0), 0, 200).unwrap();
        assert!(next.generation > first.generation);
        assert!(!fx.tracks.is_current(first.ticket()));

        fx.surface.detach();
        assert_eq!(
            fx.spawn(&CommentRecord::new("third", 1.0), 1, 100),
            Err(DanmakuError::SurfaceUnavailable)
        );
        assert!(!fx.tracks.lane(1).unwrap().is_occupied());
    }

    #[test]
    fn natural_completion_releases_lane() {
        let mut fx = Fixture::new();
        let handle = fx.spawn(&CommentRecord::new("bye", 1.0), 0, 0).unwrap();

        assert!(fx
            .entities
            .advance(4_000, &mut fx.tracks, &mut fx.surface)
            .is_empty());
        let finished = fx.entities.advance(8_000, &mut fx.tracks, &mut fx.surface);
        assert_eq!(finished.as_slice(), &[(handle, RetireOutcome::Released)]);
        assert!(!fx.tracks.lane(0).unwrap().is_occupied());
        assert!(fx.entities.is_empty());
        assert_eq!(fx.surface.retired().collect::<Vec<_>>(), vec![handle.id]);
    }

    #[test]
    fn displaced_entity_does_not_release_new_owner() {
        let mut fx = Fixture::new();
        let old = fx.spawn(&CommentRecord::new("old", 1.0), 0, 0).unwrap();
        let new = fx.spawn(&CommentRecord::new("new", 1.0), 0, 10).unwrap();

        let outcome = fx.entities.retire(old, &mut fx.tracks, &mut fx.surface);
        assert_eq!(outcome, RetireOutcome::LaneReassigned);
        assert!(fx.tracks.is_current(new.ticket()));
        assert_eq!(
            fx.entities.retire(old, &mut fx.tracks, &mut fx.surface),
            RetireOutcome::Unknown
        );
    }

    #[test]
    fn cancel_all_twice_leaves_nothing() {
        let mut fx = Fixture::new();
        for lane in 0..3 {
            fx.spawn(&CommentRecord::new(format!("c{lane}"), 1.0), lane, 0)
                .unwrap();
        }
        assert_eq!(fx.entities.cancel_all(&mut fx.tracks, &mut fx.surface), 3);
        assert_eq!(fx.entities.cancel_all(&mut fx.tracks, &mut fx.surface), 0);
        assert_eq!(fx.tracks.occupied_count(), 0);
        assert_eq!(fx.surface.live_count(), 0);
        assert_eq!(
            fx.surface
                .events()
                .iter()
                .filter(|event| matches!(event, SurfaceEvent::Retired(_)))
                .count(),
            3
        );
    }

    #[test]
    fn geometry_follows_offsets() {
        let mut fx = Fixture::new();
        let handle = fx.spawn(&CommentRecord::new("abc", 1.0), 0, 0).unwrap();
        // 3 chars at 18px
        assert_eq!(
            fx.entities.geometry(handle.id),
            EntityGeometry::Scrolling {
                right_edge: 1_054.0
            }
        );
        fx.entities.advance(8_000, &mut fx.tracks, &mut fx.surface);
        assert_eq!(fx.entities.geometry(handle.id), EntityGeometry::Gone);
    }

    #[test]
    fn shift_delays_completion() {
        let mut fx = Fixture::new();
        fx.spawn(&CommentRecord::new("wait", 1.0), 0, 0).unwrap();
        fx.entities.shift(1_000);
        assert!(fx
            .entities
            .advance(8_000, &mut fx.tracks, &mut fx.surface)
            .is_empty());
        assert_eq!(
            fx.entities
                .advance(9_000, &mut fx.tracks, &mut fx.surface)
                .len(),
            1
        );
    }
}
