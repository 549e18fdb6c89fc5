//! Lane allocation for incoming comments
//!
//! A greedy, per-arrival allocator over a fixed set of lanes. Each call
//! runs these passes in order and stops at the first hit:
//!
//! 1. Timeout sweep: force-release lanes held longer than the occupancy
//!    timeout (recovers from lost completion signals).
//! 2. Free pass: the first unoccupied lane.
//! 3. Safety pass: the first occupied lane whose last entity has cleared
//!    the entry point by the minimum spacing, or left the surface.
//! 4. Forced pass: the lane assigned longest ago, accepting a possible
//!    visual overlap rather than dropping the comment.
//!
//! Only the previous occupant's geometry is consulted. An entity that was
//! displaced by a forced assignment keeps animating in the same lane and
//! may overlap its successor; this is accepted behaviour.

mod geometry;
mod lane;

use log::{debug, warn};
use smallvec::SmallVec;

pub use geometry::{EntityGeometry, GeometrySource, LaneLayout};
pub use lane::{Lane, LaneTicket};

use crate::lifecycle::EntityId;

/// How a lane was chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AllocationKind {
    /// The lane was unoccupied
    Free,
    /// The previous occupant has cleared the entry point
    Safe,
    /// Oldest assignment taken over; overlap possible
    Forced,
}

/// A lane chosen for one comment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Allocation {
    /// Lane index
    pub lane: usize,
    /// Which pass chose it
    pub kind: AllocationKind,
}

/// Fixed array of lanes with collision-aware assignment
#[derive(Debug, Clone)]
pub struct TrackAllocator {
    lanes: Vec<Lane>,
    timeout_ms: u64,
    min_spacing_px: f32,
    timeout_reclaims: u64,
    generation_floor: u64,
}

impl TrackAllocator {
    /// Create `track_count` free lanes
    #[must_use]
    pub fn new(track_count: usize, timeout_ms: u64, min_spacing_px: f32) -> Self {
        Self {
            lanes: vec![Lane::default(); track_count],
            timeout_ms,
            min_spacing_px,
            timeout_reclaims: 0,
            generation_floor: 0,
        }
    }

    /// Release every lane and change the lane count
    ///
    /// Lanes that survive keep their generation; added lanes continue from
    /// the highest generation any lane has reached, so no ticket issued
    /// before the resize can match afterwards.
    pub fn resize(&mut self, track_count: usize) {
        self.release_all();
        let floor = self
            .lanes
            .iter()
            .map(Lane::generation)
            .max()
            .unwrap_or(0)
            .max(self.generation_floor);
        self.generation_floor = floor;
        self.lanes.resize_with(track_count, || Lane::starting_at(floor));
    }

    /// Number of lanes
    #[must_use]
    pub fn track_count(&self) -> usize {
        self.lanes.len()
    }

    /// All lanes by index
    #[must_use]
    pub fn lanes(&self) -> &[Lane] {
        &self.lanes
    }

    /// One lane
    #[must_use]
    pub fn lane(&self, index: usize) -> Option<&Lane> {
        self.lanes.get(index)
    }

    /// Number of occupied lanes
    #[must_use]
    pub fn occupied_count(&self) -> usize {
        self.lanes.iter().filter(|lane| lane.is_occupied()).count()
    }

    /// Lanes force-released by the timeout sweep so far
    #[must_use]
    pub const fn timeout_reclaims(&self) -> u64 {
        self.timeout_reclaims
    }

    /// Change the occupancy timeout
    pub fn set_timeout_ms(&mut self, timeout_ms: u64) {
        self.timeout_ms = timeout_ms;
    }

    /// Change the minimum spacing for the safety pass
    pub fn set_min_spacing_px(&mut self, min_spacing_px: f32) {
        self.min_spacing_px = min_spacing_px;
    }

    /// Force-release every lane held longer than the timeout
    ///
    /// Returns the reclaimed lane indices. The abandoned entities keep
    /// their stale tickets, so their late completions cannot release the
    /// lane again.
    pub fn sweep_timeouts(&mut self, now_ms: u64) -> SmallVec<[usize; 4]> {
        let mut reclaimed = SmallVec::new();
        for (index, lane) in self.lanes.iter_mut().enumerate() {
            if lane.is_occupied() && lane.age_ms(now_ms) > self.timeout_ms {
                warn!(
                    "Reclaiming lane {index} after {:.1}s without completion (entity {:?})",
                    lane.age_ms(now_ms) as f64 / 1000.0,
                    lane.last_entity()
                );
                lane.release();
                reclaimed.push(index);
            }
        }
        self.timeout_reclaims += reclaimed.len() as u64;
        reclaimed
    }

    /// Choose a lane for a scrolling entity entering at `spawn_x`
    ///
    /// Does not occupy the lane; call [`TrackAllocator::occupy`] once the
    /// entity exists. Returns `None` only when there are no lanes at all.
    pub fn allocate<G>(&mut self, now_ms: u64, spawn_x: f32, geometry: &G) -> Option<Allocation>
    where
        G: GeometrySource + ?Sized,
    {
        self.sweep_timeouts(now_ms);

        if let Some(lane) = self.lanes.iter().position(|lane| !lane.is_occupied()) {
            debug!("Lane {lane} is free");
            return Some(Allocation {
                lane,
                kind: AllocationKind::Free,
            });
        }

        let safe = self.lanes.iter().position(|lane| {
            lane.last_entity()
                .map_or(EntityGeometry::Gone, |id| geometry.geometry(id))
                .clears(spawn_x, self.min_spacing_px)
        });
        if let Some(lane) = safe {
            debug!("Lane {lane} is safe to share");
            return Some(Allocation {
                lane,
                kind: AllocationKind::Safe,
            });
        }

        let oldest = self
            .lanes
            .iter()
            .enumerate()
            .min_by_key(|(_, lane)| lane.occupied_at_ms())
            .map(|(index, _)| index);
        match oldest {
            Some(lane) => {
                warn!("All lanes busy, forcing lane {lane}: overlap risk");
                Some(Allocation {
                    lane,
                    kind: AllocationKind::Forced,
                })
            }
            None => {
                warn!("No lanes configured, dropping comment");
                None
            }
        }
    }

    /// Assign `lane` to `entity`
    pub fn occupy(&mut self, lane: usize, entity: EntityId, now_ms: u64) -> Option<LaneTicket> {
        let slot = self.lanes.get_mut(lane)?;
        let generation = slot.occupy(entity, now_ms);
        Some(LaneTicket { lane, generation })
    }

    /// The ticket the next [`TrackAllocator::occupy`] of `lane` will return
    #[must_use]
    pub fn next_ticket(&self, lane: usize) -> Option<LaneTicket> {
        let slot = self.lanes.get(lane)?;
        Some(LaneTicket {
            lane,
            generation: slot.next_generation(),
        })
    }

    /// Whether `ticket` still matches its lane's current generation
    #[must_use]
    pub fn is_current(&self, ticket: LaneTicket) -> bool {
        self.lanes
            .get(ticket.lane)
            .is_some_and(|lane| lane.is_occupied() && lane.generation() == ticket.generation)
    }

    /// Release the lane named by `ticket`
    ///
    /// A stale ticket (the lane was reclaimed, reassigned or reset since)
    /// is a no-op and returns `false`.
    pub fn release(&mut self, ticket: LaneTicket) -> bool {
        if !self.is_current(ticket) {
            debug!(
                "Ignoring stale release of lane {} (generation {})",
                ticket.lane, ticket.generation
            );
            return false;
        }
        self.lanes[ticket.lane].release();
        true
    }

    /// Release every occupied lane
    pub fn release_all(&mut self) {
        for lane in self.lanes.iter_mut().filter(|lane| lane.is_occupied()) {
            lane.release();
        }
    }

    /// Push occupancy times forward, e.g. after a pause
    pub fn shift_occupancy(&mut self, delta_ms: u64) {
        for lane in &mut self.lanes {
            lane.shift(delta_ms);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ahash::AHashMap;

    #[derive(Default)]
    struct Geometry(AHashMap<EntityId, EntityGeometry>);

    impl GeometrySource for Geometry {
        fn geometry(&self, id: EntityId) -> EntityGeometry {
            self.0.get(&id).copied().unwrap_or(EntityGeometry::Gone)
        }
    }

    fn occupy_all(tracks: &mut TrackAllocator, geometry: &mut Geometry, right_edge: f32) {
        for lane in 0..tracks.track_count() {
            let id = EntityId::new(lane as u64 + 100);
            tracks.occupy(lane, id, 1_000 + lane as u64).unwrap();
            geometry
                .0
                .insert(id, EntityGeometry::Scrolling { right_edge });
        }
    }

    #[test]
    fn free_lanes_are_taken_in_order() {
        let mut tracks = TrackAllocator::new(3, 10_000, 200.0);
        let geometry = Geometry::default();
        for expected in 0..3 {
            let allocation = tracks.allocate(0, 1_920.0, &geometry).unwrap();
            assert_eq!(allocation.lane, expected);
            assert_eq!(allocation.kind, AllocationKind::Free);
            tracks.occupy(expected, EntityId::new(expected as u64), 0);
        }
    }

    #[test]
    fn safe_lane_preferred_over_forced() {
        let mut tracks = TrackAllocator::new(3, 10_000, 200.0);
        let mut geometry = Geometry::default();
        occupy_all(&mut tracks, &mut geometry, 1_900.0);
        geometry.0.insert(
            EntityId::new(101),
            EntityGeometry::Scrolling { right_edge: 900.0 },
        );

        let allocation = tracks.allocate(2_000, 1_920.0, &geometry).unwrap();
        assert_eq!(allocation.lane, 1);
        assert_eq!(allocation.kind, AllocationKind::Safe);
    }

    #[test]
    fn forced_fallback_takes_oldest_lane() {
        let mut tracks = TrackAllocator::new(3, 10_000, 200.0);
        let mut geometry = Geometry::default();
        occupy_all(&mut tracks, &mut geometry, 1_900.0);

        let allocation = tracks.allocate(2_000, 1_920.0, &geometry).unwrap();
        assert_eq!(allocation.lane, 0);
        assert_eq!(allocation.kind, AllocationKind::Forced);
    }

    #[test]
    fn fixed_occupants_are_never_safe() {
        let mut tracks = TrackAllocator::new(1, 10_000, 0.0);
        let mut geometry = Geometry::default();
        tracks.occupy(0, EntityId::new(1), 0);
        geometry.0.insert(EntityId::new(1), EntityGeometry::Fixed);

        let allocation = tracks.allocate(100, 1_920.0, &geometry).unwrap();
        assert_eq!(allocation.kind, AllocationKind::Forced);
    }

    #[test]
    fn timed_out_lanes_are_reclaimed_first() {
        let mut tracks = TrackAllocator::new(2, 10_000, 200.0);
        let mut geometry = Geometry::default();
        occupy_all(&mut tracks, &mut geometry, 1_900.0);

        let allocation = tracks.allocate(11_001, 1_920.0, &geometry).unwrap();
        assert_eq!(allocation.kind, AllocationKind::Free);
        assert_eq!(allocation.lane, 0);
        assert_eq!(tracks.timeout_reclaims(), 1);
        assert!(tracks.lane(1).unwrap().is_occupied());
    }

    #[test]
    fn stale_tickets_do_not_release() {
        let mut tracks = TrackAllocator::new(1, 10_000, 200.0);
        let first = tracks.occupy(0, EntityId::new(1), 0).unwrap();
        let second = tracks.occupy(0, EntityId::new(2), 50).unwrap();

        assert!(!tracks.release(first));
        assert!(tracks.lane(0).unwrap().is_occupied());
        assert!(tracks.release(second));
        assert!(!tracks.release(second));
        assert!(!tracks.lane(0).unwrap().is_occupied());
    }

    #[test]
    fn timeout_reclaim_invalidates_old_ticket() {
        let mut tracks = TrackAllocator::new(1, 1_000, 200.0);
        let ticket = tracks.occupy(0, EntityId::new(1), 0).unwrap();
        assert_eq!(tracks.sweep_timeouts(1_001).as_slice(), &[0]);
        let newer = tracks.occupy(0, EntityId::new(2), 1_001).unwrap();

        assert!(!tracks.release(ticket));
        assert!(tracks.is_current(newer));
    }

    #[test]
    fn release_all_is_idempotent() {
        let mut tracks = TrackAllocator::new(3, 10_000, 200.0);
        let mut geometry = Geometry::default();
        occupy_all(&mut tracks, &mut geometry, 0.0);
        tracks.release_all();
        tracks.release_all();
        assert_eq!(tracks.occupied_count(), 0);
    }

    #[test]
    fn zero_lanes_allocate_nothing() {
        let mut tracks = TrackAllocator::new(0, 10_000, 200.0);
        assert!(tracks.allocate(0, 1_920.0, &Geometry::default()).is_none());
    }

    #[test]
    fn next_ticket_matches_the_following_occupy() {
        let mut tracks = TrackAllocator::new(2, 10_000, 200.0);
        let expected = tracks.next_ticket(1).unwrap();
        assert_eq!(tracks.occupy(1, EntityId::new(1), 0), Some(expected));
        assert!(tracks.next_ticket(2).is_none());
    }

    #[test]
    fn resize_never_rewinds_generations() {
        let mut tracks = TrackAllocator::new(3, 10_000, 200.0);
        let old = tracks.occupy(2, EntityId::new(1), 0).unwrap();
        tracks.occupy(2, EntityId::new(2), 10).unwrap();
        let high = tracks.lane(2).unwrap().generation();

        tracks.resize(1);
        assert_eq!(tracks.track_count(), 1);
        assert_eq!(tracks.occupied_count(), 0);

        tracks.resize(4);
        assert_eq!(tracks.track_count(), 4);
        for lane in tracks.lanes() {
            assert!(!lane.is_occupied());
        }
        assert!(tracks.lane(2).unwrap().generation() >= high);
        let reissued = tracks.occupy(2, EntityId::new(3), 20).unwrap();
        assert!(reissued.generation > old.generation);
        assert!(!tracks.release(old));
        assert!(tracks.is_current(reissued));
    }
}
