//! Danmaku scheduler: the playback clock bridge
//!
//! [`DanmakuScheduler`] owns every component and is driven entirely from
//! outside. The host calls [`DanmakuScheduler::on_position_update`] at a
//! bounded cadence while media plays (about every 500ms) and, if it wants
//! the scheduler to animate, [`DanmakuScheduler::advance`] once per frame.
//! Nothing polls internally and nothing is locked: every method runs on the
//! caller's thread, and completions reported from other threads are queued
//! until the next call.
//!
//! Per comment, the pipeline is: enabled check, dedup window, density
//! budget, surface check, lane allocation, spawn. A comment rejected at any
//! step is dropped and counted, never retried.
//!
//! # Example
//!
//! ```rust
//! use danmaku_core::{
//!     CommentRecord, DanmakuScheduler, ManualClock, RecordingSurface, SchedulerConfig,
//! };
//!
//! let clock = ManualClock::new(0);
//! let surface = RecordingSurface::new(1280.0, 720.0);
//! let mut scheduler =
//!     DanmakuScheduler::with_clock(surface, SchedulerConfig::default(), clock.clone())?;
//!
//! scheduler.load_comments(vec![
//!     CommentRecord::new("first!", 1.2),
//!     CommentRecord::new("hello", 1.8),
//! ]);
//! scheduler.on_position_update(1_000);
//! assert_eq!(scheduler.stats().active_entities, 2);
//!
//! clock.advance(8_000);
//! scheduler.advance();
//! assert_eq!(scheduler.stats().active_entities, 0);
//! # Ok::<(), danmaku_core::DanmakuError>(())
//! ```

mod completion;
mod stats;

use log::{debug, info, warn};
use smallvec::SmallVec;

pub use completion::CompletionSender;
pub use stats::SchedulerStats;

use completion::CompletionQueue;

use crate::admission::{DedupWindow, DensityLimiter, DropCounters, DropReason};
use crate::clock::{Clock, SystemClock};
use crate::config::SchedulerConfig;
use crate::lifecycle::{EntityHandle, EntityManager, OverlayEntity, RetireOutcome};
use crate::model::CommentRecord;
use crate::store::{CommentStore, IngestPolicy, LoadReport};
use crate::surface::RenderSurface;
use crate::tracks::{AllocationKind, Lane, TrackAllocator};
use crate::utils::{DanmakuError, Result};

/// Running totals behind [`SchedulerStats`]
#[derive(Debug, Default)]
struct Counters {
    spawned: u64,
    forced_assignments: u64,
    stale_completions: u64,
    displaced_retirements: u64,
    dropped: DropCounters,
}

/// Schedules danmaku comments onto a render surface
pub struct DanmakuScheduler<S, C = SystemClock> {
    surface: S,
    clock: C,
    config: SchedulerConfig,
    store: CommentStore,
    dedup: DedupWindow,
    density: DensityLimiter,
    tracks: TrackAllocator,
    entities: EntityManager,
    completions: CompletionQueue,
    enabled: bool,
    paused_at_ms: Option<u64>,
    last_position_ms: Option<i64>,
    last_dispatched_second: Option<u64>,
    counters: Counters,
}

impl<S: RenderSurface> DanmakuScheduler<S> {
    /// Create a scheduler reading the system monotonic clock
    ///
    /// # Errors
    ///
    /// Returns [`DanmakuError::InvalidConfig`] if `config` does not validate.
    pub fn new(surface: S, config: SchedulerConfig) -> Result<Self> {
        Self::with_clock(surface, config, SystemClock::new())
    }
}

impl<S: RenderSurface, C: Clock> DanmakuScheduler<S, C> {
    /// Create a scheduler reading `clock`
    ///
    /// # Errors
    ///
    /// Returns [`DanmakuError::InvalidConfig`] if `config` does not validate.
    pub fn with_clock(surface: S, config: SchedulerConfig, clock: C) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            surface,
            clock,
            store: CommentStore::new(),
            dedup: DedupWindow::new(config.dedup_window_seconds),
            density: DensityLimiter::new(config.max_per_second),
            tracks: TrackAllocator::new(
                config.track_count,
                config.channel_timeout_ms,
                config.min_spacing_px,
            ),
            entities: EntityManager::new(),
            completions: CompletionQueue::new(),
            enabled: true,
            paused_at_ms: None,
            last_position_ms: None,
            last_dispatched_second: None,
            counters: Counters::default(),
            config,
        })
    }

    /// Replace the comment set for a new media item
    ///
    /// Everything on screen is cancelled and the dedup window cleared first.
    pub fn load_comments<I>(&mut self, comments: I) -> LoadReport
    where
        I: IntoIterator<Item = CommentRecord>,
    {
        self.reset_all();
        self.store.load(comments)
    }

    /// Drop the comment set and everything on screen
    pub fn unload(&mut self) {
        self.reset_all();
        self.store.reset();
    }

    /// Change the ingest shaping used by the next load
    pub fn set_ingest_policy(&mut self, policy: IngestPolicy) {
        self.store.set_policy(policy);
    }

    /// Apply a new configuration
    ///
    /// Changing `track_count` rebuilds the lanes, which cancels everything
    /// on screen. Other options apply in place.
    ///
    /// # Errors
    ///
    /// Returns [`DanmakuError::InvalidConfig`] and leaves the current
    /// configuration untouched if `config` does not validate.
    pub fn configure(&mut self, config: SchedulerConfig) -> Result<()> {
        config.validate()?;
        if config.track_count != self.config.track_count {
            self.entities.cancel_all(&mut self.tracks, &mut self.surface);
            self.tracks.resize(config.track_count);
        }
        self.tracks.set_timeout_ms(config.channel_timeout_ms);
        self.tracks.set_min_spacing_px(config.min_spacing_px);
        self.dedup.set_window_seconds(config.dedup_window_seconds);
        self.density.set_max_per_second(config.max_per_second);
        info!(
            "Configured {} lanes, base {}ms, {}/s, dedup {}s, spacing {}px",
            config.track_count,
            config.base_duration_ms,
            config.max_per_second,
            config.dedup_window_seconds,
            config.min_spacing_px
        );
        self.config = config;
        Ok(())
    }

    /// Master switch; switching off resets everything
    pub fn set_enabled(&mut self, enabled: bool) {
        if self.enabled == enabled {
            return;
        }
        if !enabled {
            self.reset_all();
        }
        self.enabled = enabled;
        info!("Danmaku overlay {}", if enabled { "enabled" } else { "disabled" });
    }

    /// Cancel every entity, release every lane and clear the dedup window
    ///
    /// Idempotent. The comment set is kept, and so is the density count of
    /// the current clock second.
    pub fn reset_all(&mut self) {
        self.drain_completions();
        let cancelled = self.entities.cancel_all(&mut self.tracks, &mut self.surface);
        self.dedup.clear();
        self.last_position_ms = None;
        self.last_dispatched_second = None;
        if cancelled > 0 {
            info!("Reset: cancelled {cancelled} overlays");
        }
    }

    /// Playback clock tick
    ///
    /// Spawns the comments of the current whole second. Seconds skipped
    /// since the previous tick are caught up; the same second is never
    /// dispatched twice in a row. A backward move, or a forward jump beyond
    /// the seek threshold, is handled as a seek. Ignored while paused.
    pub fn on_position_update(&mut self, position_ms: i64) {
        self.drain_completions();
        if self.paused_at_ms.is_some() {
            debug!("Ignoring position {position_ms}ms while paused");
            return;
        }

        if let Some(last) = self.last_position_ms {
            let jump = position_ms.saturating_sub(last);
            if jump < 0 || jump.unsigned_abs() > self.config.seek_jump_threshold_ms {
                debug!("Position jumped from {last}ms to {position_ms}ms");
                self.cancel_for_seek(position_ms);
            }
        }
        self.last_position_ms = Some(position_ms);

        let second = position_ms.max(0).unsigned_abs() / 1000;
        let first = match self.last_dispatched_second {
            Some(previous) if previous == second => return,
            Some(previous) if previous < second => previous + 1,
            _ => second,
        };
        self.last_dispatched_second = Some(second);

        let now_ms = self.clock.now_ms();
        self.refresh(now_ms);
        for current in first..=second {
            let batch: SmallVec<[CommentRecord; 8]> =
                self.store.lookup(current).iter().cloned().collect();
            for comment in &batch {
                if let Err(reason) = self.dispatch(comment, now_ms) {
                    self.counters.dropped.record(reason);
                }
            }
        }
    }

    /// Frame tick: move scrolling entities and retire finished ones
    ///
    /// Hosts that animate overlays themselves can skip this and report
    /// completions instead. Ignored while paused.
    pub fn advance(&mut self) {
        self.drain_completions();
        if self.paused_at_ms.is_some() {
            return;
        }
        let now_ms = self.clock.now_ms();
        self.refresh(now_ms);
    }

    /// Apply queued completion reports; returns how many were processed
    pub fn pump(&mut self) -> usize {
        self.drain_completions()
    }

    /// Same-thread completion report for the overlay named by `handle`
    pub fn on_overlay_finished(&mut self, handle: EntityHandle) {
        self.complete(handle);
    }

    /// Explicit seek: clear the screen but keep the dedup window
    pub fn on_seek(&mut self, position_ms: i64) {
        self.drain_completions();
        self.cancel_for_seek(position_ms);
        self.last_position_ms = Some(position_ms);
    }

    /// The overlay view went away; everything on it is gone
    pub fn on_surface_detached(&mut self) {
        let cancelled = self.entities.cancel_all(&mut self.tracks, &mut self.surface);
        warn!("Render surface detached with {cancelled} overlays on screen");
    }

    /// Freeze animation and ignore ticks until [`DanmakuScheduler::resume`]
    pub fn pause(&mut self) {
        if self.paused_at_ms.is_none() {
            self.paused_at_ms = Some(self.clock.now_ms());
            debug!("Paused with {} overlays on screen", self.entities.len());
        }
    }

    /// Continue after [`DanmakuScheduler::pause`]
    ///
    /// Spawn times and lane occupancy times move forward by the paused
    /// duration, so nothing ages while paused.
    pub fn resume(&mut self) {
        if let Some(paused_at) = self.paused_at_ms.take() {
            let paused_for = self.clock.now_ms().saturating_sub(paused_at);
            self.entities.shift(paused_for);
            self.tracks.shift_occupancy(paused_for);
            debug!("Resumed after {paused_for}ms");
        }
    }

    /// Counters snapshot
    #[must_use]
    pub fn stats(&self) -> SchedulerStats {
        SchedulerStats {
            loaded_comments: self.store.len(),
            active_entities: self.entities.len(),
            occupied_lanes: self.tracks.occupied_count(),
            spawned: self.counters.spawned,
            forced_assignments: self.counters.forced_assignments,
            timeout_reclaims: self.tracks.timeout_reclaims(),
            stale_completions: self.counters.stale_completions,
            displaced_retirements: self.counters.displaced_retirements,
            dropped: self.counters.dropped,
        }
    }

    /// Live configuration
    #[must_use]
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Handle for reporting completions from another thread
    #[must_use]
    pub fn completion_sender(&self) -> CompletionSender {
        self.completions.sender()
    }

    /// Loaded comments
    #[must_use]
    pub fn store(&self) -> &CommentStore {
        &self.store
    }

    /// Render surface
    #[must_use]
    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Mutable render surface
    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    /// Lane states by index
    #[must_use]
    pub fn lanes(&self) -> &[Lane] {
        self.tracks.lanes()
    }

    /// Entities currently on screen
    pub fn active_entities(&self) -> impl Iterator<Item = &OverlayEntity> {
        self.entities.iter()
    }

    /// Whether the overlay is switched on
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Whether playback is paused
    #[must_use]
    pub const fn is_paused(&self) -> bool {
        self.paused_at_ms.is_some()
    }

    /// Take the scheduler apart and return the surface
    pub fn into_surface(self) -> S {
        self.surface
    }

    fn dispatch(
        &mut self,
        comment: &CommentRecord,
        now_ms: u64,
    ) -> core::result::Result<EntityHandle, DropReason> {
        if !self.enabled {
            return Err(DropReason::Disabled);
        }
        if !self.dedup.is_admissible(&comment.text, now_ms) {
            if comment.text.trim().is_empty() {
                return Err(DropReason::EmptyText);
            }
            debug!("Duplicate within window: {:?}", comment.text);
            return Err(DropReason::Duplicate);
        }
        if !self.density.try_acquire(now_ms) {
            debug!("Density cap reached, dropping {:?}", comment.text);
            return Err(DropReason::DensityCap);
        }
        let Some(size) = self.surface.size() else {
            warn!("No render surface, dropping {:?}", comment.text);
            return Err(DropReason::NoSurface);
        };

        let spawn_x = size.width - self.config.spawn_inset_px;
        let Some(allocation) = self.tracks.allocate(now_ms, spawn_x, &self.entities) else {
            warn!("No lane available, dropping {:?}", comment.text);
            return Err(DropReason::NoLane);
        };

        let handle = self
            .entities
            .spawn(
                comment,
                allocation.lane,
                &mut self.tracks,
                &mut self.surface,
                &self.config,
                now_ms,
            )
            .map_err(|err| {
                warn!("Spawn failed, dropping {:?}: {err}", comment.text);
                match err {
                    DanmakuError::SurfaceUnavailable => DropReason::NoSurface,
                    _ => DropReason::SpawnFailed,
                }
            })?;

        self.dedup.record(&comment.text, now_ms);
        self.counters.spawned += 1;
        if allocation.kind == AllocationKind::Forced {
            self.counters.forced_assignments += 1;
        }
        Ok(handle)
    }

    fn refresh(&mut self, now_ms: u64) {
        let finished = self
            .entities
            .advance(now_ms, &mut self.tracks, &mut self.surface);
        for (handle, outcome) in finished {
            self.count_outcome(handle, outcome);
        }
    }

    fn complete(&mut self, handle: EntityHandle) {
        let outcome = self
            .entities
            .retire(handle, &mut self.tracks, &mut self.surface);
        self.count_outcome(handle, outcome);
    }

    fn count_outcome(&mut self, handle: EntityHandle, outcome: RetireOutcome) {
        match outcome {
            RetireOutcome::Released => {}
            RetireOutcome::LaneReassigned => self.counters.displaced_retirements += 1,
            RetireOutcome::Unknown => {
                debug!(
                    "Stale completion for {} in lane {}",
                    handle.id, handle.lane
                );
                self.counters.stale_completions += 1;
            }
        }
    }

    fn drain_completions(&mut self) -> usize {
        let handles = self.completions.drain();
        for handle in &handles {
            self.complete(*handle);
        }
        handles.len()
    }

    fn cancel_for_seek(&mut self, position_ms: i64) {
        let cancelled = self.entities.cancel_all(&mut self.tracks, &mut self.surface);
        self.last_dispatched_second = None;
        info!("Seek to {position_ms}ms, cancelled {cancelled} overlays");
    }
}

impl<S, C> core::fmt::Debug for DanmakuScheduler<S, C> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DanmakuScheduler")
            .field("config", &self.config)
            .field("comments", &self.store.len())
            .field("entities", &self.entities.len())
            .field("lanes", &self.tracks.lanes())
            .field("enabled", &self.enabled)
            .field("paused", &self.paused_at_ms.is_some())
            .finish_non_exhaustive()
    }
}
