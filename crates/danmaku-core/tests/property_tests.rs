//! Property-based tests for the scheduler
//!
//! Uses proptest to check lane and admission invariants over random
//! comment sets and tick sequences.

use danmaku_core::admission::{DedupWindow, DensityLimiter};
use danmaku_core::{
    CommentRecord, CommentStore, DanmakuScheduler, ManualClock, Mode, RecordingSurface,
    SchedulerConfig,
};
use proptest::prelude::*;

/// Generate a comment in the first minute of playback
fn arb_comment() -> impl Strategy<Value = CommentRecord> {
    (
        "[a-z]{1,30}",
        0.0..60.0f64,
        prop_oneof![Just(Mode::Scroll), Just(Mode::Top), Just(Mode::Bottom)],
    )
        .prop_map(|(text, time, mode)| CommentRecord::new(text, time).with_mode(mode))
}

/// Generate playback ticks as (clock step, position step) pairs
fn arb_ticks() -> impl Strategy<Value = Vec<(u64, i64)>> {
    prop::collection::vec((0..3_000u64, -500..2_000i64), 1..60)
}

proptest! {
    #[test]
    fn lanes_hold_at_most_one_owner(
        comments in prop::collection::vec(arb_comment(), 0..200),
        ticks in arb_ticks(),
        track_count in 1..6usize,
    ) {
        let clock = ManualClock::new(0);
        let surface = RecordingSurface::new(1_280.0, 720.0);
        let config = SchedulerConfig::default().with_track_count(track_count);
        let mut scheduler = DanmakuScheduler::with_clock(surface, config, clock.clone()).unwrap();
        scheduler.load_comments(comments);

        let mut position = 0i64;
        for (clock_step, position_step) in ticks {
            clock.advance(clock_step);
            position = (position + position_step).max(0);
            scheduler.on_position_update(position);
            scheduler.advance();

            // every occupied lane names a live entity that claims it
            for (index, lane) in scheduler.lanes().iter().enumerate() {
                if let Some(id) = lane.last_entity() {
                    prop_assert!(lane.is_occupied());
                    let owners: Vec<_> = scheduler
                        .active_entities()
                        .filter(|entity| entity.id() == id)
                        .collect();
                    prop_assert_eq!(owners.len(), 1);
                    prop_assert_eq!(owners[0].lane(), index);
                    prop_assert_eq!(owners[0].handle().generation, lane.generation());
                }
            }
            let stats = scheduler.stats();
            prop_assert!(stats.occupied_lanes <= track_count);
            prop_assert_eq!(stats.active_entities, scheduler.surface().live_count());
        }
    }

    #[test]
    fn density_never_exceeds_cap(max in 1..30u32, attempts in 0..200usize, start in 0..10_000u64) {
        let mut limiter = DensityLimiter::new(max);
        let admitted = (0..attempts).filter(|_| limiter.try_acquire(start)).count();
        prop_assert_eq!(admitted, attempts.min(max as usize));
    }

    #[test]
    fn spawns_per_second_bounded(count in 0..120usize, max in 1..25u32) {
        let clock = ManualClock::new(5_000);
        let surface = RecordingSurface::new(1_920.0, 1_080.0);
        let config = SchedulerConfig::default().with_max_per_second(max);
        let mut scheduler = DanmakuScheduler::with_clock(surface, config, clock).unwrap();
        scheduler.load_comments((0..count).map(|i| CommentRecord::new(format!("c{i}"), 3.0)));

        scheduler.on_position_update(3_000);

        let stats = scheduler.stats();
        prop_assert_eq!(stats.spawned as usize, count.min(max as usize));
        prop_assert_eq!(stats.spawned + stats.dropped.total(), count as u64);
    }

    #[test]
    fn reset_is_idempotent(
        comments in prop::collection::vec(arb_comment(), 0..80),
        position in 0..60_000i64,
        resets in 1..4usize,
    ) {
        let clock = ManualClock::new(0);
        let surface = RecordingSurface::new(1_280.0, 720.0);
        let mut scheduler =
            DanmakuScheduler::with_clock(surface, SchedulerConfig::default(), clock).unwrap();
        scheduler.load_comments(comments);
        scheduler.on_position_update(position);

        for _ in 0..resets {
            scheduler.reset_all();
            let stats = scheduler.stats();
            prop_assert_eq!(stats.active_entities, 0);
            prop_assert_eq!(stats.occupied_lanes, 0);
            prop_assert!(scheduler.lanes().iter().all(|lane| !lane.is_occupied()));
            prop_assert_eq!(scheduler.surface().live_count(), 0);
        }
    }

    #[test]
    fn dedup_expires_exactly_after_window(window in 1..120u64, offset in 0..200_000u64) {
        let mut dedup = DedupWindow::new(window);
        prop_assert!(dedup.admit("same", offset));
        let window_ms = window * 1000;
        prop_assert!(!dedup.admit("same", offset + window_ms - 1));
        prop_assert!(dedup.admit("same", offset + window_ms));
    }

    #[test]
    fn lookup_returns_exact_second(
        comments in prop::collection::vec(arb_comment(), 0..200),
        second in 0..60u64,
    ) {
        let mut store = CommentStore::new();
        store.load(comments.clone());
        let found = store.lookup(second);
        let expected = comments
            .iter()
            .filter(|comment| comment.whole_second() == second)
            .count();
        prop_assert_eq!(found.len(), expected);
        prop_assert!(found.iter().all(|comment| comment.whole_second() == second));
    }
}
