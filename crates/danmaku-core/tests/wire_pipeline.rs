//! Integration tests for decoding server payloads into a running scheduler

#![cfg(feature = "serde")]

use danmaku_core::wire::decode_comments;
use danmaku_core::{
    CommentStore, DanmakuScheduler, IngestPolicy, ManualClock, Mode, RecordingSurface, Rgb,
    SchedulerConfig,
};
use pretty_assertions::assert_eq;

const BUCKETED: &str = r##"{
    "0-60000": [
        {"text": "opening\nsong", "time": 5.4, "color": "#00FFFF", "mode": 0},
        {"text": "first", "time": 5.0, "color": "#FFF", "mode": 1, "border": true},
        {"text": "", "time": 6}
    ],
    "60000-120000": [
        {"text": "later", "time": 61, "color": 255, "mode": 2}
    ]
}"##;

#[test]
fn test_bucketed_payload_schedules_in_time_order() {
    let records = decode_comments(BUCKETED).unwrap();
    assert_eq!(records.len(), 4);

    let clock = ManualClock::new(0);
    let surface = RecordingSurface::new(1_920.0, 1_080.0);
    let mut scheduler =
        DanmakuScheduler::with_clock(surface, SchedulerConfig::default(), clock).unwrap();
    let report = scheduler.load_comments(records);
    assert_eq!(report.accepted, 3);
    assert_eq!(report.rejected, 1);

    scheduler.on_position_update(5_000);
    let spawned: Vec<(String, Mode, Rgb, bool)> = scheduler
        .surface()
        .spawned()
        .map(|spawn| (spawn.text.clone(), spawn.mode, spawn.color, spawn.has_border))
        .collect();
    assert_eq!(
        spawned,
        vec![
            ("first".to_string(), Mode::Top, Rgb::WHITE, true),
            (
                "opening song".to_string(),
                Mode::Scroll,
                Rgb::new(0, 255, 255),
                false
            ),
        ]
    );
}

#[test]
fn test_packed_color_and_bottom_mode() {
    let records = decode_comments(BUCKETED).unwrap();
    let later = records.iter().find(|r| r.text == "later").unwrap();
    assert_eq!(later.color, Rgb::new(0, 0, 255));
    assert_eq!(later.mode, Mode::Bottom);
    assert_eq!(later.whole_second(), 61);
}

#[test]
fn test_ingest_policy_with_decoded_payload() {
    let items: Vec<serde_json::Value> = (0..100)
        .map(|i| serde_json::json!({"text": format!("t{}", i % 10), "time": i}))
        .collect();
    let payload = serde_json::json!({"code": 0, "data": items});
    let records = decode_comments(&payload.to_string()).unwrap();

    let mut store = CommentStore::with_policy(IngestPolicy {
        unique_texts: true,
        max_per_minute: Some(5),
        max_total: None,
    });
    let report = store.load(records);
    assert_eq!(report.accepted, 5);
    assert_eq!(report.sampled_out, 95);
    assert_eq!(store.last_second(), Some(8));
}
