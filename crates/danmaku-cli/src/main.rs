//! `danmaku-replay`: drive the scheduler over a simulated timeline
//!
//! Decodes a comment file, advances a manual clock alongside a simulated
//! media position and prints every spawn and retire the surface receives,
//! followed by the scheduler statistics.

mod cli;

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use clap::Parser;
use danmaku_core::lifecycle::LONG_TEXT_FACTOR;
use danmaku_core::surface::SurfaceEvent;
use danmaku_core::wire::decode_comments;
use danmaku_core::{
    Clock, DanmakuScheduler, IngestPolicy, ManualClock, RecordingSurface, SchedulerConfig,
};
use log::{debug, info};

use cli::Args;

type Scheduler = DanmakuScheduler<RecordingSurface, ManualClock>;

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbosity);
    debug!("Command-line args: {args:?}");

    if args.tick_ms == 0 {
        bail!("--tick-ms must be positive");
    }

    let payload = fs::read_to_string(&args.input)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;
    let comments = decode_comments(&payload)
        .with_context(|| format!("Failed to decode {}", args.input.display()))?;
    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => SchedulerConfig::default(),
    };

    let clock = ManualClock::new(0);
    let surface = RecordingSurface::new(args.width, args.height);
    let mut scheduler = DanmakuScheduler::with_clock(surface, config, clock.clone())
        .context("Invalid scheduler configuration")?;
    scheduler.set_ingest_policy(IngestPolicy {
        unique_texts: args.unique_texts,
        max_per_minute: args.max_per_minute,
        max_total: args.max_total,
    });

    let report = scheduler.load_comments(comments);
    info!(
        "Loaded {} comments from {} ({} rejected, {} sampled out)",
        report.accepted,
        args.input.display(),
        report.rejected,
        report.sampled_out
    );

    let from_ms = secs_to_ms(args.from_secs);
    let to_ms = match args.to_secs {
        Some(secs) => secs_to_ms(secs),
        None => scheduler
            .store()
            .last_second()
            .map_or(0, end_of_second_ms),
    };
    if to_ms < from_ms {
        bail!("--to ({to_ms}ms) is before --from ({from_ms}ms)");
    }

    replay(&mut scheduler, &clock, from_ms, to_ms, args.tick_ms);

    let stats = scheduler.stats();
    if args.json_stats {
        println!(
            "{}",
            serde_json::to_string_pretty(&stats).context("Failed to serialize statistics")?
        );
    } else {
        println!("{stats}");
    }
    Ok(())
}

/// Tick through `from_ms..=to_ms`, then let the screen empty out
fn replay(scheduler: &mut Scheduler, clock: &ManualClock, from_ms: i64, to_ms: i64, tick_ms: u64) {
    if from_ms > 0 {
        scheduler.on_seek(from_ms);
    }

    let step = i64::try_from(tick_ms).unwrap_or(i64::MAX);
    let mut position = from_ms;
    while position <= to_ms {
        scheduler.on_position_update(position);
        scheduler.advance();
        print_events(clock.now_ms(), scheduler);
        clock.advance(tick_ms);
        let Some(next) = position.checked_add(step) else {
            break;
        };
        position = next;
    }

    let longest = (scheduler.config().base_duration_ms as f64 * LONG_TEXT_FACTOR).ceil() as u64;
    let deadline = clock.now_ms().saturating_add(longest);
    while scheduler.stats().active_entities > 0 && clock.now_ms() <= deadline {
        scheduler.advance();
        print_events(clock.now_ms(), scheduler);
        clock.advance(tick_ms);
    }
}

fn print_events(now_ms: u64, scheduler: &mut Scheduler) {
    let clock = now_ms as f64 / 1000.0;
    for event in scheduler.surface_mut().take_events() {
        match event {
            SurfaceEvent::Spawned(spawn) => println!(
                "[{clock:>9.3}s] spawn  {:<6} lane {} {:<6} {:>5}ms {} {:?}",
                spawn.id().to_string(),
                spawn.lane,
                spawn.mode.to_string(),
                spawn.duration_ms,
                spawn.color,
                spawn.text
            ),
            SurfaceEvent::Retired(id) => println!("[{clock:>9.3}s] retire {id}"),
            SurfaceEvent::Moved { .. } => {}
        }
    }
}

fn load_config(path: &Path) -> Result<SchedulerConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let config: SchedulerConfig = serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse config {}", path.display()))?;
    Ok(config)
}

/// Media position just past the whole second `second`
fn end_of_second_ms(second: u64) -> i64 {
    i64::try_from(second)
        .unwrap_or(i64::MAX)
        .saturating_add(1)
        .saturating_mul(1000)
}

fn secs_to_ms(secs: f64) -> i64 {
    (secs.max(0.0) * 1000.0).round() as i64
}

/// 0 (default) = warn, 1 (-v) = info, 2 (-vv) = debug, 3+ (-vvv) = trace
fn init_logging(verbosity: u8) {
    let default_level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp_millis()
        .init();
}
