//! # Danmaku Core
//!
//! Lane-based scheduler for time-synchronized scrolling comments
//! ("danmaku") drawn over video playback. Given a time-stamped comment set
//! and periodic playback position ticks, it spawns, animates and retires
//! overlay entities across a small number of horizontal lanes so that
//! concurrently visible comments do not collide, screen density stays
//! bounded and repeated text is suppressed.
//!
//! ## Features
//!
//! - **Collision-aware lanes**: free, safe-to-share and forced passes with
//!   an occupancy timeout as a safety net
//! - **Admission gates**: trailing dedup window and one-second density cap
//! - **Stale-proof completions**: per-lane generations make late animation
//!   callbacks harmless
//! - **Host-agnostic**: rendering goes through the [`RenderSurface`] trait
//!   and time through the [`Clock`] trait
//! - **Wire decoding**: server JSON payloads via the `wire` module
//!   (`serde` feature, on by default)
//!
//! ## Quick Start
//!
//! ```rust
//! use danmaku_core::{CommentRecord, DanmakuScheduler, RecordingSurface, SchedulerConfig};
//!
//! let surface = RecordingSurface::new(1920.0, 1080.0);
//! let mut scheduler = DanmakuScheduler::new(surface, SchedulerConfig::default())?;
//!
//! scheduler.load_comments(vec![
//!     CommentRecord::new("A", 10.0),
//!     CommentRecord::new("B", 10.0),
//!     CommentRecord::new("C", 10.0),
//! ]);
//! scheduler.on_position_update(10_000);
//!
//! let lanes: Vec<usize> = scheduler.surface().spawned().map(|s| s.lane).collect();
//! assert_eq!(lanes, vec![0, 1, 2]);
//! # Ok::<(), danmaku_core::DanmakuError>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod admission;
pub mod clock;
pub mod config;
pub mod lifecycle;
pub mod model;
pub mod scheduler;
pub mod store;
pub mod surface;
pub mod tracks;
pub mod utils;

#[cfg(feature = "serde")]
pub mod wire;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::SchedulerConfig;
pub use lifecycle::{EntityHandle, EntityId};
pub use model::{CommentRecord, Mode, Rgb};
pub use scheduler::{CompletionSender, DanmakuScheduler, SchedulerStats};
pub use store::{CommentStore, IngestPolicy, LoadReport};
pub use surface::{OverlaySpawn, RecordingSurface, RenderSurface, SurfaceError, SurfaceSize};
pub use utils::{DanmakuError, ErrorCategory, Result};

/// Crate version for runtime compatibility checks
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
