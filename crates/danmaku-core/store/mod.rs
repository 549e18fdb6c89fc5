//! Comment store for the current media item
//!
//! Holds the validated comment set sorted by appearance time and answers
//! "which comments appear at this whole second" with two binary searches.
//! Fractional seconds are truncated before comparison on both sides.
//!
//! # Example
//!
//! ```rust
//! use danmaku_core::{CommentRecord, CommentStore};
//!
//! let mut store = CommentStore::new();
//! let report = store.load(vec![
//!     CommentRecord::new("late", 12.7),
//!     CommentRecord::new("early", 3.0),
//!     CommentRecord::new("", 5.0),
//! ]);
//! assert_eq!(report.accepted, 2);
//! assert_eq!(report.rejected, 1);
//! assert_eq!(store.lookup(12)[0].text, "late");
//! assert!(store.lookup(5).is_empty());
//! ```

use ahash::AHashSet;
use log::{debug, info};

use crate::model::CommentRecord;

/// Optional shaping applied while loading
///
/// Both limits keep comments by even sampling over the time-sorted list,
/// so a dense minute is thinned out instead of truncated. Text
/// uniqueness is applied first, in input order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct IngestPolicy {
    /// Keep only the first comment for each text, ignoring case and
    /// surrounding whitespace
    pub unique_texts: bool,
    /// Keep at most this many comments per playback minute
    pub max_per_minute: Option<usize>,
    /// Keep at most this many comments overall
    pub max_total: Option<usize>,
}

impl IngestPolicy {
    /// No shaping
    pub const UNLIMITED: Self = Self {
        unique_texts: false,
        max_per_minute: None,
        max_total: None,
    };
}

/// Outcome of a [`CommentStore::load`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoadReport {
    /// Records kept in the store
    pub accepted: usize,
    /// Malformed records dropped at ingestion
    pub rejected: usize,
    /// Valid records removed by the ingest policy
    pub sampled_out: usize,
}

/// Sorted comment set with per-second lookup
#[derive(Debug, Clone, Default)]
pub struct CommentStore {
    records: Vec<CommentRecord>,
    policy: IngestPolicy,
}

impl CommentStore {
    /// Create an empty store without ingest shaping
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store with the given ingest policy
    #[must_use]
    pub fn with_policy(policy: IngestPolicy) -> Self {
        Self {
            records: Vec::new(),
            policy,
        }
    }

    /// Current ingest policy
    #[must_use]
    pub const fn policy(&self) -> IngestPolicy {
        self.policy
    }

    /// Change the ingest policy; applies from the next load
    pub fn set_policy(&mut self, policy: IngestPolicy) {
        self.policy = policy;
    }

    /// Replace the active set
    ///
    /// Records with blank text or a negative time are dropped silently.
    /// Sorting is stable, so records sharing a time keep their input order.
    pub fn load<I>(&mut self, comments: I) -> LoadReport
    where
        I: IntoIterator<Item = CommentRecord>,
    {
        let mut report = LoadReport::default();
        let mut records: Vec<CommentRecord> = comments
            .into_iter()
            .filter(|record| match record.validate() {
                Ok(()) => true,
                Err(err) => {
                    debug!("Dropping comment at ingestion: {err}");
                    report.rejected += 1;
                    false
                }
            })
            .collect();
        let valid = records.len();
        if self.policy.unique_texts {
            let mut seen = AHashSet::new();
            records.retain(|record| seen.insert(record.text.trim().to_lowercase()));
        }
        records.sort_by(|a, b| a.appear_second.total_cmp(&b.appear_second));

        if let Some(limit) = self.policy.max_per_minute {
            records = sample_per_minute(records, limit);
        }
        if let Some(limit) = self.policy.max_total {
            records = sample_evenly(records, limit);
        }

        report.accepted = records.len();
        report.sampled_out = valid - records.len();
        self.records = records;
        info!(
            "Loaded {} comments ({} rejected, {} sampled out)",
            report.accepted, report.rejected, report.sampled_out
        );
        report
    }

    /// All records whose whole appearance second equals `second`
    #[must_use]
    pub fn lookup(&self, second: u64) -> &[CommentRecord] {
        let start = self
            .records
            .partition_point(|record| record.whole_second() < second);
        let end = self
            .records
            .partition_point(|record| record.whole_second() <= second);
        &self.records[start..end]
    }

    /// Clear the active set
    pub fn reset(&mut self) {
        self.records.clear();
    }

    /// Number of stored records
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All records in appearance order
    #[must_use]
    pub fn records(&self) -> &[CommentRecord] {
        &self.records
    }

    /// Whole second of the last stored record
    #[must_use]
    pub fn last_second(&self) -> Option<u64> {
        self.records.last().map(CommentRecord::whole_second)
    }
}

/// Keep `limit` items spread evenly over `items`
fn sample_evenly<T>(items: Vec<T>, limit: usize) -> Vec<T> {
    if items.len() <= limit {
        return items;
    }
    if limit == 0 {
        return Vec::new();
    }
    let step = items.len() as f64 / limit as f64;
    let last = items.len() - 1;
    let mut keep = vec![false; items.len()];
    for i in 0..limit {
        keep[((i as f64 * step) as usize).min(last)] = true;
    }
    items
        .into_iter()
        .zip(keep)
        .filter_map(|(item, kept)| kept.then_some(item))
        .collect()
}

/// Apply [`sample_evenly`] to each playback minute of a sorted list
fn sample_per_minute(records: Vec<CommentRecord>, limit: usize) -> Vec<CommentRecord> {
    let mut result = Vec::with_capacity(records.len());
    let mut group: Vec<CommentRecord> = Vec::new();
    let mut group_minute = None;

    for record in records {
        let minute = record.whole_second() / 60;
        if group_minute != Some(minute) {
            result.extend(sample_evenly(core::mem::take(&mut group), limit));
            group_minute = Some(minute);
        }
        group.push(record);
    }
    result.extend(sample_evenly(group, limit));
    result
}
