//! Bounded in-memory usage history.
//!
//! Two FIFO rings hold recent history at two resolutions: per-second rows
//! for the last four hours, per-minute averages for the last day. The
//! sampler is the only writer; readers take shared guards and receive
//! newest-last copies, so a query never observes a torn row.

use std::collections::VecDeque;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use crate::probe::RawSnapshot;

/// Per-second rows kept in memory: 4 hours.
pub const SECONDS_CAP: usize = 4 * 3600;
/// Per-minute rows kept in memory: 24 hours.
pub const MINUTES_CAP: usize = 24 * 60;

/// One sampled second, as journaled to `raw_usage.csv`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecondRow {
    pub timestamp: f64,
    pub iso_time: String,
    pub cpu_percent: f64,
    pub ram_percent: f64,
    pub gpu_percent: f64,
}

/// One aggregated minute, as journaled to `minute_avg.csv`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinuteRow {
    pub minute_ts: i64,
    pub iso_time: String,
    pub cpu_avg: f64,
    pub ram_avg: f64,
    pub gpu_avg: f64,
}

/// Fixed-capacity FIFO: push at the tail, evict from the head.
#[derive(Debug)]
pub struct Ring<T> {
    buf: VecDeque<T>,
    cap: usize,
}

impl<T: Clone> Ring<T> {
    pub fn new(cap: usize) -> Self {
        Self {
            buf: VecDeque::new(),
            cap: cap.max(1),
        }
    }

    pub fn push(&mut self, item: T) {
        if self.buf.len() == self.cap {
            self.buf.pop_front();
        }
        self.buf.push_back(item);
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.cap
    }

    /// The last `n` items, oldest first. `n == 0` yields nothing.
    pub fn tail(&self, n: usize) -> Vec<T> {
        let skip = self.buf.len().saturating_sub(n);
        self.buf.iter().skip(skip).cloned().collect()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> {
        self.buf.iter()
    }
}

/// Shared usage history: the seconds ring, the minutes ring, and the most
/// recent raw snapshot. The sampler writes; any number of readers read.
#[derive(Debug)]
pub struct UsageHistory {
    seconds: RwLock<Ring<SecondRow>>,
    minutes: RwLock<Ring<MinuteRow>>,
    latest: RwLock<Option<RawSnapshot>>,
}

impl UsageHistory {
    pub fn new(seconds_cap: usize, minutes_cap: usize) -> Self {
        Self {
            seconds: RwLock::new(Ring::new(seconds_cap)),
            minutes: RwLock::new(Ring::new(minutes_cap)),
            latest: RwLock::new(None),
        }
    }

    pub fn with_default_caps() -> Self {
        Self::new(SECONDS_CAP, MINUTES_CAP)
    }

    // -- writer side (sampler only) --

    pub(crate) fn publish_latest(&self, snap: RawSnapshot) {
        *self.latest.write().unwrap() = Some(snap);
    }

    pub(crate) fn push_second(&self, row: SecondRow) {
        self.seconds.write().unwrap().push(row);
    }

    pub(crate) fn push_minute(&self, row: MinuteRow) {
        self.minutes.write().unwrap().push(row);
    }

    // -- reader side --

    /// The newest published snapshot; `None` before the first tick.
    pub fn latest(&self) -> Option<RawSnapshot> {
        self.latest.read().unwrap().clone()
    }

    pub fn seconds_len(&self) -> usize {
        self.seconds.read().unwrap().len()
    }

    pub fn minutes_len(&self) -> usize {
        self.minutes.read().unwrap().len()
    }

    /// Rows with `timestamp >= now - window_secs`, newest last. Non-positive
    /// windows yield nothing.
    pub fn last_seconds(&self, now: f64, window_secs: f64) -> Vec<SecondRow> {
        if window_secs <= 0.0 {
            return Vec::new();
        }
        let cutoff = now - window_secs;
        let ring = self.seconds.read().unwrap();
        let mut rows: Vec<SecondRow> = ring
            .iter()
            .rev()
            .take_while(|r| r.timestamp >= cutoff)
            .cloned()
            .collect();
        rows.reverse();
        rows
    }

    /// The last `n` second rows, newest last.
    pub fn last_n_seconds(&self, n: usize) -> Vec<SecondRow> {
        self.seconds.read().unwrap().tail(n)
    }

    /// The last `n` minute rows, newest last.
    pub fn last_n_minutes(&self, n: usize) -> Vec<MinuteRow> {
        self.minutes.read().unwrap().tail(n)
    }
}
