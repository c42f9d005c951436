//! Read-only facade over the live pipeline.
//!
//! A [`UsageReader`] is a cheap clone of three shared handles; any number of
//! them can query concurrently while the sampler writes. Every operation
//! degrades to an empty result on out-of-range input, none of them error.

use std::cmp::Ordering;
use std::sync::Arc;

use crate::analysis::{self, AverageWindow, Averages};
use crate::classify::classify;
use crate::clock::Clock;
use crate::probe::RawSnapshot;
use crate::ring::{MinuteRow, SecondRow, UsageHistory};
use crate::store::{
    ClassifiedSample, ProcessFilter, ProcessSnapshot, ProcessStanding, ProcessStore,
    SessionMetric, SessionSummary, TimelinePoint,
};

/// Ranking key for [`UsageReader::top_now`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotMetric {
    Cpu,
    Ram,
    /// `cpu_percent + ram_mb / 1024`.
    Combined,
}

/// Handle for consumers: UIs, CLIs, tests. Obtained from
/// [`UsageMonitor::reader`](crate::monitor::UsageMonitor::reader).
#[derive(Clone)]
pub struct UsageReader {
    history: Arc<UsageHistory>,
    store: Arc<ProcessStore>,
    clock: Arc<dyn Clock>,
}

impl UsageReader {
    pub fn new(
        history: Arc<UsageHistory>,
        store: Arc<ProcessStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        UsageReader {
            history,
            store,
            clock,
        }
    }

    /// The most recent snapshot, absent before the first successful tick.
    pub fn latest(&self) -> Option<RawSnapshot> {
        self.history.latest()
    }

    /// Second rows of the trailing window, oldest first.
    pub fn last_seconds(&self, window_secs: f64) -> Vec<SecondRow> {
        self.history
            .last_seconds(self.clock.now_epoch(), window_secs)
    }

    /// The `n` most recent second rows, oldest first.
    pub fn last_n_samples(&self, n: usize) -> Vec<SecondRow> {
        self.history.last_n_seconds(n)
    }

    /// The `n` most recent minute rows, oldest first.
    pub fn last_minutes(&self, n: usize) -> Vec<MinuteRow> {
        self.history.last_n_minutes(n)
    }

    /// Mean usage over one named window.
    pub fn averages(&self, window: AverageWindow) -> Averages {
        analysis::average_over_seconds(&self.history, self.clock.now_epoch(), window.seconds())
    }

    /// The 30 s / 1 h / 4 h triple in one pass.
    pub fn averages_overview(&self) -> (Averages, Averages, Averages) {
        analysis::averages_now_1h_4h(&self.history, self.clock.now_epoch())
    }

    /// Top processes of the snapshot nearest to `t`. See
    /// [`ProcessStore::top_at`].
    pub fn top_at(&self, t: f64, filter: ProcessFilter, n: usize) -> Vec<ClassifiedSample> {
        self.store.top_at(t, filter, n)
    }

    /// Merged session entries ranked by average. See
    /// [`ProcessStore::top_by`].
    pub fn top_by(&self, metric: SessionMetric, n: usize) -> Vec<ProcessStanding> {
        self.store.top_by(metric, n)
    }

    /// Top processes of the latest snapshot, classified on the fly.
    pub fn top_now(&self, metric: SnapshotMetric, n: usize) -> Vec<ClassifiedSample> {
        if n == 0 {
            return Vec::new();
        }
        let Some(snap) = self.history.latest() else {
            return Vec::new();
        };
        let mut procs: Vec<ClassifiedSample> = snap
            .processes
            .iter()
            .map(|p| {
                let name = p.name.trim().to_lowercase();
                let classification = classify(&name);
                ClassifiedSample {
                    pid: p.pid,
                    name,
                    cpu_percent: p.cpu_percent,
                    ram_mb: p.ram_mb,
                    classification,
                }
            })
            .collect();
        procs.sort_by(|a, b| {
            let key = |p: &ClassifiedSample| match metric {
                SnapshotMetric::Cpu => p.cpu_percent,
                SnapshotMetric::Ram => p.ram_mb,
                SnapshotMetric::Combined => p.cpu_percent + p.ram_mb / 1024.0,
            };
            key(b)
                .partial_cmp(&key(a))
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.name.cmp(&b.name))
        });
        procs.truncate(n);
        procs
    }

    /// One process's usage across the trailing window of snapshots.
    pub fn timeline(&self, name: &str, window_secs: f64) -> Vec<TimelinePoint> {
        self.store
            .timeline(name, self.clock.now_epoch(), window_secs)
    }

    /// Process snapshots within `[a, b]`, oldest first.
    pub fn snapshots_between(&self, a: f64, b: f64) -> Vec<ProcessSnapshot> {
        self.store.snapshots_between(a, b)
    }

    /// Merged-view overview of the session so far.
    pub fn session_summary(&self) -> SessionSummary {
        self.store.session_summary(self.clock.now_epoch())
    }
}
