//! Per-process session statistics and the recent-process timeline.
//!
//! The store keeps two kinds of state: a keyed map of running accumulators
//! (one entry per lowercased process name seen this session) and a bounded
//! FIFO of full classified process snapshots, one per sampler tick. Every
//! 300 s the session is merged over the statistics loaded at startup and the
//! result replaces `process_statistics.json` atomically. The merge is
//! recomputed from scratch on every save, so periodic saves never
//! double-count a session.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::classify::{Classification, ProcessKind, classify};
use crate::clock::{iso_local_now, iso_utc, round2};
use crate::probe::RawSnapshot;
use crate::ring::Ring;

/// Most recent per-tick process snapshots kept in memory (one hour at 1 s).
pub const SNAPSHOT_CAP: usize = 3600;
/// Hard cap on distinct process names tracked in one session.
pub const MAX_TRACKED: usize = 10_000;
/// Persisted statistics document, relative to the data directory.
pub const STATS_FILE: &str = "process_statistics.json";

/// A process sample with its classification attached.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassifiedSample {
    pub pid: Option<u32>,
    pub name: String,
    pub cpu_percent: f64,
    pub ram_mb: f64,
    pub classification: Classification,
}

/// The full classified process list of one tick.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessSnapshot {
    pub timestamp: f64,
    pub iso_time: String,
    pub processes: Vec<ClassifiedSample>,
}

/// One point of a per-process timeline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimelinePoint {
    pub timestamp: f64,
    pub cpu_percent: f64,
    pub ram_mb: f64,
}

/// Lifetime totals for one process, as persisted on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessTotals {
    pub total_cpu_time: f64,
    pub total_ram_time: f64,
    pub peak_cpu: f64,
    pub peak_ram: f64,
    pub total_samples: u64,
    pub classification: Classification,
}

/// The on-disk statistics document (`process_statistics.json`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsDocument {
    pub total_runtime_seconds: f64,
    pub last_updated: String,
    pub processes: BTreeMap<String, ProcessTotals>,
}

/// A ranked row derived from merged totals; averages are computed on read.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessStanding {
    pub name: String,
    pub display_name: String,
    pub category: String,
    pub avg_cpu: f64,
    pub avg_ram_mb: f64,
    pub peak_cpu: f64,
    pub peak_ram_mb: f64,
    pub samples: u64,
}

/// Session overview over the merged (persisted + current) view.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub duration_seconds: f64,
    pub unique_processes: usize,
    pub top_cpu_consumers: Vec<ProcessStanding>,
    pub top_ram_consumers: Vec<ProcessStanding>,
    pub total_snapshots: usize,
}

/// Ranking key for [`ProcessStore::top_by`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMetric {
    Cpu,
    Ram,
}

/// Kind filter for [`ProcessStore::top_at`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessFilter {
    /// Programs and browsers.
    User,
    System,
    All,
}

impl ProcessFilter {
    fn admits(self, kind: ProcessKind) -> bool {
        match self {
            ProcessFilter::User => matches!(kind, ProcessKind::Program | ProcessKind::Browser),
            ProcessFilter::System => kind == ProcessKind::System,
            ProcessFilter::All => true,
        }
    }
}

/// Running accumulators for one process name within the current session.
#[derive(Debug, Clone)]
struct SessionEntry {
    total_cpu: f64,
    total_ram_mb: f64,
    peak_cpu: f64,
    peak_ram_mb: f64,
    samples: u64,
    first_seen: f64,
    last_seen: f64,
    classification: Classification,
}

struct StoreState {
    /// Totals loaded from disk at startup; never mutated during the session.
    base: BTreeMap<String, ProcessTotals>,
    base_runtime_seconds: f64,
    session: HashMap<String, SessionEntry>,
    session_start: f64,
    snapshots: Ring<ProcessSnapshot>,
}

/// Session store: a single writer (the sampler) feeds it via [`observe`];
/// any number of readers query it concurrently.
///
/// [`observe`]: ProcessStore::observe
pub struct ProcessStore {
    stats_path: PathBuf,
    max_tracked: usize,
    state: RwLock<StoreState>,
}

impl ProcessStore {
    /// Pure construction; no file is touched until [`load_base`] or
    /// [`save`] run.
    ///
    /// [`load_base`]: ProcessStore::load_base
    /// [`save`]: ProcessStore::save
    pub fn new(data_dir: &Path, max_tracked: usize, snapshot_cap: usize) -> Self {
        ProcessStore {
            stats_path: data_dir.join(STATS_FILE),
            max_tracked: max_tracked.max(1),
            state: RwLock::new(StoreState {
                base: BTreeMap::new(),
                base_runtime_seconds: 0.0,
                session: HashMap::new(),
                session_start: 0.0,
                snapshots: Ring::new(snapshot_cap),
            }),
        }
    }

    pub fn stats_path(&self) -> &Path {
        &self.stats_path
    }

    /// Load the persisted document if present and mark `now` as the session
    /// start. A missing file starts a fresh history; a malformed one is
    /// discarded with a warning.
    pub fn load_base(&self, now: f64) {
        let mut state = self.state.write().unwrap();
        state.session_start = now;
        state.base = BTreeMap::new();
        state.base_runtime_seconds = 0.0;
        match fs::read_to_string(&self.stats_path) {
            Ok(text) => match serde_json::from_str::<StatsDocument>(&text) {
                Ok(doc) => {
                    debug!(
                        "[store] loaded {} persisted processes ({:.0} s runtime)",
                        doc.processes.len(),
                        doc.total_runtime_seconds
                    );
                    state.base = doc.processes;
                    state.base_runtime_seconds = doc.total_runtime_seconds;
                }
                Err(err) => warn!("[store] discarding malformed {STATS_FILE}: {err}"),
            },
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => warn!("[store] could not read {STATS_FILE}: {err}"),
        }
    }

    /// Fold one tick's process list into the session accumulators and append
    /// the classified snapshot to the timeline.
    pub fn observe(&self, snap: &RawSnapshot) {
        let now = snap.timestamp;
        let mut state = self.state.write().unwrap();
        let mut classified = Vec::with_capacity(snap.processes.len());
        for sample in &snap.processes {
            let key = sample.name.trim().to_lowercase();
            if key.is_empty() {
                continue;
            }
            // Classify the raw name so the unknown fallback keeps its casing.
            let classification = classify(sample.name.trim());
            if !state.session.contains_key(&key) && state.session.len() >= self.max_tracked {
                evict_stalest(&mut state.session);
            }
            let entry = state.session.entry(key.clone()).or_insert_with(|| SessionEntry {
                total_cpu: 0.0,
                total_ram_mb: 0.0,
                peak_cpu: 0.0,
                peak_ram_mb: 0.0,
                samples: 0,
                first_seen: now,
                last_seen: now,
                classification: classification.clone(),
            });
            entry.total_cpu += sample.cpu_percent;
            entry.total_ram_mb += sample.ram_mb;
            entry.peak_cpu = entry.peak_cpu.max(sample.cpu_percent);
            entry.peak_ram_mb = entry.peak_ram_mb.max(sample.ram_mb);
            entry.samples += 1;
            entry.last_seen = now;
            entry.classification = classification.clone();
            classified.push(ClassifiedSample {
                pid: sample.pid,
                name: key,
                cpu_percent: sample.cpu_percent,
                ram_mb: sample.ram_mb,
                classification,
            });
        }
        state.snapshots.push(ProcessSnapshot {
            timestamp: now,
            iso_time: iso_utc(now),
            processes: classified,
        });
    }

    /// Lifetime view: persisted base with the current session folded in.
    /// Totals and sample counts are summed, peaks maxed, the session's
    /// classification wins.
    pub fn merged(&self) -> BTreeMap<String, ProcessTotals> {
        merged_of(&self.state.read().unwrap())
    }

    /// Write the merged statistics document, replacing the previous one
    /// atomically (temp file + rename in the same directory).
    pub fn save(&self, now: f64) -> io::Result<()> {
        let doc = {
            let state = self.state.read().unwrap();
            let mut processes = merged_of(&state);
            if processes.len() > self.max_tracked {
                retain_most_sampled(&mut processes, self.max_tracked);
            }
            StatsDocument {
                total_runtime_seconds: state.base_runtime_seconds
                    + (now - state.session_start).max(0.0),
                last_updated: iso_local_now(),
                processes,
            }
        };
        let text = serde_json::to_string_pretty(&doc).map_err(io::Error::other)?;
        let tmp = self.stats_path.with_extension("json.tmp");
        fs::write(&tmp, text)?;
        fs::rename(&tmp, &self.stats_path)?;
        Ok(())
    }

    /// Merged entries ranked by derived average, highest first. Entries with
    /// no samples are skipped, never reported with zero averages.
    pub fn top_by(&self, metric: SessionMetric, n: usize) -> Vec<ProcessStanding> {
        if n == 0 {
            return Vec::new();
        }
        let standings = standings_of(&merged_of(&self.state.read().unwrap()));
        ranked(standings, metric, n)
    }

    /// The snapshot closest in time to `t`; an exact tie picks the newer one.
    pub fn snapshot_at(&self, t: f64) -> Option<ProcessSnapshot> {
        let state = self.state.read().unwrap();
        let mut best: Option<(f64, &ProcessSnapshot)> = None;
        for snap in state.snapshots.iter() {
            let diff = (snap.timestamp - t).abs();
            match best {
                Some((best_diff, _)) if diff > best_diff => {}
                _ => best = Some((diff, snap)),
            }
        }
        best.map(|(_, snap)| snap.clone())
    }

    /// Top processes at a past instant: nearest snapshot, kind filter, then
    /// `cpu + 0.01 × ram_mb` descending.
    pub fn top_at(&self, t: f64, filter: ProcessFilter, n: usize) -> Vec<ClassifiedSample> {
        if n == 0 {
            return Vec::new();
        }
        let Some(snap) = self.snapshot_at(t) else {
            return Vec::new();
        };
        let mut procs: Vec<ClassifiedSample> = snap
            .processes
            .into_iter()
            .filter(|p| filter.admits(p.classification.kind))
            .collect();
        procs.sort_by(|a, b| {
            let score_a = a.cpu_percent + 0.01 * a.ram_mb;
            let score_b = b.cpu_percent + 0.01 * b.ram_mb;
            score_b
                .partial_cmp(&score_a)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.name.cmp(&b.name))
        });
        procs.truncate(n);
        procs
    }

    /// Usage of one process (lowercased name match) across the snapshots of
    /// the trailing window. One point per snapshot the process appears in.
    pub fn timeline(&self, name: &str, now: f64, window_secs: f64) -> Vec<TimelinePoint> {
        if window_secs <= 0.0 {
            return Vec::new();
        }
        let needle = name.trim().to_lowercase();
        let cutoff = now - window_secs;
        let state = self.state.read().unwrap();
        let mut points = Vec::new();
        for snap in state.snapshots.iter() {
            if snap.timestamp < cutoff {
                continue;
            }
            if let Some(proc) = snap.processes.iter().find(|p| p.name == needle) {
                points.push(TimelinePoint {
                    timestamp: snap.timestamp,
                    cpu_percent: proc.cpu_percent,
                    ram_mb: proc.ram_mb,
                });
            }
        }
        points
    }

    /// All snapshots with `a ≤ timestamp ≤ b` (bounds in either order),
    /// oldest first.
    pub fn snapshots_between(&self, a: f64, b: f64) -> Vec<ProcessSnapshot> {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let state = self.state.read().unwrap();
        state
            .snapshots
            .iter()
            .filter(|s| s.timestamp >= lo && s.timestamp <= hi)
            .cloned()
            .collect()
    }

    /// Overview of the merged view plus this session's wall-clock duration.
    /// Consumer lists are capped at 5.
    pub fn session_summary(&self, now: f64) -> SessionSummary {
        let state = self.state.read().unwrap();
        let merged = merged_of(&state);
        let standings = standings_of(&merged);
        SessionSummary {
            duration_seconds: round2((now - state.session_start).max(0.0)),
            unique_processes: merged.len(),
            top_cpu_consumers: ranked(standings.clone(), SessionMetric::Cpu, 5),
            top_ram_consumers: ranked(standings, SessionMetric::Ram, 5),
            total_snapshots: state.snapshots.len(),
        }
    }

    /// How long this session has observed `name` so far
    /// (`last_seen − first_seen`), if it has been seen at all.
    pub fn session_runtime(&self, name: &str) -> Option<f64> {
        let needle = name.trim().to_lowercase();
        let state = self.state.read().unwrap();
        state
            .session
            .get(&needle)
            .map(|e| (e.last_seen - e.first_seen).max(0.0))
    }

    /// Distinct process names seen this session.
    pub fn session_len(&self) -> usize {
        self.state.read().unwrap().session.len()
    }

    pub fn snapshots_len(&self) -> usize {
        self.state.read().unwrap().snapshots.len()
    }
}

/// Read a statistics document from disk; used by offline consumers.
pub fn load_stats(path: &Path) -> io::Result<StatsDocument> {
    let text = fs::read_to_string(path)?;
    serde_json::from_str(&text).map_err(io::Error::other)
}

fn merged_of(state: &StoreState) -> BTreeMap<String, ProcessTotals> {
    let mut merged = state.base.clone();
    for (name, entry) in &state.session {
        let slot = merged.entry(name.clone()).or_insert_with(|| ProcessTotals {
            total_cpu_time: 0.0,
            total_ram_time: 0.0,
            peak_cpu: 0.0,
            peak_ram: 0.0,
            total_samples: 0,
            classification: entry.classification.clone(),
        });
        slot.total_cpu_time += entry.total_cpu;
        slot.total_ram_time += entry.total_ram_mb;
        slot.peak_cpu = slot.peak_cpu.max(entry.peak_cpu);
        slot.peak_ram = slot.peak_ram.max(entry.peak_ram_mb);
        slot.total_samples += entry.samples;
        slot.classification = entry.classification.clone();
    }
    merged
}

fn standings_of(merged: &BTreeMap<String, ProcessTotals>) -> Vec<ProcessStanding> {
    merged
        .iter()
        .filter(|(_, totals)| totals.total_samples > 0)
        .map(|(name, totals)| {
            let samples = totals.total_samples as f64;
            ProcessStanding {
                name: name.clone(),
                display_name: totals.classification.display_name.clone(),
                category: totals.classification.category.clone(),
                avg_cpu: round2(totals.total_cpu_time / samples),
                avg_ram_mb: round2(totals.total_ram_time / samples),
                peak_cpu: totals.peak_cpu,
                peak_ram_mb: totals.peak_ram,
                samples: totals.total_samples,
            }
        })
        .collect()
}

fn ranked(
    mut standings: Vec<ProcessStanding>,
    metric: SessionMetric,
    n: usize,
) -> Vec<ProcessStanding> {
    standings.sort_by(|a, b| {
        let (key_a, key_b) = match metric {
            SessionMetric::Cpu => (a.avg_cpu, b.avg_cpu),
            SessionMetric::Ram => (a.avg_ram_mb, b.avg_ram_mb),
        };
        key_b
            .partial_cmp(&key_a)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.name.cmp(&b.name))
    });
    standings.truncate(n);
    standings
}

/// Drop the entry with the oldest `last_seen`, name as tie-break.
fn evict_stalest(session: &mut HashMap<String, SessionEntry>) {
    let victim = session
        .iter()
        .min_by(|(name_a, a), (name_b, b)| {
            a.last_seen
                .partial_cmp(&b.last_seen)
                .unwrap_or(Ordering::Equal)
                .then_with(|| name_a.cmp(name_b))
        })
        .map(|(name, _)| name.clone());
    if let Some(name) = victim {
        session.remove(&name);
    }
}

/// Keep the `cap` entries with the most samples, name as tie-break.
fn retain_most_sampled(processes: &mut BTreeMap<String, ProcessTotals>, cap: usize) {
    let mut order: Vec<(String, u64)> = processes
        .iter()
        .map(|(name, totals)| (name.clone(), totals.total_samples))
        .collect();
    order.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    let keep: HashSet<String> = order.into_iter().take(cap).map(|(name, _)| name).collect();
    processes.retain(|name, _| keep.contains(name));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::ProcessSample;
    use tempfile::tempdir;

    fn sample(name: &str, cpu: f64, ram_mb: f64) -> ProcessSample {
        ProcessSample {
            pid: None,
            name: name.to_string(),
            cpu_percent: cpu,
            ram_mb,
        }
    }

    fn snap(ts: f64, processes: Vec<ProcessSample>) -> RawSnapshot {
        RawSnapshot {
            timestamp: ts,
            cpu_percent: 0.0,
            ram_percent: 0.0,
            gpu_percent: 0.0,
            processes,
        }
    }

    fn fresh_store(dir: &Path) -> ProcessStore {
        let store = ProcessStore::new(dir, MAX_TRACKED, SNAPSHOT_CAP);
        store.load_base(1000.0);
        store
    }

    // -----------------------------------------------------------------------
    // accumulation and ranking
    // -----------------------------------------------------------------------

    #[test]
    fn test_observe_accumulates_totals_and_peaks() {
        let dir = tempdir().unwrap();
        let store = fresh_store(dir.path());
        store.observe(&snap(1000.0, vec![sample("chrome.exe", 10.0, 500.0)]));
        store.observe(&snap(1001.0, vec![sample("chrome.exe", 30.0, 700.0)]));

        let merged = store.merged();
        let chrome = &merged["chrome.exe"];
        assert_eq!(chrome.total_cpu_time, 40.0);
        assert_eq!(chrome.total_ram_time, 1200.0);
        assert_eq!(chrome.peak_cpu, 30.0);
        assert_eq!(chrome.peak_ram, 700.0);
        assert_eq!(chrome.total_samples, 2);
    }

    #[test]
    fn test_top_by_ranks_by_derived_average() {
        let dir = tempdir().unwrap();
        let store = fresh_store(dir.path());
        store.observe(&snap(1000.0, vec![
            sample("chrome.exe", 10.0, 900.0),
            sample("code.exe", 50.0, 300.0),
        ]));

        let by_cpu = store.top_by(SessionMetric::Cpu, 10);
        assert_eq!(by_cpu[0].name, "code.exe");
        assert_eq!(by_cpu[0].avg_cpu, 50.0);
        assert_eq!(by_cpu[0].display_name, "VS Code");

        let by_ram = store.top_by(SessionMetric::Ram, 10);
        assert_eq!(by_ram[0].name, "chrome.exe");
        assert_eq!(by_ram[0].avg_ram_mb, 900.0);

        assert!(store.top_by(SessionMetric::Cpu, 0).is_empty());
    }

    #[test]
    fn test_top_by_skips_entries_without_samples() {
        let dir = tempdir().unwrap();
        let ghost = ProcessTotals {
            total_cpu_time: 0.0,
            total_ram_time: 0.0,
            peak_cpu: 0.0,
            peak_ram: 0.0,
            total_samples: 0,
            classification: classify("ghost.exe"),
        };
        let doc = StatsDocument {
            total_runtime_seconds: 60.0,
            last_updated: "2025-01-16T00:00:00".to_string(),
            processes: BTreeMap::from([("ghost.exe".to_string(), ghost)]),
        };
        let path = dir.path().join(STATS_FILE);
        fs::write(&path, serde_json::to_string_pretty(&doc).unwrap()).unwrap();

        let store = fresh_store(dir.path());
        assert_eq!(store.merged().len(), 1);
        assert!(store.top_by(SessionMetric::Cpu, 10).is_empty());
    }

    // -----------------------------------------------------------------------
    // snapshots: top_at, timeline, ranges
    // -----------------------------------------------------------------------

    #[test]
    fn test_top_at_filters_and_orders() {
        let dir = tempdir().unwrap();
        let store = fresh_store(dir.path());
        store.observe(&snap(1000.0, vec![
            sample("chrome.exe", 10.0, 500.0),
            sample("svchost.exe", 5.0, 100.0),
            sample("code.exe", 8.0, 400.0),
        ]));

        // Scores: chrome 15.0, code 12.0, svchost 6.0.
        let all = store.top_at(1000.0, ProcessFilter::All, 10);
        let names: Vec<&str> = all.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["chrome.exe", "code.exe", "svchost.exe"]);

        let user = store.top_at(1000.0, ProcessFilter::User, 10);
        let names: Vec<&str> = user.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["chrome.exe", "code.exe"]);

        let system = store.top_at(1000.0, ProcessFilter::System, 10);
        assert_eq!(system.len(), 1);
        assert_eq!(system[0].name, "svchost.exe");
        assert!(system[0].classification.is_critical);

        assert!(store.top_at(1000.0, ProcessFilter::All, 0).is_empty());
    }

    #[test]
    fn test_top_at_on_empty_store_is_empty() {
        let dir = tempdir().unwrap();
        let store = fresh_store(dir.path());
        assert!(store.top_at(1000.0, ProcessFilter::All, 5).is_empty());
        assert!(store.snapshot_at(1000.0).is_none());
    }

    #[test]
    fn test_snapshot_at_prefers_newer_on_tie() {
        let dir = tempdir().unwrap();
        let store = fresh_store(dir.path());
        store.observe(&snap(1000.0, vec![sample("a.exe", 1.0, 1.0)]));
        store.observe(&snap(1010.0, vec![sample("b.exe", 1.0, 1.0)]));

        // 1005 is equidistant; the newer snapshot wins.
        let tied = store.snapshot_at(1005.0).unwrap();
        assert_eq!(tied.timestamp, 1010.0);

        let near = store.snapshot_at(1001.0).unwrap();
        assert_eq!(near.timestamp, 1000.0);
    }

    #[test]
    fn test_snapshot_cap_evicts_oldest() {
        let dir = tempdir().unwrap();
        let store = ProcessStore::new(dir.path(), MAX_TRACKED, 3);
        store.load_base(1000.0);
        for i in 0..5 {
            store.observe(&snap(1000.0 + i as f64, vec![sample("a.exe", 1.0, 1.0)]));
        }
        assert_eq!(store.snapshots_len(), 3);
        let kept = store.snapshots_between(0.0, 2000.0);
        assert_eq!(kept.first().unwrap().timestamp, 1002.0);
        assert_eq!(kept.last().unwrap().timestamp, 1004.0);
    }

    #[test]
    fn test_timeline_matches_name_within_window() {
        let dir = tempdir().unwrap();
        let store = fresh_store(dir.path());
        for i in 0..4 {
            let ts = 1000.0 + i as f64;
            store.observe(&snap(ts, vec![
                sample("chrome.exe", 10.0 + i as f64, 500.0),
                sample("svchost.exe", 1.0, 50.0),
            ]));
        }

        // Window of 2 s back from 1003 covers 1001..=1003.
        let points = store.timeline("CHROME.EXE", 1003.0, 2.0);
        assert_eq!(points.len(), 3);
        assert_eq!(points[0].timestamp, 1001.0);
        assert_eq!(points[2].cpu_percent, 13.0);

        assert!(store.timeline("chrome.exe", 1003.0, 0.0).is_empty());
        assert!(store.timeline("nope.exe", 1003.0, 60.0).is_empty());
    }

    #[test]
    fn test_snapshots_between_is_inclusive_and_order_insensitive() {
        let dir = tempdir().unwrap();
        let store = fresh_store(dir.path());
        for ts in [1000.0, 1001.0, 1002.0, 1003.0] {
            store.observe(&snap(ts, vec![sample("a.exe", 1.0, 1.0)]));
        }
        let range = store.snapshots_between(1001.0, 1002.0);
        assert_eq!(range.len(), 2);
        assert_eq!(range[0].timestamp, 1001.0);

        let swapped = store.snapshots_between(1002.0, 1001.0);
        assert_eq!(swapped.len(), 2);
    }

    // -----------------------------------------------------------------------
    // persistence
    // -----------------------------------------------------------------------

    #[test]
    fn test_save_writes_expected_document_shape() {
        let dir = tempdir().unwrap();
        let store = fresh_store(dir.path());
        store.observe(&snap(1000.0, vec![sample("chrome.exe", 80.0, 500.0)]));
        store.save(1060.0).unwrap();

        let text = fs::read_to_string(store.stats_path()).unwrap();
        let doc: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(doc["total_runtime_seconds"], 60.0);
        let chrome = &doc["processes"]["chrome.exe"];
        assert_eq!(chrome["total_cpu_time"], 80.0);
        assert_eq!(chrome["total_ram_time"], 500.0);
        assert_eq!(chrome["total_samples"], 1);
        assert_eq!(chrome["classification"]["type"], "browser");
        assert_eq!(chrome["classification"]["is_rival"], true);
        assert!(!dir.path().join("process_statistics.json.tmp").exists());
    }

    #[test]
    fn test_repeated_saves_do_not_double_count() {
        let dir = tempdir().unwrap();
        let store = fresh_store(dir.path());
        store.observe(&snap(1000.0, vec![sample("chrome.exe", 10.0, 100.0)]));
        store.save(1300.0).unwrap();
        store.save(1600.0).unwrap();

        let doc = load_stats(store.stats_path()).unwrap();
        assert_eq!(doc.processes["chrome.exe"].total_cpu_time, 10.0);
        assert_eq!(doc.processes["chrome.exe"].total_samples, 1);
        assert_eq!(doc.total_runtime_seconds, 600.0);
    }

    #[test]
    fn test_load_then_save_preserves_totals() {
        let dir = tempdir().unwrap();
        let first = fresh_store(dir.path());
        first.observe(&snap(1000.0, vec![sample("chrome.exe", 25.0, 250.0)]));
        first.save(1100.0).unwrap();
        let before = load_stats(first.stats_path()).unwrap();

        let reloaded = ProcessStore::new(dir.path(), MAX_TRACKED, SNAPSHOT_CAP);
        reloaded.load_base(5000.0);
        reloaded.save(5000.0).unwrap();
        let after = load_stats(reloaded.stats_path()).unwrap();

        assert_eq!(after.processes, before.processes);
        assert_eq!(after.total_runtime_seconds, before.total_runtime_seconds);
    }

    #[test]
    fn test_restart_merges_history() {
        let dir = tempdir().unwrap();
        let first = fresh_store(dir.path());
        first.observe(&snap(1000.0, vec![sample("chrome.exe", 10.0, 100.0)]));
        first.observe(&snap(1001.0, vec![sample("chrome.exe", 10.0, 100.0)]));
        first.save(1100.0).unwrap();

        let second = ProcessStore::new(dir.path(), MAX_TRACKED, SNAPSHOT_CAP);
        second.load_base(2000.0);
        second.observe(&snap(2000.0, vec![sample("chrome.exe", 30.0, 100.0)]));

        let merged = store_merged_chrome(&second);
        assert_eq!(merged.total_cpu_time, 50.0);
        assert_eq!(merged.total_samples, 3);
        assert_eq!(merged.peak_cpu, 30.0);

        let summary = second.session_summary(2005.0);
        assert_eq!(summary.duration_seconds, 5.0);
        assert_eq!(summary.top_cpu_consumers[0].name, "chrome.exe");
        // 50 / 3 = 16.666...
        assert_eq!(summary.top_cpu_consumers[0].avg_cpu, 16.67);
    }

    fn store_merged_chrome(store: &ProcessStore) -> ProcessTotals {
        store.merged().remove("chrome.exe").unwrap()
    }

    #[test]
    fn test_malformed_document_starts_fresh() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(STATS_FILE), "{not json").unwrap();
        let store = fresh_store(dir.path());
        assert!(store.merged().is_empty());
        store.observe(&snap(1000.0, vec![sample("a.exe", 1.0, 1.0)]));
        store.save(1001.0).unwrap();
        assert!(load_stats(store.stats_path()).is_ok());
    }

    // -----------------------------------------------------------------------
    // bounds and summaries
    // -----------------------------------------------------------------------

    #[test]
    fn test_tracked_name_cap_evicts_oldest_last_seen() {
        let dir = tempdir().unwrap();
        let store = ProcessStore::new(dir.path(), 3, SNAPSHOT_CAP);
        store.load_base(1000.0);
        store.observe(&snap(1000.0, vec![sample("a.exe", 1.0, 1.0)]));
        store.observe(&snap(1001.0, vec![sample("b.exe", 1.0, 1.0)]));
        store.observe(&snap(1002.0, vec![sample("c.exe", 1.0, 1.0)]));
        store.observe(&snap(1003.0, vec![sample("d.exe", 1.0, 1.0)]));

        assert_eq!(store.session_len(), 3);
        let merged = store.merged();
        assert!(!merged.contains_key("a.exe"));
        assert!(merged.contains_key("d.exe"));
    }

    #[test]
    fn test_session_summary_caps_consumer_lists() {
        let dir = tempdir().unwrap();
        let store = fresh_store(dir.path());
        let processes: Vec<ProcessSample> = (0..7)
            .map(|i| sample(&format!("p{i}.exe"), i as f64, 10.0))
            .collect();
        store.observe(&snap(1000.0, processes));

        let summary = store.session_summary(1030.0);
        assert_eq!(summary.unique_processes, 7);
        assert_eq!(summary.total_snapshots, 1);
        assert_eq!(summary.duration_seconds, 30.0);
        assert_eq!(summary.top_cpu_consumers.len(), 5);
        assert_eq!(summary.top_cpu_consumers[0].name, "p6.exe");
        assert_eq!(summary.top_ram_consumers.len(), 5);
    }

    #[test]
    fn test_session_runtime_is_span_of_observations() {
        let dir = tempdir().unwrap();
        let store = fresh_store(dir.path());
        store.observe(&snap(1000.0, vec![sample("chrome.exe", 1.0, 1.0)]));
        store.observe(&snap(1042.0, vec![sample("chrome.exe", 1.0, 1.0)]));
        assert_eq!(store.session_runtime("Chrome.EXE"), Some(42.0));
        assert_eq!(store.session_runtime("nope.exe"), None);
    }
}
