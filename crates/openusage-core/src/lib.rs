//! # openusage-core
//!
//! **Desktop usage telemetry with bounded memory and plain-file output.**
//!
//! `openusage-core` samples system and per-process resource usage once a
//! second, keeps multi-resolution in-memory history (4 h of seconds, 24 h of
//! minutes, 1 h of process snapshots), appends every row to CSV journals,
//! and accumulates per-process session statistics that survive restarts via
//! a JSON document.
//!
//! ## Quick Start
//!
//! ```no_run
//! use openusage_core::{AverageWindow, MonitorConfig, UsageMonitor};
//!
//! let mut monitor = UsageMonitor::new(MonitorConfig::at("openusage-data"));
//! monitor.start().expect("data dir must be writable");
//!
//! let reader = monitor.reader();
//! std::thread::sleep(std::time::Duration::from_secs(5));
//! if let Some(snap) = reader.latest() {
//!     let avg = reader.averages(AverageWindow::Now);
//!     println!(
//!         "cpu {:.1}% (30 s avg {:.1}%)  ram {:.1}%",
//!         snap.cpu_percent, avg.cpu, snap.ram_percent
//!     );
//! }
//! monitor.stop();
//! ```
//!
//! ## Architecture
//!
//! Probe → Sampler → {seconds ring, raw CSV, process store} → every 60th
//! sample → {minutes ring, minute CSV}. Reads go through [`UsageReader`],
//! which shares the rings and the store with the sampler thread; nothing a
//! reader does can block a tick for long.
//!
//! The probe and the clock are traits ([`PlatformProbe`], [`Clock`]), so the
//! whole pipeline runs deterministically under a scripted probe in tests.
//! The real probe is backed by `sysinfo`.

pub mod analysis;
pub mod classify;
pub mod clock;
pub mod config;
pub mod journal;
pub mod monitor;
pub mod probe;
pub mod query;
pub mod ring;
pub mod sampler;
pub mod store;

pub use analysis::{
    AverageWindow, Averages, SpikeReport, average_over_seconds, averages_now_1h_4h, averages_of,
    detect_spike_last, simple_trend, spike_of,
};
pub use classify::{
    Classification, ProcessKind, classify, describe, is_system_process, is_user_process,
};
pub use clock::{Clock, ManualClock, SystemClock, epoch_now, iso_local_now, iso_utc};
pub use config::MonitorConfig;
pub use journal::{MINUTE_AVG_FILE, RAW_USAGE_FILE, UsageJournal};
pub use monitor::UsageMonitor;
pub use probe::{
    MachineInfo, PlatformProbe, ProbeError, ProcessSample, RawSnapshot, ScriptedProbe,
    SystemProbe,
};
pub use query::{SnapshotMetric, UsageReader};
pub use ring::{MINUTES_CAP, MinuteRow, Ring, SECONDS_CAP, SecondRow, UsageHistory};
pub use store::{
    ClassifiedSample, MAX_TRACKED, ProcessFilter, ProcessSnapshot, ProcessStanding,
    ProcessStore, ProcessTotals, SNAPSHOT_CAP, STATS_FILE, SessionMetric, SessionSummary,
    StatsDocument, TimelinePoint, load_stats,
};

/// Library version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
