//! Monitor configuration.

use std::path::PathBuf;
use std::time::Duration;

use crate::ring::{MINUTES_CAP, SECONDS_CAP};
use crate::store::{MAX_TRACKED, SNAPSHOT_CAP};

/// Settings for one monitor instance. Plain data; pass it to
/// [`UsageMonitor::new`](crate::monitor::UsageMonitor::new).
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Directory for the CSV logs and the statistics document.
    pub data_dir: PathBuf,
    /// Sampler tick period.
    pub sample_interval: Duration,
    /// Capacity of the per-second ring.
    pub seconds_cap: usize,
    /// Capacity of the per-minute ring.
    pub minutes_cap: usize,
    /// Capacity of the process snapshot timeline.
    pub snapshot_cap: usize,
    /// Cap on distinct process names tracked per session.
    pub max_tracked: usize,
    /// How often the statistics document is rewritten.
    pub persist_interval: Duration,
    /// Log informational CPU spike reports.
    pub spike_log: bool,
    /// Window fed to spike detection, in seconds.
    pub spike_window_secs: f64,
    /// Relative CPU change treated as a spike, in percent.
    pub spike_threshold_pct: f64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        MonitorConfig {
            data_dir: PathBuf::from("openusage-data"),
            sample_interval: Duration::from_secs(1),
            seconds_cap: SECONDS_CAP,
            minutes_cap: MINUTES_CAP,
            snapshot_cap: SNAPSHOT_CAP,
            max_tracked: MAX_TRACKED,
            persist_interval: Duration::from_secs(300),
            spike_log: true,
            spike_window_secs: 30.0,
            spike_threshold_pct: 50.0,
        }
    }
}

impl MonitorConfig {
    /// Defaults with the data directory replaced.
    pub fn at(data_dir: impl Into<PathBuf>) -> Self {
        MonitorConfig {
            data_dir: data_dir.into(),
            ..MonitorConfig::default()
        }
    }
}
