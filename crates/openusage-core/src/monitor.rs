//! Monitor lifecycle.
//!
//! [`UsageMonitor`] wires the pieces together and owns the sampler thread.
//! Construction is pure; nothing is probed and no file is touched until
//! [`start`](UsageMonitor::start).

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;

use log::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::MonitorConfig;
use crate::journal::UsageJournal;
use crate::probe::{PlatformProbe, SystemProbe};
use crate::query::UsageReader;
use crate::ring::UsageHistory;
use crate::sampler::Sampler;
use crate::store::ProcessStore;

pub struct UsageMonitor {
    config: MonitorConfig,
    clock: Arc<dyn Clock>,
    history: Arc<UsageHistory>,
    store: Arc<ProcessStore>,
    probe_slot: Option<Box<dyn PlatformProbe>>,
    stop: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl UsageMonitor {
    /// Monitor backed by the real system probe and wall clock.
    pub fn new(config: MonitorConfig) -> Self {
        Self::with_parts(config, Box::new(SystemProbe::new()), Arc::new(SystemClock))
    }

    /// Monitor with a custom probe on the wall clock.
    pub fn with_probe(config: MonitorConfig, probe: Box<dyn PlatformProbe>) -> Self {
        Self::with_parts(config, probe, Arc::new(SystemClock))
    }

    /// Fully explicit wiring; what the tests use.
    pub fn with_parts(
        config: MonitorConfig,
        probe: Box<dyn PlatformProbe>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let history = Arc::new(UsageHistory::new(config.seconds_cap, config.minutes_cap));
        let store = Arc::new(ProcessStore::new(
            &config.data_dir,
            config.max_tracked,
            config.snapshot_cap,
        ));
        UsageMonitor {
            config,
            clock,
            history,
            store,
            probe_slot: Some(probe),
            stop: Arc::new(AtomicBool::new(false)),
            worker: None,
        }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    /// A read handle sharing this monitor's state. Cheap; take as many as
    /// needed.
    pub fn reader(&self) -> UsageReader {
        UsageReader::new(self.history.clone(), self.store.clone(), self.clock.clone())
    }

    /// Create the data directory and journals, load persisted statistics,
    /// and spawn the sampler thread. Calling it again while running is a
    /// no-op. A monitor samples at most once; after [`stop`](UsageMonitor::stop)
    /// a fresh instance is needed.
    pub fn start(&mut self) -> io::Result<()> {
        if self.worker.is_some() {
            debug!("[monitor] start ignored, already running");
            return Ok(());
        }
        let journal = UsageJournal::create(&self.config.data_dir)?;
        let Some(probe) = self.probe_slot.take() else {
            warn!("[monitor] start ignored, this monitor already ran");
            return Ok(());
        };
        self.store.load_base(self.clock.now_epoch());
        self.stop.store(false, Ordering::SeqCst);

        let mut sampler = Sampler::new(
            probe,
            self.history.clone(),
            journal,
            self.store.clone(),
            &self.config,
        );
        let interval = self.config.sample_interval;
        let stop = self.stop.clone();
        let handle = std::thread::Builder::new()
            .name("openusage-sampler".to_string())
            .spawn(move || sampler.run_loop(interval, &stop))?;
        self.worker = Some(handle);
        info!(
            "[monitor] started, data dir {}",
            self.config.data_dir.display()
        );
        Ok(())
    }

    /// Flip the stop flag, join the sampler, and write the statistics
    /// document one last time. The join returns within roughly one tick
    /// period plus the current probe call. No-op when not running.
    pub fn stop(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };
        self.stop.store(true, Ordering::SeqCst);
        if worker.join().is_err() {
            warn!("[monitor] sampler thread panicked");
        }
        if let Err(err) = self.store.save(self.clock.now_epoch()) {
            warn!("[monitor] final statistics save failed: {err}");
        }
        info!("[monitor] stopped");
    }
}

impl Drop for UsageMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::probe::{ProcessSample, RawSnapshot, ScriptedProbe};
    use std::fs;
    use std::time::Duration;
    use tempfile::tempdir;

    fn snap(ts: f64, cpu: f64) -> RawSnapshot {
        RawSnapshot {
            timestamp: ts,
            cpu_percent: cpu,
            ram_percent: 50.0,
            gpu_percent: 0.0,
            processes: vec![ProcessSample {
                pid: Some(7),
                name: "chrome.exe".to_string(),
                cpu_percent: cpu,
                ram_mb: 512.0,
            }],
        }
    }

    fn scripted_monitor(dir: &std::path::Path) -> UsageMonitor {
        let mut config = MonitorConfig::at(dir);
        config.sample_interval = Duration::from_millis(5);
        let script: Vec<RawSnapshot> = (0..500).map(|i| snap(1000.0 + i as f64, 10.0)).collect();
        UsageMonitor::with_parts(
            config,
            Box::new(ScriptedProbe::new(script)),
            Arc::new(ManualClock::new(1000.0)),
        )
    }

    // -----------------------------------------------------------------------
    // lifecycle
    // -----------------------------------------------------------------------

    #[test]
    fn test_construction_touches_nothing() {
        let dir = tempdir().unwrap();
        let data = dir.path().join("data");
        let monitor = UsageMonitor::with_parts(
            MonitorConfig::at(&data),
            Box::new(ScriptedProbe::new(Vec::new())),
            Arc::new(ManualClock::new(1000.0)),
        );
        assert!(!monitor.is_running());
        assert!(!data.exists());
    }

    #[test]
    fn test_start_stop_round_trip() {
        let dir = tempdir().unwrap();
        let mut monitor = scripted_monitor(dir.path());
        monitor.start().unwrap();
        assert!(monitor.is_running());
        monitor.start().unwrap(); // second start is a no-op

        std::thread::sleep(Duration::from_millis(60));
        monitor.stop();
        assert!(!monitor.is_running());
        monitor.stop(); // and so is a second stop

        let reader = monitor.reader();
        assert!(reader.latest().is_some());
        assert!(!reader.last_n_samples(10).is_empty());
        assert!(dir.path().join("raw_usage.csv").exists());
        // stop() writes the document even before the periodic timer fires
        assert!(dir.path().join("process_statistics.json").exists());

        // the probe was consumed; a relaunch stays idle
        monitor.start().unwrap();
        assert!(!monitor.is_running());
    }

    #[test]
    fn test_stop_before_start_is_noop() {
        let dir = tempdir().unwrap();
        let mut monitor = scripted_monitor(dir.path());
        monitor.stop();
        assert!(!monitor.is_running());
        assert!(!dir.path().join("raw_usage.csv").exists());
    }

    #[test]
    fn test_drop_stops_and_saves() {
        let dir = tempdir().unwrap();
        {
            let mut monitor = scripted_monitor(dir.path());
            monitor.start().unwrap();
            std::thread::sleep(Duration::from_millis(30));
        }
        assert!(dir.path().join("process_statistics.json").exists());
    }

    #[test]
    fn test_start_propagates_unusable_data_dir() {
        let dir = tempdir().unwrap();
        let blocked = dir.path().join("blocked");
        fs::write(&blocked, "not a directory").unwrap();
        let mut monitor = UsageMonitor::with_parts(
            MonitorConfig::at(&blocked),
            Box::new(ScriptedProbe::new(Vec::new())),
            Arc::new(ManualClock::new(1000.0)),
        );
        assert!(monitor.start().is_err());
        assert!(!monitor.is_running());
    }
}
