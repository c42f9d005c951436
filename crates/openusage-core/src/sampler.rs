//! The sampling loop.
//!
//! One tick: probe, append the second row to ring and journal, feed the
//! process store, and every 60th sample fold the trailing minute into the
//! minute ring and journal. All writes happen on the thread running the
//! loop; readers go through [`UsageHistory`] and
//! [`ProcessStore`](crate::store::ProcessStore) handles.
//!
//! Ticks are driven by snapshot timestamps, not by a separate clock read,
//! so a scripted probe makes the whole pipeline deterministic.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, info, warn};

use crate::analysis;
use crate::clock::{iso_utc, round3};
use crate::config::MonitorConfig;
use crate::journal::UsageJournal;
use crate::probe::PlatformProbe;
use crate::ring::{MinuteRow, SecondRow, UsageHistory};
use crate::store::ProcessStore;

/// Samples folded into one minute row.
pub const MINUTE_TICKS: u32 = 60;

/// Minimum gap between informational spike log lines.
const SPIKE_LOG_COOLDOWN_SECS: f64 = 300.0;

pub struct Sampler {
    probe: Box<dyn PlatformProbe>,
    history: Arc<UsageHistory>,
    journal: UsageJournal,
    store: Arc<ProcessStore>,
    persist_secs: f64,
    spike_log: bool,
    spike_window_secs: f64,
    spike_threshold_pct: f64,
    ticks_since_minute: u32,
    last_persist: Option<f64>,
    last_spike_log: f64,
}

impl Sampler {
    pub fn new(
        probe: Box<dyn PlatformProbe>,
        history: Arc<UsageHistory>,
        journal: UsageJournal,
        store: Arc<ProcessStore>,
        config: &MonitorConfig,
    ) -> Self {
        Sampler {
            probe,
            history,
            journal,
            store,
            persist_secs: config.persist_interval.as_secs_f64(),
            spike_log: config.spike_log,
            spike_window_secs: config.spike_window_secs,
            spike_threshold_pct: config.spike_threshold_pct,
            ticks_since_minute: 0,
            last_persist: None,
            last_spike_log: f64::NEG_INFINITY,
        }
    }

    /// One sampling iteration. Returns `false` when the probe had nothing,
    /// which skips the tick entirely; every other failure is logged and
    /// absorbed, the in-memory rings stay authoritative.
    pub fn tick(&mut self) -> bool {
        let snap = match self.probe.probe() {
            Ok(snap) => snap,
            Err(err) => {
                debug!("[sampler] probe unavailable: {err}");
                return false;
            }
        };
        let now = snap.timestamp;

        let row = SecondRow {
            timestamp: now,
            iso_time: iso_utc(now),
            cpu_percent: snap.cpu_percent,
            ram_percent: snap.ram_percent,
            gpu_percent: snap.gpu_percent,
        };
        if let Err(err) = self.journal.append_second(&row) {
            warn!("[sampler] second append failed: {err}");
        }
        self.history.push_second(row);
        self.store.observe(&snap);
        self.history.publish_latest(snap);

        self.ticks_since_minute += 1;
        if self.ticks_since_minute >= MINUTE_TICKS {
            self.commit_minute(now);
            self.ticks_since_minute = 0;
        }

        if self.spike_log {
            self.report_spike(now);
        }
        self.maybe_persist(now);
        true
    }

    /// Run ticks at `interval` until `stop` flips. Scheduling is
    /// boundary-based: lateness up to half a period is absorbed by a shorter
    /// sleep, anything worse drops tick boundaries instead of firing
    /// back-to-back.
    pub fn run_loop(&mut self, interval: Duration, stop: &AtomicBool) {
        let interval = if interval.is_zero() {
            Duration::from_millis(10)
        } else {
            interval
        };
        info!("[sampler] loop started, period {} ms", interval.as_millis());
        let mut next_tick = Instant::now();
        while !stop.load(Ordering::SeqCst) {
            self.tick();
            next_tick += interval;
            let now = Instant::now();
            let late = now.saturating_duration_since(next_tick);
            if late > interval / 2 {
                let mut dropped = 0u32;
                while next_tick <= now {
                    next_tick += interval;
                    dropped += 1;
                }
                warn!(
                    "[sampler] {} ms behind schedule, dropped {dropped} tick(s)",
                    late.as_millis()
                );
            }
            if !sleep_until(next_tick, stop) {
                break;
            }
        }
        info!("[sampler] loop stopped");
    }

    /// Mean of the 60 most recent second rows, stamped with the emission
    /// instant. Fewer rows than a full minute still average; none at all
    /// skips the row.
    fn commit_minute(&mut self, now: f64) {
        let window = self.history.last_n_seconds(MINUTE_TICKS as usize);
        if window.is_empty() {
            return;
        }
        let n = window.len() as f64;
        let (mut cpu, mut ram, mut gpu) = (0.0, 0.0, 0.0);
        for row in &window {
            cpu += row.cpu_percent;
            ram += row.ram_percent;
            gpu += row.gpu_percent;
        }
        let row = MinuteRow {
            minute_ts: now.floor() as i64,
            iso_time: iso_utc(now),
            cpu_avg: round3(cpu / n),
            ram_avg: round3(ram / n),
            gpu_avg: round3(gpu / n),
        };
        if let Err(err) = self.journal.append_minute(&row) {
            warn!("[sampler] minute append failed: {err}");
        }
        debug!("[sampler] minute {} committed, cpu {:.3}", row.minute_ts, row.cpu_avg);
        self.history.push_minute(row);
    }

    fn report_spike(&mut self, now: f64) {
        let report = analysis::detect_spike_last(
            &self.history,
            now,
            self.spike_window_secs,
            self.spike_threshold_pct,
        );
        if report.spike && now - self.last_spike_log >= SPIKE_LOG_COOLDOWN_SECS {
            info!(
                "[sampler] cpu spike: {:+.2}% against the trailing mean",
                report.change_pct
            );
            self.last_spike_log = now;
        }
    }

    /// Rewrite the statistics document once `persist_secs` of sampled time
    /// has passed. A failed save is retried on the next tick.
    fn maybe_persist(&mut self, now: f64) {
        match self.last_persist {
            None => self.last_persist = Some(now),
            Some(last) if now - last >= self.persist_secs => {
                match self.store.save(now) {
                    Ok(()) => {
                        debug!("[sampler] statistics saved");
                        self.last_persist = Some(now);
                    }
                    Err(err) => warn!("[sampler] statistics save failed: {err}"),
                }
            }
            Some(_) => {}
        }
    }
}

/// Sliced sleep so the stop flag is honored within ~10 ms. Returns `false`
/// when stopped.
fn sleep_until(deadline: Instant, stop: &AtomicBool) -> bool {
    const SLICE: Duration = Duration::from_millis(10);
    loop {
        if stop.load(Ordering::SeqCst) {
            return false;
        }
        let now = Instant::now();
        if now >= deadline {
            return true;
        }
        thread::sleep(SLICE.min(deadline - now));
    }
}
