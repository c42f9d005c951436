//! Stateless math over the seconds ring.
//!
//! Everything here reads a window of [`SecondRow`]s and reduces it; nothing
//! holds state, so the same functions serve live history and journal
//! replays alike.

use serde::Serialize;

use crate::clock::round2;
use crate::ring::{SecondRow, UsageHistory};

/// Named averaging windows for the standard triple view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AverageWindow {
    /// Trailing 30 seconds.
    Now,
    OneHour,
    FourHours,
}

impl AverageWindow {
    pub fn seconds(self) -> f64 {
        match self {
            AverageWindow::Now => 30.0,
            AverageWindow::OneHour => 3600.0,
            AverageWindow::FourHours => 14_400.0,
        }
    }
}

/// Mean CPU / RAM / GPU over some window, rounded to 2 decimals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Averages {
    pub cpu: f64,
    pub ram: f64,
    pub gpu: f64,
}

impl Averages {
    pub const ZERO: Averages = Averages {
        cpu: 0.0,
        ram: 0.0,
        gpu: 0.0,
    };
}

/// Did the newest CPU sample jump relative to the mean of the samples
/// before it, and by how many percent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SpikeReport {
    pub spike: bool,
    pub change_pct: f64,
}

impl SpikeReport {
    const NONE: SpikeReport = SpikeReport {
        spike: false,
        change_pct: 0.0,
    };
}

/// Mean over rows with `timestamp >= now - window_secs`. An empty window
/// yields zeros, never an error.
pub fn average_over_seconds(history: &UsageHistory, now: f64, window_secs: f64) -> Averages {
    averages_of(&history.last_seconds(now, window_secs))
}

/// Mean over an explicit slice of rows; used for journal replays too.
pub fn averages_of(rows: &[SecondRow]) -> Averages {
    if rows.is_empty() {
        return Averages::ZERO;
    }
    let n = rows.len() as f64;
    let (mut cpu, mut ram, mut gpu) = (0.0, 0.0, 0.0);
    for row in rows {
        cpu += row.cpu_percent;
        ram += row.ram_percent;
        gpu += row.gpu_percent;
    }
    Averages {
        cpu: round2(cpu / n),
        ram: round2(ram / n),
        gpu: round2(gpu / n),
    }
}

/// The 30 s / 1 h / 4 h triple.
pub fn averages_now_1h_4h(history: &UsageHistory, now: f64) -> (Averages, Averages, Averages) {
    (
        average_over_seconds(history, now, AverageWindow::Now.seconds()),
        average_over_seconds(history, now, AverageWindow::OneHour.seconds()),
        average_over_seconds(history, now, AverageWindow::FourHours.seconds()),
    )
}

/// Compare the newest CPU value in the window against the mean of the
/// values before it. Fewer than 2 samples, or a preceding mean of zero,
/// reads as "no spike". An exact tie with the threshold counts as a spike.
pub fn detect_spike_last(
    history: &UsageHistory,
    now: f64,
    window_secs: f64,
    threshold_pct: f64,
) -> SpikeReport {
    spike_of(&history.last_seconds(now, window_secs), threshold_pct)
}

/// Spike check over an explicit slice of rows.
pub fn spike_of(rows: &[SecondRow], threshold_pct: f64) -> SpikeReport {
    if rows.len() < 2 {
        return SpikeReport::NONE;
    }
    let last = rows[rows.len() - 1].cpu_percent;
    let preceding = &rows[..rows.len() - 1];
    let prev_mean =
        preceding.iter().map(|r| r.cpu_percent).sum::<f64>() / preceding.len() as f64;
    if prev_mean == 0.0 {
        return SpikeReport::NONE;
    }
    let diff = (last - prev_mean) / prev_mean * 100.0;
    SpikeReport {
        spike: diff.abs() >= threshold_pct,
        change_pct: round2(diff),
    }
}

/// Slope-style indicator over a series: `(last - first) / len`. Fewer than
/// 2 points reads as flat.
pub fn simple_trend(series: &[f64]) -> f64 {
    if series.len() < 2 {
        return 0.0;
    }
    (series[series.len() - 1] - series[0]) / series.len() as f64
}
