//! Wall-clock access and time rendering.
//!
//! Sampling code never calls `SystemTime::now()` directly; everything goes
//! through the [`Clock`] trait so tests can crank time by hand and get
//! bit-identical output.

use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Local, Utc};

/// Wall-clock time as fractional seconds since the Unix epoch.
pub trait Clock: Send + Sync {
    fn now_epoch(&self) -> f64;
}

/// The real wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_epoch(&self) -> f64 {
        epoch_now()
    }
}

/// Hand-cranked clock for deterministic tests.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Mutex<f64>,
}

impl ManualClock {
    pub fn new(start: f64) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn set(&self, now: f64) {
        *self.now.lock().unwrap() = now;
    }

    pub fn advance(&self, secs: f64) {
        *self.now.lock().unwrap() += secs;
    }
}

impl Clock for ManualClock {
    fn now_epoch(&self) -> f64 {
        *self.now.lock().unwrap()
    }
}

/// Current wall time as fractional seconds since the Unix epoch.
pub fn epoch_now() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

/// UTC ISO-8601 at second precision, no timezone suffix:
/// `2025-01-16T04:00:00`. Non-finite input renders as the epoch.
pub fn iso_utc(epoch_secs: f64) -> String {
    let secs = if epoch_secs.is_finite() {
        epoch_secs.floor() as i64
    } else {
        0
    };
    match DateTime::<Utc>::from_timestamp(secs, 0) {
        Some(dt) => dt.format("%Y-%m-%dT%H:%M:%S").to_string(),
        None => "1970-01-01T00:00:00".to_string(),
    }
}

/// Local ISO-8601 at second precision. Used for human-facing metadata, not
/// for journal rows.
pub fn iso_local_now() -> String {
    Local::now().format("%Y-%m-%dT%H:%M:%S").to_string()
}

/// Round to 2 decimals (reported percentages and averages).
pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Round to 3 decimals (minute averages).
pub fn round3(v: f64) -> f64 {
    (v * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    // -----------------------------------------------------------------------
    // Clock impls
    // -----------------------------------------------------------------------

    #[test]
    fn test_system_clock_is_recent() {
        // Anything after 2020-01-01 counts as "the clock works".
        assert!(SystemClock.now_epoch() > 1_577_836_800.0);
    }

    #[test]
    fn test_manual_clock_set_and_advance() {
        let clock = ManualClock::new(1000.0);
        assert_eq!(clock.now_epoch(), 1000.0);
        clock.advance(2.5);
        assert_eq!(clock.now_epoch(), 1002.5);
        clock.set(50.0);
        assert_eq!(clock.now_epoch(), 50.0);
    }

    // -----------------------------------------------------------------------
    // ISO rendering
    // -----------------------------------------------------------------------

    #[test]
    fn test_iso_utc_epoch() {
        assert_eq!(iso_utc(0.0), "1970-01-01T00:00:00");
    }

    #[test]
    fn test_iso_utc_known_instant() {
        assert_eq!(iso_utc(1_737_000_000.0), "2025-01-16T04:00:00");
    }

    #[test]
    fn test_iso_utc_truncates_fraction() {
        assert_eq!(iso_utc(1_737_000_000.9), "2025-01-16T04:00:00");
    }

    #[test]
    fn test_iso_utc_non_finite() {
        assert_eq!(iso_utc(f64::NAN), "1970-01-01T00:00:00");
        assert_eq!(iso_utc(f64::INFINITY), "1970-01-01T00:00:00");
    }

    #[test]
    fn test_iso_local_shape() {
        let s = iso_local_now();
        // YYYY-MM-DDTHH:MM:SS
        assert_eq!(s.len(), 19);
        assert_eq!(&s[4..5], "-");
        assert_eq!(&s[10..11], "T");
    }

    // -----------------------------------------------------------------------
    // Rounding
    // -----------------------------------------------------------------------

    #[test]
    fn test_round2() {
        assert_eq!(round2(12.346), 12.35);
        assert_eq!(round2(12.344), 12.34);
        assert_eq!(round2(-0.016), -0.02);
        assert_eq!(round2(0.0), 0.0);
    }

    #[test]
    fn test_round3() {
        assert_eq!(round3(11.4716), 11.472);
        assert_eq!(round3(15.0), 15.0);
        assert_eq!(round3(0.0004), 0.0);
    }
}
