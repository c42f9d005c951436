//! Append-only CSV journals.
//!
//! Two files mirror the in-memory rings: `raw_usage.csv` gets one row per
//! sampled second, `minute_avg.csv` one row per aggregated minute. Appends
//! open the file fresh each time (the core is the sole writer) and are
//! best-effort: the ring stays authoritative, a failed write costs one row
//! of durability and a warning.

use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use log::warn;

use crate::ring::{MinuteRow, SecondRow};

pub const RAW_USAGE_FILE: &str = "raw_usage.csv";
pub const MINUTE_AVG_FILE: &str = "minute_avg.csv";

const RAW_HEADER: &str = "timestamp,iso_time,cpu_percent,ram_percent,gpu_percent";
const MINUTE_HEADER: &str = "minute_ts,iso_time,cpu_avg,ram_avg,gpu_avg";

/// The two usage journals of one data directory.
#[derive(Debug, Clone)]
pub struct UsageJournal {
    raw_path: PathBuf,
    minute_path: PathBuf,
}

impl UsageJournal {
    /// Binds the journal to `dir`, creating the directory and both files
    /// (with headers) if absent. Existing files are left untouched.
    pub fn create(dir: &Path) -> io::Result<Self> {
        std::fs::create_dir_all(dir)?;
        let journal = Self::open(dir);
        ensure_header(&journal.raw_path, RAW_HEADER)?;
        ensure_header(&journal.minute_path, MINUTE_HEADER)?;
        Ok(journal)
    }

    /// Binds to `dir` without touching the filesystem. Readers of an existing
    /// data directory use this; a missing file surfaces as `NotFound` on read.
    pub fn open(dir: &Path) -> Self {
        Self {
            raw_path: dir.join(RAW_USAGE_FILE),
            minute_path: dir.join(MINUTE_AVG_FILE),
        }
    }

    pub fn raw_path(&self) -> &Path {
        &self.raw_path
    }

    pub fn minute_path(&self) -> &Path {
        &self.minute_path
    }

    /// Appends one second row. The error is handed back for the caller to
    /// log; the in-memory ring is authoritative either way.
    ///
    /// Floats are written in shortest-roundtrip form with a guaranteed
    /// decimal point (`1737000000.0`, not `1737000000`), matching the
    /// journal format consumers already parse.
    pub fn append_second(&self, row: &SecondRow) -> io::Result<()> {
        let mut f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.raw_path)?;
        writeln!(
            f,
            "{:?},{},{:?},{:?},{:?}",
            row.timestamp, row.iso_time, row.cpu_percent, row.ram_percent, row.gpu_percent
        )
    }

    /// Appends one minute row; averages carry exactly three decimals.
    pub fn append_minute(&self, row: &MinuteRow) -> io::Result<()> {
        let mut f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.minute_path)?;
        writeln!(
            f,
            "{},{},{:.3},{:.3},{:.3}",
            row.minute_ts, row.iso_time, row.cpu_avg, row.ram_avg, row.gpu_avg
        )
    }

    /// Replays `raw_usage.csv` into rows. The header and malformed lines are
    /// skipped; skipped data lines are counted in the log.
    pub fn read_seconds(&self) -> io::Result<Vec<SecondRow>> {
        let file = File::open(&self.raw_path)?;
        let mut rows = Vec::new();
        let mut malformed = 0usize;
        for (idx, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            if idx == 0 && line.starts_with("timestamp") {
                continue;
            }
            if line.trim().is_empty() {
                continue;
            }
            match parse_second_row(&line) {
                Some(row) => rows.push(row),
                None => malformed += 1,
            }
        }
        if malformed > 0 {
            warn!(
                "[journal] skipped {malformed} malformed line(s) in {}",
                self.raw_path.display()
            );
        }
        Ok(rows)
    }

    /// Replays `minute_avg.csv` into rows, with the same header and
    /// malformed-line handling as [`read_seconds`](Self::read_seconds).
    pub fn read_minutes(&self) -> io::Result<Vec<MinuteRow>> {
        let file = File::open(&self.minute_path)?;
        let mut rows = Vec::new();
        let mut malformed = 0usize;
        for (idx, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            if idx == 0 && line.starts_with("minute_ts") {
                continue;
            }
            if line.trim().is_empty() {
                continue;
            }
            match parse_minute_row(&line) {
                Some(row) => rows.push(row),
                None => malformed += 1,
            }
        }
        if malformed > 0 {
            warn!(
                "[journal] skipped {malformed} malformed line(s) in {}",
                self.minute_path.display()
            );
        }
        Ok(rows)
    }
}

fn ensure_header(path: &Path, header: &str) -> io::Result<()> {
    if path.exists() {
        return Ok(());
    }
    let mut f = File::create(path)?;
    writeln!(f, "{header}")
}

fn parse_second_row(line: &str) -> Option<SecondRow> {
    let mut parts = line.splitn(5, ',');
    let timestamp = parts.next()?.trim().parse().ok()?;
    let iso_time = parts.next()?.trim().to_string();
    let cpu_percent = parts.next()?.trim().parse().ok()?;
    let ram_percent = parts.next()?.trim().parse().ok()?;
    let gpu_percent = parts.next()?.trim().parse().ok()?;
    Some(SecondRow {
        timestamp,
        iso_time,
        cpu_percent,
        ram_percent,
        gpu_percent,
    })
}

fn parse_minute_row(line: &str) -> Option<MinuteRow> {
    let mut parts = line.splitn(5, ',');
    let minute_ts = parts.next()?.trim().parse().ok()?;
    let iso_time = parts.next()?.trim().to_string();
    let cpu_avg = parts.next()?.trim().parse().ok()?;
    let ram_avg = parts.next()?.trim().parse().ok()?;
    let gpu_avg = parts.next()?.trim().parse().ok()?;
    Some(MinuteRow {
        minute_ts,
        iso_time,
        cpu_avg,
        ram_avg,
        gpu_avg,
    })
}
