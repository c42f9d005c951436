pub mod history;
pub mod run;
pub mod summary;

use std::time::Duration;

/// Parse a human duration like "500ms", "30s", "15m", "2h".
/// A bare number is taken as seconds. Exits with an error on garbage input.
pub fn parse_duration(s: &str) -> Duration {
    let (num, unit_ms) = if let Some(stripped) = s.strip_suffix("ms") {
        (stripped, 1u64)
    } else if let Some(stripped) = s.strip_suffix('s') {
        (stripped, 1000)
    } else if let Some(stripped) = s.strip_suffix('m') {
        (stripped, 60_000)
    } else if let Some(stripped) = s.strip_suffix('h') {
        (stripped, 3_600_000)
    } else {
        (s, 1000)
    };
    let n: u64 = num.trim().parse().unwrap_or_else(|_| {
        eprintln!("Error: invalid duration '{s}' (try \"30s\", \"15m\", \"2h\")");
        std::process::exit(1);
    });
    Duration::from_millis(n * unit_ms)
}

/// Render a second count as "2h 05m 10s" / "5m 10s" / "42s".
pub fn fmt_runtime(secs: f64) -> String {
    let total = secs.max(0.0) as u64;
    let h = total / 3600;
    let m = (total % 3600) / 60;
    let s = total % 60;
    if h > 0 {
        format!("{h}h {m:02}m {s:02}s")
    } else if m > 0 {
        format!("{m}m {s:02}s")
    } else {
        format!("{s}s")
    }
}

/// Render a megabyte figure, switching to GB above 1024.
pub fn fmt_mb(mb: f64) -> String {
    if mb >= 1024.0 {
        format!("{:.1} GB", mb / 1024.0)
    } else {
        format!("{mb:.0} MB")
    }
}
