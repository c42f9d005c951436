//! `openusage run` — record machine usage until stopped.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use openusage_core::{AverageWindow, MachineInfo, MonitorConfig, SnapshotMetric, UsageMonitor};

use super::{fmt_mb, fmt_runtime, parse_duration};

/// Run the run command.
pub fn run(data_dir: &str, interval: &str, status_every: u64, duration: Option<&str>) {
    let interval = parse_duration(interval);
    let max_duration = duration.map(parse_duration);

    let mut config = MonitorConfig::at(data_dir);
    config.sample_interval = interval;

    // Set up Ctrl+C handler
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .expect("Error setting Ctrl+C handler");

    // Print session start info
    let machine = MachineInfo::collect();
    println!("Recording usage");
    println!(
        "  Machine:   {} {} ({})",
        machine.os, machine.os_version, machine.arch
    );
    println!(
        "  CPU:       {} ({} cores)",
        machine.cpu_model, machine.cpu_cores
    );
    println!("  RAM:       {}", fmt_mb(machine.total_ram_mb as f64));
    println!("  Interval:  {}ms", interval.as_millis());
    if let Some(d) = max_duration {
        println!("  Duration:  {}s", d.as_secs());
    } else {
        println!("  Duration:  until Ctrl+C");
    }
    println!("  Output:    {}", config.data_dir.display());
    println!();

    // Start the sampling thread
    let mut monitor = UsageMonitor::new(config);
    if let Err(e) = monitor.start() {
        eprintln!("Error opening data directory: {e}");
        std::process::exit(1);
    }
    let reader = monitor.reader();

    // Status loop; sampling happens on the monitor's thread
    let start = Instant::now();
    let status_interval = Duration::from_secs(status_every);
    let mut next_status = start + status_interval;

    while running.load(Ordering::SeqCst) {
        if let Some(max) = max_duration
            && start.elapsed() >= max
        {
            break;
        }

        if status_every > 0 && Instant::now() >= next_status {
            next_status += status_interval;
            if let Some(snap) = reader.latest() {
                let avg = reader.averages(AverageWindow::Now);
                let lead = reader
                    .top_now(SnapshotMetric::Cpu, 1)
                    .into_iter()
                    .next()
                    .map(|p| {
                        format!("  top {} {:.1}%", p.classification.display_name, p.cpu_percent)
                    })
                    .unwrap_or_default();
                println!(
                    "  [{:>7}] cpu {:5.1}% (30s {:5.1}%)  ram {:5.1}% (30s {:5.1}%){lead}",
                    fmt_runtime(start.elapsed().as_secs_f64()),
                    snap.cpu_percent,
                    avg.cpu,
                    snap.ram_percent,
                    avg.ram
                );
            }
        }

        std::thread::sleep(Duration::from_millis(100));
    }

    // Stop sampling and write the final statistics
    monitor.stop();

    let summary = reader.session_summary();
    let (now, hour, four) = reader.averages_overview();
    println!();
    println!(
        "Session finished after {}",
        fmt_runtime(summary.duration_seconds)
    );
    println!("  Averages:  30s cpu {:.1}%  ram {:.1}%", now.cpu, now.ram);
    println!("             1h  cpu {:.1}%  ram {:.1}%", hour.cpu, hour.ram);
    println!("             4h  cpu {:.1}%  ram {:.1}%", four.cpu, four.ram);
    println!(
        "  Processes: {} seen, {} snapshots kept",
        summary.unique_processes, summary.total_snapshots
    );
    if let Some(top) = summary.top_cpu_consumers.first() {
        println!(
            "  Top CPU:   {} (avg {:.1}%, peak {:.1}%)",
            top.display_name, top.avg_cpu, top.peak_cpu
        );
    }
    if let Some(top) = summary.top_ram_consumers.first() {
        println!(
            "  Top RAM:   {} (avg {}, peak {})",
            top.display_name,
            fmt_mb(top.avg_ram_mb),
            fmt_mb(top.peak_ram_mb)
        );
    }
    println!();
    println!("Data written to {}", monitor.config().data_dir.display());
    println!("  raw_usage.csv           — one row per sample");
    println!("  minute_avg.csv          — one row per completed minute");
    println!("  process_statistics.json — lifetime per-process totals");
}
