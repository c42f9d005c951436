//! `openusage summary` — lifetime process statistics from a data directory.

use std::cmp::Ordering;
use std::path::Path;

use openusage_core::{ProcessTotals, STATS_FILE, is_user_process, load_stats};

use super::{fmt_mb, fmt_runtime};

/// Run the summary command.
pub fn run(data_dir: &str, top: usize, json: bool) {
    let path = Path::new(data_dir).join(STATS_FILE);
    let doc = match load_stats(&path) {
        Ok(doc) => doc,
        Err(e) => {
            eprintln!("Error reading {}: {e}", path.display());
            eprintln!("Record usage first: openusage run");
            std::process::exit(1);
        }
    };

    if json {
        match serde_json::to_string_pretty(&doc) {
            Ok(text) => println!("{text}"),
            Err(e) => {
                eprintln!("Error rendering statistics: {e}");
                std::process::exit(1);
            }
        }
        return;
    }

    let user = doc
        .processes
        .keys()
        .filter(|name| is_user_process(name))
        .count();
    println!("Process statistics from {}", path.display());
    println!("  Updated:  {}", doc.last_updated);
    println!("  Runtime:  {}", fmt_runtime(doc.total_runtime_seconds));
    println!(
        "  Tracked:  {} processes ({} user, {} system)",
        doc.processes.len(),
        user,
        doc.processes.len() - user
    );

    let rows: Vec<(&str, &ProcessTotals)> = doc
        .processes
        .iter()
        .filter(|(_, totals)| totals.total_samples > 0)
        .map(|(name, totals)| (name.as_str(), totals))
        .collect();
    if rows.is_empty() {
        println!();
        println!("No samples recorded yet.");
        return;
    }

    // Averages are derived from the running totals: total / samples.
    let avg_cpu = |t: &ProcessTotals| t.total_cpu_time / t.total_samples as f64;
    let avg_ram = |t: &ProcessTotals| t.total_ram_time / t.total_samples as f64;

    println!();
    println!("Top {top} by average CPU");
    for (i, (_, totals)) in ranked(&rows, avg_cpu, top).into_iter().enumerate() {
        println!(
            "  {:>2}. {} {:<24} {:>6.1}% avg   {:>6.1}% peak   {:>8} samples",
            i + 1,
            totals.classification.icon,
            totals.classification.display_name,
            avg_cpu(totals),
            totals.peak_cpu,
            totals.total_samples
        );
    }

    println!();
    println!("Top {top} by average RAM");
    for (i, (_, totals)) in ranked(&rows, avg_ram, top).into_iter().enumerate() {
        println!(
            "  {:>2}. {} {:<24} {:>9} avg   {:>9} peak   {:>8} samples",
            i + 1,
            totals.classification.icon,
            totals.classification.display_name,
            fmt_mb(avg_ram(totals)),
            fmt_mb(totals.peak_ram),
            totals.total_samples
        );
    }
}

/// Order by `metric` descending (name breaks ties) and keep the first `n`.
fn ranked<'a>(
    rows: &[(&'a str, &'a ProcessTotals)],
    metric: impl Fn(&ProcessTotals) -> f64,
    n: usize,
) -> Vec<(&'a str, &'a ProcessTotals)> {
    let mut out = rows.to_vec();
    out.sort_by(|a, b| {
        metric(b.1)
            .partial_cmp(&metric(a.1))
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.0.cmp(b.0))
    });
    out.truncate(n);
    out
}
