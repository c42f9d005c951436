//! `openusage history` — recent rows from the CSV journals.

use std::path::Path;

use openusage_core::UsageJournal;

/// Run the history command.
pub fn run(data_dir: &str, minutes: usize, seconds: Option<usize>) {
    let journal = UsageJournal::open(Path::new(data_dir));

    if let Some(n) = seconds {
        let rows = match journal.read_seconds() {
            Ok(rows) => rows,
            Err(e) => {
                eprintln!("Error reading {}: {e}", journal.raw_path().display());
                std::process::exit(1);
            }
        };
        if rows.is_empty() {
            println!("No samples in {} yet.", journal.raw_path().display());
            println!("Record usage first: openusage run");
            return;
        }
        let tail = &rows[rows.len().saturating_sub(n)..];
        println!(
            "Last {} of {} samples from {}",
            tail.len(),
            rows.len(),
            journal.raw_path().display()
        );
        println!(
            "  {:<19}  {:>6}  {:>6}  {:>6}",
            "time (UTC)", "cpu%", "ram%", "gpu%"
        );
        for row in tail {
            println!(
                "  {:<19}  {:>6.1}  {:>6.1}  {:>6.1}",
                row.iso_time, row.cpu_percent, row.ram_percent, row.gpu_percent
            );
        }
        return;
    }

    let rows = match journal.read_minutes() {
        Ok(rows) => rows,
        Err(e) => {
            eprintln!("Error reading {}: {e}", journal.minute_path().display());
            std::process::exit(1);
        }
    };
    if rows.is_empty() {
        println!(
            "No minute averages in {} yet (a minute needs 60 samples).",
            journal.minute_path().display()
        );
        println!("Record usage first: openusage run");
        return;
    }
    let tail = &rows[rows.len().saturating_sub(minutes)..];
    println!(
        "Last {} of {} minute averages from {}",
        tail.len(),
        rows.len(),
        journal.minute_path().display()
    );
    println!(
        "  {:<19}  {:>7}  {:>7}  {:>7}",
        "minute (UTC)", "cpu%", "ram%", "gpu%"
    );
    for row in tail {
        println!(
            "  {:<19}  {:>7.3}  {:>7.3}  {:>7.3}",
            row.iso_time, row.cpu_avg, row.ram_avg, row.gpu_avg
        );
    }
}
