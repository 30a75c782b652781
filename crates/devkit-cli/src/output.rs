use devkit_core::bootstrap::Reporter;
use serde::Serialize;

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{}", json);
    Ok(())
}

pub fn print_table(headers: &[&str], rows: Vec<Vec<String>>) {
    // Calculate column widths
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in &rows {
        for (i, cell) in row.iter().enumerate() {
            if i < widths.len() {
                widths[i] = widths[i].max(cell.len());
            }
        }
    }

    let header_row: Vec<String> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| format!("{:width$}", h, width = widths[i]))
        .collect();
    println!("{}", header_row.join("  "));

    let sep: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();
    println!("{}", sep.join("  "));

    for row in &rows {
        let cells: Vec<String> = row
            .iter()
            .enumerate()
            .map(|(i, cell)| {
                let w = widths.get(i).copied().unwrap_or(0);
                format!("{:width$}", cell, width = w)
            })
            .collect();
        println!("{}", cells.join("  "));
    }
}

/// Prints step progress to stdout and failures to stderr.
///
/// Quiet mode suppresses progress so `--json` output stays parseable.
pub struct ConsoleReporter {
    quiet: bool,
}

impl ConsoleReporter {
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }
}

impl Reporter for ConsoleReporter {
    fn step_started(&self, index: usize, total: usize, name: &str, description: &str) {
        if !self.quiet {
            println!("==> [{index}/{total}] {description} ({name})");
        }
    }

    fn step_skipped(&self, _name: &str, reason: &str) {
        if !self.quiet {
            println!("    skipped: {reason}");
        }
    }

    fn step_finished(&self, name: &str) {
        if !self.quiet {
            println!("    ok: {name}");
        }
    }

    fn step_failed(&self, name: &str, error: &str) {
        eprintln!("    FAILED: {name}: {error}");
    }

    fn probe_retry(&self, attempt: u32) {
        if !self.quiet {
            println!("    waiting for the database (attempt {attempt} not ready)...");
        }
    }

    fn dependency_wiped(&self, dir: &str) {
        if !self.quiet {
            println!("Removed {dir}; starting from a clean install");
        }
    }
}
