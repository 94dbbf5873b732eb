//! Result aggregation and the final summary table
//!
//! Row formatting is a pure function of a [`CaseResult`]; color is applied only
//! when a row is rendered, so everything here can be tested without a terminal.

use crate::parser::CaseResult;
use colored::Colorize;
use serde::Serialize;

/// One slot per catalog entry; `None` marks a timed-out or unlaunchable case.
pub type ResultSequence = Vec<Option<CaseResult>>;

const TABLE_WIDTH: usize = 85;

/// Display strings for one table row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryRow {
    pub name: String,
    pub shape: String,
    /// Two decimals, or `N/A` when the CPU time is unavailable
    pub cpu: String,
    /// Three decimals
    pub npu: String,
    /// One decimal plus `x`, or `-` when undefined
    pub speedup: String,
    /// `PASS` or `FAIL`
    pub status: &'static str,
    /// Speedup strictly above the highlight threshold
    pub highlighted: bool,
}

impl SummaryRow {
    pub fn from_result(result: &CaseResult, highlight_threshold: f64) -> Self {
        let cpu = if result.has_cpu_time() {
            format!("{:.2}", result.cpu_ms)
        } else {
            "N/A".to_string()
        };
        let speedup = if result.has_speedup() {
            format!("{:.1}x", result.speedup)
        } else {
            "-".to_string()
        };
        Self {
            name: result.name.clone(),
            shape: result.shape_label.clone(),
            cpu,
            npu: format!("{:.3}", result.npu_ms),
            speedup,
            status: if result.passed { "PASS" } else { "FAIL" },
            highlighted: result.speedup > highlight_threshold,
        }
    }

    /// Fixed-width line; the speedup cell is emphasized when highlighted
    pub fn render(&self) -> String {
        let speedup = format!("{:>8}", self.speedup);
        let speedup = if self.highlighted {
            speedup.yellow().bold().to_string()
        } else {
            speedup
        };
        format!(
            "{:<15} | {:<12} | {:>10} | {:>10} | {} | {:<6}",
            self.name, self.shape, self.cpu, self.npu, speedup, self.status
        )
    }
}

/// Column header line
pub fn header() -> String {
    format!(
        "{:<15} | {:<12} | {:>10} | {:>10} | {:>8} | {:<6}",
        "Case Name", "Shape", "CPU (ms)", "NPU (ms)", "Speedup", "Result"
    )
}

/// Full table: delimiter, header, rule, one row per present result, delimiter.
/// Absent slots produce no row.
pub fn render_table(results: &[Option<CaseResult>], highlight_threshold: f64) -> String {
    let mut out = String::new();
    out.push_str(&"=".repeat(TABLE_WIDTH));
    out.push('\n');
    out.push_str(&header());
    out.push('\n');
    out.push_str(&"-".repeat(TABLE_WIDTH));
    out.push('\n');
    for result in results.iter().flatten() {
        out.push_str(&SummaryRow::from_result(result, highlight_threshold).render());
        out.push('\n');
    }
    out.push_str(&"=".repeat(TABLE_WIDTH));
    out.push('\n');
    out
}

/// Running totals; absent slots count only as `not_run`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Tally {
    pub passed: usize,
    pub failed: usize,
    pub not_run: usize,
}

impl Tally {
    pub fn from_results(results: &[Option<CaseResult>]) -> Self {
        results.iter().fold(Self::default(), |mut t, slot| {
            match slot {
                Some(r) if r.passed => t.passed += 1,
                Some(_) => t.failed += 1,
                None => t.not_run += 1,
            }
            t
        })
    }

    pub fn render(&self) -> String {
        format!(
            "{} passed, {} failed, {} not run",
            self.passed, self.failed, self.not_run
        )
    }
}

/// Machine-readable summary, index-aligned with the catalog
#[derive(Debug, Serialize)]
pub struct JsonSummary<'a> {
    pub results: &'a [Option<CaseResult>],
    #[serde(flatten)]
    pub tally: Tally,
}

impl<'a> JsonSummary<'a> {
    pub fn new(results: &'a [Option<CaseResult>]) -> Self {
        Self {
            results,
            tally: Tally::from_results(results),
        }
    }
}
