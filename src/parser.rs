//! Kernel report parsing
//!
//! The kernel prints free-form text. Three independent extractors pull out
//! the pass sentinel and the two timings; a missing or malformed field falls
//! back to its default instead of failing the case.

use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

/// Literal success marker written by the kernel
pub const PASS_SENTINEL: &str = "PASS";

/// Parsed outcome of one completed case
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaseResult {
    pub name: String,
    /// `NxM`
    #[serde(rename = "shape")]
    pub shape_label: String,
    /// Reference backend time; 0.0 means unavailable
    pub cpu_ms: f64,
    /// Accelerated backend time; 0.0 means unavailable
    pub npu_ms: f64,
    /// `cpu_ms / npu_ms`, or 0.0 when either side is unavailable
    pub speedup: f64,
    pub passed: bool,
}

impl CaseResult {
    /// Build a result from raw kernel stdout
    pub fn from_report(name: &str, shape_label: &str, stdout: &str) -> Self {
        let cpu_ms = extract_cpu_ms(stdout).unwrap_or(0.0);
        let npu_ms = extract_npu_ms(stdout).unwrap_or(0.0);
        Self {
            name: name.to_string(),
            shape_label: shape_label.to_string(),
            cpu_ms,
            npu_ms,
            speedup: speedup(cpu_ms, npu_ms),
            passed: has_pass_sentinel(stdout),
        }
    }

    pub fn has_cpu_time(&self) -> bool {
        self.cpu_ms > 0.0
    }

    pub fn has_speedup(&self) -> bool {
        self.speedup > 0.0
    }
}

/// True iff the sentinel appears anywhere in the text
pub fn has_pass_sentinel(stdout: &str) -> bool {
    stdout.contains(PASS_SENTINEL)
}

fn cpu_time_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"CPU Time:\s*([0-9.]+)\s*ms").expect("built-in CPU time pattern must compile")
    })
}

fn npu_time_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"NPU Time:\s*([0-9.]+)\s*ms").expect("built-in NPU time pattern must compile")
    })
}

/// First capture of `re` that parses as a finite non-negative float
fn extract_ms(re: &Regex, stdout: &str) -> Option<f64> {
    re.captures_iter(stdout)
        .filter_map(|caps| caps.get(1)?.as_str().parse::<f64>().ok())
        .find(|v| v.is_finite() && *v >= 0.0)
}

/// Value of `CPU Time: <number> ms`, if present
pub fn extract_cpu_ms(stdout: &str) -> Option<f64> {
    extract_ms(cpu_time_regex(), stdout)
}

/// Value of `NPU Time: <number> ms`, if present
pub fn extract_npu_ms(stdout: &str) -> Option<f64> {
    extract_ms(npu_time_regex(), stdout)
}

/// Ratio defined only when both timings are strictly positive
pub fn speedup(cpu_ms: f64, npu_ms: f64) -> f64 {
    if cpu_ms > 0.0 && npu_ms > 0.0 {
        cpu_ms / npu_ms
    } else {
        0.0
    }
}
