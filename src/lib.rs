//! pdist-bench: benchmark and validation harness for pairwise-distance kernels.
//!
//! Builds the kernel once, runs a fixed catalog of shapes, norms and dtypes
//! against it (one child process per case, bounded by a timeout), scrapes the
//! CPU/NPU timings and the `PASS` sentinel from each report, and prints a
//! summary table.
//!
//! # Kernel contract
//!
//! ```text
//! <binary> <N> <M> <P> <dtype>      # dtype: 0 = fp32, 1 = fp16; P may be `inf`
//! ```
//!
//! The kernel's stdout should contain `CPU Time: <float> ms`,
//! `NPU Time: <float> ms` and, when its own validation succeeds, `PASS`.

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

pub mod build;
pub mod catalog;
pub mod config;
pub mod error;
pub mod harness;
pub mod logging;
pub mod output;
pub mod parser;
pub mod runner;
pub mod summary;

pub use catalog::{CaseDescriptor, Dtype, NormExponent, DEFAULT_CATALOG};
pub use config::{BuildStep, HarnessConfig};
pub use error::{HarnessError, Result};
pub use parser::CaseResult;
pub use runner::{CaseExecutor, ExecutionOutcome, ProcessRunner};

/// pdist-bench - CPU vs NPU pairwise-distance kernel harness
#[derive(Parser, Debug)]
#[command(name = "pdist-bench")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Kernel executable produced by the build
    #[arg(long, value_name = "PATH", default_value = config::DEFAULT_BINARY)]
    pub binary: PathBuf,

    /// Directory the build steps run in (created if absent)
    #[arg(long, value_name = "DIR", default_value = config::DEFAULT_BUILD_DIR)]
    pub build_dir: PathBuf,

    /// Replace the default `cmake ..` / `make` steps (repeatable, run in order)
    #[arg(long = "build-step", value_name = "COMMAND", value_parser = parse_build_step)]
    pub build_steps: Vec<BuildStep>,

    /// Parallel jobs for the default `make` step
    #[arg(short, long, default_value_t = config::DEFAULT_JOBS)]
    pub jobs: usize,

    /// Do not invoke the toolchain; the binary must already exist
    #[arg(long)]
    pub skip_build: bool,

    /// Per-case timeout in seconds
    #[arg(long, value_name = "SECS", default_value = "300", value_parser = parse_timeout)]
    pub timeout_secs: Duration,

    /// Emphasize speedups strictly above this factor
    #[arg(long, value_name = "FACTOR", default_value_t = config::DEFAULT_HIGHLIGHT_THRESHOLD)]
    pub highlight_above: f64,

    /// Only run cases whose name contains this text
    #[arg(long, value_name = "TEXT")]
    pub filter: Option<String>,

    /// Print the case catalog and exit
    #[arg(long)]
    pub list: bool,

    /// Also print the summary as JSON
    #[arg(long)]
    pub json: bool,

    /// Disable ANSI colors
    #[arg(long)]
    pub no_color: bool,

    /// Log level when RUST_LOG is unset (error, warn, info, debug, trace)
    #[arg(long, value_name = "LEVEL", default_value = "warn")]
    pub log_level: String,

    /// Log line format
    #[arg(long, value_enum, default_value_t = logging::LogFormat::Compact)]
    pub log_format: logging::LogFormat,
}

fn parse_timeout(value: &str) -> std::result::Result<Duration, String> {
    let secs: f64 = value
        .parse()
        .map_err(|e| format!("invalid timeout '{value}': {e}"))?;
    if secs.is_finite() && secs > 0.0 {
        Ok(Duration::from_secs_f64(secs))
    } else {
        Err(format!("timeout must be a positive number of seconds, got '{value}'"))
    }
}

fn parse_build_step(value: &str) -> std::result::Result<BuildStep, String> {
    BuildStep::parse(value).ok_or_else(|| "build step must name a program".to_string())
}

impl Cli {
    /// Freeze the parsed flags into a run configuration
    pub fn to_config(&self) -> HarnessConfig {
        let build_steps = if self.build_steps.is_empty() {
            BuildStep::cmake_default(self.jobs)
        } else {
            self.build_steps.clone()
        };
        HarnessConfig {
            binary: self.binary.clone(),
            build_dir: self.build_dir.clone(),
            build_steps,
            skip_build: self.skip_build,
            timeout: self.timeout_secs,
            highlight_threshold: self.highlight_above,
            filter: self.filter.clone(),
            json: self.json,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("pdist-bench").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_defaults_match_config_defaults() {
        let config = parse(&[]).to_config();
        let default = HarnessConfig::default();
        assert_eq!(config.binary, default.binary);
        assert_eq!(config.build_dir, default.build_dir);
        assert_eq!(config.build_steps, default.build_steps);
        assert_eq!(config.timeout, default.timeout);
        assert!((config.highlight_threshold - default.highlight_threshold).abs() < f64::EPSILON);
    }

    #[test]
    fn test_jobs_flag_changes_make_step() {
        let config = parse(&["-j", "16"]).to_config();
        assert_eq!(config.build_steps[1].to_string(), "make -j16");
    }

    #[test]
    fn test_build_steps_replace_defaults() {
        let config = parse(&["--build-step", "ninja -C out", "--build-step", "true"]).to_config();
        assert_eq!(config.build_steps.len(), 2);
        assert_eq!(config.build_steps[0].program, "ninja");
        assert_eq!(config.build_steps[1].program, "true");
    }

    #[test]
    fn test_rejects_blank_build_step() {
        assert!(Cli::try_parse_from(["pdist-bench", "--build-step", ""]).is_err());
        assert!(Cli::try_parse_from(["pdist-bench", "--build-step", "   "]).is_err());
    }

    #[test]
    fn test_fractional_timeout() {
        let config = parse(&["--timeout-secs", "0.5"]).to_config();
        assert_eq!(config.timeout, Duration::from_millis(500));
    }

    #[test]
    fn test_rejects_non_positive_timeout() {
        assert!(Cli::try_parse_from(["pdist-bench", "--timeout-secs", "0"]).is_err());
        assert!(Cli::try_parse_from(["pdist-bench", "--timeout-secs", "-3"]).is_err());
        assert!(Cli::try_parse_from(["pdist-bench", "--timeout-secs", "soon"]).is_err());
    }

    #[test]
    fn test_filter_and_json_flags() {
        let config = parse(&["--filter", "Odd", "--json", "--skip-build"]).to_config();
        assert_eq!(config.filter.as_deref(), Some("Odd"));
        assert!(config.json);
        assert!(config.skip_build);
    }

    #[test]
    fn test_log_format_value_enum() {
        let cli = parse(&["--log-format", "json"]);
        assert_eq!(cli.log_format, logging::LogFormat::Json);
    }
}
