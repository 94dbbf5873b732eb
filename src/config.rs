//! Harness configuration
//!
//! Built once from the command line and passed by reference everywhere.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Default kernel executable, relative to the working directory
pub const DEFAULT_BINARY: &str = "./build/main";
/// Default build directory
pub const DEFAULT_BUILD_DIR: &str = "build";
/// Per-case wall clock limit
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);
/// Speedups strictly above this are emphasized in the summary
pub const DEFAULT_HIGHLIGHT_THRESHOLD: f64 = 50.0;
/// Parallelism handed to `make`
pub const DEFAULT_JOBS: usize = 4;

/// One toolchain command, run inside the build directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildStep {
    pub program: String,
    pub args: Vec<String>,
}

impl BuildStep {
    pub fn new<S: Into<String>>(program: S, args: &[&str]) -> Self {
        Self {
            program: program.into(),
            args: args.iter().map(|a| (*a).to_string()).collect(),
        }
    }

    /// Split a command line on whitespace. Returns `None` for a blank line.
    pub fn parse(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self {
            program,
            args: parts.collect(),
        })
    }

    /// `cmake ..` followed by `make -j<jobs>`
    pub fn cmake_default(jobs: usize) -> Vec<Self> {
        vec![
            Self::new("cmake", &[".."]),
            Self {
                program: "make".to_string(),
                args: vec![format!("-j{jobs}")],
            },
        ]
    }
}

impl fmt::Display for BuildStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Immutable run configuration
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// Kernel executable produced by the build
    pub binary: PathBuf,
    /// Working directory for every build step (created if absent)
    pub build_dir: PathBuf,
    pub build_steps: Vec<BuildStep>,
    /// Skip the toolchain; the artifact must still exist
    pub skip_build: bool,
    pub timeout: Duration,
    pub highlight_threshold: f64,
    /// Only run cases whose name contains this substring
    pub filter: Option<String>,
    /// Also emit the summary as JSON
    pub json: bool,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            binary: PathBuf::from(DEFAULT_BINARY),
            build_dir: PathBuf::from(DEFAULT_BUILD_DIR),
            build_steps: BuildStep::cmake_default(DEFAULT_JOBS),
            skip_build: false,
            timeout: DEFAULT_TIMEOUT,
            highlight_threshold: DEFAULT_HIGHLIGHT_THRESHOLD,
            filter: None,
            json: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = HarnessConfig::default();
        assert_eq!(config.binary, PathBuf::from("./build/main"));
        assert_eq!(config.build_dir, PathBuf::from("build"));
        assert_eq!(config.timeout, Duration::from_secs(300));
        assert!((config.highlight_threshold - 50.0).abs() < f64::EPSILON);
        assert!(!config.skip_build);
        assert!(config.filter.is_none());
        assert!(!config.json);
    }

    #[test]
    fn test_cmake_default_steps() {
        let steps = BuildStep::cmake_default(4);
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].to_string(), "cmake ..");
        assert_eq!(steps[1].to_string(), "make -j4");
    }

    #[test]
    fn test_parse_build_step() {
        let step = BuildStep::parse("  ninja  -C out  ").unwrap();
        assert_eq!(step.program, "ninja");
        assert_eq!(step.args, vec!["-C", "out"]);
    }

    #[test]
    fn test_parse_blank_build_step() {
        assert!(BuildStep::parse("   ").is_none());
    }
}
