//! Error types for pdist-bench
//!
//! Only failures that must halt the whole run live here. Per-case faults
//! (timeouts, spawn errors) are `ExecutionOutcome` variants instead.

use std::path::PathBuf;
use std::process::{ExitCode, ExitStatus};
use thiserror::Error;

/// Result type alias for harness operations
pub type Result<T> = std::result::Result<T, HarnessError>;

/// Fatal harness errors
#[derive(Error, Debug)]
pub enum HarnessError {
    /// A build step exited with a non-zero status
    #[error("Build step `{step}` failed with {status}")]
    BuildFailed {
        /// Rendered command line of the failing step
        step: String,
        /// Exit status reported by the toolchain
        status: ExitStatus,
    },

    /// A build step could not be launched at all
    #[error("Build step `{step}` could not be started: {source}")]
    BuildSpawn {
        /// Rendered command line of the failing step
        step: String,
        /// Underlying spawn error
        #[source]
        source: std::io::Error,
    },

    /// The toolchain reported success but the artifact is not there
    #[error("Binary not found at {}", .0.display())]
    ArtifactMissing(PathBuf),

    /// Malformed case table
    #[error("Invalid case catalog: {0}")]
    InvalidCatalog(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl HarnessError {
    /// Numeric process status for this error
    pub fn status_code(&self) -> u8 {
        match self {
            Self::BuildFailed { .. } | Self::BuildSpawn { .. } => 3,
            Self::ArtifactMissing(_) => 4,
            Self::InvalidCatalog(_) => 5,
            Self::Io(_) => 7,
            Self::Json(_) => 8,
        }
    }

    /// Get exit code for this error
    pub fn exit_code(&self) -> ExitCode {
        ExitCode::from(self.status_code())
    }

    /// True for the build-trigger abort path
    pub fn is_build_failure(&self) -> bool {
        matches!(
            self,
            Self::BuildFailed { .. } | Self::BuildSpawn { .. } | Self::ArtifactMissing(_)
        )
    }
}
