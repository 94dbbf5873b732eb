//! Build trigger
//!
//! Runs the toolchain once before any case. Any failing step, or a "successful"
//! build that leaves no artifact behind, aborts the whole run.

use crate::config::{BuildStep, HarnessConfig};
use crate::error::{HarnessError, Result};
use crate::output;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

fn run_step(step: &BuildStep, dir: &Path) -> Result<()> {
    info!(step = %step, dir = %dir.display(), "running build step");
    let status = Command::new(&step.program)
        .args(&step.args)
        .current_dir(dir)
        .status()
        .map_err(|source| HarnessError::BuildSpawn {
            step: step.to_string(),
            source,
        })?;
    debug!(step = %step, %status, "build step finished");
    if status.success() {
        Ok(())
    } else {
        Err(HarnessError::BuildFailed {
            step: step.to_string(),
            status,
        })
    }
}

/// Fail unless `binary` exists on disk
pub fn verify_artifact(binary: &Path) -> Result<PathBuf> {
    if binary.exists() {
        Ok(binary.to_path_buf())
    } else {
        Err(HarnessError::ArtifactMissing(binary.to_path_buf()))
    }
}

/// Build (unless skipped) and return the verified artifact path.
///
/// Steps run in order inside `build_dir`, which is created if absent. The
/// first failing step stops the build.
pub fn ensure_artifact(config: &HarnessConfig) -> Result<PathBuf> {
    output::section("Setup");
    if config.skip_build {
        println!("Skipping build, using {}", config.binary.display());
    } else {
        println!("Compiling kernel in {} ...", config.build_dir.display());
        fs::create_dir_all(&config.build_dir)?;
        for step in &config.build_steps {
            run_step(step, &config.build_dir)?;
        }
    }

    let artifact = verify_artifact(&config.binary)?;
    output::success(&format!("Kernel ready at {}", artifact.display()));
    Ok(artifact)
}
