//! The run loop
//!
//! Build once, run every selected case in catalog order, then report. Only a
//! build failure (or a malformed catalog) stops the run; every per-case fault
//! becomes an absent slot in the result sequence.

use crate::build;
use crate::catalog::{select_cases, validate_catalog, CaseDescriptor};
use crate::config::HarnessConfig;
use crate::error::Result;
use crate::output;
use crate::parser::CaseResult;
use crate::runner::{CaseExecutor, ExecutionOutcome, ProcessRunner};
use crate::summary::{render_table, JsonSummary, ResultSequence, Tally};
use std::io::Write;
use tracing::{debug, warn};

/// Execute one case and turn its outcome into a slot
pub fn run_case<E: CaseExecutor + ?Sized>(
    case: &CaseDescriptor,
    executor: &mut E,
) -> Option<CaseResult> {
    print!("Running {} args={:?} ... ", case.name, case.args());
    let _ = std::io::stdout().flush();

    match executor.execute(case) {
        ExecutionOutcome::Completed {
            stdout,
            stderr,
            status,
        } => {
            if !stderr.is_empty() {
                debug!(case = case.name, %stderr, "kernel stderr");
            }
            let result = CaseResult::from_report(case.name, &case.shape_label(), &stdout);
            debug!(
                case = case.name,
                %status,
                cpu_ms = result.cpu_ms,
                npu_ms = result.npu_ms,
                passed = result.passed,
                "parsed kernel report"
            );
            println!("{}", output::verdict(result.passed));
            Some(result)
        }
        ExecutionOutcome::TimedOut => {
            println!("{}", output::timeout_tag());
            warn!(case = case.name, "case timed out, no result recorded");
            None
        }
        ExecutionOutcome::LaunchError(cause) => {
            println!("{}", output::error_tag(&cause));
            warn!(case = case.name, %cause, "case failed to launch, no result recorded");
            None
        }
    }
}

/// Run all cases sequentially. The returned sequence has exactly one slot per
/// case, in the same order.
pub fn run_cases<E: CaseExecutor + ?Sized>(
    cases: &[CaseDescriptor],
    executor: &mut E,
) -> ResultSequence {
    cases.iter().map(|case| run_case(case, executor)).collect()
}

/// Print the summary table, totals and (optionally) the JSON document
pub fn report(results: &[Option<CaseResult>], config: &HarnessConfig) -> Result<()> {
    println!();
    print!("{}", render_table(results, config.highlight_threshold));

    let tally = Tally::from_results(results);
    if tally.not_run > 0 {
        output::warning(&tally.render());
    } else {
        println!("{}", tally.render());
    }

    if config.json {
        println!("{}", serde_json::to_string_pretty(&JsonSummary::new(results))?);
    }
    println!();
    Ok(())
}

/// Full harness run against the kernel built from `config`
pub fn run(config: &HarnessConfig, catalog: &[CaseDescriptor]) -> Result<ResultSequence> {
    validate_catalog(catalog)?;
    let artifact = build::ensure_artifact(config)?;

    let cases = select_cases(catalog, config.filter.as_deref());
    if cases.is_empty() {
        output::warning("No cases selected");
    }

    output::section("Run");
    let mut runner = ProcessRunner::new(artifact, config.timeout);
    debug!(
        binary = %runner.binary().display(),
        timeout = ?runner.timeout(),
        cases = cases.len(),
        "starting case loop"
    );
    let results = run_cases(&cases, &mut runner);

    report(&results, config)?;
    Ok(results)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::catalog::DEFAULT_CATALOG;
    use std::collections::VecDeque;
    use std::os::unix::process::ExitStatusExt;
    use std::process::ExitStatus;

    /// Replays scripted outcomes and records which cases were executed
    struct ScriptedExecutor {
        outcomes: VecDeque<ExecutionOutcome>,
        seen: Vec<&'static str>,
    }

    impl ScriptedExecutor {
        fn new(outcomes: Vec<ExecutionOutcome>) -> Self {
            Self {
                outcomes: outcomes.into(),
                seen: Vec::new(),
            }
        }
    }

    impl CaseExecutor for ScriptedExecutor {
        fn execute(&mut self, case: &CaseDescriptor) -> ExecutionOutcome {
            self.seen.push(case.name);
            self.outcomes
                .pop_front()
                .unwrap_or(ExecutionOutcome::LaunchError("exhausted".into()))
        }
    }

    fn completed(stdout: &str, code: i32) -> ExecutionOutcome {
        ExecutionOutcome::Completed {
            stdout: stdout.to_string(),
            stderr: String::new(),
            status: ExitStatus::from_raw(code << 8),
        }
    }

    #[test]
    fn test_one_slot_per_case_in_order() {
        let cases = &DEFAULT_CATALOG[..4];
        let mut exec = ScriptedExecutor::new(vec![
            completed("CPU Time: 10 ms\nNPU Time: 1 ms\nPASS", 0),
            ExecutionOutcome::TimedOut,
            ExecutionOutcome::LaunchError("Permission denied".into()),
            completed("FAIL", 1),
        ]);
        let results = run_cases(cases, &mut exec);

        assert_eq!(results.len(), 4);
        assert_eq!(exec.seen, ["Case01_Base", "Case02_FP16", "Case03_Manhat", "Case04_Inf"]);
        let first = results[0].as_ref().unwrap();
        assert_eq!(first.name, "Case01_Base");
        assert!(first.passed);
        assert!(results[1].is_none());
        assert!(results[2].is_none());
        let last = results[3].as_ref().unwrap();
        assert_eq!(last.name, "Case04_Inf");
        assert!(!last.passed);
    }

    #[test]
    fn test_timeout_does_not_stop_the_loop() {
        let mut exec = ScriptedExecutor::new(
            (0..DEFAULT_CATALOG.len())
                .map(|_| ExecutionOutcome::TimedOut)
                .collect(),
        );
        let results = run_cases(DEFAULT_CATALOG, &mut exec);
        assert_eq!(results.len(), DEFAULT_CATALOG.len());
        assert!(results.iter().all(Option::is_none));
        assert_eq!(exec.seen.len(), DEFAULT_CATALOG.len());
    }

    #[test]
    fn test_exit_status_does_not_decide_pass() {
        let cases = &DEFAULT_CATALOG[..2];
        let mut exec = ScriptedExecutor::new(vec![completed("[PASS]", 1), completed("", 0)]);
        let results = run_cases(cases, &mut exec);
        assert!(results[0].as_ref().unwrap().passed);
        assert!(!results[1].as_ref().unwrap().passed);
    }

    #[test]
    fn test_result_carries_shape_label() {
        let cases = &DEFAULT_CATALOG[6..7];
        let mut exec = ScriptedExecutor::new(vec![completed("PASS", 0)]);
        let results = run_cases(cases, &mut exec);
        assert_eq!(results[0].as_ref().unwrap().shape_label, "128x33");
    }

    #[test]
    fn test_build_failure_runs_no_case() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = HarnessConfig {
            binary: dir.path().join("build").join("main"),
            build_dir: dir.path().join("build"),
            build_steps: vec![crate::config::BuildStep::new("false", &[])],
            ..HarnessConfig::default()
        };
        let err = run(&config, DEFAULT_CATALOG).unwrap_err();
        assert!(err.is_build_failure());
    }

    #[test]
    fn test_invalid_catalog_aborts_before_build() {
        let dir = tempfile::TempDir::new().unwrap();
        let cases = [DEFAULT_CATALOG[0], DEFAULT_CATALOG[0]];
        let config = HarnessConfig {
            build_dir: dir.path().join("build"),
            ..HarnessConfig::default()
        };
        let err = run(&config, &cases).unwrap_err();
        assert!(matches!(err, crate::error::HarnessError::InvalidCatalog(_)));
        assert!(!config.build_dir.exists());
    }
}
