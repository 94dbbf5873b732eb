//! Case execution
//!
//! Each case runs the kernel as a child process bounded by a timeout. The
//! child lives inside a [`ProcessGuard`] that kills and reaps it on every exit
//! path, including panics and Ctrl+C.

use crate::catalog::CaseDescriptor;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::collections::HashSet;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::{Mutex, OnceLock};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// What happened to one case attempt
#[derive(Debug)]
pub enum ExecutionOutcome {
    /// Process exited within the timeout, whatever its status
    Completed {
        stdout: String,
        stderr: String,
        status: ExitStatus,
    },
    /// Process was killed after exceeding the timeout
    TimedOut,
    /// Process could not be started or waited on
    LaunchError(String),
}

/// Seam between the run loop and process execution
pub trait CaseExecutor {
    fn execute(&mut self, case: &CaseDescriptor) -> ExecutionOutcome;
}

// ============================================================================
// Process registry for interrupt cleanup
// ============================================================================

type PidSet = Mutex<HashSet<u32>>;

fn live_pids() -> &'static PidSet {
    static LIVE: OnceLock<PidSet> = OnceLock::new();
    LIVE.get_or_init(|| Mutex::new(HashSet::new()))
}

fn track(pid: u32, live: bool) {
    if let Ok(mut pids) = live_pids().lock() {
        if live {
            pids.insert(pid);
        } else {
            pids.remove(&pid);
        }
    }
}

#[cfg(unix)]
fn force_kill(pid: u32) {
    let _ = Command::new("kill")
        .args(["-KILL", &pid.to_string()])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();
}

#[cfg(windows)]
fn force_kill(pid: u32) {
    let _ = Command::new("taskkill")
        .args(["/F", "/T", "/PID", &pid.to_string()])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();
}

/// Kill every kernel still running. Returns how many were signalled.
pub fn kill_all_registered() -> usize {
    let pids: Vec<u32> = match live_pids().lock() {
        Ok(guard) => guard.iter().copied().collect(),
        Err(_) => return 0,
    };
    pids.iter().copied().for_each(force_kill);
    pids.len()
}

/// Kill in-flight kernels on SIGINT/SIGTERM, then exit with 130.
pub fn install_interrupt_handler() {
    if let Err(e) = ctrlc::set_handler(|| {
        let count = kill_all_registered();
        eprintln!("\nInterrupted. Killed {count} running kernel process(es).");
        std::process::exit(130);
    }) {
        warn!("could not install interrupt handler: {e}");
    }
}

// ============================================================================
// ProcessGuard
// ============================================================================

/// RAII guard that kills its child on drop unless it was reaped normally
pub struct ProcessGuard {
    child: Option<Child>,
    pid: u32,
}

impl ProcessGuard {
    pub fn new(child: Child) -> Self {
        let pid = child.id();
        track(pid, true);
        Self {
            child: Some(child),
            pid,
        }
    }

    /// Poll until exit or `timeout`. `Ok(None)` means the child was killed.
    pub fn wait_timeout(&mut self, timeout: Duration) -> std::io::Result<Option<ExitStatus>> {
        let start = Instant::now();
        loop {
            let Some(child) = self.child.as_mut() else {
                return Ok(None);
            };
            match child.try_wait()? {
                Some(status) => {
                    self.child = None;
                    track(self.pid, false);
                    return Ok(Some(status));
                }
                None if start.elapsed() >= timeout => {
                    debug!(pid = self.pid, "timeout elapsed, killing child");
                    self.kill_and_wait();
                    return Ok(None);
                }
                None => thread::sleep(POLL_INTERVAL),
            }
        }
    }

    /// Kill and reap the child
    pub fn kill_and_wait(&mut self) {
        if let Some(ref mut child) = self.child {
            let _ = child.kill();
            let _ = child.wait();
        }
        track(self.pid, false);
        self.child = None;
    }
}

impl Drop for ProcessGuard {
    fn drop(&mut self) {
        if self.child.is_some() {
            self.kill_and_wait();
        }
    }
}

// ============================================================================
// ProcessRunner
// ============================================================================

/// Runs the kernel executable: `<binary> <N> <M> <P> <dtype>`
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    binary: PathBuf,
    timeout: Duration,
}

impl ProcessRunner {
    pub fn new<P: AsRef<Path>>(binary: P, timeout: Duration) -> Self {
        Self {
            binary: binary.as_ref().to_path_buf(),
            timeout,
        }
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

/// Read a pipe to EOF on its own thread; the buffer arrives on the receiver.
fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Receiver<String> {
    let (tx, rx) = mpsc::channel();
    match pipe {
        Some(mut pipe) => {
            thread::spawn(move || {
                let mut buf = Vec::new();
                let _ = pipe.read_to_end(&mut buf);
                let _ = tx.send(String::from_utf8_lossy(&buf).into_owned());
            });
        }
        None => {
            let _ = tx.send(String::new());
        }
    }
    rx
}

/// Wait for a drained pipe until `deadline`. `None` means something still
/// holds the write end (typically a backgrounded grandchild).
fn collect(rx: &Receiver<String>, deadline: Instant) -> Option<String> {
    let remaining = deadline.saturating_duration_since(Instant::now());
    match rx.recv_timeout(remaining) {
        Ok(text) => Some(text),
        Err(RecvTimeoutError::Disconnected) => Some(String::new()),
        Err(RecvTimeoutError::Timeout) => None,
    }
}

impl CaseExecutor for ProcessRunner {
    fn execute(&mut self, case: &CaseDescriptor) -> ExecutionOutcome {
        let args = case.args();
        debug!(case = case.name, binary = %self.binary.display(), ?args, "spawning kernel");

        let deadline = Instant::now() + self.timeout;
        let spawned = Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn();
        let mut child = match spawned {
            Ok(child) => child,
            Err(e) => return ExecutionOutcome::LaunchError(e.to_string()),
        };

        // Drain concurrently so a chatty kernel cannot block on a full pipe.
        let stdout_rx = drain(child.stdout.take());
        let stderr_rx = drain(child.stderr.take());

        let mut guard = ProcessGuard::new(child);
        let budget = deadline.saturating_duration_since(Instant::now());
        let status = match guard.wait_timeout(budget) {
            Ok(Some(status)) => status,
            // Readers are left detached: a grandchild may still hold the pipes.
            Ok(None) => return ExecutionOutcome::TimedOut,
            Err(e) => return ExecutionOutcome::LaunchError(format!("wait failed: {e}")),
        };

        match (collect(&stdout_rx, deadline), collect(&stderr_rx, deadline)) {
            (Some(stdout), Some(stderr)) => ExecutionOutcome::Completed {
                stdout,
                stderr,
                status,
            },
            _ => {
                debug!(case = case.name, %status, "kernel exited but its output pipes stayed open");
                ExecutionOutcome::TimedOut
            }
        }
    }
}
