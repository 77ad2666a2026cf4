//! Parallel multi-directory inspection.
//!
//! Recursive mode re-invokes this binary once per discovered working
//! directory (`--machine --chdir <dir>`), keeping module trees isolated
//! from each other. Admission is bounded by a counting semaphore, results
//! are aggregated in completion order, and cancellation interrupts running
//! children before killing them.
//!
//! The child contract: exactly one JSON issue array on stdout, logs on
//! stderr, exit status 0 or 1. A child whose stdout does not decode is a
//! bug in this binary, not a user error, and aborts the parent.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::unbounded;
use parking_lot::{Condvar, Mutex};
use thiserror::Error;
use tracing::{debug, warn};
use walkdir::WalkDir;

use terralint_core::Issue;

use crate::cli::Cli;

const KILL_GRACE: Duration = Duration::from_secs(3);
const POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("failed to locate the terralint binary")]
    CurrentExe(#[source] std::io::Error),

    #[error("failed to scan {path}")]
    Walk {
        path: String,
        #[source]
        source: walkdir::Error,
    },

    #[error("failed to run inspection of {dir}")]
    Child {
        dir: String,
        #[source]
        source: std::io::Error,
    },

    #[error("inspection of {dir} failed")]
    ChildFailed { dir: String },

    #[error("run canceled")]
    Canceled,
}

/// Counting semaphore that cancellation can wake.
struct Gate {
    state: Mutex<GateState>,
    cond: Condvar,
}

struct GateState {
    permits: usize,
    canceled: bool,
}

impl Gate {
    fn new(permits: usize) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(GateState {
                permits,
                canceled: false,
            }),
            cond: Condvar::new(),
        })
    }

    /// Blocks until a permit is free. Returns false when the run was
    /// canceled while waiting.
    fn acquire(&self) -> bool {
        let mut state = self.state.lock();
        while state.permits == 0 && !state.canceled {
            self.cond.wait(&mut state);
        }
        if state.canceled {
            return false;
        }
        state.permits -= 1;
        true
    }

    fn release(&self) {
        self.state.lock().permits += 1;
        self.cond.notify_one();
    }

    fn cancel(&self) {
        self.state.lock().canceled = true;
        self.cond.notify_all();
    }

    fn is_canceled(&self) -> bool {
        self.state.lock().canceled
    }
}

struct WorkerOutcome {
    dir: PathBuf,
    stdout: Vec<u8>,
    stderr: Vec<u8>,
    result: Result<ExitStatus, OrchestratorError>,
}

/// Inspects every Terraform working directory below `base`, in parallel.
/// Issues come back merged and re-sorted.
pub fn run(base: &Path, cli: &Cli) -> Result<Vec<Issue>, OrchestratorError> {
    let dirs = discover_dirs(base)?;
    if dirs.is_empty() {
        warn!("no Terraform working directories found under {}", base.display());
        return Ok(Vec::new());
    }
    debug!("inspecting {} directories", dirs.len());

    let exe = std::env::current_exe().map_err(OrchestratorError::CurrentExe)?;
    let workers = cli.max_workers.unwrap_or_else(num_cpus::get).max(1);
    let gate = Gate::new(workers);

    {
        let gate = Arc::clone(&gate);
        if let Err(err) = ctrlc::set_handler(move || gate.cancel()) {
            warn!("could not install interrupt handler: {err}");
        }
    }

    let (tx, rx) = unbounded();
    for dir in dirs {
        let tx = tx.clone();
        let gate = Arc::clone(&gate);
        let exe = exe.clone();
        let args = cli.child_args(&dir);
        std::thread::spawn(move || {
            let outcome = run_child(&exe, dir, &args, &gate);
            // The receiver only goes away when the parent is shutting down.
            let _ = tx.send(outcome);
        });
    }
    drop(tx);

    let mut issues = Vec::new();
    let mut failure = None;
    for outcome in rx {
        // Child stderr is buffered during the run and flushed afterwards so
        // concurrent children do not interleave.
        eprint!("{}", String::from_utf8_lossy(&outcome.stderr));

        if gate.is_canceled() {
            debug!("discarding result of {} after cancel", outcome.dir.display());
            continue;
        }

        match outcome.result {
            Ok(status) if matches!(status.code(), Some(0) | Some(1)) => {
                let decoded: Vec<Issue> =
                    serde_json::from_slice(&outcome.stdout).unwrap_or_else(|err| {
                        panic!(
                            "child for {} violated the output contract: {err}",
                            outcome.dir.display()
                        )
                    });
                issues.extend(decoded);
            }
            Ok(_) => {
                failure.get_or_insert(OrchestratorError::ChildFailed {
                    dir: outcome.dir.display().to_string(),
                });
            }
            Err(OrchestratorError::Canceled) => {}
            Err(err) => {
                failure.get_or_insert(err);
            }
        }
    }

    if gate.is_canceled() {
        return Err(OrchestratorError::Canceled);
    }
    if let Some(err) = failure {
        return Err(err);
    }

    Issue::sort(&mut issues);
    Ok(issues)
}

fn run_child(exe: &Path, dir: PathBuf, args: &[String], gate: &Gate) -> WorkerOutcome {
    if !gate.acquire() {
        return WorkerOutcome {
            dir,
            stdout: Vec::new(),
            stderr: Vec::new(),
            result: Err(OrchestratorError::Canceled),
        };
    }

    let outcome = spawn_and_wait(exe, &dir, args, gate);
    gate.release();
    outcome
}

fn spawn_and_wait(exe: &Path, dir: &Path, args: &[String], gate: &Gate) -> WorkerOutcome {
    let child_err = |source| OrchestratorError::Child {
        dir: dir.display().to_string(),
        source,
    };

    let mut child = match Command::new(exe)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
    {
        Ok(child) => child,
        Err(err) => {
            return WorkerOutcome {
                dir: dir.to_path_buf(),
                stdout: Vec::new(),
                stderr: Vec::new(),
                result: Err(child_err(err)),
            }
        }
    };

    // Drain pipes off-thread so a chatty child cannot block on a full pipe
    // while we poll for exit.
    let stdout_reader = child.stdout.take().map(drain);
    let stderr_reader = child.stderr.take().map(drain);

    let mut interrupted_at: Option<Instant> = None;
    let result = loop {
        match child.try_wait() {
            Ok(Some(status)) => break Ok(status),
            Ok(None) => {}
            Err(err) => break Err(child_err(err)),
        }

        if gate.is_canceled() {
            match interrupted_at {
                None => {
                    debug!("interrupting inspection of {}", dir.display());
                    interrupt(&mut child);
                    interrupted_at = Some(Instant::now());
                }
                Some(at) if at.elapsed() >= KILL_GRACE => {
                    warn!("killing unresponsive child for {}", dir.display());
                    let _ = child.kill();
                }
                Some(_) => {}
            }
        }
        std::thread::sleep(POLL_INTERVAL);
    };

    let stdout = stdout_reader.map(collect).unwrap_or_default();
    let stderr = stderr_reader.map(collect).unwrap_or_default();

    WorkerOutcome {
        dir: dir.to_path_buf(),
        stdout,
        stderr,
        result,
    }
}

fn drain(mut pipe: impl Read + Send + 'static) -> std::thread::JoinHandle<Vec<u8>> {
    std::thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        buf
    })
}

fn collect(handle: std::thread::JoinHandle<Vec<u8>>) -> Vec<u8> {
    handle.join().unwrap_or_default()
}

#[cfg(unix)]
fn interrupt(child: &mut Child) {
    // SIGINT first, so the child can finish flushing stderr.
    unsafe {
        libc::kill(child.id() as libc::pid_t, libc::SIGINT);
    }
}

#[cfg(not(unix))]
fn interrupt(child: &mut Child) {
    let _ = child.kill();
}

/// Directories below `base` containing at least one `.tf` file. Hidden
/// directories and `.terraform` data dirs are skipped.
fn discover_dirs(base: &Path) -> Result<Vec<PathBuf>, OrchestratorError> {
    let mut dirs = std::collections::BTreeSet::new();

    let walker = WalkDir::new(base).into_iter().filter_entry(|entry| {
        if entry.depth() == 0 {
            return true;
        }
        !entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with('.'))
    });

    for entry in walker {
        let entry = entry.map_err(|source| OrchestratorError::Walk {
            path: base.display().to_string(),
            source,
        })?;
        if entry.file_type().is_file()
            && entry.path().extension().is_some_and(|ext| ext == "tf")
        {
            if let Some(parent) = entry.path().parent() {
                dirs.insert(parent.to_path_buf());
            }
        }
    }

    Ok(dirs.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;

    #[test]
    fn test_discover_skips_hidden_and_data_dirs() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("stacks/app")).unwrap();
        fs::create_dir_all(dir.path().join(".terraform/modules")).unwrap();
        fs::create_dir_all(dir.path().join(".hidden")).unwrap();
        fs::write(dir.path().join("main.tf"), "").unwrap();
        fs::write(dir.path().join("stacks/app/main.tf"), "").unwrap();
        fs::write(dir.path().join(".terraform/modules/main.tf"), "").unwrap();
        fs::write(dir.path().join(".hidden/main.tf"), "").unwrap();
        fs::write(dir.path().join("stacks/app/notes.txt"), "").unwrap();

        let dirs = discover_dirs(dir.path()).unwrap();
        assert_eq!(
            dirs,
            vec![dir.path().to_path_buf(), dir.path().join("stacks/app")]
        );
    }

    #[test]
    fn test_discover_empty_tree() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("docs")).unwrap();
        assert!(discover_dirs(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn test_gate_bounds_permits() {
        let gate = Gate::new(1);
        assert!(gate.acquire());

        let waiter = {
            let gate = Arc::clone(&gate);
            std::thread::spawn(move || gate.acquire())
        };
        std::thread::sleep(Duration::from_millis(50));
        assert!(!waiter.is_finished());

        gate.release();
        assert!(waiter.join().unwrap());
    }

    #[test]
    fn test_canceled_run_never_starts_queued_children() {
        let gate = Gate::new(1);
        gate.cancel();

        // A nonexistent executable would fail to spawn; getting `Canceled`
        // back proves the child was never started at all.
        let outcome = run_child(
            Path::new("/nonexistent/terralint"),
            PathBuf::from("stacks/app"),
            &[],
            &gate,
        );
        assert!(matches!(outcome.result, Err(OrchestratorError::Canceled)));
        assert!(outcome.stdout.is_empty());
        assert!(outcome.stderr.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_cancel_interrupts_running_child() {
        let gate = Gate::new(1);
        gate.cancel();

        let dir = tempfile::tempdir().unwrap();
        let started = Instant::now();
        let outcome = spawn_and_wait(
            Path::new("sleep"),
            dir.path(),
            &["30".to_string()],
            &gate,
        );

        let status = outcome.result.unwrap();
        assert!(!status.success());
        // Interrupted long before the 30 s sleep and before the kill grace.
        assert!(started.elapsed() < KILL_GRACE);
    }

    #[test]
    fn test_gate_cancel_wakes_waiters() {
        let gate = Gate::new(0);
        let waiter = {
            let gate = Arc::clone(&gate);
            std::thread::spawn(move || gate.acquire())
        };
        std::thread::sleep(Duration::from_millis(50));
        gate.cancel();
        assert!(!waiter.join().unwrap());
        assert!(gate.is_canceled());
    }
}
