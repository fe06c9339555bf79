use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::debug;

use crate::engine::error::SweepError;

/// Captured result of one solver invocation.
///
/// A non-zero exit code alone is not failure; only crash classification of
/// the captured streams decides that.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

/// Seam between the sweep workflow and the external solver.
///
/// Production code spawns the real executable; tests substitute an
/// implementation returning canned output, so the retry machinery is
/// exercised without ever launching a process.
pub trait SolverInvoker {
    /// Runs the solver scoped to `workspace`, feeding it the named macro
    /// file on standard input, and blocks until it exits.
    fn invoke(&self, workspace: &Path, macro_file: &str) -> Result<RunOutput, SweepError>;
}

/// Invokes the solver executable as a blocking child process.
///
/// The workspace is passed to the child as an explicit working-directory
/// argument; no process-wide state is mutated, so nothing needs restoring on
/// any exit path.
#[derive(Debug, Clone)]
pub struct ProcessInvoker {
    executable: PathBuf,
}

impl ProcessInvoker {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
        }
    }
}

impl SolverInvoker for ProcessInvoker {
    fn invoke(&self, workspace: &Path, macro_file: &str) -> Result<RunOutput, SweepError> {
        let macro_path = workspace.join(macro_file);

        // Reported, not retried: a missing executable or macro is a launch
        // problem, never a solver crash.
        if !self.executable.is_file() {
            return Err(SweepError::Launch(format!(
                "solver executable not found: {}",
                self.executable.display()
            )));
        }
        if !macro_path.is_file() {
            return Err(SweepError::Launch(format!(
                "macro file not found: {}",
                macro_path.display()
            )));
        }

        debug!(
            "Spawning {:?} in {:?} with {} on stdin",
            self.executable, workspace, macro_file
        );
        let macro_input = File::open(&macro_path)?;
        let output = Command::new(&self.executable)
            .current_dir(workspace)
            .stdin(Stdio::from(macro_input))
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| {
                SweepError::Launch(format!(
                    "failed to spawn '{}': {}",
                    self.executable.display(),
                    e
                ))
            })?;

        Ok(RunOutput {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
