//! Process execution utilities
//!
//! Provides a unified interface for running external commands with:
//! - Output capture
//! - Directory context
//! - Streaming output that is captured at the same time (tee)
//!
//! Callers branch on the structured [`CommandResult`] rather than on errors:
//! an `Err` only means the program could not be started at all.

use crate::error::{Error, ErrorCode, Result};
use std::io::{BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

/// Result of a command execution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    /// Whether the command succeeded (exit code 0)
    pub success: bool,
    /// Exit code of the command (-1 when killed by a signal)
    pub exit_code: i32,
    /// Standard output
    pub stdout: String,
    /// Standard error
    pub stderr: String,
}

impl CommandResult {
    /// Create from std::process::Output
    pub fn from_output(output: Output) -> Self {
        Self {
            success: output.status.success(),
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        }
    }

    /// Build a result from an exit code and captured streams
    pub fn new(exit_code: i32, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            success: exit_code == 0,
            exit_code,
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    /// Get combined output (stdout + stderr)
    pub fn combined_output(&self) -> String {
        if self.stderr.is_empty() {
            self.stdout.clone()
        } else if self.stdout.is_empty() {
            self.stderr.clone()
        } else {
            format!("{}\n{}", self.stdout, self.stderr)
        }
    }

    /// Last `n` lines of combined output, for short failure summaries
    pub fn tail(&self, n: usize) -> String {
        let combined = self.combined_output();
        let lines: Vec<&str> = combined.lines().collect();
        let start = lines.len().saturating_sub(n);
        lines[start..].join("\n")
    }
}

/// Synchronous command execution seam.
///
/// The build orchestrator depends on this trait so tests can substitute a
/// fake build tool.
pub trait CommandRunner {
    /// Run `program` with `args` in `dir` and return the structured result
    fn run(&self, program: &Path, args: &[&str], dir: &Path) -> Result<CommandResult>;
}

impl<T: CommandRunner + ?Sized> CommandRunner for &T {
    fn run(&self, program: &Path, args: &[&str], dir: &Path) -> Result<CommandResult> {
        (**self).run(program, args, dir)
    }
}

/// Runs real processes, streaming their output to the terminal while capturing it
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner {
    /// Do not echo output, only capture it
    pub quiet: bool,
}

impl CommandRunner for SystemRunner {
    fn run(&self, program: &Path, args: &[&str], dir: &Path) -> Result<CommandResult> {
        if self.quiet {
            return run_command_in_dir(&program.to_string_lossy(), args, dir);
        }
        run_command_tee_in_dir(program, args, dir)
    }
}

fn spawn_error(program: &str, e: std::io::Error) -> Error {
    if e.kind() == std::io::ErrorKind::NotFound {
        Error::command_not_found(program).with_source(e)
    } else {
        Error::process(format!("Failed to execute {}: {}", program, e)).with_source(e)
    }
}

/// Run a command and capture output
pub fn run_command(program: &str, args: &[&str]) -> Result<CommandResult> {
    let output = Command::new(program)
        .args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .map_err(|e| spawn_error(program, e))?;

    Ok(CommandResult::from_output(output))
}

/// Run a command in a specific directory
pub fn run_command_in_dir(program: &str, args: &[&str], dir: &Path) -> Result<CommandResult> {
    let output = Command::new(program)
        .args(args)
        .current_dir(dir)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .map_err(|e| spawn_error(program, e))?;

    Ok(CommandResult::from_output(output))
}

/// Run a command in a directory, echoing stdout/stderr line by line while capturing both.
///
/// stderr is drained on a scoped thread so neither pipe can fill up and
/// block the child.
pub fn run_command_tee_in_dir(program: &Path, args: &[&str], dir: &Path) -> Result<CommandResult> {
    let display = program.display().to_string();
    let mut child = Command::new(program)
        .args(args)
        .current_dir(dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| spawn_error(&display, e))?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| Error::process(format!("No stdout pipe for {}", display)))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| Error::process(format!("No stderr pipe for {}", display)))?;

    let (out, err) = std::thread::scope(|scope| {
        let err_handle = scope.spawn(move || tee(stderr, std::io::stderr()));
        let out = tee(stdout, std::io::stdout());
        let err = err_handle
            .join()
            .unwrap_or_else(|_| Err(std::io::Error::other("stderr reader panicked")));
        (out, err)
    });

    let status = child.wait().map_err(|e| spawn_error(&display, e))?;
    let stdout = out.map_err(|e| Error::new(ErrorCode::ProcessError, e.to_string()))?;
    let stderr = err.map_err(|e| Error::new(ErrorCode::ProcessError, e.to_string()))?;

    Ok(CommandResult::new(status.code().unwrap_or(-1), stdout, stderr))
}

/// Copy `reader` to `sink` line by line and return everything that was read
fn tee(reader: impl Read, mut sink: impl Write) -> std::io::Result<String> {
    let mut reader = BufReader::new(reader);
    let mut captured = Vec::new();
    let mut line = Vec::new();
    loop {
        line.clear();
        let n = reader.read_until(b'\n', &mut line)?;
        if n == 0 {
            break;
        }
        // A closed terminal must not abort the build; keep capturing.
        let _ = sink.write_all(&line);
        let _ = sink.flush();
        captured.extend_from_slice(&line);
    }
    Ok(String::from_utf8_lossy(&captured).into_owned())
}

/// Check if a command exists in PATH
pub fn command_exists(program: &str) -> bool {
    which::which(program).is_ok()
}

/// Get the path to a command
pub fn which_command(program: &str) -> Option<PathBuf> {
    which::which(program).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_exists_nonexistent() {
        assert!(!command_exists("nonexistent_command_12345"));
    }

    #[test]
    fn test_command_result_combined_output() {
        let result = CommandResult::new(0, "out", "err");
        assert!(result.success);
        assert!(result.combined_output().contains("out"));
        assert!(result.combined_output().contains("err"));
    }

    #[test]
    fn test_command_result_nonzero() {
        let result = CommandResult::new(3, "", "boom");
        assert!(!result.success);
        assert_eq!(result.combined_output(), "boom");
    }

    #[test]
    fn test_tail_keeps_last_lines() {
        let result = CommandResult::new(1, "a\nb\nc", "d\ne");
        assert_eq!(result.tail(2), "d\ne");
        assert_eq!(result.tail(10).lines().count(), 5);
    }

    #[test]
    fn test_tee_captures_everything() {
        let mut sink = Vec::new();
        let captured = tee("line one\nline two".as_bytes(), &mut sink).unwrap();
        assert_eq!(captured, "line one\nline two");
        assert_eq!(sink, b"line one\nline two");
    }

    #[test]
    fn test_missing_program_is_command_not_found() {
        let err = run_command("nonexistent_command_12345", &[]).unwrap_err();
        assert_eq!(err.code, ErrorCode::CommandNotFound);
    }

    #[cfg(unix)]
    #[test]
    fn test_tee_runner_captures_exit_code_and_streams() {
        let dir = tempfile::tempdir().unwrap();
        let result = run_command_tee_in_dir(
            Path::new("sh"),
            &["-c", "echo hello; echo oops 1>&2; exit 3"],
            dir.path(),
        )
        .unwrap();
        assert!(!result.success);
        assert_eq!(result.exit_code, 3);
        assert!(result.stdout.contains("hello"));
        assert!(result.stderr.contains("oops"));
    }
}
