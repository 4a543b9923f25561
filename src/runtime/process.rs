//! Blocking subprocess execution.

use anyhow::{Context, Result};
use log::debug;
use std::process::Command;

use super::RealRuntime;

/// Captured result of a finished subprocess.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// A successful run printing `stdout`.
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            success: true,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// A failed run printing `stderr`.
    pub fn failed(stderr: impl Into<String>) -> Self {
        Self {
            success: false,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// Trimmed, non-empty stdout lines.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.stdout.lines().map(str::trim).filter(|l| !l.is_empty())
    }
}

impl RealRuntime {
    #[tracing::instrument(skip(self))]
    pub(crate) fn run_impl(&self, program: &str, args: &[String]) -> Result<CommandOutput> {
        let output = Command::new(program)
            .args(args)
            .output()
            .with_context(|| format!("Failed to execute {}", program))?;

        debug!("{} {:?} exited with {}", program, args, output.status);

        Ok(CommandOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{Runtime, args};

    #[test]
    fn test_command_output_lines() {
        let output = CommandOutput::ok("/usr/bin/foo\n\n  /usr/share/foo  \n");
        let lines: Vec<_> = output.lines().collect();
        assert_eq!(lines, vec!["/usr/bin/foo", "/usr/share/foo"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_real_runtime_run_captures_output() {
        let runtime = RealRuntime;
        let output = runtime.run("sh", &args(["-c", "echo hello"])).unwrap();
        assert!(output.success);
        assert_eq!(output.stdout, "hello\n");
    }

    #[cfg(unix)]
    #[test]
    fn test_real_runtime_run_reports_failure_status() {
        let runtime = RealRuntime;
        let output = runtime
            .run("sh", &args(["-c", "echo oops >&2; exit 3"]))
            .unwrap();
        assert!(!output.success);
        assert_eq!(output.stderr, "oops\n");
    }

    #[test]
    fn test_real_runtime_run_missing_program() {
        let runtime = RealRuntime;
        let result = runtime.run("distrodb-no-such-program", &[]);
        assert!(result.is_err());
    }
}
