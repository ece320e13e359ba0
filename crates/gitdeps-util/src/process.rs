use std::collections::HashMap;
use std::path::Path;
use std::process::{Command, Output};

use crate::errors::GitdepsError;

/// Builder for constructing and executing external processes.
///
/// Provides a fluent API for setting program, arguments, environment variables, and working directory.
pub struct CommandBuilder {
    program: String,
    args: Vec<String>,
    env: HashMap<String, String>,
    cwd: Option<String>,
}

impl CommandBuilder {
    /// Create a new builder for the given program.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: HashMap::new(),
            cwd: None,
        }
    }

    /// Append a single argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append multiple arguments.
    pub fn args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set an environment variable for the child process.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Set the working directory for the child process.
    pub fn cwd(mut self, dir: impl AsRef<Path>) -> Self {
        self.cwd = Some(dir.as_ref().to_string_lossy().into_owned());
        self
    }

    /// The command line as it would be typed, for diagnostics.
    pub fn display(&self) -> String {
        let mut line = self.program.clone();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }

    /// Execute the command and return its raw output, whatever the exit status.
    pub fn exec(&self) -> Result<Output, GitdepsError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        for (k, v) in &self.env {
            cmd.env(k, v);
        }
        if let Some(ref dir) = self.cwd {
            cmd.current_dir(Path::new(dir));
        }
        tracing::trace!("exec: {}", self.display());
        cmd.output().map_err(|e| GitdepsError::Execution {
            command: self.display(),
            message: e.to_string(),
        })
    }

    /// Execute the command, failing with [`GitdepsError::Execution`] on a nonzero exit.
    ///
    /// Returns the captured stdout.
    pub fn exec_checked(&self) -> Result<String, GitdepsError> {
        let output = self.exec()?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let message = if stderr.is_empty() {
                format!("exited with {}", output.status)
            } else {
                stderr
            };
            return Err(GitdepsError::Execution {
                command: self.display(),
                message,
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Execute the command and split its stdout into non-empty, trimmed lines.
    pub fn exec_lines(&self) -> Result<Vec<String>, GitdepsError> {
        let stdout = self.exec_checked()?;
        Ok(stdout
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect())
    }
}
