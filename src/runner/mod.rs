//! Process runner
//!
//! Runs one external program at a time and blocks until it exits. Child
//! output goes straight to our own stdout/stderr. The `ProcessRunner`
//! trait is the seam the orchestrator is tested through.

use std::fmt;
use std::io;
use std::process::{Command, ExitStatus, Stdio};

use relaunch_profile::CompileCommand;

/// Exit code reported when a program cannot be started
pub const EXIT_CODE_SPAWN_FAILED: i32 = 127;

/// Errors from running a child process
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    #[error("failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("empty command line")]
    EmptyCommand,
}

impl RunnerError {
    pub fn exit_code(&self) -> i32 {
        match self {
            RunnerError::Spawn { .. } => EXIT_CODE_SPAWN_FAILED,
            RunnerError::EmptyCommand => 1,
        }
    }
}

/// A program plus its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub program: String,
    pub args: Vec<String>,
    /// Discard the child's stdout/stderr instead of forwarding them
    pub quiet: bool,
}

impl CommandLine {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            quiet: false,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn quiet(mut self) -> Self {
        self.quiet = true;
        self
    }

    /// All tokens, program first.
    pub fn tokens(&self) -> Vec<String> {
        std::iter::once(self.program.clone())
            .chain(self.args.iter().cloned())
            .collect()
    }
}

impl From<&CompileCommand> for CommandLine {
    fn from(cmd: &CompileCommand) -> Self {
        CommandLine::new(cmd.program()).args(cmd.args().iter().cloned())
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tokens().join(" "))
    }
}

/// Runs external programs synchronously.
pub trait ProcessRunner {
    /// Run `command` to completion and return its exit code.
    fn run(&mut self, command: &CommandLine) -> Result<i32, RunnerError>;
}

/// Runs programs as real child processes.
#[derive(Debug, Default)]
pub struct SystemRunner;

impl SystemRunner {
    pub fn new() -> Self {
        Self
    }
}

impl ProcessRunner for SystemRunner {
    fn run(&mut self, command: &CommandLine) -> Result<i32, RunnerError> {
        if command.program.is_empty() {
            return Err(RunnerError::EmptyCommand);
        }
        tracing::info!("> {}", command);

        let output = || if command.quiet { Stdio::null() } else { Stdio::inherit() };
        let status = Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::inherit())
            .stdout(output())
            .stderr(output())
            .status()
            .map_err(|source| RunnerError::Spawn {
                program: command.program.clone(),
                source,
            })?;

        let code = exit_code(status);
        tracing::debug!(program = %command.program, code, "process exited");
        Ok(code)
    }
}

/// Exit code of a finished child. A child killed by a signal reports
/// `128 + signal`, as shells do.
pub fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    1
}
