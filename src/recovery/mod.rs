//! Lock recovery for the build artifact
//!
//! A previously launched build keeps its executable open, which makes the
//! compiler fail to overwrite it. Before rebuilding we probe the artifact by
//! opening it for writing; if that is refused, running instances are asked
//! to terminate and we pause briefly so the OS can release the handle.
//!
//! Recovery is best-effort. Every failure is logged and recorded in the
//! returned `RecoveryOutcome`, and the build proceeds regardless.

use serde::Serialize;
use std::fs::OpenOptions;
use std::io;
use std::path::Path;
use std::time::Duration;

use relaunch_profile::{HostOs, PlatformProfile};

use crate::config::RecoverySettings;
use crate::runner::{CommandLine, ProcessRunner};
use crate::staleness::BuildArtifact;

/// Linux truncates process names to this many bytes for `pkill` matching
const LINUX_COMM_LEN: usize = 15;

/// Windows `ERROR_SHARING_VIOLATION` / `ERROR_LOCK_VIOLATION`
#[cfg(windows)]
const WINDOWS_LOCK_ERRORS: [i32; 2] = [32, 33];

/// Decides whether the artifact is held open by another process.
pub trait LockProbe {
    fn is_locked(&self, path: &Path) -> bool;
}

/// Probe that tries to open the file for read-write access.
#[derive(Debug, Default, Clone, Copy)]
pub struct OpenForWriteProbe;

impl LockProbe for OpenForWriteProbe {
    fn is_locked(&self, path: &Path) -> bool {
        match OpenOptions::new().read(true).write(true).open(path) {
            Ok(_) => false,
            Err(e) if is_lock_error(&e) => {
                tracing::debug!(path = %path.display(), error = %e, "artifact is locked");
                true
            }
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "lock probe failed, assuming unlocked");
                false
            }
        }
    }
}

/// Errors that mean "someone else has this file open".
pub fn is_lock_error(e: &io::Error) -> bool {
    if e.kind() == io::ErrorKind::PermissionDenied {
        return true;
    }
    #[cfg(unix)]
    {
        if e.raw_os_error() == Some(libc::ETXTBSY) {
            return true;
        }
    }
    #[cfg(windows)]
    {
        if let Some(code) = e.raw_os_error() {
            if WINDOWS_LOCK_ERRORS.contains(&code) {
                return true;
            }
        }
    }
    false
}

/// What the termination step did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TerminationReport {
    /// Termination commands issued
    pub commands: Vec<String>,
    /// At least one command reported a terminated process
    pub matched: bool,
    /// Commands that failed, with the reason
    pub failures: Vec<String>,
    /// Pause observed after termination
    #[serde(with = "millis")]
    pub pause: Duration,
}

/// Result of lock recovery
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RecoveryOutcome {
    /// No artifact, or the artifact could be opened for writing
    NotLocked,
    /// Locked, but recovery is disabled in the configuration
    Disabled,
    /// Termination was requested
    Terminated(TerminationReport),
}

impl RecoveryOutcome {
    pub fn attempted(&self) -> bool {
        matches!(self, RecoveryOutcome::Terminated(_))
    }

    pub fn succeeded(&self) -> bool {
        matches!(self, RecoveryOutcome::Terminated(report) if report.matched)
    }
}

/// Terminates stale instances of the artifact.
#[derive(Debug, Clone)]
pub struct LockRecovery<'a> {
    profile: &'a PlatformProfile,
    window_title: Option<&'a str>,
    settings: RecoverySettings,
}

impl<'a> LockRecovery<'a> {
    pub fn new(
        profile: &'a PlatformProfile,
        window_title: Option<&'a str>,
        settings: RecoverySettings,
    ) -> Self {
        Self {
            profile,
            window_title,
            settings,
        }
    }

    /// Probe the artifact and, if it is locked, terminate whatever holds it.
    ///
    /// Callers only invoke this when a rebuild is about to happen.
    pub fn recover(
        &self,
        artifact: &BuildArtifact,
        probe: &dyn LockProbe,
        runner: &mut dyn ProcessRunner,
    ) -> RecoveryOutcome {
        if !artifact.exists() || !probe.is_locked(&artifact.path) {
            return RecoveryOutcome::NotLocked;
        }
        if !self.settings.enabled {
            tracing::warn!(
                artifact = %artifact.path.display(),
                "artifact is in use and lock recovery is disabled; the build may fail"
            );
            return RecoveryOutcome::Disabled;
        }

        tracing::info!(artifact = %artifact.path.display(), "artifact is in use, stopping running instances");
        let report = self.terminate(artifact, runner);
        if !report.matched {
            tracing::warn!(
                failures = ?report.failures,
                "could not stop running instances; continuing with the build"
            );
        }
        RecoveryOutcome::Terminated(report)
    }

    /// Commands that stop running instances of `artifact` on this platform.
    pub fn termination_commands(&self, artifact: &BuildArtifact) -> Vec<CommandLine> {
        match self.profile.host {
            HostOs::Windows => {
                let mut commands = vec![CommandLine::new("taskkill")
                    .args(["/F", "/IM"])
                    .arg(artifact.file_name())
                    .quiet()];
                if let (true, Some(title)) = (self.profile.window_title_matching, self.window_title) {
                    commands.push(
                        CommandLine::new("taskkill")
                            .args(["/F", "/FI"])
                            .arg(format!("WINDOWTITLE eq {}*", title))
                            .quiet(),
                    );
                }
                commands
            }
            HostOs::Linux => {
                let base = artifact.base_name();
                vec![CommandLine::new("pkill").arg("-x").arg(linux_comm_name(&base)).quiet()]
            }
            HostOs::MacOs => {
                vec![CommandLine::new("pkill").arg("-x").arg(artifact.base_name()).quiet()]
            }
        }
    }

    fn terminate(&self, artifact: &BuildArtifact, runner: &mut dyn ProcessRunner) -> TerminationReport {
        let mut report = TerminationReport {
            commands: Vec::new(),
            matched: false,
            failures: Vec::new(),
            pause: self.settings.pause,
        };

        for command in self.termination_commands(artifact) {
            report.commands.push(command.to_string());
            match runner.run(&command) {
                Ok(0) => report.matched = true,
                Ok(code) => {
                    tracing::debug!(command = %command, code, "termination command reported no match");
                    report.failures.push(format!("{}: exit code {}", command, code));
                }
                Err(e) => {
                    tracing::debug!(command = %command, error = %e, "termination command failed");
                    report.failures.push(format!("{}: {}", command, e));
                }
            }
        }

        std::thread::sleep(self.settings.pause);
        report
    }
}

/// Cut `name` to the kernel's `comm` length, backing off to a char boundary.
fn linux_comm_name(name: &str) -> &str {
    if name.len() <= LINUX_COMM_LEN {
        return name;
    }
    let mut end = LINUX_COMM_LEN;
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    &name[..end]
}

mod millis {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }
}
