//! Build-and-launch pipeline
//!
//! Runs the stages strictly in sequence:
//! - discover sources (fails fast when there are none)
//! - assemble the compiler command for the host profile
//! - check staleness against the existing artifact
//! - recover a locked artifact (only when rebuilding over an existing one)
//! - compile
//! - run the artifact
//!
//! The build step's non-zero exit code ends the pipeline; the artifact's
//! exit code is reported back untouched.

use serde::Serialize;
use std::fs;
use std::io;
use std::path::PathBuf;

use relaunch_profile::{CompileCommand, CompileInputs, HostOs, PlatformProfile};

use crate::config::{ConfigError, ProjectConfig};
use crate::discovery::{discover_sources, DiscoveryError, SourceSet};
use crate::recovery::{LockProbe, LockRecovery, RecoveryOutcome};
use crate::runner::{CommandLine, ProcessRunner, RunnerError};
use crate::staleness::{
    check_staleness, BuildArtifact, RebuildReason, SourceStamp, Staleness, StalenessError,
};

/// Pipeline errors
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Discovery(#[from] DiscoveryError),

    #[error("timestamp error: {0}")]
    Staleness(#[from] StalenessError),

    #[error("{0}")]
    Runner(#[from] RunnerError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PipelineError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            PipelineError::Config(_) => 1,
            PipelineError::Discovery(_) => 1,
            PipelineError::Staleness(_) => 1,
            PipelineError::Runner(e) => e.exit_code(),
            PipelineError::Io(_) => 1,
            PipelineError::Serialization(_) => 1,
        }
    }
}

/// Result type for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Per-invocation switches
#[derive(Debug, Clone, Copy, Default)]
pub struct PipelineOptions {
    /// Rebuild even when the artifact is up to date
    pub force: bool,
    /// Plan only: no recovery, no build, no run
    pub dry_run: bool,
    /// Build if needed but do not launch the artifact
    pub no_run: bool,
}

/// Everything decided before any process is started
#[derive(Debug, Clone, Serialize)]
pub struct BuildPlan {
    pub host: HostOs,
    pub sources: SourceSet,
    pub artifact: BuildArtifact,
    pub staleness: Staleness,
    pub command: CompileCommand,
}

impl BuildPlan {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn to_human(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("Host: {}\n", self.host));
        out.push_str(&format!("Sources ({}):\n", self.sources.len()));
        for source in self.sources.iter() {
            out.push_str(&format!("  {}\n", source.display()));
        }
        match self.artifact.modified {
            Some(at) => out.push_str(&format!(
                "Artifact: {} (built {})\n",
                self.artifact.path.display(),
                at.format("%Y-%m-%d %H:%M:%S UTC")
            )),
            None => out.push_str(&format!("Artifact: {} (missing)\n", self.artifact.path.display())),
        }
        out.push_str(&format!("Status: {}\n", self.staleness.describe()));
        out.push_str(&format!("Command: {}\n", self.command));
        out
    }
}

/// What a pipeline run did
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub plan: BuildPlan,
    pub recovery: RecoveryOutcome,
    /// Compiler exit code, when the compiler ran
    pub build_exit_code: Option<i32>,
    /// Artifact exit code, when it ran
    pub run_exit_code: Option<i32>,
}

impl RunReport {
    fn planned(plan: BuildPlan) -> Self {
        Self {
            plan,
            recovery: RecoveryOutcome::NotLocked,
            build_exit_code: None,
            run_exit_code: None,
        }
    }

    pub fn rebuilt(&self) -> bool {
        self.build_exit_code == Some(0)
    }

    pub fn build_failed(&self) -> bool {
        matches!(self.build_exit_code, Some(code) if code != 0)
    }

    /// Process exit code for the orchestrator: the failing compiler's
    /// code, otherwise the artifact's code, otherwise 0.
    pub fn exit_code(&self) -> i32 {
        match (self.build_exit_code, self.run_exit_code) {
            (Some(code), _) if code != 0 => code,
            (_, Some(code)) => code,
            _ => 0,
        }
    }
}

/// Pipeline execution context
pub struct Pipeline<R, P> {
    config: ProjectConfig,
    profile: &'static PlatformProfile,
    options: PipelineOptions,
    runner: R,
    probe: P,
}

impl<R: ProcessRunner, P: LockProbe> Pipeline<R, P> {
    pub fn new(
        config: ProjectConfig,
        host: HostOs,
        options: PipelineOptions,
        runner: R,
        probe: P,
    ) -> Self {
        Self {
            config,
            profile: PlatformProfile::for_host(host),
            options,
            runner,
            probe,
        }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub fn probe(&self) -> &P {
        &self.probe
    }

    /// Path of the build output for this host
    pub fn artifact_path(&self) -> PathBuf {
        self.config
            .output_dir
            .join(self.profile.artifact_file_name(&self.config.name))
    }

    /// Discover sources, assemble the command and check staleness.
    pub fn plan(&self) -> PipelineResult<BuildPlan> {
        let sources = discover_sources(&self.config.source_dir, &self.config.source_patterns)?;
        let artifact_path = self.artifact_path();

        let dependency = self
            .config
            .dependency_paths(self.profile.dependency_library_files);
        if dependency.is_none() {
            tracing::debug!(dir = %self.config.dependency_dir.display(), "dependency directory not found");
        }

        let inputs = CompileInputs {
            compiler: &self.config.compiler,
            std: &self.config.std,
            include_dir: &self.config.include_dir,
            dependency: dependency.as_ref(),
            sources: sources.files(),
            output: &artifact_path,
            toolkit_root: self.config.toolkit_root.as_deref(),
        };
        let command = CompileCommand::assemble(&inputs, self.profile);

        let artifact = BuildArtifact::inspect(&artifact_path)?;
        let staleness = if self.options.force {
            Staleness::Rebuild(RebuildReason::Forced)
        } else {
            check_staleness(&artifact, &SourceStamp::read_all(&sources)?)
        };
        tracing::debug!(status = %staleness.describe(), "staleness checked");

        Ok(BuildPlan {
            host: self.profile.host,
            sources,
            artifact,
            staleness,
            command,
        })
    }

    /// Run the whole pipeline.
    pub fn run(&mut self) -> PipelineResult<RunReport> {
        let plan = self.plan()?;
        let mut report = RunReport::planned(plan);
        if self.options.dry_run {
            return Ok(report);
        }

        if report.plan.staleness.needs_rebuild() {
            if report.plan.artifact.exists() {
                let recovery = LockRecovery::new(
                    self.profile,
                    self.config.window_title.as_deref(),
                    self.config.recovery,
                );
                report.recovery = recovery.recover(&report.plan.artifact, &self.probe, &mut self.runner);
            }

            fs::create_dir_all(&self.config.output_dir)?;
            tracing::info!(
                "Building from {} ({})...",
                self.config.source_dir.display(),
                report.plan.staleness.describe()
            );
            let code = self.runner.run(&CommandLine::from(&report.plan.command))?;
            report.build_exit_code = Some(code);
            if code != 0 {
                tracing::error!(code, "build failed");
                return Ok(report);
            }
        } else {
            tracing::info!("{} is up to date", report.plan.artifact.path.display());
        }

        if self.options.no_run {
            return Ok(report);
        }

        let artifact = &report.plan.artifact.path;
        tracing::info!("Running {}...", artifact.display());
        let code = self
            .runner
            .run(&CommandLine::new(artifact.display().to_string()))?;
        report.run_exit_code = Some(code);
        Ok(report)
    }
}
