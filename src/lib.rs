//! relaunch - rebuild a C++ project when needed, then launch it
//!
//! Discovers sources, assembles a platform-specific compiler invocation,
//! rebuilds only when a source is newer than the last build, stops stale
//! running instances that keep the old binary locked, and runs the result.

pub mod config;
pub mod discovery;
pub mod logging;
pub mod pipeline;
pub mod recovery;
pub mod runner;
pub mod staleness;

pub use config::{ConfigError, ProjectConfig, RecoverySettings};
pub use discovery::{discover_sources, DiscoveryError, SourceSet};
pub use pipeline::{BuildPlan, Pipeline, PipelineError, PipelineOptions, RunReport};
pub use recovery::{LockProbe, LockRecovery, OpenForWriteProbe, RecoveryOutcome};
pub use relaunch_profile::{CompileCommand, HostOs, PlatformProfile};
pub use runner::{CommandLine, ProcessRunner, RunnerError, SystemRunner};
pub use staleness::{check_staleness, BuildArtifact, Staleness};
