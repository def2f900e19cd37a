//! Staleness detection
//!
//! A single timestamp comparison decides whether the project is rebuilt:
//! - no artifact on disk → rebuild
//! - any source modified strictly after the artifact → rebuild
//! - otherwise the artifact is up to date
//!
//! Contents are never hashed and headers are not tracked.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::discovery::SourceSet;

/// Errors reading timestamps
#[derive(Debug, thiserror::Error)]
pub enum StalenessError {
    #[error("cannot read modification time of {}: {source}", path.display())]
    Timestamp {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// The build output and its modification time, if it exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildArtifact {
    pub path: PathBuf,
    pub modified: Option<DateTime<Utc>>,
}

impl BuildArtifact {
    /// Inspect the artifact at `path`. A missing file is not an error.
    pub fn inspect(path: &Path) -> Result<Self, StalenessError> {
        let modified = match fs::metadata(path) {
            Ok(meta) => Some(read_modified(path, &meta)?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(source) => {
                return Err(StalenessError::Timestamp {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        Ok(Self {
            path: path.to_path_buf(),
            modified,
        })
    }

    pub fn exists(&self) -> bool {
        self.modified.is_some()
    }

    /// File name without directory or platform suffix, used to find
    /// running instances.
    pub fn base_name(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// File name including any platform suffix.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// A source file and its modification time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceStamp {
    pub path: PathBuf,
    pub modified: DateTime<Utc>,
}

impl SourceStamp {
    pub fn read(path: &Path) -> Result<Self, StalenessError> {
        let meta = fs::metadata(path).map_err(|source| StalenessError::Timestamp {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            modified: read_modified(path, &meta)?,
        })
    }

    /// Read timestamps for every source, preserving set order.
    pub fn read_all(sources: &SourceSet) -> Result<Vec<Self>, StalenessError> {
        sources.iter().map(|p| Self::read(p)).collect()
    }
}

/// Why a rebuild is needed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum RebuildReason {
    ArtifactMissing,
    SourceNewer { path: PathBuf },
    Forced,
}

/// Outcome of the staleness check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Staleness {
    UpToDate,
    Rebuild(RebuildReason),
}

impl Staleness {
    pub fn needs_rebuild(&self) -> bool {
        matches!(self, Staleness::Rebuild(_))
    }

    pub fn describe(&self) -> String {
        match self {
            Staleness::UpToDate => "up to date".to_string(),
            Staleness::Rebuild(RebuildReason::ArtifactMissing) => {
                "rebuild needed: no previous build".to_string()
            }
            Staleness::Rebuild(RebuildReason::SourceNewer { path }) => {
                format!("rebuild needed: {} changed", path.display())
            }
            Staleness::Rebuild(RebuildReason::Forced) => "rebuild forced".to_string(),
        }
    }
}

/// Decide whether the artifact must be rebuilt.
///
/// The first source (in the given order) newer than the artifact is
/// reported as the reason.
pub fn check_staleness(artifact: &BuildArtifact, sources: &[SourceStamp]) -> Staleness {
    let Some(built_at) = artifact.modified else {
        return Staleness::Rebuild(RebuildReason::ArtifactMissing);
    };

    match sources.iter().find(|s| s.modified > built_at) {
        Some(newer) => Staleness::Rebuild(RebuildReason::SourceNewer {
            path: newer.path.clone(),
        }),
        None => Staleness::UpToDate,
    }
}

fn read_modified(path: &Path, meta: &fs::Metadata) -> Result<DateTime<Utc>, StalenessError> {
    meta.modified()
        .map(DateTime::<Utc>::from)
        .map_err(|source| StalenessError::Timestamp {
            path: path.to_path_buf(),
            source,
        })
}
