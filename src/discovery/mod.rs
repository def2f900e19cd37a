//! Source discovery
//!
//! Lists the compilable files directly inside the source directory. Only
//! the file name is matched against the source patterns; subdirectories
//! are not searched and nothing is excluded.

use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::Serialize;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Errors from source discovery
#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    #[error("No source files found in {}", dir.display())]
    NoSources { dir: PathBuf },

    #[error("invalid source pattern: {0}")]
    Pattern(#[from] globset::Error),

    #[error("failed to read source directory: {0}")]
    Walk(#[from] walkdir::Error),
}

/// Sorted set of source files for one run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceSet {
    files: Vec<PathBuf>,
}

impl SourceSet {
    /// Build a set, sorting by path string.
    pub fn new(mut files: Vec<PathBuf>) -> Self {
        files.sort_by(|a, b| a.as_os_str().cmp(b.as_os_str()));
        Self { files }
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PathBuf> {
        self.files.iter()
    }
}

/// Discover source files in `dir` whose names match any of `patterns`.
///
/// A missing directory is reported the same way as an empty one.
pub fn discover_sources(dir: &Path, patterns: &[String]) -> Result<SourceSet, DiscoveryError> {
    if !dir.is_dir() {
        return Err(DiscoveryError::NoSources {
            dir: dir.to_path_buf(),
        });
    }

    let matcher = build_matcher(patterns)?;
    let mut files = Vec::new();

    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry?;
        if !entry.path().is_file() {
            continue;
        }
        if matcher.is_match(entry.file_name()) {
            files.push(entry.path().to_path_buf());
        }
    }

    if files.is_empty() {
        return Err(DiscoveryError::NoSources {
            dir: dir.to_path_buf(),
        });
    }

    tracing::debug!(count = files.len(), dir = %dir.display(), "discovered sources");
    Ok(SourceSet::new(files))
}

fn build_matcher(patterns: &[String]) -> Result<GlobSet, globset::Error> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn cpp() -> Vec<String> {
        vec!["*.cpp".to_string()]
    }

    #[test]
    fn test_sources_sorted_by_path() {
        let dir = TempDir::new().unwrap();
        for name in ["Room.cpp", "Bullet.cpp", "Map.cpp", "Game.cpp"] {
            fs::write(dir.path().join(name), b"").unwrap();
        }

        let set = discover_sources(dir.path(), &cpp()).unwrap();
        let names: Vec<_> = set
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["Bullet.cpp", "Game.cpp", "Map.cpp", "Room.cpp"]);
    }

    #[test]
    fn test_only_matching_extensions() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("Game.cpp"), b"").unwrap();
        fs::write(dir.path().join("Game.h"), b"").unwrap();
        fs::write(dir.path().join("notes.txt"), b"").unwrap();

        let set = discover_sources(dir.path(), &cpp()).unwrap();
        assert_eq!(set.len(), 1);
        assert!(set.files()[0].ends_with("Game.cpp"));
    }

    #[test]
    fn test_subdirectories_not_searched() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("main.cpp"), b"").unwrap();
        fs::create_dir(dir.path().join("nested.cpp")).unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub/Extra.cpp"), b"").unwrap();

        let set = discover_sources(dir.path(), &cpp()).unwrap();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_empty_directory_is_no_sources() {
        let dir = TempDir::new().unwrap();
        let err = discover_sources(dir.path(), &cpp()).unwrap_err();
        assert!(matches!(err, DiscoveryError::NoSources { .. }));
    }

    #[test]
    fn test_missing_directory_is_no_sources() {
        let dir = TempDir::new().unwrap();
        let err = discover_sources(&dir.path().join("src"), &cpp()).unwrap_err();
        assert!(matches!(err, DiscoveryError::NoSources { .. }));
    }

    #[test]
    fn test_multiple_patterns() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.cc"), b"").unwrap();
        fs::write(dir.path().join("b.cpp"), b"").unwrap();
        let patterns = vec!["*.cc".to_string(), "*.cpp".to_string()];
        let set = discover_sources(dir.path(), &patterns).unwrap();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_source_set_sorts_on_construction() {
        let set = SourceSet::new(vec![PathBuf::from("src/b.cpp"), PathBuf::from("src/a.cpp")]);
        assert_eq!(set.files()[0], PathBuf::from("src/a.cpp"));
    }
}
