//! Compiler command assembly
//!
//! One routine builds the invocation for every platform; the platform only
//! contributes data through its `PlatformProfile`. Token order:
//!
//! 1. compiler, language standard
//! 2. project include dir, dependency include dir, profile include dirs
//! 3. sources (already sorted)
//! 4. `-o <artifact>`
//! 5. dependency lib dir, profile lib dirs, linker flags
//! 6. profile link items, in profile order

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::profile::PlatformProfile;

/// Include and library directories of the secondary (networking) dependency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyPaths {
    pub include_dir: PathBuf,
    pub lib_dir: PathBuf,
}

/// Everything the assembler needs besides the platform profile.
#[derive(Debug, Clone)]
pub struct CompileInputs<'a> {
    /// Compiler binary, e.g. `g++`
    pub compiler: &'a str,
    /// Language standard without the flag prefix, e.g. `c++17`
    pub std: &'a str,
    /// Project include directory
    pub include_dir: &'a Path,
    /// Secondary dependency, when present on disk
    pub dependency: Option<&'a DependencyPaths>,
    /// Sorted source files
    pub sources: &'a [PathBuf],
    /// Output artifact path
    pub output: &'a Path,
    /// Replaces the profile's toolkit include/lib dirs (`<root>/include`, `<root>/lib`)
    pub toolkit_root: Option<&'a Path>,
}

/// A fully assembled compiler invocation. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompileCommand {
    tokens: Vec<String>,
}

impl CompileCommand {
    /// Assemble the compiler invocation.
    pub fn assemble(inputs: &CompileInputs<'_>, profile: &PlatformProfile) -> Self {
        let mut tokens = vec![inputs.compiler.to_string(), format!("-std={}", inputs.std)];

        tokens.push(include_flag(inputs.include_dir));
        if let Some(dep) = inputs.dependency {
            tokens.push(include_flag(&dep.include_dir));
        }
        for dir in toolkit_dirs(profile.include_dirs, inputs.toolkit_root, "include") {
            tokens.push(format!("-I{}", dir));
        }

        tokens.extend(inputs.sources.iter().map(|s| s.display().to_string()));

        tokens.push("-o".to_string());
        tokens.push(inputs.output.display().to_string());

        if let Some(dep) = inputs.dependency {
            tokens.push(format!("-L{}", dep.lib_dir.display()));
        }
        for dir in toolkit_dirs(profile.lib_dirs, inputs.toolkit_root, "lib") {
            tokens.push(format!("-L{}", dir));
        }
        tokens.extend(profile.linker_flags.iter().map(|f| f.to_string()));

        tokens.extend(profile.link_tokens());

        Self { tokens }
    }

    /// Build a command from raw tokens (first token is the program).
    pub fn from_tokens(tokens: Vec<String>) -> Self {
        Self { tokens }
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn program(&self) -> &str {
        self.tokens.first().map(String::as_str).unwrap_or_default()
    }

    pub fn args(&self) -> &[String] {
        self.tokens.get(1..).unwrap_or_default()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for CompileCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tokens.join(" "))
    }
}

fn include_flag(dir: &Path) -> String {
    format!("-I{}", dir.display())
}

/// Profile toolkit dirs, or the override root's subdirectory when the
/// profile uses toolkit dirs at all.
fn toolkit_dirs(
    profile_dirs: &'static [&'static str],
    root: Option<&Path>,
    sub: &str,
) -> Vec<String> {
    match root {
        Some(root) if !profile_dirs.is_empty() => vec![root.join(sub).display().to_string()],
        _ => profile_dirs.iter().map(|d| d.to_string()).collect(),
    }
}
