//! Project configuration
//!
//! Three layers, later layers winning:
//! 1. Built-in defaults
//! 2. Project file (`relaunch.toml` in the project root, or `--config`)
//! 3. CLI flags
//!
//! Layers are merged as JSON values, then deserialized and validated into
//! a `ProjectConfig` whose paths are anchored at the project root.

mod defaults;
mod merge;

pub use defaults::BuiltinDefaults;
pub use merge::{deep_merge, merge_layers};

use globset::Glob;
use serde::Deserialize;
use serde_json::Value;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use relaunch_profile::DependencyPaths;

/// Project file name looked up in the project root
pub const CONFIG_FILE_NAME: &str = "relaunch.toml";

/// Upper bound for the post-termination pause
pub const MAX_RECOVERY_PAUSE_MS: u64 = 1000;

/// Base name used when the project root has no usable directory name
const FALLBACK_NAME: &str = "app";

/// Error types for config operations
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Schema(#[from] serde_json::Error),

    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

/// Merged configuration as it appears in `relaunch.toml`
#[derive(Debug, Clone, Deserialize)]
struct Settings {
    project: ProjectSection,
    toolchain: ToolchainSection,
    dependency: DependencySection,
    #[serde(default)]
    windows: WindowsSection,
    recovery: RecoverySection,
}

#[derive(Debug, Clone, Deserialize)]
struct ProjectSection {
    name: Option<String>,
    source_dir: String,
    include_dir: String,
    output_dir: String,
    source_patterns: Vec<String>,
    window_title: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct ToolchainSection {
    compiler: String,
    std: String,
}

#[derive(Debug, Clone, Deserialize)]
struct DependencySection {
    dir: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct WindowsSection {
    freeglut_root: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct RecoverySection {
    enabled: bool,
    pause_ms: u64,
}

/// Lock recovery settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecoverySettings {
    pub enabled: bool,
    pub pause: Duration,
}

impl Default for RecoverySettings {
    fn default() -> Self {
        let defaults = BuiltinDefaults::default();
        Self {
            enabled: defaults.recovery_enabled,
            pause: Duration::from_millis(defaults.recovery_pause_ms),
        }
    }
}

/// Fully resolved project configuration
#[derive(Debug, Clone)]
pub struct ProjectConfig {
    /// Project root all relative paths are anchored at
    pub root: PathBuf,
    /// Artifact base name (without platform suffix)
    pub name: String,
    pub source_dir: PathBuf,
    pub include_dir: PathBuf,
    pub output_dir: PathBuf,
    pub source_patterns: Vec<String>,
    /// Window title used to find running instances on platforms that expose it
    pub window_title: Option<String>,
    pub compiler: String,
    pub std: String,
    /// Secondary dependency directory (may not exist)
    pub dependency_dir: PathBuf,
    /// Overrides the Windows toolkit include/lib directories
    pub toolkit_root: Option<PathBuf>,
    pub recovery: RecoverySettings,
    /// Config file that contributed, if any
    pub source_file: Option<PathBuf>,
}

impl ProjectConfig {
    /// Load configuration for the project at `root`.
    ///
    /// An explicit `config_path` must exist; otherwise `relaunch.toml` in
    /// the root is used when present and built-in defaults when not.
    pub fn load(
        root: &Path,
        config_path: Option<&Path>,
        cli_overrides: Option<Value>,
    ) -> Result<Self, ConfigError> {
        let root = anchor_root(root)?;

        let file = match config_path {
            Some(path) if path.exists() => Some(path.to_path_buf()),
            Some(path) => return Err(ConfigError::NotFound(path.to_path_buf())),
            None => Some(root.join(CONFIG_FILE_NAME)).filter(|p| p.exists()),
        };

        let mut layers = vec![BuiltinDefaults::default().to_value()];
        if let Some(ref path) = file {
            layers.push(load_toml_file(path)?);
        }
        if let Some(cli) = cli_overrides {
            layers.push(cli);
        }

        let settings: Settings = serde_json::from_value(merge_layers(layers))?;
        Self::resolve(root, settings, file)
    }

    fn resolve(
        root: PathBuf,
        settings: Settings,
        source_file: Option<PathBuf>,
    ) -> Result<Self, ConfigError> {
        let name = settings
            .project
            .name
            .clone()
            .or_else(|| {
                root.file_name()
                    .map(|n| n.to_string_lossy().into_owned())
            })
            .unwrap_or_else(|| FALLBACK_NAME.to_string());

        let config = Self {
            name,
            source_dir: root.join(&settings.project.source_dir),
            include_dir: root.join(&settings.project.include_dir),
            output_dir: root.join(&settings.project.output_dir),
            source_patterns: settings.project.source_patterns,
            window_title: settings.project.window_title.filter(|t| !t.is_empty()),
            compiler: settings.toolchain.compiler,
            std: settings.toolchain.std,
            dependency_dir: root.join(&settings.dependency.dir),
            toolkit_root: settings.windows.freeglut_root.map(PathBuf::from),
            recovery: RecoverySettings {
                enabled: settings.recovery.enabled,
                pause: Duration::from_millis(settings.recovery.pause_ms),
            },
            source_file,
            root,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "project name must not be empty".to_string(),
            ));
        }
        if self.name.contains(['/', '\\']) {
            return Err(ConfigError::ValidationError(format!(
                "project name '{}' must not contain path separators",
                self.name
            )));
        }
        if self.compiler.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "toolchain.compiler must not be empty".to_string(),
            ));
        }
        if self.std.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "toolchain.std must not be empty".to_string(),
            ));
        }
        if self.source_patterns.is_empty() {
            return Err(ConfigError::ValidationError(
                "at least one entry is required in project.source_patterns".to_string(),
            ));
        }
        for pattern in &self.source_patterns {
            Glob::new(pattern).map_err(|e| {
                ConfigError::ValidationError(format!("invalid source pattern '{}': {}", pattern, e))
            })?;
        }
        if self.recovery.pause > Duration::from_millis(MAX_RECOVERY_PAUSE_MS) {
            return Err(ConfigError::ValidationError(format!(
                "recovery.pause_ms must be at most {}, got {}",
                MAX_RECOVERY_PAUSE_MS,
                self.recovery.pause.as_millis()
            )));
        }
        Ok(())
    }

    /// Dependency include/lib directories, when the dependency is present.
    ///
    /// The dependency counts as present when `<dir>/include` exists. Its
    /// library directory is `<dir>/lib` if that holds one of the profile's
    /// library files, otherwise `<dir>` itself.
    pub fn dependency_paths(&self, library_files: &[&str]) -> Option<DependencyPaths> {
        let include_dir = self.dependency_dir.join("include");
        if !include_dir.is_dir() {
            return None;
        }
        let lib_sub = self.dependency_dir.join("lib");
        let lib_dir = if library_files.iter().any(|f| lib_sub.join(f).is_file()) {
            lib_sub
        } else {
            self.dependency_dir.clone()
        };
        Some(DependencyPaths { include_dir, lib_dir })
    }
}

/// Absolute, symlink-free project root.
///
/// Windows canonical paths come back in verbatim form (`\\?\C:\proj`),
/// which MinGW tools reject, so the prefix is dropped where a plain
/// equivalent exists.
fn anchor_root(root: &Path) -> io::Result<PathBuf> {
    let canonical = fs::canonicalize(root)?;
    Ok(match canonical.to_str().and_then(strip_verbatim_prefix) {
        Some(plain) => PathBuf::from(plain),
        None => canonical,
    })
}

/// `\\?\C:\x` -> `C:\x` and `\\?\UNC\host\share` -> `\\host\share`.
/// Other verbatim forms have no plain spelling and yield `None`.
fn strip_verbatim_prefix(path: &str) -> Option<String> {
    let rest = path.strip_prefix(r"\\?\")?;
    if let Some(unc) = rest.strip_prefix(r"UNC\") {
        return Some(format!(r"\\{}", unc));
    }
    match rest.as_bytes() {
        [drive, b':', ..] if drive.is_ascii_alphabetic() => Some(rest.to_string()),
        _ => None,
    }
}

fn load_toml_file(path: &Path) -> Result<Value, ConfigError> {
    let contents = fs::read_to_string(path)?;
    Ok(toml::from_str(&contents)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_without_file() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("projectOj");
        fs::create_dir(&root).unwrap();

        let config = ProjectConfig::load(&root, None, None).unwrap();
        assert_eq!(config.name, "projectOj");
        assert!(config.source_dir.ends_with("src"));
        assert!(config.output_dir.ends_with("bin/Debug"));
        assert_eq!(config.compiler, "g++");
        assert_eq!(config.std, "c++17");
        assert_eq!(config.recovery, RecoverySettings::default());
        assert_eq!(config.window_title.as_deref(), Some("Operation Jackpot"));
        assert!(config.source_file.is_none());
    }

    #[test]
    fn test_project_file_overrides_defaults() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            r#"
[project]
name = "game"
window_title = "Operation Jackpot"
source_patterns = ["*.cc"]

[toolchain]
compiler = "clang++"

[recovery]
pause_ms = 150
"#,
        )
        .unwrap();

        let config = ProjectConfig::load(dir.path(), None, None).unwrap();
        assert_eq!(config.name, "game");
        assert_eq!(config.window_title.as_deref(), Some("Operation Jackpot"));
        assert_eq!(config.source_patterns, vec!["*.cc"]);
        assert_eq!(config.compiler, "clang++");
        assert_eq!(config.std, "c++17");
        assert_eq!(config.recovery.pause, Duration::from_millis(150));
        assert!(config.recovery.enabled);
        assert!(config.source_file.is_some());
    }

    #[test]
    fn test_cli_overrides_win() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "[toolchain]\ncompiler = \"clang++\"\n",
        )
        .unwrap();

        let cli = json!({"toolchain": {"compiler": "g++-13"}, "recovery": {"enabled": false}});
        let config = ProjectConfig::load(dir.path(), None, Some(cli)).unwrap();
        assert_eq!(config.compiler, "g++-13");
        assert!(!config.recovery.enabled);
    }

    #[test]
    fn test_explicit_config_must_exist() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope.toml");
        let err = ProjectConfig::load(dir.path(), Some(&missing), None).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_pause_is_bounded() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "[recovery]\npause_ms = 5000\n",
        )
        .unwrap();
        let err = ProjectConfig::load(dir.path(), None, None).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "[project]\nsource_patterns = [\"[\"]\n",
        )
        .unwrap();
        let err = ProjectConfig::load(dir.path(), None, None).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_malformed_toml() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CONFIG_FILE_NAME), "[project\n").unwrap();
        let err = ProjectConfig::load(dir.path(), None, None).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_empty_window_title_disables_title_matching() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CONFIG_FILE_NAME), "[project]\nwindow_title = \"\"\n").unwrap();
        let config = ProjectConfig::load(dir.path(), None, None).unwrap();
        assert!(config.window_title.is_none());
    }

    #[test]
    fn test_verbatim_prefix_is_stripped() {
        assert_eq!(
            strip_verbatim_prefix(r"\\?\C:\games\projectOj").as_deref(),
            Some(r"C:\games\projectOj")
        );
        assert_eq!(
            strip_verbatim_prefix(r"\\?\UNC\fileserver\games\projectOj").as_deref(),
            Some(r"\\fileserver\games\projectOj")
        );
        assert_eq!(strip_verbatim_prefix(r"\\?\Volume{1234}\games"), None);
        assert_eq!(strip_verbatim_prefix(r"C:\games\projectOj"), None);
        assert_eq!(strip_verbatim_prefix("/home/dev/projectOj"), None);
    }

    #[test]
    fn test_root_is_absolute_and_not_verbatim() {
        let dir = TempDir::new().unwrap();
        let config = ProjectConfig::load(dir.path(), None, None).unwrap();
        assert!(config.root.is_absolute());
        assert!(!config.root.to_string_lossy().starts_with(r"\\?\"));
        assert!(config.source_dir.starts_with(&config.root));
    }

    #[test]
    fn test_dependency_paths_detection() {
        let dir = TempDir::new().unwrap();
        let config = ProjectConfig::load(dir.path(), None, None).unwrap();
        assert!(config.dependency_paths(&["libenet.a"]).is_none());

        let dep = config.root.join("deps/enet");
        fs::create_dir_all(dep.join("include")).unwrap();
        let paths = config.dependency_paths(&["libenet.a"]).unwrap();
        assert_eq!(paths.include_dir, dep.join("include"));
        assert_eq!(paths.lib_dir, dep);

        fs::create_dir_all(dep.join("lib")).unwrap();
        fs::write(dep.join("lib/libenet.a"), b"").unwrap();
        let paths = config.dependency_paths(&["libenet.a"]).unwrap();
        assert_eq!(paths.lib_dir, dep.join("lib"));
    }
}
