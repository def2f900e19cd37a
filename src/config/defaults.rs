//! Built-in defaults (layer 1)
//!
//! Hardcoded defaults for every configuration value, matching the layout
//! of the reference project.

use serde::{Deserialize, Serialize};

/// Built-in default configuration values
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltinDefaults {
    /// Source directory (default: "src")
    pub source_dir: String,

    /// Project include directory (default: "include")
    pub include_dir: String,

    /// Artifact output directory (default: "bin/Debug")
    pub output_dir: String,

    /// File name patterns that count as sources (default: ["*.cpp"])
    pub source_patterns: Vec<String>,

    /// Window title of the running application (default: "Operation Jackpot")
    pub window_title: String,

    /// Compiler binary (default: "g++")
    pub compiler: String,

    /// Language standard (default: "c++17")
    pub std: String,

    /// Secondary dependency directory (default: "deps/enet")
    pub dependency_dir: String,

    /// Lock recovery enabled (default: true)
    pub recovery_enabled: bool,

    /// Pause after termination in milliseconds (default: 300)
    pub recovery_pause_ms: u64,
}

impl Default for BuiltinDefaults {
    fn default() -> Self {
        Self {
            source_dir: "src".to_string(),
            include_dir: "include".to_string(),
            output_dir: "bin/Debug".to_string(),
            source_patterns: vec!["*.cpp".to_string()],
            window_title: "Operation Jackpot".to_string(),
            compiler: "g++".to_string(),
            std: "c++17".to_string(),
            dependency_dir: "deps/enet".to_string(),
            recovery_enabled: true,
            recovery_pause_ms: 300,
        }
    }
}

impl BuiltinDefaults {
    /// Convert to JSON Value for merging, shaped like `relaunch.toml`
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::json!({
            "project": {
                "source_dir": self.source_dir,
                "include_dir": self.include_dir,
                "output_dir": self.output_dir,
                "source_patterns": self.source_patterns,
                "window_title": self.window_title,
            },
            "toolchain": {
                "compiler": self.compiler,
                "std": self.std,
            },
            "dependency": {
                "dir": self.dependency_dir,
            },
            "windows": {},
            "recovery": {
                "enabled": self.recovery_enabled,
                "pause_ms": self.recovery_pause_ms,
            }
        })
    }
}
