//! Host operating system identification

use serde::{Deserialize, Serialize};
use std::fmt;

/// The closed set of host platforms a profile exists for.
///
/// Anything that is not recognizably Windows or macOS resolves to `Linux`,
/// which doubles as the default profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HostOs {
    Windows,
    MacOs,
    Linux,
}

impl HostOs {
    /// Resolve an OS identifier (as reported by `std::env::consts::OS` or
    /// `uname`-style names such as `Darwin`). Unknown identifiers fall back to
    /// the default profile.
    pub fn from_identifier(id: &str) -> Self {
        match id.trim().to_ascii_lowercase().as_str() {
            "windows" | "win32" | "win64" => HostOs::Windows,
            "macos" | "darwin" | "osx" => HostOs::MacOs,
            _ => HostOs::Linux,
        }
    }

    /// The OS this binary was compiled for.
    pub fn current() -> Self {
        Self::from_identifier(std::env::consts::OS)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HostOs::Windows => "windows",
            HostOs::MacOs => "macos",
            HostOs::Linux => "linux",
        }
    }
}

impl fmt::Display for HostOs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
