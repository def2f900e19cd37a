//! Static platform profile table
//!
//! One immutable record per `HostOs`. The link item order in each record is
//! significant: libraries are emitted exactly in the listed order, and the
//! MinGW toolchain needs the socket library (`ws2_32`) ahead of the timer
//! library (`winmm`), with the networking dependency (`enet`) ahead of both.

use serde::Serialize;

use crate::host::HostOs;

/// A single entry on the link line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "name", rename_all = "lowercase")]
pub enum LinkItem {
    /// `-l<name>`
    Library(&'static str),
    /// `-framework <name>` (macOS only)
    Framework(&'static str),
}

impl LinkItem {
    /// Render this item as compiler tokens.
    pub fn to_tokens(&self) -> Vec<String> {
        match self {
            LinkItem::Library(name) => vec![format!("-l{}", name)],
            LinkItem::Framework(name) => vec!["-framework".to_string(), name.to_string()],
        }
    }
}

/// Compiler and linker settings for one host platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlatformProfile {
    /// Platform this profile applies to
    pub host: HostOs,

    /// Extra include directories (after the project's own)
    pub include_dirs: &'static [&'static str],

    /// Extra library search directories
    pub lib_dirs: &'static [&'static str],

    /// Linker behaviour flags emitted before the link items
    pub linker_flags: &'static [&'static str],

    /// Link items, in link order
    pub link_items: &'static [LinkItem],

    /// Suffix appended to the artifact base name
    pub executable_suffix: &'static str,

    /// Candidate file names for the prebuilt networking library
    pub dependency_library_files: &'static [&'static str],

    /// Whether running instances can be matched by window title
    pub window_title_matching: bool,
}

static WINDOWS: PlatformProfile = PlatformProfile {
    host: HostOs::Windows,
    include_dirs: &["C:\\freeglut\\include"],
    lib_dirs: &["C:\\freeglut\\lib"],
    linker_flags: &["-Wl,--enable-auto-import"],
    link_items: &[
        LinkItem::Library("freeglut"),
        LinkItem::Library("opengl32"),
        LinkItem::Library("glu32"),
        LinkItem::Library("gdi32"),
        LinkItem::Library("enet"),
        LinkItem::Library("ws2_32"),
        LinkItem::Library("winmm"),
    ],
    executable_suffix: ".exe",
    dependency_library_files: &["libenet.a", "enet.lib"],
    window_title_matching: true,
};

static MACOS: PlatformProfile = PlatformProfile {
    host: HostOs::MacOs,
    include_dirs: &[],
    lib_dirs: &[],
    linker_flags: &[],
    link_items: &[
        LinkItem::Framework("OpenGL"),
        LinkItem::Library("freeglut"),
        LinkItem::Library("enet"),
    ],
    executable_suffix: "",
    dependency_library_files: &["libenet.a", "libenet.dylib"],
    window_title_matching: false,
};

static LINUX: PlatformProfile = PlatformProfile {
    host: HostOs::Linux,
    include_dirs: &[],
    lib_dirs: &[],
    linker_flags: &[],
    link_items: &[
        LinkItem::Library("freeglut"),
        LinkItem::Library("GL"),
        LinkItem::Library("GLU"),
        LinkItem::Library("enet"),
    ],
    executable_suffix: "",
    dependency_library_files: &["libenet.a", "libenet.so"],
    window_title_matching: false,
};

impl PlatformProfile {
    /// Look up the profile for a host. Pure table lookup.
    pub fn for_host(host: HostOs) -> &'static PlatformProfile {
        match host {
            HostOs::Windows => &WINDOWS,
            HostOs::MacOs => &MACOS,
            HostOs::Linux => &LINUX,
        }
    }

    /// Artifact file name for a base name (`projectOj` -> `projectOj.exe` on Windows).
    pub fn artifact_file_name(&self, base: &str) -> String {
        format!("{}{}", base, self.executable_suffix)
    }

    /// All link tokens in profile order.
    pub fn link_tokens(&self) -> Vec<String> {
        self.link_items.iter().flat_map(|item| item.to_tokens()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn position(tokens: &[String], token: &str) -> usize {
        tokens
            .iter()
            .position(|t| t == token)
            .unwrap_or_else(|| panic!("missing {}", token))
    }

    #[test]
    fn test_each_host_has_its_own_profile() {
        assert_eq!(PlatformProfile::for_host(HostOs::Windows).host, HostOs::Windows);
        assert_eq!(PlatformProfile::for_host(HostOs::MacOs).host, HostOs::MacOs);
        assert_eq!(PlatformProfile::for_host(HostOs::Linux).host, HostOs::Linux);
    }

    #[test]
    fn test_unknown_identifier_uses_default_profile() {
        let profile = PlatformProfile::for_host(HostOs::from_identifier("haiku"));
        assert_eq!(profile, PlatformProfile::for_host(HostOs::Linux));
    }

    #[test]
    fn test_executable_suffix_only_on_windows() {
        assert_eq!(
            PlatformProfile::for_host(HostOs::Windows).artifact_file_name("projectOj"),
            "projectOj.exe"
        );
        assert_eq!(
            PlatformProfile::for_host(HostOs::MacOs).artifact_file_name("projectOj"),
            "projectOj"
        );
        assert_eq!(
            PlatformProfile::for_host(HostOs::Linux).artifact_file_name("projectOj"),
            "projectOj"
        );
    }

    #[test]
    fn test_windows_socket_library_precedes_timer_library() {
        let tokens = PlatformProfile::for_host(HostOs::Windows).link_tokens();
        let enet = position(&tokens, "-lenet");
        let ws2 = position(&tokens, "-lws2_32");
        let winmm = position(&tokens, "-lwinmm");
        assert!(enet < ws2);
        assert!(ws2 < winmm);
    }

    #[test]
    fn test_macos_framework_tokens() {
        let tokens = PlatformProfile::for_host(HostOs::MacOs).link_tokens();
        assert_eq!(tokens[0], "-framework");
        assert_eq!(tokens[1], "OpenGL");
        assert!(tokens.contains(&"-lfreeglut".to_string()));
    }

    #[test]
    fn test_linux_link_tokens() {
        let tokens = PlatformProfile::for_host(HostOs::Linux).link_tokens();
        assert_eq!(tokens, vec!["-lfreeglut", "-lGL", "-lGLU", "-lenet"]);
    }

    #[test]
    fn test_only_windows_matches_window_titles() {
        assert!(PlatformProfile::for_host(HostOs::Windows).window_title_matching);
        assert!(!PlatformProfile::for_host(HostOs::MacOs).window_title_matching);
        assert!(!PlatformProfile::for_host(HostOs::Linux).window_title_matching);
    }
}
