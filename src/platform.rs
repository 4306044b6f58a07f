//! Host platform detection

use serde::{Deserialize, Serialize};
use std::fmt;

/// Supported platforms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Linux,
    #[serde(alias = "osx", alias = "darwin")]
    MacOS,
    Windows,
}

impl Platform {
    /// Get the current platform
    pub fn current() -> Self {
        #[cfg(target_os = "linux")]
        return Platform::Linux;

        #[cfg(target_os = "macos")]
        return Platform::MacOS;

        #[cfg(target_os = "windows")]
        return Platform::Windows;

        #[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
        return Platform::Linux; // Default fallback
    }

    /// Whether freshly built shared libraries are invisible to the loader
    /// unless their directories are added to the search path
    pub fn needs_search_path_shim(&self) -> bool {
        matches!(self, Platform::Windows)
    }

    /// Separator between entries of a path-list variable
    pub fn path_list_separator(&self) -> &'static str {
        match self {
            Platform::Windows => ";",
            Platform::Linux | Platform::MacOS => ":",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::Linux => write!(f, "linux"),
            Platform::MacOS => write!(f, "macos"),
            Platform::Windows => write!(f, "windows"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_windows_needs_shim() {
        assert!(Platform::Windows.needs_search_path_shim());
        assert!(!Platform::Linux.needs_search_path_shim());
        assert!(!Platform::MacOS.needs_search_path_shim());
    }

    #[test]
    fn test_deserialize_aliases() {
        let platforms: Vec<Platform> = serde_yaml::from_str("[linux, darwin, windows]").unwrap();
        assert_eq!(platforms, [Platform::Linux, Platform::MacOS, Platform::Windows]);
    }
}
