//! Configuration file handling

use serde::Deserialize;
use std::path::{Path, PathBuf};

use super::paths::config_path;
use super::Result;

/// Main configuration structure
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Companion repository checked out before any fixture runs
    #[serde(default)]
    pub repository: RepositoryConfig,

    /// Where fixtures live
    #[serde(default)]
    pub fixtures: FixturesConfig,

    /// External tool locations
    #[serde(default)]
    pub tools: ToolsConfig,

    /// Options injected on the path-sensitive platform
    #[serde(default)]
    pub platform: PlatformConfig,
}

/// Companion repository settings
#[derive(Debug, Deserialize, Clone)]
pub struct RepositoryConfig {
    /// Remote to clone from
    #[serde(default = "default_repository_url")]
    pub url: String,

    /// Local checkout path
    #[serde(default = "default_repository_path")]
    pub path: PathBuf,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            url: default_repository_url(),
            path: default_repository_path(),
        }
    }
}

fn default_repository_url() -> String {
    "https://github.com/vigralibs/vigra_cmake.git".to_string()
}

fn default_repository_path() -> PathBuf {
    PathBuf::from("vigra_cmake")
}

/// Fixture discovery settings
#[derive(Debug, Deserialize, Clone)]
pub struct FixturesConfig {
    /// Directory containing one subdirectory per fixture
    #[serde(default = "default_fixtures_dir")]
    pub dir: PathBuf,

    /// Optional YAML manifest overriding the built-in fixture list
    #[serde(default)]
    pub manifest: Option<PathBuf>,
}

impl Default for FixturesConfig {
    fn default() -> Self {
        Self {
            dir: default_fixtures_dir(),
            manifest: None,
        }
    }
}

fn default_fixtures_dir() -> PathBuf {
    PathBuf::from("fixtures")
}

/// External tool locations
#[derive(Debug, Deserialize, Clone)]
pub struct ToolsConfig {
    #[serde(default = "default_git")]
    pub git: String,

    #[serde(default = "default_cmake")]
    pub cmake: String,

    #[serde(default = "default_ctest")]
    pub ctest: String,

    /// Oldest cmake accepted by `check`
    #[serde(default = "default_min_cmake_version")]
    pub min_cmake_version: String,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            git: default_git(),
            cmake: default_cmake(),
            ctest: default_ctest(),
            min_cmake_version: default_min_cmake_version(),
        }
    }
}

fn default_git() -> String {
    "git".to_string()
}
fn default_cmake() -> String {
    "cmake".to_string()
}
fn default_ctest() -> String {
    "ctest".to_string()
}
fn default_min_cmake_version() -> String {
    "3.5.0".to_string()
}

/// Settings for the platform where shared libraries are not found by default
#[derive(Debug, Deserialize, Clone)]
pub struct PlatformConfig {
    /// Generator passed to cmake with `-G`
    #[serde(default = "default_generator")]
    pub generator: String,

    /// Configuration passed to ctest with `-C`
    #[serde(default = "default_test_config")]
    pub test_config: String,

    /// Path-list file written by the build, relative to the build directory
    #[serde(default = "default_path_list_file")]
    pub path_list_file: PathBuf,

    /// Library search-path variable augmented during the test phase
    #[serde(default = "default_search_path_var")]
    pub search_path_var: String,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            generator: default_generator(),
            test_config: default_test_config(),
            path_list_file: default_path_list_file(),
            search_path_var: default_search_path_var(),
        }
    }
}

fn default_generator() -> String {
    "Visual Studio 14 2015 Win64".to_string()
}
fn default_test_config() -> String {
    "Debug".to_string()
}
fn default_path_list_file() -> PathBuf {
    PathBuf::from("vad_path.txt")
}
fn default_search_path_var() -> String {
    "PATH".to_string()
}

impl Config {
    /// Load configuration from an explicit file, or the default config file
    ///
    /// An explicit path must exist. The default location falls back to
    /// built-in defaults when nothing is there.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        if let Some(path) = config_path() {
            if path.exists() {
                return Self::from_file(&path);
            }
        }
        Ok(Self::default())
    }

    fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| super::Error::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| super::Error::ConfigParse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.repository.path, PathBuf::from("vigra_cmake"));
        assert_eq!(config.tools.cmake, "cmake");
        assert_eq!(config.platform.test_config, "Debug");
        assert!(config.fixtures.manifest.is_none());
    }

    #[test]
    fn test_partial_sections_keep_other_defaults() {
        let config = Config::parse(
            r#"
[platform]
generator = "Ninja"

[fixtures]
dir = "tests/projects"
"#,
        )
        .unwrap();
        assert_eq!(config.platform.generator, "Ninja");
        assert_eq!(config.platform.search_path_var, "PATH");
        assert_eq!(config.fixtures.dir, PathBuf::from("tests/projects"));
    }

    #[test]
    fn test_invalid_toml_is_parse_error() {
        let err = Config::parse("[tools\ncmake = ").unwrap_err();
        assert!(matches!(err, crate::Error::ConfigParse(_)));
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let err = Config::load(Some(Path::new("/nonexistent/harness.toml"))).unwrap_err();
        assert!(matches!(err, crate::Error::FileRead { .. }));
    }
}
