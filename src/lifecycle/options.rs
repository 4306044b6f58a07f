//! Per-run platform options
//!
//! All platform branching happens here, once per fixture run. The phases
//! only ever look at the resolved [`PlatformOptions`].

use std::path::PathBuf;

use crate::common::config::PlatformConfig;
use crate::platform::Platform;

/// Which variable to augment during the test phase, and from where
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchPathSpec {
    /// Variable name, e.g. `PATH`
    pub var: String,
    /// Path-list file relative to the build directory
    pub path_list_file: PathBuf,
    /// Separator placed between the new entry and the old value
    pub separator: &'static str,
}

/// Options consumed uniformly by configure, build and test
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PlatformOptions {
    /// Passed to cmake as `-G <generator>`
    pub generator: Option<String>,
    /// Passed to ctest as `-C <config>`
    pub test_config: Option<String>,
    /// Augment the library search path while tests run
    pub search_path: Option<SearchPathSpec>,
    /// The fixture does not support this platform
    pub skip: bool,
}

impl PlatformOptions {
    /// Resolve the options for `platform`
    ///
    /// `skip_on` lists the platforms the fixture cannot run on.
    pub fn resolve(platform: Platform, config: &PlatformConfig, skip_on: &[Platform]) -> Self {
        let skip = skip_on.contains(&platform);

        if !platform.needs_search_path_shim() {
            return Self {
                skip,
                ..Self::default()
            };
        }

        Self {
            generator: Some(config.generator.clone()).filter(|g| !g.is_empty()),
            test_config: Some(config.test_config.clone()).filter(|c| !c.is_empty()),
            search_path: Some(SearchPathSpec {
                var: config.search_path_var.clone(),
                path_list_file: config.path_list_file.clone(),
                separator: platform.path_list_separator(),
            }),
            skip,
        }
    }

    /// Extra arguments for the configure command
    pub fn configure_args(&self) -> Vec<String> {
        self.generator
            .iter()
            .flat_map(|g| ["-G".to_string(), g.clone()])
            .collect()
    }

    /// Extra arguments for the test command
    pub fn test_args(&self) -> Vec<String> {
        self.test_config
            .iter()
            .flat_map(|c| ["-C".to_string(), c.clone()])
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_windows_injects_generator_and_selector() {
        let options = PlatformOptions::resolve(Platform::Windows, &PlatformConfig::default(), &[]);
        assert_eq!(
            options.configure_args(),
            ["-G", "Visual Studio 14 2015 Win64"]
        );
        assert_eq!(options.test_args(), ["-C", "Debug"]);
        let spec = options.search_path.unwrap();
        assert_eq!(spec.var, "PATH");
        assert_eq!(spec.separator, ";");
        assert!(!options.skip);
    }

    #[test]
    fn test_other_platforms_get_no_extra_arguments() {
        for platform in [Platform::Linux, Platform::MacOS] {
            let options = PlatformOptions::resolve(platform, &PlatformConfig::default(), &[]);
            assert!(options.configure_args().is_empty());
            assert!(options.test_args().is_empty());
            assert!(options.search_path.is_none());
        }
    }

    #[test]
    fn test_skip_when_platform_listed() {
        let options = PlatformOptions::resolve(
            Platform::Linux,
            &PlatformConfig::default(),
            &[Platform::Windows, Platform::Linux],
        );
        assert!(options.skip);

        let options =
            PlatformOptions::resolve(Platform::MacOS, &PlatformConfig::default(), &[Platform::Linux]);
        assert!(!options.skip);
    }

    #[test]
    fn test_empty_generator_is_omitted() {
        let config = PlatformConfig {
            generator: String::new(),
            ..PlatformConfig::default()
        };
        let options = PlatformOptions::resolve(Platform::Windows, &config, &[]);
        assert!(options.configure_args().is_empty());
        assert_eq!(options.test_args(), ["-C", "Debug"]);
    }
}
